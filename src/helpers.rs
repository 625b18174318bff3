use chrono::{DateTime, Local, NaiveDate, Utc};
use kinoclub_core::Language;

/// "2 h 43 min" style runtime.
pub fn format_runtime(minutes: u32, lang: Language) -> String {
    let (h, m) = (minutes / 60, minutes % 60);
    let (hu, mu) = match lang {
        Language::Russian => ("ч", "мин"),
        Language::English => ("h", "min"),
    };
    match (h, m) {
        (0, m) => format!("{} {}", m, mu),
        (h, 0) => format!("{} {}", h, hu),
        (h, m) => format!("{} {} {} {}", h, hu, m, mu),
    }
}

pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d.%m.%Y").to_string()).unwrap_or_else(|| "—".to_string())
}

pub fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.with_timezone(&Local).format("%d.%m.%Y %H:%M").to_string())
        .unwrap_or_default()
}

/// Format file size in human-readable format
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Russian plural form for counts ("1 монета", "3 монеты", "5 монет").
pub fn plural_ru<'a>(n: i64, one: &'a str, few: &'a str, many: &'a str) -> &'a str {
    let n = n.abs();
    match (n % 10, n % 100) {
        (1, r) if r != 11 => one,
        (2..=4, r) if !(12..=14).contains(&r) => few,
        _ => many,
    }
}

pub fn format_coins(n: i64, lang: Language) -> String {
    match lang {
        Language::Russian => format!("{} {}", n, plural_ru(n, "монета", "монеты", "монет")),
        Language::English => format!("{} {}", n, if n == 1 { "coin" } else { "coins" }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime() {
        assert_eq!(format_runtime(163, Language::English), "2 h 43 min");
        assert_eq!(format_runtime(120, Language::Russian), "2 ч");
        assert_eq!(format_runtime(45, Language::English), "45 min");
    }

    #[test]
    fn coins_pluralize() {
        assert_eq!(format_coins(1, Language::Russian), "1 монета");
        assert_eq!(format_coins(3, Language::Russian), "3 монеты");
        assert_eq!(format_coins(11, Language::Russian), "11 монет");
        assert_eq!(format_coins(22, Language::Russian), "22 монеты");
        assert_eq!(format_coins(1, Language::English), "1 coin");
    }

    #[test]
    fn sizes() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.00 MB");
    }
}
