//! Third-party video references found in free-text movie fields.

use once_cell::sync::Lazy;
use regex::Regex;

static YOUTUBE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^.*(youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*).*").expect("youtube pattern")
});
static VIMEO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"vimeo\.com/([0-9]+)").expect("vimeo pattern"));
static VIMEO_PLAYER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"player\.vimeo\.com/video/([0-9]+)").expect("vimeo player pattern"));
static DAILYMOTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"dailymotion\.com/video/([a-zA-Z0-9]+)").expect("dailymotion pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoEmbed {
    YouTube(String),
    Vimeo(String),
    Dailymotion(String),
}

impl VideoEmbed {
    /// Recognizes the host first, then extracts the id; a known host with an
    /// unreadable id yields `None`.
    pub fn parse(url: &str) -> Option<Self> {
        let url = url.trim();
        if url.contains("vimeo.com") {
            vimeo_id(url).map(VideoEmbed::Vimeo)
        } else if url.contains("youtube.com") || url.contains("youtu.be") {
            youtube_id(url).map(VideoEmbed::YouTube)
        } else if url.contains("dailymotion.com") {
            dailymotion_id(url).map(VideoEmbed::Dailymotion)
        } else {
            None
        }
    }

    pub fn id(&self) -> &str {
        match self {
            VideoEmbed::YouTube(id) | VideoEmbed::Vimeo(id) | VideoEmbed::Dailymotion(id) => id,
        }
    }

    pub fn provider(&self) -> &'static str {
        match self {
            VideoEmbed::YouTube(_) => "YouTube",
            VideoEmbed::Vimeo(_) => "Vimeo",
            VideoEmbed::Dailymotion(_) => "Dailymotion",
        }
    }

    /// Canonical page for opening in a browser.
    pub fn watch_url(&self) -> String {
        match self {
            VideoEmbed::YouTube(id) => format!("https://www.youtube.com/watch?v={}", urlencoding::encode(id)),
            VideoEmbed::Vimeo(id) => format!("https://vimeo.com/{}", id),
            VideoEmbed::Dailymotion(id) => format!("https://www.dailymotion.com/video/{}", id),
        }
    }
}

/// 11-character video id, or `None`.
pub fn youtube_id(url: &str) -> Option<String> {
    let caps = YOUTUBE_RE.captures(url)?;
    let id = caps.get(2)?.as_str();
    (id.len() == 11).then(|| id.to_string())
}

pub fn vimeo_id(url: &str) -> Option<String> {
    VIMEO_RE
        .captures(url)
        .or_else(|| VIMEO_PLAYER_RE.captures(url))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn dailymotion_id(url: &str) -> Option<String> {
    DAILYMOTION_RE.captures(url).and_then(|c| c.get(1)).map(|m| m.as_str().to_string())
}

/// What sits behind the movie header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backdrop {
    None,
    Image(String),
    Video(VideoEmbed),
}

impl Backdrop {
    pub fn classify(reference: &str) -> Self {
        let reference = reference.trim();
        if reference.is_empty() {
            return Backdrop::None;
        }
        match VideoEmbed::parse(reference) {
            Some(embed) => Backdrop::Video(embed),
            None => Backdrop::Image(reference.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn youtube_shapes() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?t=42",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ#top",
        ] {
            assert_eq!(youtube_id(url).as_deref(), Some("dQw4w9WgXcQ"), "{}", url);
        }
        assert_eq!(youtube_id("https://www.youtube.com/watch?v=short"), None);
    }

    #[test]
    fn vimeo_shapes() {
        assert_eq!(vimeo_id("https://vimeo.com/76979871").as_deref(), Some("76979871"));
        assert_eq!(vimeo_id("https://player.vimeo.com/video/76979871?h=abc").as_deref(), Some("76979871"));
        assert_eq!(vimeo_id("https://vimeo.com/channels/staff"), None);
    }

    #[test]
    fn dailymotion_shape() {
        assert_eq!(dailymotion_id("https://www.dailymotion.com/video/x7tgad0").as_deref(), Some("x7tgad0"));
    }

    #[test]
    fn parse_dispatches_on_host() {
        assert_eq!(
            VideoEmbed::parse("https://youtu.be/dQw4w9WgXcQ"),
            Some(VideoEmbed::YouTube("dQw4w9WgXcQ".into()))
        );
        assert_eq!(VideoEmbed::parse("https://example.com/poster.jpg"), None);
        assert_eq!(VideoEmbed::parse("https://vimeo.com/about"), None);
    }

    #[test]
    fn backdrop_falls_back_to_image() {
        assert_eq!(Backdrop::classify("  "), Backdrop::None);
        assert_eq!(
            Backdrop::classify("https://cdn.example.com/b.jpg"),
            Backdrop::Image("https://cdn.example.com/b.jpg".into())
        );
        assert!(matches!(
            Backdrop::classify("https://www.dailymotion.com/video/x7tgad0"),
            Backdrop::Video(VideoEmbed::Dailymotion(_))
        ));
    }

    #[test]
    fn watch_urls() {
        assert_eq!(VideoEmbed::YouTube("dQw4w9WgXcQ".into()).watch_url(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(VideoEmbed::Vimeo("1".into()).watch_url(), "https://vimeo.com/1");
        assert_eq!(VideoEmbed::Dailymotion("x7tgad0".into()).watch_url(), "https://www.dailymotion.com/video/x7tgad0");
    }
}
