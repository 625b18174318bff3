use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use kinoclub_core::{Language, DEFAULT_API_URL};

use crate::storage::config_dir;

pub const API_URL_ENV: &str = "KINOCLUB_API_URL";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub oauth_timeout_secs: u64,
    /// 0 lets the OS pick a free port.
    pub oauth_callback_port: u16,
    /// `{URL}` is replaced by the stream address; otherwise it is appended.
    pub player_command: String,
    pub theme: String, // "dark" | "light"
    pub font_scale: f32,
    pub language: Language,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 15,
            oauth_timeout_secs: 120,
            oauth_callback_port: 0,
            player_command: "vlc {URL}".to_string(),
            theme: "dark".to_string(),
            font_scale: 1.0,
            language: Language::English,
        }
    }
}

impl Config {
    /// Base URL after the environment override.
    pub fn effective_api_url(&self) -> String {
        match std::env::var(API_URL_ENV) {
            Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => self.api_base_url.clone(),
        }
    }
}

fn config_file_path() -> PathBuf {
    config_dir().join("kinoclub_config.txt")
}

pub fn read_config() -> Result<Config, io::Error> {
    let content = fs::read_to_string(config_file_path())?;
    Ok(parse_config(&content))
}

/// Unknown keys are ignored and unparseable values fall back to the default.
pub fn parse_config(content: &str) -> Config {
    let mut cfg = Config::default();
    let defaults = Config::default();
    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        let Some((k, v)) = line.split_once('=') else { continue };
        let v = v.trim();
        match k.trim() {
            "api_base_url" if !v.is_empty() => cfg.api_base_url = v.to_string(),
            "request_timeout_secs" => {
                cfg.request_timeout_secs = v.parse::<u64>().ok().filter(|n| *n > 0).unwrap_or(defaults.request_timeout_secs)
            }
            "oauth_timeout_secs" => {
                cfg.oauth_timeout_secs = v.parse::<u64>().ok().filter(|n| *n > 0).unwrap_or(defaults.oauth_timeout_secs)
            }
            "oauth_callback_port" => cfg.oauth_callback_port = v.parse::<u16>().unwrap_or(0),
            "player_command" if !v.is_empty() => cfg.player_command = v.to_string(),
            "theme" => cfg.theme = if v == "light" { "light" } else { "dark" }.to_string(),
            "font_scale" => cfg.font_scale = v.parse::<f32>().map(|s| s.clamp(0.6, 2.0)).unwrap_or(1.0),
            "language" => cfg.language = Language::from_code(v),
            _ => {}
        }
    }
    cfg
}

pub fn save_config(cfg: &Config) -> Result<(), io::Error> {
    write_config_to(&config_file_path(), cfg)
}

fn write_config_to(path: &Path, cfg: &Config) -> Result<(), io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut f = fs::File::create(path)?;
    writeln!(f, "api_base_url={}", cfg.api_base_url)?;
    writeln!(f, "request_timeout_secs={}", cfg.request_timeout_secs)?;
    writeln!(f, "oauth_timeout_secs={}", cfg.oauth_timeout_secs)?;
    writeln!(f, "oauth_callback_port={}", cfg.oauth_callback_port)?;
    if !cfg.player_command.is_empty() {
        writeln!(f, "player_command={}", cfg.player_command)?;
    }
    writeln!(f, "theme={}", cfg.theme)?;
    writeln!(f, "font_scale={:.2}", cfg.font_scale)?;
    writeln!(f, "language={}", cfg.language.code())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_and_broken_keys() {
        let cfg = parse_config("# comment\nrequest_timeout_secs=abc\nlanguage=ru\nfont_scale=9\nunknown=1\nnot a pair");
        assert_eq!(cfg.request_timeout_secs, 15);
        assert_eq!(cfg.language, Language::Russian);
        assert_eq!(cfg.font_scale, 2.0);
        assert_eq!(cfg.api_base_url, DEFAULT_API_URL);
        assert_eq!(cfg.player_command, "vlc {URL}");
    }

    #[test]
    fn saved_file_reads_back() {
        let path = std::env::temp_dir().join(format!("kinoclub-config-{}.txt", std::process::id()));
        let cfg = Config {
            api_base_url: "http://localhost:8000/api".into(),
            oauth_callback_port: 8765,
            player_command: "mpv --fs {URL}".into(),
            theme: "light".into(),
            font_scale: 1.25,
            language: Language::Russian,
            ..Config::default()
        };
        write_config_to(&path, &cfg).unwrap();
        let back = parse_config(&fs::read_to_string(&path).unwrap());
        let _ = fs::remove_file(&path);
        assert_eq!(back, cfg);
    }
}
