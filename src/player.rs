use std::io;
use std::process::Command;

use tracing::{error, info};

use crate::config::Config;
use crate::logger::log_command;

/// Splits the configured command and substitutes the stream address for
/// `{URL}`; without a placeholder the address is appended.
pub fn player_args(player_command: &str, stream_url: &str) -> Vec<String> {
    let cmd = if player_command.trim().is_empty() { "vlc {URL}" } else { player_command };
    let mut parts: Vec<String> = cmd.split_whitespace().map(|s| s.to_string()).collect();
    let mut replaced = false;
    for p in &mut parts {
        if p == "URL" || p == "{URL}" || p == "{url}" {
            *p = stream_url.to_string();
            replaced = true;
        }
    }
    if !replaced {
        parts.push(stream_url.to_string());
    }
    parts
}

pub fn start_player(cfg: &Config, stream_url: &str) -> io::Result<()> {
    let mut parts = player_args(&cfg.player_command, stream_url);
    if parts.is_empty() {
        return Ok(());
    }
    let program = parts.remove(0);
    log_command(&program, &parts);
    match Command::new(&program).args(&parts).spawn() {
        Ok(child) => {
            info!("spawned player pid={} program={}", child.id(), program);
            Ok(())
        }
        Err(e) => {
            error!("failed to spawn player {}: {}", program, e);
            #[cfg(target_os = "macos")]
            {
                if program.to_lowercase().contains("vlc") {
                    info!("falling back to 'open -a VLC'");
                    if Command::new("open").arg("-a").arg("VLC").arg(stream_url).spawn().is_ok() {
                        return Ok(());
                    }
                }
            }
            Err(e)
        }
    }
}

/// Opens a page in the default browser.
pub fn open_in_browser(url: &str) -> io::Result<()> {
    info!("opening {}", url);
    webbrowser::open(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_substituted() {
        assert_eq!(player_args("mpv --fs {URL}", "http://x/v.mp4"), vec!["mpv", "--fs", "http://x/v.mp4"]);
        assert_eq!(player_args("vlc", "http://x/v.mp4"), vec!["vlc", "http://x/v.mp4"]);
        assert_eq!(player_args("  ", "u"), vec!["vlc", "u"]);
    }
}
