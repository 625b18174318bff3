use std::fs;
use std::path::{Path, PathBuf};

use kinoclub_core::TokenStore;
use tracing::warn;

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("club", "kino", "KinoClub")
}

/// Platform data directory, falling back to the working directory.
pub fn data_dir() -> PathBuf {
    let dir = project_dirs().map(|d| d.data_dir().to_path_buf()).unwrap_or_else(|| PathBuf::from("."));
    let _ = fs::create_dir_all(&dir);
    dir
}

pub fn config_dir() -> PathBuf {
    let dir = project_dirs().map(|d| d.config_dir().to_path_buf()).unwrap_or_else(|| PathBuf::from("."));
    let _ = fs::create_dir_all(&dir);
    dir
}

/// Bearer token kept in a plain file next to the log.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn in_data_dir() -> Self {
        Self::new(data_dir().join("session_token.txt"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        let s = fs::read_to_string(&self.path).ok()?;
        let s = s.trim();
        if s.is_empty() { None } else { Some(s.to_string()) }
    }

    fn save(&self, token: &str) {
        if let Err(e) = fs::write(&self.path, token) {
            warn!("cannot persist session token to {}: {}", self.path.display(), e);
        }
    }

    fn clear(&self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                warn!("cannot remove session token {}: {}", self.path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_file_round_trip() {
        let path = std::env::temp_dir().join(format!("kinoclub-token-{}.txt", std::process::id()));
        let store = FileTokenStore::new(path.clone());
        assert_eq!(store.load(), None);
        store.save("abc.def.ghi\n");
        assert_eq!(store.load().as_deref(), Some("abc.def.ghi"));
        store.clear();
        assert!(!path.exists());
        store.clear();
    }
}
