//! Image uploads are checked locally before anything is sent.

use std::path::Path;

use thiserror::Error;

use crate::error::ApiError;
use crate::models::Language;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const ALLOWED_MIME_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("file is empty")]
    Empty,
    #[error("file is {size} bytes, limit is 5 MiB")]
    TooLarge { size: usize },
    #[error("unsupported file type {0}")]
    UnsupportedType(String),
    #[error("cannot read file: {0}")]
    Io(String),
}

impl UploadError {
    pub fn user_message(&self, lang: Language) -> String {
        let (ru, en) = match self {
            UploadError::Empty => ("Файл пуст", "The file is empty"),
            UploadError::TooLarge { .. } => ("Размер файла не должен превышать 5MB", "File size must not exceed 5MB"),
            UploadError::UnsupportedType(_) => (
                "Разрешены только изображения (JPEG, PNG, GIF, WEBP)",
                "Only images are allowed (JPEG, PNG, GIF, WEBP)",
            ),
            UploadError::Io(e) => return e.clone(),
        };
        match lang {
            Language::Russian => ru.to_string(),
            Language::English => en.to_string(),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(e: UploadError) -> Self {
        ApiError::Validation(e.to_string())
    }
}

/// A validated image ready for a multipart `file` field.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn from_bytes(file_name: &str, bytes: Vec<u8>) -> Result<Self, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(UploadError::TooLarge { size: bytes.len() });
        }
        let mime = mime_guess::from_path(file_name).first_or_octet_stream().essence_str().to_string();
        if !ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
            return Err(UploadError::UnsupportedType(mime));
        }
        Ok(Self { file_name: file_name.to_string(), mime, bytes })
    }

    pub fn read(path: &Path) -> Result<Self, UploadError> {
        let meta = std::fs::metadata(path).map_err(|e| UploadError::Io(e.to_string()))?;
        if meta.len() as usize > MAX_UPLOAD_BYTES {
            return Err(UploadError::TooLarge { size: meta.len() as usize });
        }
        let bytes = std::fs::read(path).map_err(|e| UploadError::Io(e.to_string()))?;
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("upload");
        Self::from_bytes(name, bytes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserMedia {
    Photo,
    HeaderPhoto,
}

impl UserMedia {
    pub fn path_segment(self) -> &'static str {
        match self {
            UserMedia::Photo => "photo",
            UserMedia::HeaderPhoto => "header_photo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieMedia {
    Poster,
    Backdrop,
}

impl MovieMedia {
    pub fn path_segment(self) -> &'static str {
        match self {
            MovieMedia::Poster => "poster",
            MovieMedia::Backdrop => "backdrop",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_images() {
        for name in ["a.jpg", "b.JPEG", "c.png", "d.gif", "e.webp"] {
            let f = UploadFile::from_bytes(name, vec![1, 2, 3]).unwrap();
            assert!(ALLOWED_MIME_TYPES.contains(&f.mime.as_str()), "{}", name);
        }
    }

    #[test]
    fn rejects_other_types_and_sizes() {
        assert!(matches!(UploadFile::from_bytes("notes.txt", vec![1]), Err(UploadError::UnsupportedType(_))));
        assert!(matches!(UploadFile::from_bytes("clip.mp4", vec![1]), Err(UploadError::UnsupportedType(_))));
        assert_eq!(UploadFile::from_bytes("a.png", Vec::new()), Err(UploadError::Empty));
        assert_eq!(
            UploadFile::from_bytes("a.png", vec![0; MAX_UPLOAD_BYTES + 1]),
            Err(UploadError::TooLarge { size: MAX_UPLOAD_BYTES + 1 })
        );
        assert!(UploadFile::from_bytes("a.png", vec![0; MAX_UPLOAD_BYTES]).is_ok());
    }

    #[test]
    fn reads_from_disk() {
        let path = std::env::temp_dir().join(format!("kinoclub-upload-{}.png", std::process::id()));
        std::fs::write(&path, [137u8, 80, 78, 71]).unwrap();
        let f = UploadFile::read(&path).unwrap();
        assert_eq!(f.mime, "image/png");
        assert_eq!(f.bytes.len(), 4);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(UploadFile::read(&path), Err(UploadError::Io(_))));
    }

    #[test]
    fn too_large_message_is_localized() {
        let e = UploadError::TooLarge { size: 1 };
        assert_eq!(e.user_message(Language::Russian), "Размер файла не должен превышать 5MB");
        assert!(matches!(ApiError::from(e), ApiError::Validation(_)));
    }
}
