use std::collections::{HashMap, HashSet};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use eframe::egui;
use kinoclub_core::ApiClient;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::app_state::Msg;

/// Poster and avatar textures, fetched once per URL and kept for the session.
pub struct ImageManager {
    textures: HashMap<String, egui::TextureHandle>,
    pending: HashSet<String>,
    failed: HashSet<String>,
    load_semaphore: Arc<Semaphore>,
}

impl Default for ImageManager {
    fn default() -> Self {
        Self::new(6)
    }
}

impl ImageManager {
    pub fn new(concurrent_loads: usize) -> Self {
        Self {
            textures: HashMap::new(),
            pending: HashSet::new(),
            failed: HashSet::new(),
            load_semaphore: Arc::new(Semaphore::new(concurrent_loads)),
        }
    }

    pub fn texture(&self, url: &str) -> Option<&egui::TextureHandle> {
        self.textures.get(url)
    }

    /// Starts a background fetch and decode unless one is known already.
    pub fn request(&mut self, url: &str, api: &ApiClient, tx: &Sender<Msg>, ctx: &egui::Context) {
        if url.is_empty() || self.textures.contains_key(url) || self.pending.contains(url) || self.failed.contains(url) {
            return;
        }
        self.pending.insert(url.to_string());
        let url = url.to_string();
        let api = api.clone();
        let tx = tx.clone();
        let ctx = ctx.clone();
        let semaphore = self.load_semaphore.clone();
        tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else { return };
            let msg = match api.fetch_media(&url).await {
                Ok(bytes) => match tokio::task::spawn_blocking(move || decode(&bytes)).await {
                    Ok(Ok((rgba, w, h))) => Msg::ImageDecoded { url, rgba, w, h },
                    Ok(Err(e)) => {
                        warn!("cannot decode image {}: {}", url, e);
                        Msg::ImageFailed { url }
                    }
                    Err(e) => {
                        warn!("image decode task failed for {}: {}", url, e);
                        Msg::ImageFailed { url }
                    }
                },
                Err(e) => {
                    warn!("cannot load image {}: {}", url, e);
                    Msg::ImageFailed { url }
                }
            };
            let _ = tx.send(msg);
            ctx.request_repaint();
        });
    }

    pub fn on_decoded(&mut self, ctx: &egui::Context, url: String, rgba: Vec<u8>, w: u32, h: u32) {
        self.pending.remove(&url);
        let image = egui::ColorImage::from_rgba_unmultiplied([w as usize, h as usize], &rgba);
        let texture = ctx.load_texture(url.clone(), image, egui::TextureOptions::LINEAR);
        self.textures.insert(url, texture);
    }

    pub fn on_failed(&mut self, url: String) {
        self.pending.remove(&url);
        self.failed.insert(url);
    }

    /// Drop failures so they are retried, e.g. after the API URL changed.
    pub fn clear_failed(&mut self) {
        self.failed.clear();
    }
}

fn decode(bytes: &[u8]) -> Result<(Vec<u8>, u32, u32), image::ImageError> {
    let img = image::load_from_memory(bytes)?;
    // Posters come in at full resolution; keep textures small.
    let img = if img.width() > 600 || img.height() > 900 { img.thumbnail(600, 900) } else { img };
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    Ok((rgba.into_raw(), w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_and_shrinks_png() {
        let img = image::RgbaImage::from_pixel(1200, 1800, image::Rgba([10, 20, 30, 255]));
        let mut png = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img).write_to(&mut png, image::ImageOutputFormat::Png).unwrap();
        let (rgba, w, h) = decode(png.get_ref()).unwrap();
        assert_eq!((w, h), (600, 900));
        assert_eq!(rgba.len(), (600 * 900 * 4) as usize);
        assert!(decode(b"not an image").is_err());
    }

    #[test]
    fn failed_url_is_not_requested_again() {
        let api = ApiClient::new(kinoclub_core::DEFAULT_API_URL, std::time::Duration::from_secs(1), kinoclub_core::Session::in_memory()).unwrap();
        let (tx, _rx) = std::sync::mpsc::channel();
        let ctx = egui::Context::default();
        let mut images = ImageManager::new(1);
        images.on_failed("https://cdn.example.com/p.jpg".to_string());
        images.request("https://cdn.example.com/p.jpg", &api, &tx, &ctx);
        assert!(images.pending.is_empty());
        images.clear_failed();
        assert!(images.failed.is_empty());
    }
}
