//! Cover images as egui textures, fetched in the background.

use std::collections::HashMap;
use std::sync::Arc;

use egui::{ColorImage, TextureHandle, TextureOptions};

use crate::api::Backend;
use crate::config::Config;
use crate::error::Result;
use crate::images::{self, ImageRef};
use crate::worker::Worker;

/// Longest side kept in memory for display.
const TEXTURE_MAX: u32 = 512;

enum CoverState {
    Loading,
    Ready(TextureHandle),
    Failed,
}

type Loaded = (String, Result<ColorImage>);

pub struct CoverCache {
    config: Config,
    worker: Worker<Loaded>,
    entries: HashMap<String, CoverState>,
}

impl CoverCache {
    pub fn new(backend: Arc<dyn Backend>, config: Config, ctx: &egui::Context) -> Self {
        Self {
            config,
            worker: Worker::new(backend).with_context(ctx.clone()),
            entries: HashMap::new(),
        }
    }

    /// Texture for a stored image value, or `None` while it loads (or if it can't).
    pub fn get(&mut self, ctx: &egui::Context, value: &str) -> Option<TextureHandle> {
        self.poll(ctx);
        match self.entries.get(value) {
            Some(CoverState::Ready(tex)) => Some(tex.clone()),
            Some(CoverState::Loading | CoverState::Failed) => None,
            None => {
                self.request(value);
                None
            }
        }
    }

    pub fn forget(&mut self, value: &str) {
        self.entries.remove(value);
    }

    fn request(&mut self, value: &str) {
        let Some(image_ref) = ImageRef::parse(value) else { return };
        self.entries.insert(value.to_owned(), CoverState::Loading);
        let key = value.to_owned();
        let url = image_ref.resolve(&self.config.uploads_base);
        self.worker.spawn(move |backend| {
            let bytes = match url {
                Some(url) => backend.fetch_image(&url),
                None => images::decode_data_url(&key),
            };
            let image = bytes.and_then(|b| decode(&b));
            (key, image)
        });
    }

    fn poll(&mut self, ctx: &egui::Context) {
        for (key, result) in self.worker.drain() {
            let state = match result {
                Ok(image) => CoverState::Ready(ctx.load_texture(&key, image, TextureOptions::LINEAR)),
                Err(err) => {
                    log::warn!("cover {} failed: {err}", short(&key));
                    CoverState::Failed
                }
            };
            self.entries.insert(key, state);
        }
    }
}

/// Decodes and shrinks an image into something egui can upload.
pub fn decode(bytes: &[u8]) -> Result<ColorImage> {
    let img = image::load_from_memory(bytes)?;
    let img = if img.width().max(img.height()) > TEXTURE_MAX {
        img.thumbnail(TEXTURE_MAX, TEXTURE_MAX)
    } else {
        img
    };
    Ok(to_color_image(&img))
}

pub fn to_color_image(img: &image::DynamicImage) -> ColorImage {
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    ColorImage::from_rgba_unmultiplied(size, rgba.as_raw())
}

/// Data URLs make terrible log lines.
fn short(key: &str) -> &str {
    key.get(..60).unwrap_or(key)
}
