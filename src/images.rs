//! What a stored image value points at, and how to get its bytes.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, RgbImage};

use crate::error::{Result, ShelfError};

/// JPEG quality for images produced on the client.
pub const JPEG_QUALITY: u8 = 95;

const THUMB_SUFFIXES: [&str; 5] = ["_thumb", "-thumb", ".thumb", "_small", "-small"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageRef<'a> {
    /// `data:image/...;base64,...`
    DataUrl(&'a str),
    External(&'a str),
    /// A file name under the uploads directory.
    Local(&'a str),
}

impl<'a> ImageRef<'a> {
    pub fn parse(value: &'a str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            None
        } else if value.starts_with("data:") {
            Some(Self::DataUrl(value))
        } else if value.starts_with("http://") || value.starts_with("https://") || value.starts_with("//") {
            Some(Self::External(value))
        } else {
            Some(Self::Local(value))
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Self::External(_))
    }

    /// Absolute URL for fetching; `None` for data URLs, which need no request.
    pub fn resolve(&self, uploads_base: &str) -> Option<String> {
        match self {
            Self::DataUrl(_) => None,
            Self::External(url) if url.starts_with("//") => Some(format!("https:{url}")),
            Self::External(url) => Some((*url).to_owned()),
            Self::Local(name) => Some(format!(
                "{}/{}",
                uploads_base.trim_end_matches('/'),
                name.trim_start_matches('/').trim_start_matches("uploads/")
            )),
        }
    }

    /// Where an external image is hosted: host name plus the first path
    /// segment, lowercased. Bucket-style hosts keep the site in that segment,
    /// e.g. `storage.googleapis.com/images.pricecharting.com`.
    pub fn source(&self) -> Option<String> {
        let Self::External(url) = self else { return None };
        let full = if url.starts_with("//") { format!("https:{url}") } else { (*url).to_owned() };
        let parsed = url::Url::parse(&full).ok()?;
        let host = parsed.host_str()?;
        let first = parsed
            .path_segments()
            .and_then(|mut segments| segments.next())
            .unwrap_or_default();
        Some(format!("{host}/{first}").to_ascii_lowercase())
    }
}

/// Asks for the full-size file instead of a thumbnail.
pub fn strip_thumbnail_suffix(url: &str) -> String {
    let (path, query) = match url.find(['?', '#']) {
        Some(i) => url.split_at(i),
        None => (url, ""),
    };
    let mut path = path.replace("/thumbs/", "/");
    let file_start = path.rfind('/').map_or(0, |i| i + 1);
    let ext_start = path
        .rfind('.')
        .filter(|&i| i > file_start)
        .unwrap_or(path.len());
    let stem = path.get(file_start..ext_start).unwrap_or_default();
    if let Some(suffix) = THUMB_SUFFIXES.iter().find(|s| stem.ends_with(*s)) {
        path.replace_range(ext_start - suffix.len()..ext_start, "");
    }
    format!("{path}{query}")
}

/// Same-origin proxy URL for an external image.
pub fn proxy_url(api_base: &str, url: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(url.as_bytes()).collect();
    format!("{}/image_proxy.php?url={encoded}", api_base.trim_end_matches('/'))
}

pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>> {
    let (header, payload) = data_url
        .split_once(',')
        .ok_or_else(|| ShelfError::Decode("data URL without payload".to_owned()))?;
    if !header.ends_with(";base64") {
        return Err(ShelfError::Decode("only base64 data URLs are supported".to_owned()));
    }
    Ok(STANDARD.decode(payload.trim())?)
}

pub fn encode_jpeg_data_url(image: &DynamicImage) -> Result<String> {
    let rgb: RgbImage = image.to_rgb8();
    let mut bytes = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY);
    encoder.encode(rgb.as_raw(), rgb.width(), rgb.height(), image::ColorType::Rgb8)?;
    Ok(format!("data:image/jpeg;base64,{}", STANDARD.encode(&bytes)))
}
