//! Cuts one scanned cover (front and back side by side, or stacked) into two
//! images.

use image::DynamicImage;
use image::imageops::FilterType;

use crate::api::Backend;
use crate::config::Config;
use crate::error::{Result, ShelfError};
use crate::images::{self, ImageRef};

/// Longest side of the live preview.
pub const PREVIEW_MAX: u32 = 480;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum SplitAxis {
    /// Cut line runs top to bottom: left and right halves.
    #[default]
    Vertical,
    /// Cut line runs left to right: top and bottom halves.
    Horizontal,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct SplitSettings {
    pub axis: SplitAxis,
    /// Cut position along the width, in percent.
    pub vertical_pct: f32,
    /// Cut position along the height, in percent.
    pub horizontal_pct: f32,
    /// Second half is the front.
    pub swap: bool,
}

impl Default for SplitSettings {
    fn default() -> Self {
        Self {
            axis: SplitAxis::Vertical,
            vertical_pct: 50.0,
            horizontal_pct: 50.0,
            swap: false,
        }
    }
}

/// Known scan sources and where their covers usually divide.
const SOURCE_PRESETS: [(&str, SplitAxis, f32); 2] = [
    ("thecoverproject", SplitAxis::Vertical, 50.0),
    ("pricecharting", SplitAxis::Vertical, 53.0),
];

impl SplitSettings {
    pub fn position_mut(&mut self) -> &mut f32 {
        match self.axis {
            SplitAxis::Vertical => &mut self.vertical_pct,
            SplitAxis::Horizontal => &mut self.horizontal_pct,
        }
    }

    /// Picks axis and position from where the image is hosted; anything
    /// unknown keeps `manual`.
    pub fn for_source(value: &str, manual: Self) -> Self {
        let Some(source) = ImageRef::parse(value).and_then(|r| r.source()) else { return manual };
        match SOURCE_PRESETS.iter().find(|(needle, ..)| source.contains(needle)) {
            Some(&(_, axis, pct)) => {
                let mut settings = Self { axis, ..manual };
                *settings.position_mut() = pct;
                settings
            }
            None => manual,
        }
    }
}

/// Pixel column/row where the second half starts.
///
/// Always leaves at least one pixel on each side.
pub fn cut_at(extent: u32, pct: f32) -> u32 {
    let raw = (f64::from(extent) * f64::from(pct.clamp(0.0, 100.0)) / 100.0).floor() as u32;
    raw.clamp(1, extent.saturating_sub(1).max(1))
}

/// The two halves in reading order (left/top first).
pub fn split(img: &DynamicImage, settings: &SplitSettings) -> Result<(DynamicImage, DynamicImage)> {
    let (w, h) = (img.width(), img.height());
    match settings.axis {
        SplitAxis::Vertical => {
            if w < 2 || h == 0 {
                return Err(ShelfError::Validation("Image is too narrow to split".to_owned()));
            }
            let cut = cut_at(w, settings.vertical_pct);
            Ok((img.crop_imm(0, 0, cut, h), img.crop_imm(cut, 0, w - cut, h)))
        }
        SplitAxis::Horizontal => {
            if h < 2 || w == 0 {
                return Err(ShelfError::Validation("Image is too short to split".to_owned()));
            }
            let cut = cut_at(h, settings.horizontal_pct);
            Ok((img.crop_imm(0, 0, w, cut), img.crop_imm(0, cut, w, h - cut)))
        }
    }
}

/// Front and back as JPEG data URLs, ready for the form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitResult {
    pub front: String,
    pub back: String,
}

/// A loaded image being split interactively.
pub struct SplitSession {
    source: DynamicImage,
    preview: DynamicImage,
    pub settings: SplitSettings,
}

impl SplitSession {
    pub fn new(source: DynamicImage, settings: SplitSettings) -> Self {
        let preview = if source.width().max(source.height()) > PREVIEW_MAX {
            source.resize(PREVIEW_MAX, PREVIEW_MAX, FilterType::Triangle)
        } else {
            source.clone()
        };
        Self { source, preview, settings }
    }

    pub fn source_size(&self) -> (u32, u32) {
        (self.source.width(), self.source.height())
    }

    /// Reduced-resolution halves for the live preview, front first.
    pub fn preview_halves(&self) -> Result<(DynamicImage, DynamicImage)> {
        split(&self.preview, &self.settings).map(|halves| self.order(halves))
    }

    /// Splits the full-resolution image and encodes both halves.
    pub fn export(&self) -> Result<SplitResult> {
        let (front, back) = self.order(split(&self.source, &self.settings)?);
        log::info!(
            "split {}x{} image into {}x{} and {}x{}",
            self.source.width(),
            self.source.height(),
            front.width(),
            front.height(),
            back.width(),
            back.height()
        );
        Ok(SplitResult {
            front: images::encode_jpeg_data_url(&front)?,
            back: images::encode_jpeg_data_url(&back)?,
        })
    }

    fn order(&self, (first, second): (DynamicImage, DynamicImage)) -> (DynamicImage, DynamicImage) {
        if self.settings.swap { (second, first) } else { (first, second) }
    }
}

/// URLs to try for a stored image value, best first.
///
/// The full-size variant comes before the original; external images go
/// through the proxy. Data URLs need no request and yield nothing.
pub fn load_candidates(value: &str, config: &Config) -> Vec<String> {
    let Some(image_ref) = ImageRef::parse(value) else { return Vec::new() };
    let Some(original) = image_ref.resolve(&config.uploads_base) else { return Vec::new() };
    let mut urls = vec![images::strip_thumbnail_suffix(&original)];
    if !urls.contains(&original) {
        urls.push(original);
    }
    if image_ref.is_external() {
        urls = urls
            .into_iter()
            .map(|u| images::proxy_url(&config.api_base, &u))
            .collect();
    }
    urls
}

/// Loads the image behind a stored value, falling back once to the un-stripped URL.
pub fn load_source(backend: &dyn Backend, value: &str, config: &Config) -> Result<DynamicImage> {
    if let Some(ImageRef::DataUrl(data)) = ImageRef::parse(value) {
        return Ok(image::load_from_memory(&images::decode_data_url(data)?)?);
    }
    let mut last_err = ShelfError::Validation("No image to split".to_owned());
    for url in load_candidates(value, config) {
        match backend
            .fetch_image(&url)
            .and_then(|bytes| Ok(image::load_from_memory(&bytes)?))
        {
            Ok(img) => return Ok(img),
            Err(err) => {
                log::warn!("could not load {url} for splitting: {err}");
                last_err = err;
            }
        }
    }
    Err(last_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, MockBackend};
    use image::{Rgb, RgbImage};

    fn canvas(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, _| {
            if x < w / 2 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) }
        }))
    }

    #[test]
    fn vertical_halves_cover_the_width_exactly() {
        for (w, h) in [(2, 1), (3, 7), (640, 480), (1001, 333)] {
            let img = canvas(w, h);
            for pct in [0.0, 0.5, 12.5, 33.3, 50.0, 53.0, 99.9, 100.0] {
                let s = SplitSettings { vertical_pct: pct, ..Default::default() };
                let (a, b) = split(&img, &s).unwrap();
                assert_eq!(a.width() + b.width(), w, "w={w} pct={pct}");
                assert_eq!((a.height(), b.height()), (h, h));
                assert!(a.width() >= 1 && b.width() >= 1);
            }
        }
    }

    #[test]
    fn horizontal_halves_cover_the_height_exactly() {
        let img = canvas(300, 401);
        let s = SplitSettings { axis: SplitAxis::Horizontal, horizontal_pct: 25.0, ..Default::default() };
        let (top, bottom) = split(&img, &s).unwrap();
        assert_eq!((top.width(), top.height()), (300, 100));
        assert_eq!((bottom.width(), bottom.height()), (300, 301));
    }

    #[test]
    fn single_pixel_images_cannot_be_split() {
        assert!(split(&canvas(1, 10), &SplitSettings::default()).is_err());
    }

    #[test]
    fn source_heuristics() {
        let manual = SplitSettings { vertical_pct: 41.0, ..Default::default() };
        let cp = SplitSettings::for_source("https://www.thecoverproject.net/images/c.jpg", manual);
        assert_eq!((cp.axis, cp.vertical_pct), (SplitAxis::Vertical, 50.0));
        let pc = SplitSettings::for_source("https://storage.googleapis.com/images.pricecharting.com/x/1600.jpg", manual);
        assert_eq!(pc.vertical_pct, 53.0);
        let bucket = SplitSettings::for_source("https://storage.googleapis.com/other-bucket/pricecharting.jpg", manual);
        assert_eq!(bucket, manual);
        let pc = SplitSettings::for_source("https://images.pricecharting.com/x/1600.jpg", manual);
        assert_eq!(pc.vertical_pct, 53.0);
        assert_eq!(SplitSettings::for_source("cover_3.jpg", manual), manual);
        assert_eq!(SplitSettings::for_source("https://other.example/c.jpg", manual), manual);
    }

    #[test]
    fn swap_puts_the_second_half_first() {
        let session = SplitSession::new(
            canvas(100, 40),
            SplitSettings { swap: true, ..Default::default() },
        );
        let (front, _) = session.preview_halves().unwrap();
        assert_eq!(front.to_rgb8().get_pixel(0, 0), &Rgb([0, 0, 255]));
    }

    #[test]
    fn preview_is_reduced_but_export_is_full_size() {
        let session = SplitSession::new(canvas(1200, 600), SplitSettings::default());
        let (a, b) = session.preview_halves().unwrap();
        assert_eq!(a.width() + b.width(), PREVIEW_MAX);

        let result = session.export().unwrap();
        let front = image::load_from_memory(&images::decode_data_url(&result.front).unwrap()).unwrap();
        assert_eq!((front.width(), front.height()), (600, 600));
    }

    #[test]
    fn external_loads_try_full_size_then_original_through_proxy() {
        let cfg = Config::default();
        let urls = load_candidates("https://img.example/box_thumb.jpg", &cfg);
        assert_eq!(urls.len(), 2);
        assert!(urls[0].contains("box.jpg") && urls[0].contains("image_proxy.php"));
        assert!(urls[1].contains("box_thumb.jpg"));

        let backend = MockBackend::default();
        assert!(load_source(&backend, "https://img.example/box_thumb.jpg", &cfg).is_err());
        assert_eq!(
            backend.calls(),
            urls.iter().cloned().map(Call::FetchImage).collect::<Vec<_>>()
        );

        assert_eq!(load_candidates("box.jpg", &cfg), vec!["http://localhost/uploads/box.jpg"]);
    }

    #[test]
    fn falls_back_to_the_original_url() {
        let cfg = Config::default();
        let mut png = Vec::new();
        canvas(4, 2)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageOutputFormat::Png)
            .unwrap();
        let backend = MockBackend {
            images: vec![("http://localhost/uploads/box_thumb.png".to_owned(), png)],
            ..Default::default()
        };
        let img = load_source(&backend, "box_thumb.png", &cfg).unwrap();
        assert_eq!(img.width(), 4);
        assert_eq!(backend.calls().len(), 2);
    }
}
