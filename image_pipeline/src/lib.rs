use image::imageops::FilterType;
use serde::Deserialize;

pub mod render;
pub mod segment;

pub use image::RgbaImage;
pub use render::{encode_png, mask_data_url, mask_png, mask_to_rgba, PNG_DATA_URL_PREFIX};
pub use segment::ImageMask;

const MIN_DIMENSION: u32 = 3;
/// Upper bound for `blur_radius`, `dilate_size` and `feather_edge`.
pub const MAX_FILTER_RADIUS: u32 = 64;

#[derive(Debug, thiserror::Error)]
pub enum SegmentError {
    #[error("image load failed: {0}")]
    ImageLoad(String),
    #[error("segmentation failed: {0}")]
    Segmentation(String),
    #[error("mask encode failed: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SegmentConfig {
    pub threshold: f32,
    pub blur_radius: u32,
    pub dilate_size: u32,
    pub feather_edge: u32,
    /// Downscale the source so its longest side fits before analysis.
    pub max_dim: Option<u32>,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            blur_radius: 2,
            dilate_size: 2,
            feather_edge: 8,
            max_dim: None,
        }
    }
}

impl SegmentConfig {
    /// Lower threshold, keeps more of the subject.
    pub fn permissive() -> Self {
        Self {
            threshold: 0.15,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), SegmentError> {
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(SegmentError::Segmentation(format!(
                "threshold {} outside [0, 1]",
                self.threshold
            )));
        }
        for (name, value) in [
            ("blur_radius", self.blur_radius),
            ("dilate_size", self.dilate_size),
            ("feather_edge", self.feather_edge),
        ] {
            if value > MAX_FILTER_RADIUS {
                return Err(SegmentError::Segmentation(format!(
                    "{name} {value} exceeds {MAX_FILTER_RADIUS}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentStage {
    Analyze,
    Smooth,
    Dilate,
    Feather,
    Complement,
}

impl SegmentStage {
    pub fn label(self) -> &'static str {
        match self {
            SegmentStage::Analyze => "analyze",
            SegmentStage::Smooth => "smooth",
            SegmentStage::Dilate => "dilate",
            SegmentStage::Feather => "feather",
            SegmentStage::Complement => "complement",
        }
    }
}

/// Complementary soft masks; `character + background == 255` per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskPair {
    pub character: ImageMask,
    pub background: ImageMask,
}

impl MaskPair {
    pub fn dimensions(&self) -> (u32, u32) {
        (self.character.width(), self.character.height())
    }
}

pub struct Segmenter {
    config: SegmentConfig,
}

impl Segmenter {
    pub fn new(config: SegmentConfig) -> Result<Self, SegmentError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SegmentConfig {
        &self.config
    }

    pub fn process(&self, bytes: &[u8]) -> Result<MaskPair, SegmentError> {
        let rgba = decode_rgba(bytes)?;
        self.segment(&rgba)
    }

    pub fn segment(&self, image: &RgbaImage) -> Result<MaskPair, SegmentError> {
        self.segment_with_progress(image, |_| {})
    }

    pub fn segment_with_progress(
        &self,
        image: &RgbaImage,
        mut progress: impl FnMut(SegmentStage),
    ) -> Result<MaskPair, SegmentError> {
        let resized;
        let image = match resize_to_max_dim(image, self.config.max_dim) {
            Some(next) => {
                resized = next;
                &resized
            }
            None => image,
        };
        let (width, height) = image.dimensions();
        if width < MIN_DIMENSION || height < MIN_DIMENSION {
            return Err(SegmentError::Segmentation(format!(
                "image {width}x{height} is smaller than {MIN_DIMENSION}x{MIN_DIMENSION}"
            )));
        }

        progress(SegmentStage::Analyze);
        let mask = segment::analyze(image, self.config.threshold);
        progress(SegmentStage::Smooth);
        let mask = segment::gaussian_blur(&mask, self.config.blur_radius);
        progress(SegmentStage::Dilate);
        let mask = segment::dilate(&mask, self.config.dilate_size);
        progress(SegmentStage::Feather);
        let character = segment::feather(&mask, self.config.feather_edge);
        progress(SegmentStage::Complement);
        let background = segment::complement(&character);
        Ok(MaskPair {
            character,
            background,
        })
    }
}

pub fn segment(image: &RgbaImage, config: &SegmentConfig) -> Result<MaskPair, SegmentError> {
    Segmenter::new(*config)?.segment(image)
}

pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage, SegmentError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|err| SegmentError::ImageLoad(err.to_string()))?;
    Ok(decoded.to_rgba8())
}

/// Wraps raw canvas pixels (RGBA, row-major) without copying.
pub fn rgba_from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<RgbaImage, SegmentError> {
    RgbaImage::from_raw(width, height, data).ok_or_else(|| {
        SegmentError::ImageLoad(format!("pixel buffer does not match {width}x{height}"))
    })
}

fn resize_to_max_dim(image: &RgbaImage, max_dim: Option<u32>) -> Option<RgbaImage> {
    let max_dim = max_dim.filter(|dim| *dim > 0)?;
    let (width, height) = image.dimensions();
    let max_axis = width.max(height);
    if max_axis <= max_dim {
        return None;
    }
    let scale = max_dim as f32 / max_axis as f32;
    let next_width = ((width as f32) * scale).round().max(1.0) as u32;
    let next_height = ((height as f32) * scale).round().max(1.0) as u32;
    Some(image::imageops::resize(
        image,
        next_width,
        next_height,
        FilterType::Triangle,
    ))
}
