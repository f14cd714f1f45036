use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

use crate::segment::ImageMask;
use crate::SegmentError;

pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// White pixels whose alpha carries the mask, for use as a CSS `mask-image`.
pub fn mask_to_rgba(mask: &ImageMask) -> RgbaImage {
    let mut out = Vec::with_capacity(mask.as_bytes().len() * 4);
    for alpha in mask.as_bytes() {
        out.extend_from_slice(&[255, 255, 255, *alpha]);
    }
    RgbaImage::from_raw(mask.width(), mask.height(), out)
        .unwrap_or_else(|| RgbaImage::new(mask.width(), mask.height()))
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, SegmentError> {
    let (width, height) = image.dimensions();
    let mut bytes = Vec::new();
    PngEncoder::new(Cursor::new(&mut bytes))
        .write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8)
        .map_err(|err| SegmentError::Encode(err.to_string()))?;
    Ok(bytes)
}

pub fn mask_png(mask: &ImageMask) -> Result<Vec<u8>, SegmentError> {
    encode_png(&mask_to_rgba(mask))
}

pub fn mask_data_url(mask: &ImageMask) -> Result<String, SegmentError> {
    let png = mask_png(mask)?;
    Ok(format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(png)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_mask() -> ImageMask {
        let data = (0..48u32).map(|i| (i * 5) as u8).collect();
        ImageMask::from_raw(8, 6, data).expect("mask")
    }

    #[test]
    fn rgba_is_white_with_mask_alpha() {
        let mask = gradient_mask();
        let rgba = mask_to_rgba(&mask);
        assert_eq!(rgba.dimensions(), (8, 6));
        for (pixel, alpha) in rgba.pixels().zip(mask.as_bytes()) {
            assert_eq!(pixel.0, [255, 255, 255, *alpha]);
        }
    }

    #[test]
    fn png_keeps_alpha_exactly() {
        let mask = gradient_mask();
        let png = mask_png(&mask).expect("encode");
        let decoded = image::load_from_memory(&png).expect("decode").to_rgba8();
        assert_eq!(decoded.dimensions(), (8, 6));
        let alphas: Vec<u8> = decoded.pixels().map(|pixel| pixel.0[3]).collect();
        assert_eq!(alphas, mask.as_bytes());
    }

    #[test]
    fn data_url_carries_png_payload() {
        let mask = gradient_mask();
        let url = mask_data_url(&mask).expect("url");
        let payload = url.strip_prefix(PNG_DATA_URL_PREFIX).expect("prefix");
        let png = STANDARD.decode(payload).expect("base64");
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
