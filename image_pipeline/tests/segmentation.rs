use holocard_image_pipeline::{
    decode_rgba, encode_png, mask_data_url, segment, SegmentConfig, Segmenter,
};
use image::{Rgba, RgbaImage};

fn white_card() -> RgbaImage {
    RgbaImage::from_pixel(60, 80, Rgba([255, 255, 255, 255]))
}

fn bright_disk(width: u32, height: u32) -> RgbaImage {
    let cx = width as f32 / 2.0;
    let cy = height as f32 * 0.4;
    let radius = width.min(height) as f32 / 4.0;
    RgbaImage::from_fn(width, height, |x, y| {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        if (dx * dx + dy * dy).sqrt() <= radius {
            Rgba([240, 220, 200, 255])
        } else {
            Rgba([20, 30, 40, 255])
        }
    })
}

#[test]
fn white_image_peaks_at_upper_center() {
    let image = white_card();
    let masks = segment(&image, &SegmentConfig::default()).expect("segment");
    let character = &masks.character;
    assert_eq!(masks.dimensions(), (60, 80));

    let row = 32;
    let center = character.get(30, row);
    let quarter = character.get(15, row);
    let edge = character.get(0, row);
    assert!(center > 150, "center {center}");
    assert!(character.get(0, 0) < 60, "corner {}", character.get(0, 0));
    assert!(center > quarter, "{center} vs {quarter}");
    assert!(quarter > edge, "{quarter} vs {edge}");
}

#[test]
fn masks_are_complementary() {
    let image = bright_disk(48, 64);
    let masks = segment(&image, &SegmentConfig::default()).expect("segment");
    assert_eq!(masks.character.as_bytes().len(), 48 * 64);
    for (character, background) in masks
        .character
        .as_bytes()
        .iter()
        .zip(masks.background.as_bytes())
    {
        assert_eq!(*character as u16 + *background as u16, 255);
    }
}

#[test]
fn segmentation_is_deterministic() {
    let image = bright_disk(40, 56);
    let segmenter = Segmenter::new(SegmentConfig::default()).expect("config");
    let first = segmenter.segment(&image).expect("segment");
    let second = segmenter.segment(&image).expect("segment");
    assert_eq!(first, second);
    assert_eq!(
        mask_data_url(&first.character).expect("url"),
        mask_data_url(&second.character).expect("url")
    );
}

#[test]
fn bright_subject_outweighs_dark_surroundings() {
    let image = bright_disk(64, 80);
    let masks = segment(&image, &SegmentConfig::default()).expect("segment");
    let subject = masks.character.get(32, 32);
    let corner = masks.character.get(2, 77);
    assert!(subject > corner, "{subject} vs {corner}");
    assert!(masks.background.get(2, 77) > masks.background.get(32, 32));
}

#[test]
fn permissive_preset_keeps_at_least_as_much() {
    let image = bright_disk(40, 50);
    let balanced = segment(&image, &SegmentConfig::default()).expect("segment");
    let permissive = segment(&image, &SegmentConfig::permissive()).expect("segment");
    for (loose, strict) in permissive
        .character
        .as_bytes()
        .iter()
        .zip(balanced.character.as_bytes())
    {
        assert!(loose >= strict);
    }
    assert!(permissive.character.mean() > balanced.character.mean());
}

#[test]
fn encoded_bytes_segment_like_pixels() {
    let image = bright_disk(32, 40);
    let png = encode_png(&image).expect("encode");
    assert_eq!(decode_rgba(&png).expect("decode"), image);

    let segmenter = Segmenter::new(SegmentConfig::default()).expect("config");
    let from_bytes = segmenter.process(&png).expect("process");
    let from_pixels = segmenter.segment(&image).expect("segment");
    assert_eq!(from_bytes, from_pixels);
}
