//! Character/background separation on a single RGBA image.
//!
//! Every stage maps an [`ImageMask`] to a new one of the same size; values
//! are rounded back to bytes between stages so the output only depends on
//! the input pixels and the configuration.

use image::RgbaImage;

type Kernel3 = [[f32; 3]; 3];

const SOBEL_KERNEL_X: Kernel3 = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_KERNEL_Y: Kernel3 = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

const LUMINANCE_WEIGHT: f32 = 0.3;
const EDGE_WEIGHT: f32 = 0.4;
const POSITION_WEIGHT: f32 = 0.3;
const BIAS_CENTER_Y_RATIO: f32 = 0.4;
const SOFT_THRESHOLD_GAIN: f32 = 3.0 * 255.0;

/// One byte of soft membership per pixel, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ImageMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        (data.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.data.iter().map(|value| *value as u64).sum();
        sum as f64 / self.data.len() as f64
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width as usize + x
    }
}

fn to_byte(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Scores every interior pixel by brightness, edge strength and closeness to
/// a point at the horizontal centre, 40% down the image. Border pixels stay 0.
pub fn analyze(image: &RgbaImage, threshold: f32) -> ImageMask {
    let (width, height) = image.dimensions();
    let mut mask = ImageMask::new(width, height);
    if width < 3 || height < 3 {
        return mask;
    }
    let w = width as usize;
    let h = height as usize;
    let raw = image.as_raw();
    let gray: Vec<f32> = raw
        .chunks_exact(4)
        .map(|px| (px[0] as f32 + px[1] as f32 + px[2] as f32) / 3.0)
        .collect();

    let center_x = width as f32 / 2.0;
    let center_y = height as f32 * BIAS_CENTER_Y_RATIO;
    let max_distance = (center_x * center_x + center_y * center_y).sqrt();

    for y in 1..h - 1 {
        let rows = [
            &gray[(y - 1) * w..y * w],
            &gray[y * w..(y + 1) * w],
            &gray[(y + 1) * w..(y + 2) * w],
        ];
        for x in 1..w - 1 {
            let px = &raw[(y * w + x) * 4..(y * w + x) * 4 + 4];
            let luminance =
                (0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32) / 255.0;

            let mut gx = 0.0;
            let mut gy = 0.0;
            for (ky, row) in rows.iter().enumerate() {
                for kx in 0..3 {
                    let sample = row[x + kx - 1];
                    gx += sample * SOBEL_KERNEL_X[ky][kx];
                    gy += sample * SOBEL_KERNEL_Y[ky][kx];
                }
            }
            let edge = ((gx * gx + gy * gy).sqrt() / 255.0).min(1.0);

            let dx = x as f32 - center_x;
            let dy = y as f32 - center_y;
            let distance = (dx * dx + dy * dy).sqrt();
            let position_bias = (1.0 - distance / max_distance).max(0.0);

            let probability = luminance * LUMINANCE_WEIGHT
                + edge * EDGE_WEIGHT
                + position_bias * POSITION_WEIGHT;
            let index = mask.index(x, y);
            mask.data[index] = to_byte((probability - threshold) * SOFT_THRESHOLD_GAIN);
        }
    }
    mask
}

fn gaussian_kernel(radius: u32) -> Vec<f32> {
    let sigma = radius as f32 / 3.0;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let r = i64::from(radius);
    let weights: Vec<f32> = (-r..=r)
        .map(|offset| {
            let offset = offset as f32;
            (-(offset * offset) / two_sigma_sq).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    weights.into_iter().map(|weight| weight / sum).collect()
}

/// Separable Gaussian blur with σ = radius / 3 and clamped edges.
pub fn gaussian_blur(mask: &ImageMask, radius: u32) -> ImageMask {
    if radius == 0 || mask.data.is_empty() {
        return mask.clone();
    }
    let kernel = gaussian_kernel(radius);
    let horizontal = convolve_axis(mask, &kernel, Axis::Horizontal);
    convolve_axis(&horizontal, &kernel, Axis::Vertical)
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

fn convolve_axis(mask: &ImageMask, kernel: &[f32], axis: Axis) -> ImageMask {
    let w = mask.width as usize;
    let h = mask.height as usize;
    let half = (kernel.len() / 2) as isize;
    let mut out = ImageMask::new(mask.width, mask.height);
    for y in 0..h {
        for x in 0..w {
            let mut sum = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let offset = k as isize - half;
                let (sx, sy) = match axis {
                    Axis::Horizontal => ((x as isize + offset).clamp(0, w as isize - 1) as usize, y),
                    Axis::Vertical => (x, (y as isize + offset).clamp(0, h as isize - 1) as usize),
                };
                sum += mask.data[sy * w + sx] as f32 * weight;
            }
            out.data[y * w + x] = to_byte(sum);
        }
    }
    out
}

/// Maximum over the `(2·size+1)²` neighbourhood, clamped at the edges.
pub fn dilate(mask: &ImageMask, size: u32) -> ImageMask {
    if size == 0 || mask.data.is_empty() {
        return mask.clone();
    }
    let horizontal = max_axis(mask, size as isize, Axis::Horizontal);
    max_axis(&horizontal, size as isize, Axis::Vertical)
}

fn max_axis(mask: &ImageMask, size: isize, axis: Axis) -> ImageMask {
    let w = mask.width as isize;
    let h = mask.height as isize;
    let mut out = ImageMask::new(mask.width, mask.height);
    for y in 0..h {
        for x in 0..w {
            let mut max_value = 0u8;
            for offset in -size..=size {
                let (sx, sy) = match axis {
                    Axis::Horizontal => ((x + offset).clamp(0, w - 1), y),
                    Axis::Vertical => (x, (y + offset).clamp(0, h - 1)),
                };
                max_value = max_value.max(mask.data[(sy * w + sx) as usize]);
            }
            out.data[(y * w + x) as usize] = max_value;
        }
    }
    out
}

/// Distance-weighted average over a disc of radius `edge`, weight falling
/// linearly from 1 at the centre to 0 at the rim. Samples outside the image
/// are skipped and the weights renormalized.
pub fn feather(mask: &ImageMask, edge: u32) -> ImageMask {
    if edge == 0 || mask.data.is_empty() {
        return mask.clone();
    }
    let radius = edge as f32;
    let r = edge as isize;
    let mut window = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            let distance = ((dx * dx + dy * dy) as f32).sqrt();
            if distance <= radius {
                window.push((dx, dy, 1.0 - distance / radius));
            }
        }
    }

    let w = mask.width as isize;
    let h = mask.height as isize;
    let mut out = ImageMask::new(mask.width, mask.height);
    for y in 0..h {
        for x in 0..w {
            let mut sum = 0.0f32;
            let mut weight_sum = 0.0f32;
            for &(dx, dy, weight) in &window {
                let nx = x + dx;
                let ny = y + dy;
                if nx < 0 || nx >= w || ny < 0 || ny >= h {
                    continue;
                }
                sum += mask.data[(ny * w + nx) as usize] as f32 * weight;
                weight_sum += weight;
            }
            let index = (y * w + x) as usize;
            out.data[index] = if weight_sum > 0.0 {
                to_byte(sum / weight_sum)
            } else {
                mask.data[index]
            };
        }
    }
    out
}

pub fn complement(mask: &ImageMask) -> ImageMask {
    ImageMask {
        width: mask.width,
        height: mask.height,
        data: mask.data.iter().map(|value| 255 - value).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise_mask(width: u32, height: u32, seed: u32) -> ImageMask {
        let mut state = seed;
        let data = (0..width * height)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 24) as u8
            })
            .collect();
        ImageMask::from_raw(width, height, data).expect("mask")
    }

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let kernel = gaussian_kernel(3);
        assert_eq!(kernel.len(), 7);
        let sum: f32 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!((kernel[0] - kernel[6]).abs() < 1e-7);
        assert!(kernel[3] > kernel[2]);
    }

    #[test]
    fn wide_kernels_do_not_overflow() {
        let kernel = gaussian_kernel(50_000);
        assert_eq!(kernel.len(), 100_001);
        assert!(kernel.iter().all(|weight| weight.is_finite()));
        assert!(kernel[50_000] >= kernel[0]);
    }

    #[test]
    fn blur_keeps_flat_masks_flat() {
        let flat = ImageMask::from_raw(9, 7, vec![200; 63]).expect("mask");
        assert_eq!(gaussian_blur(&flat, 4), flat);
        assert_eq!(feather(&flat, 3), flat);
    }

    #[test]
    fn dilation_never_darkens() {
        let mask = noise_mask(33, 21, 7);
        for size in [1, 2, 5] {
            let dilated = dilate(&mask, size);
            for (after, before) in dilated.as_bytes().iter().zip(mask.as_bytes()) {
                assert!(after >= before);
            }
        }
    }

    #[test]
    fn dilation_spreads_a_single_peak_into_a_square() {
        let mut mask = ImageMask::new(9, 9);
        let center = mask.index(4, 4);
        mask.data[center] = 180;
        let dilated = dilate(&mask, 2);
        for y in 0..9 {
            for x in 0..9 {
                let inside = (2..=6).contains(&x) && (2..=6).contains(&y);
                assert_eq!(dilated.get(x, y), if inside { 180 } else { 0 });
            }
        }
    }

    #[test]
    fn feathering_preserves_average_energy() {
        let noise = noise_mask(64, 48, 42);
        let feathered = feather(&noise, 6);
        assert!((noise.mean() - feathered.mean()).abs() < 2.0);

        let ramp: Vec<u8> = (0..48)
            .flat_map(|_| (0..64u32).map(|x| (x * 4) as u8))
            .collect();
        let ramp = ImageMask::from_raw(64, 48, ramp).expect("mask");
        let feathered = feather(&ramp, 8);
        assert!((ramp.mean() - feathered.mean()).abs() < 1.0);
    }

    #[test]
    fn complement_sums_to_full_scale() {
        let mask = noise_mask(10, 10, 3);
        let inverse = complement(&mask);
        for (a, b) in mask.as_bytes().iter().zip(inverse.as_bytes()) {
            assert_eq!(*a as u16 + *b as u16, 255);
        }
    }

    #[test]
    fn analyze_leaves_border_dark() {
        let image = RgbaImage::from_pixel(12, 10, image::Rgba([255, 255, 255, 255]));
        let mask = analyze(&image, 0.0);
        for x in 0..12 {
            assert_eq!(mask.get(x, 0), 0);
            assert_eq!(mask.get(x, 9), 0);
        }
        for y in 0..10 {
            assert_eq!(mask.get(0, y), 0);
            assert_eq!(mask.get(11, y), 0);
        }
        assert!(mask.get(6, 4) > 0);
    }

    #[test]
    fn strong_edges_raise_probability() {
        let mut image = RgbaImage::from_pixel(20, 20, image::Rgba([0, 0, 0, 255]));
        for y in 0..20 {
            for x in 10..20 {
                image.put_pixel(x, y, image::Rgba([255, 255, 255, 255]));
            }
        }
        let mask = analyze(&image, 0.3);
        // Same darkness and similar bias, but one pixel sits on the boundary.
        assert!(mask.get(9, 8) > mask.get(5, 8));
    }
}
