//! Classifier input preprocessing.
//!
//! The breed model was trained on 224x224 crops taken from images resized so
//! their shortest side is 256, normalized with the standard ImageNet mean and
//! deviation. The same pipeline is reproduced here on cropped regions.

use anyhow::{anyhow, Result};
use image::imageops::{crop_imm, resize, FilterType};

use crate::crop::CroppedRegion;
use crate::frame::ChannelOrder;

pub const RESIZE_SHORTEST_SIDE: u32 = 256;
pub const CROP_SIZE: u32 = 224;
pub const INPUT_LEN: usize = 3 * CROP_SIZE as usize * CROP_SIZE as usize;

const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Turn a cropped region into a normalized CHW tensor.
pub fn preprocess(region: &CroppedRegion) -> Result<Vec<f32>> {
    let mut pixels = region.pixels.clone();
    if region.order == ChannelOrder::Bgr {
        for px in pixels.chunks_exact_mut(3) {
            px.swap(0, 2);
        }
    }
    let img = image::RgbImage::from_raw(region.width, region.height, pixels)
        .ok_or_else(|| anyhow!("region buffer does not match its dimensions"))?;

    // Shortest-side-preserving resize, then center crop.
    let (w, h) = (region.width, region.height);
    let (new_w, new_h) = if w <= h {
        let scaled = (h as u64 * RESIZE_SHORTEST_SIDE as u64 / w.max(1) as u64) as u32;
        (RESIZE_SHORTEST_SIDE, scaled.max(RESIZE_SHORTEST_SIDE))
    } else {
        let scaled = (w as u64 * RESIZE_SHORTEST_SIDE as u64 / h.max(1) as u64) as u32;
        (scaled.max(RESIZE_SHORTEST_SIDE), RESIZE_SHORTEST_SIDE)
    };
    let resized = resize(&img, new_w, new_h, FilterType::Triangle);
    let cropped = crop_imm(
        &resized,
        (new_w - CROP_SIZE) / 2,
        (new_h - CROP_SIZE) / 2,
        CROP_SIZE,
        CROP_SIZE,
    )
    .to_image();

    let side = CROP_SIZE as usize;
    let mut out = vec![0.0f32; INPUT_LEN];
    for (x, y, px) in cropped.enumerate_pixels() {
        for c in 0..3 {
            let value = px.0[c] as f32 / 255.0;
            out[c * side * side + y as usize * side + x as usize] = (value - MEAN[c]) / STD[c];
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(width: u32, height: u32, fill: u8) -> CroppedRegion {
        CroppedRegion {
            pixels: vec![fill; (width * height * 3) as usize],
            width,
            height,
            order: ChannelOrder::Rgb,
        }
    }

    #[test]
    fn output_has_fixed_shape() {
        let out = preprocess(&region(100, 60, 128)).unwrap();
        assert_eq!(out.len(), INPUT_LEN);
    }

    #[test]
    fn uniform_region_normalizes_per_channel() {
        // 255 everywhere: channel c becomes (1.0 - mean[c]) / std[c].
        let out = preprocess(&region(300, 300, 255)).unwrap();
        let side = CROP_SIZE as usize;
        for c in 0..3 {
            let expected = (1.0 - MEAN[c]) / STD[c];
            let got = out[c * side * side];
            assert!((got - expected).abs() < 1e-5, "channel {c}: {got} vs {expected}");
        }
    }

    #[test]
    fn tiny_region_still_produces_full_tensor() {
        let out = preprocess(&region(3, 7, 10)).unwrap();
        assert_eq!(out.len(), INPUT_LEN);
    }
}
