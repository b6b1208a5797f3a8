//! Region cropper.
//!
//! Expands a detection's bounding box by a padding ratio, clamps it into
//! frame bounds, and extracts the sub-image that is handed to the breed
//! classifier. A degenerate region is signalled with `None`; the caller
//! skips that detection and carries on with the frame.

use crate::detect::BoundingBox;
use crate::frame::{ChannelOrder, Frame};

pub const DEFAULT_PADDING_RATIO: f32 = 0.15;

/// A pixel buffer extracted from a frame. Discarded after classification.
#[derive(Clone)]
pub struct CroppedRegion {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub order: ChannelOrder,
}

/// Crop a padded bounding box out of a frame.
///
/// Padding is `min(width, height) * padding_ratio`, added symmetrically on
/// all sides before clamping. Returns `None` when the clamped box has
/// non-positive width or height.
pub fn crop(frame: &Frame, bbox: &BoundingBox, padding_ratio: f32) -> Option<CroppedRegion> {
    let pad = (bbox.width.min(bbox.height) as f32 * padding_ratio).round() as i32;

    let x0 = (bbox.x - pad).max(0);
    let y0 = (bbox.y - pad).max(0);
    let x1 = (bbox.x + bbox.width + pad).min(frame.width() as i32);
    let y1 = (bbox.y + bbox.height + pad).min(frame.height() as i32);

    let width = x1 - x0;
    let height = y1 - y0;
    if width <= 0 || height <= 0 {
        return None;
    }

    let (x0, y0, width, height) = (x0 as u32, y0 as u32, width as u32, height as u32);
    let src = frame.pixels();
    let row_bytes = width as usize * 3;
    let frame_stride = frame.width() as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in y0..y0 + height {
        let start = row as usize * frame_stride + x0 as usize * 3;
        pixels.extend_from_slice(&src[start..start + row_bytes]);
    }
    if pixels.is_empty() {
        return None;
    }

    Some(CroppedRegion {
        pixels,
        width,
        height,
        order: frame.order(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(width: u32, height: u32) -> Frame {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 0]);
            }
        }
        Frame::new(pixels, width, height, 0).unwrap()
    }

    #[test]
    fn pads_and_extracts_interior_box() {
        let frame = gradient_frame(100, 100);
        let bbox = BoundingBox {
            x: 40,
            y: 40,
            width: 20,
            height: 20,
        };
        // pad = round(20 * 0.15) = 3, so the region spans 37..63 both axes.
        let region = crop(&frame, &bbox, DEFAULT_PADDING_RATIO).unwrap();
        assert_eq!(region.width, 26);
        assert_eq!(region.height, 26);
        // First pixel of the region is frame pixel (37, 37).
        assert_eq!(&region.pixels[..3], &[37, 37, 0]);
    }

    #[test]
    fn clamps_padded_extent_to_frame_bounds() {
        let frame = gradient_frame(50, 40);
        let bbox = BoundingBox {
            x: -10,
            y: 30,
            width: 100,
            height: 100,
        };
        // pad = round(100 * 0.15) = 15; the padded extent exceeds the frame
        // on every side and must clamp to 0 <= x, y, x+width <= 50,
        // y+height <= 40.
        let region = crop(&frame, &bbox, DEFAULT_PADDING_RATIO).unwrap();
        assert_eq!(region.width, 50);
        assert_eq!(region.height, 25);
        assert_eq!(&region.pixels[..3], &[0, 15, 0]);
    }

    #[test]
    fn degenerate_box_is_unusable() {
        let frame = gradient_frame(50, 50);
        let off_frame = BoundingBox {
            x: 60,
            y: 60,
            width: 10,
            height: 10,
        };
        assert!(crop(&frame, &off_frame, DEFAULT_PADDING_RATIO).is_none());

        let zero = BoundingBox {
            x: 10,
            y: 10,
            width: 0,
            height: 0,
        };
        assert!(crop(&frame, &zero, 0.0).is_none());
    }
}
