//! In-memory video frames.
//!
//! A `Frame` is an interleaved HxWx3 pixel buffer tagged with its ordinal
//! index in the sampled sequence. Channel order is tracked explicitly because
//! the subject detector and the breed classifier were trained on opposite
//! conventions; conversions happen at the model boundary, never implicitly.
//!
//! Frames are ephemeral: the orchestrator owns one for the duration of a
//! single iteration, and only the representative-frame selector keeps a deep
//! copy beyond that.

use std::borrow::Cow;

use anyhow::{anyhow, Result};
use sha2::{Digest, Sha256};

/// Interleaved channel order of a pixel buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

#[derive(Clone)]
pub struct Frame {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    order: ChannelOrder,
    /// Ordinal index in the sampled sequence (not the source frame number).
    pub index: u64,
}

impl Frame {
    /// Create a frame from an interleaved RGB buffer.
    /// Called by the ingestion layer and by tests.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, index: u64) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "expected {} interleaved bytes for {}x{} frame, received {}",
                expected,
                width,
                height,
                pixels.len()
            ));
        }
        Ok(Self {
            pixels,
            width,
            height,
            order: ChannelOrder::Rgb,
            index,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    /// Raw pixel bytes in the frame's native order.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixel bytes in the requested channel order.
    ///
    /// Borrows when the frame is already in that order; otherwise swaps the
    /// first and third channel of every pixel into a fresh buffer.
    pub fn pixels_in(&self, order: ChannelOrder) -> Cow<'_, [u8]> {
        if order == self.order {
            return Cow::Borrowed(&self.pixels);
        }
        let mut swapped = self.pixels.clone();
        for px in swapped.chunks_exact_mut(3) {
            px.swap(0, 2);
        }
        Cow::Owned(swapped)
    }

    /// Content digest, logged when the representative-frame selector stores
    /// a frame so re-runs can be compared from their logs alone.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(&self.pixels);
        hasher.finalize().into()
    }

    /// View the frame as an `RgbImage` for resizing and PNG encoding.
    pub fn to_rgb_image(&self) -> Result<image::RgbImage> {
        let bytes = self.pixels_in(ChannelOrder::Rgb).into_owned();
        image::RgbImage::from_raw(self.width, self.height, bytes)
            .ok_or_else(|| anyhow!("frame buffer does not match its dimensions"))
    }
}
