use anyhow::Result;

use crate::detect::result::RawDetection;
use crate::frame::ChannelOrder;

/// Detector backend trait.
///
/// A backend runs one object-detection model on a pre-resized pixel buffer
/// and returns raw detections. Backends differ only in where the computation
/// executes; two backends fed the same pixels must produce the same boxes.
/// Preprocessing constants (scale, mean, channel order) live inside the
/// backend because they are properties of how the model was trained.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// True when this backend runs on an accelerated execution target.
    /// The registry prefers accelerated backends and falls back transparently.
    fn accelerated(&self) -> bool {
        false
    }

    /// Side length of the square model input the backend expects.
    fn input_size(&self) -> u32;

    /// Channel order the pixel buffer must arrive in.
    fn expected_order(&self) -> ChannelOrder {
        ChannelOrder::Rgb
    }

    /// Run detection on an `input_size` x `input_size` buffer.
    ///
    /// Implementations must treat the pixel slice as read-only and ephemeral.
    /// Returning an empty vec means nothing was found; it is not an error.
    fn detect(&mut self, pixels: &[u8], threshold: f32) -> Result<Vec<RawDetection>>;
}
