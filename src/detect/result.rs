/// Raw backend output: class index plus a box in normalized [0,1] coordinates
/// of the model input. The subject adapter resolves the class label and scales
/// the box back onto the source frame.
#[derive(Clone, Debug)]
pub struct RawDetection {
    pub class_id: usize,
    pub confidence: f32,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// A detected subject in pixel coordinates of the source frame.
#[derive(Clone, Debug)]
pub struct Detection {
    pub class_label: String,
    /// Confidence in [0,1].
    pub confidence: f32,
    pub bounding_box: BoundingBox,
}

/// Axis-aligned box in pixel coordinates. Signed so that padding arithmetic
/// may go out of bounds before the cropper clamps it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}
