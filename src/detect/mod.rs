//! Subject detection.
//!
//! Detection is split into pluggable backends (the code that runs a model on
//! pixels) and the subject adapter (the code that knows which classes count
//! as a dog-like subject and maps raw model output onto frame coordinates).

pub mod backend;
pub mod backends;
pub mod registry;
pub mod result;
pub mod subject;

pub use backend::DetectorBackend;
pub use registry::BackendRegistry;
pub use result::{BoundingBox, Detection, RawDetection};
pub use subject::{DetectorArtifacts, SubjectDetector};
