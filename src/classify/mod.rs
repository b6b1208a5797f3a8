//! Breed classification.
//!
//! Mirrors the detection split: a backend trait for running the model on a
//! normalized tensor, and the breed adapter that owns preprocessing, softmax,
//! top-k selection, and the below-threshold sentinel.

pub mod backend;
pub mod breed;
pub mod labels;
pub mod preprocess;

pub use backend::ClassifierBackend;
pub use breed::{BreedClassifier, BreedGuess, ClassifierArtifacts, UNDETERMINED};
pub use labels::LabelEncoder;
