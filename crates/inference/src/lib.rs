pub mod backend;
pub mod classifier;
pub mod config;
pub mod errors;
pub mod labels;

// Re-export commonly used types for convenience
pub use backend::{ExecutionProvider, InferenceBackend, InferenceOutput};
pub use classifier::{CustomModelClassifier, DEFAULT_CONFIDENCE_THRESHOLD, ModelVerdict, select_top};
pub use config::ModelConfig;
pub use errors::ModelLoadError;
pub use labels::LabelTable;

#[cfg(feature = "ort-backend")]
pub use backend::ort::OrtBackend;
