pub mod classifier;
pub mod config;
pub mod errors;
pub mod labeler;
pub mod onnx;

pub use classifier::GeneralLabelClassifier;
pub use config::LabelerConfig;
pub use errors::LabelingError;
pub use labeler::{ImageLabel, ImageLabeler};
pub use onnx::{LabelerOptions, OnnxImageLabeler, ScoreActivation, rank_labels};
