use preprocess::PreprocessError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelingError {
    #[error("Labeler unavailable: {0}")]
    Unavailable(String),

    #[error("Cannot label an empty image")]
    EmptyInput,

    #[error("Failed to build labeler input: {0}")]
    Encoding(#[from] PreprocessError),

    #[error("Labeling inference failed: {0}")]
    Inference(String),

    #[error("Labeling task failed: {0}")]
    Task(String),
}
