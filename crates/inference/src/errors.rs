use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Startup failure of a model artifact (network weights or label table).
#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("Model artifact not found: {}", .0.display())]
    MissingArtifact(PathBuf),

    #[error("Failed to read label table {}: {source}", path.display())]
    LabelsUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Label table {} contains no labels", .0.display())]
    EmptyLabelTable(PathBuf),

    #[error("Failed to load network: {0}")]
    Backend(String),
}
