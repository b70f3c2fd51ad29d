use crate::onnx::{LabelerOptions, ScoreActivation};
use common::{env_opt, env_or};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct LabelerConfig {
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub max_results: Option<usize>,
    pub activation: ScoreActivation,
}

impl LabelerConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Self {
        let model_path = env_opt("LABELER_MODEL_PATH")
            .unwrap_or_else(|| "models/labeler.onnx".to_string())
            .into();

        let labels_path = env_opt("LABELER_LABELS_PATH")
            .unwrap_or_else(|| "models/labeler_labels.txt".to_string())
            .into();

        let input_size = env_or("LABELER_INPUT_SIZE", 224);

        let confidence_threshold = env_or("LABELER_CONFIDENCE", 0.5);

        // 0 means unlimited
        let max_results = Some(env_or("LABELER_MAX_RESULTS", 0usize)).filter(|&n| n > 0);

        let activation = env_or("LABELER_ACTIVATION", ScoreActivation::Softmax);

        Self {
            model_path,
            labels_path,
            input_size,
            confidence_threshold,
            max_results,
            activation,
        }
    }

    pub fn options(&self) -> LabelerOptions {
        LabelerOptions {
            confidence_threshold: self.confidence_threshold,
            max_results: self.max_results,
            activation: self.activation,
        }
    }

    /// Create default configuration for testing
    pub fn test_default() -> Self {
        Self {
            model_path: "/models/labeler.onnx".into(),
            labels_path: "/models/labeler_labels.txt".into(),
            input_size: 224,
            confidence_threshold: 0.5,
            max_results: None,
            activation: ScoreActivation::Softmax,
        }
    }
}
