use crate::backend::ExecutionProvider;
use crate::classifier::DEFAULT_CONFIDENCE_THRESHOLD;
use common::{env_opt, env_or};
use std::path::PathBuf;

/// Where the custom model's artifacts live and how its output is gated.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub execution_provider: ExecutionProvider,
}

impl ModelConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Self {
        let model_path = env_opt("MODEL_PATH")
            .unwrap_or_else(|| "models/flower_model.onnx".to_string())
            .into();

        let labels_path = env_opt("LABELS_PATH")
            .unwrap_or_else(|| "models/labels.txt".to_string())
            .into();

        let input_size = env_or("INPUT_SIZE", 224);

        let confidence_threshold = env_or("CONFIDENCE_THRESHOLD", DEFAULT_CONFIDENCE_THRESHOLD);

        let execution_provider = env_or("EXECUTION_PROVIDER", ExecutionProvider::Cpu);

        Self {
            model_path,
            labels_path,
            input_size,
            confidence_threshold,
            execution_provider,
        }
    }

    /// Create default configuration for testing
    pub fn test_default() -> Self {
        Self {
            model_path: "/models/flower_model.onnx".into(),
            labels_path: "/models/labels.txt".into(),
            input_size: 224,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            execution_provider: ExecutionProvider::Cpu,
        }
    }
}
