use ndarray::{Array, ArrayD, IxDyn};
use std::path::Path;
use std::str::FromStr;

#[cfg(feature = "ort-backend")]
pub mod ort;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionProvider {
    #[default]
    Cpu,
    Cuda,
}

impl FromStr for ExecutionProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu" => Ok(Self::Cuda),
            other => Err(format!(
                "{} is not a supported execution provider. Use either `cpu` or `cuda`.",
                other
            )),
        }
    }
}

/// A loaded network that maps one input tensor to one score tensor.
pub trait InferenceBackend {
    fn load_model(path: &Path) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Run inference on a single `[1, H, W, 3]` input
    fn infer(&mut self, input: &Array<f32, IxDyn>) -> anyhow::Result<InferenceOutput>;
}

pub struct InferenceOutput {
    pub scores: ArrayD<f32>, // [1, num_classes] raw scores
}

impl InferenceOutput {
    /// Scores of the single batch item, in class-index order.
    pub fn class_scores(&self) -> Vec<f32> {
        self.scores.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_provider_parsing() {
        assert_eq!("cpu".parse(), Ok(ExecutionProvider::Cpu));
        assert_eq!(" CUDA ".parse(), Ok(ExecutionProvider::Cuda));
        assert_eq!("gpu".parse(), Ok(ExecutionProvider::Cuda));
        assert!("tpu".parse::<ExecutionProvider>().is_err());
    }

    #[test]
    fn test_class_scores_flattens_batch() {
        let output = InferenceOutput {
            scores: Array::from_shape_vec(IxDyn(&[1, 3]), vec![0.1, -0.5, 0.3]).unwrap(),
        };
        assert_eq!(output.class_scores(), vec![0.1, -0.5, 0.3]);
    }
}
