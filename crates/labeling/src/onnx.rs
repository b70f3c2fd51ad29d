use crate::{
    config::LabelerConfig,
    errors::LabelingError,
    labeler::{ImageLabel, ImageLabeler},
};
use common::span;
use image::RgbImage;
use inference::{InferenceBackend, LabelTable, ModelLoadError};
use preprocess::TensorEncoder;
use std::future::Future;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// How raw network scores become confidences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreActivation {
    /// Scores are already probabilities
    Identity,
    #[default]
    Softmax,
    Sigmoid,
}

impl ScoreActivation {
    pub fn apply(&self, scores: &mut [f32]) {
        match self {
            ScoreActivation::Identity => {}
            ScoreActivation::Sigmoid => {
                for s in scores.iter_mut() {
                    *s = sigmoid(*s);
                }
            }
            ScoreActivation::Softmax => {
                let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                let mut sum = 0.0;
                for s in scores.iter_mut() {
                    *s = (*s - max).exp();
                    sum += *s;
                }
                if sum > 0.0 {
                    for s in scores.iter_mut() {
                        *s /= sum;
                    }
                }
            }
        }
    }
}

impl FromStr for ScoreActivation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "identity" | "none" => Ok(Self::Identity),
            "softmax" => Ok(Self::Softmax),
            "sigmoid" => Ok(Self::Sigmoid),
            other => Err(format!(
                "{} is not a supported activation. Use `identity`, `softmax` or `sigmoid`.",
                other
            )),
        }
    }
}

#[inline]
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelerOptions {
    pub confidence_threshold: f32,
    pub max_results: Option<usize>,
    pub activation: ScoreActivation,
}

impl Default for LabelerOptions {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            max_results: None,
            activation: ScoreActivation::Softmax,
        }
    }
}

/// Keep labels whose confidence reaches `threshold`, highest first.
/// Equal confidences keep table order.
pub fn rank_labels(
    confidences: &[f32],
    labels: &LabelTable,
    threshold: f32,
    max_results: Option<usize>,
) -> Vec<ImageLabel> {
    let mut ranked: Vec<ImageLabel> = confidences
        .iter()
        .enumerate()
        .filter(|&(_, &c)| c >= threshold)
        .filter_map(|(index, &confidence)| {
            labels.get(index).map(|text| ImageLabel {
                text: text.to_string(),
                confidence,
                index,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    if let Some(max) = max_results {
        ranked.truncate(max);
    }

    ranked
}

struct LabelerState<B> {
    backend: B,
    encoder: TensorEncoder,
    labels: LabelTable,
}

/// On-device general-purpose labeler backed by an ONNX network.
///
/// Inference runs on the blocking pool; concurrent calls are serialized on
/// the network.
pub struct OnnxImageLabeler<B> {
    state: Arc<Mutex<LabelerState<B>>>,
    options: LabelerOptions,
}

impl<B: InferenceBackend + Send + 'static> OnnxImageLabeler<B> {
    pub fn new(backend: B, labels: LabelTable, input_size: u32, options: LabelerOptions) -> Self {
        Self {
            state: Arc::new(Mutex::new(LabelerState {
                backend,
                encoder: TensorEncoder::new(input_size),
                labels,
            })),
            options,
        }
    }

    pub fn load<F>(config: &LabelerConfig, load_backend: F) -> Result<Self, LabelingError>
    where
        F: FnOnce(&Path) -> anyhow::Result<B>,
    {
        let _s = span!("load_labeler");

        let unavailable = |e: ModelLoadError| LabelingError::Unavailable(e.to_string());

        if !config.model_path.exists() {
            return Err(unavailable(ModelLoadError::MissingArtifact(
                config.model_path.clone(),
            )));
        }

        let labels = LabelTable::from_file(&config.labels_path).map_err(unavailable)?;
        let backend = load_backend(&config.model_path)
            .map_err(|e| unavailable(ModelLoadError::Backend(format!("{e:#}"))))?;

        tracing::info!(
            model = %config.model_path.display(),
            labels = labels.len(),
            "General labeler ready"
        );

        Ok(Self::new(backend, labels, config.input_size, config.options()))
    }

    pub fn options(&self) -> &LabelerOptions {
        &self.options
    }

    fn label_blocking(
        state: &Mutex<LabelerState<B>>,
        options: &LabelerOptions,
        image: &RgbImage,
    ) -> Result<Vec<ImageLabel>, LabelingError> {
        let _s = span!("general_labeler_process");

        let mut guard = state
            .lock()
            .map_err(|_| LabelingError::Task("labeler state poisoned".to_string()))?;
        let LabelerState {
            backend,
            encoder,
            labels,
        } = &mut *guard;

        let tensor = encoder.encode(image)?;
        let output = backend
            .infer(&tensor)
            .map_err(|e| LabelingError::Inference(format!("{e:#}")))?;

        let mut confidences = output.class_scores();
        if confidences.len() != labels.len() {
            return Err(LabelingError::Inference(format!(
                "expected {} scores, got {}",
                labels.len(),
                confidences.len()
            )));
        }

        options.activation.apply(&mut confidences);

        let ranked = rank_labels(
            &confidences,
            labels,
            options.confidence_threshold,
            options.max_results,
        );

        tracing::debug!(labels = ranked.len(), "General labeler finished");
        Ok(ranked)
    }
}

impl<B: InferenceBackend + Send + 'static> ImageLabeler for OnnxImageLabeler<B> {
    fn process(
        &self,
        image: RgbImage,
    ) -> impl Future<Output = Result<Vec<ImageLabel>, LabelingError>> + Send {
        let state = Arc::clone(&self.state);
        let options = self.options;

        async move {
            tokio::task::spawn_blocking(move || Self::label_blocking(&state, &options, &image))
                .await
                .map_err(|e| LabelingError::Task(e.to_string()))?
        }
    }
}
