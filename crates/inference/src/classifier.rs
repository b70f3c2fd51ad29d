use crate::{backend::InferenceBackend, errors::ModelLoadError, labels::LabelTable};
use common::{Prediction, span};
use ndarray::{Array, IxDyn};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

/// Raw-score cutoff of the bundled flower model. Its last layer is not
/// softmax-normalized, so this is not a probability.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = -0.2;

/// Outcome of one custom-model classification.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelVerdict {
    Match(Prediction),
    NoConfidentMatch,
    Unavailable,
    Failed(String),
}

enum ModelState<B> {
    Ready { backend: B, labels: LabelTable },
    Unavailable { reason: String },
}

/// Single-label classifier over a bundled network and its label table.
///
/// Both artifacts are loaded once. If either fails to load the classifier
/// stays usable but answers every request with [`ModelVerdict::Unavailable`].
pub struct CustomModelClassifier<B> {
    state: ModelState<B>,
    confidence_threshold: f32,
}

impl<B: InferenceBackend> CustomModelClassifier<B> {
    pub fn new(backend: B, labels: LabelTable, confidence_threshold: f32) -> Self {
        Self {
            state: ModelState::Ready { backend, labels },
            confidence_threshold,
        }
    }

    pub fn unavailable(reason: impl Into<String>, confidence_threshold: f32) -> Self {
        Self {
            state: ModelState::Unavailable {
                reason: reason.into(),
            },
            confidence_threshold,
        }
    }

    /// Load the label table and the network, failing on the first missing or
    /// malformed artifact.
    pub fn try_load<F>(
        model_path: &Path,
        labels_path: &Path,
        confidence_threshold: f32,
        load_backend: F,
    ) -> Result<Self, ModelLoadError>
    where
        F: FnOnce(&Path) -> anyhow::Result<B>,
    {
        let _s = span!("load_custom_model");

        if !model_path.exists() {
            return Err(ModelLoadError::MissingArtifact(model_path.to_path_buf()));
        }

        let labels = LabelTable::from_file(labels_path)?;
        let backend =
            load_backend(model_path).map_err(|e| ModelLoadError::Backend(format!("{e:#}")))?;

        tracing::info!(
            model = %model_path.display(),
            labels = labels.len(),
            confidence_threshold,
            "Custom model ready"
        );

        Ok(Self::new(backend, labels, confidence_threshold))
    }

    /// Like [`Self::try_load`], but degrades to an unavailable classifier
    /// instead of failing.
    pub fn load<F>(
        model_path: &Path,
        labels_path: &Path,
        confidence_threshold: f32,
        load_backend: F,
    ) -> Self
    where
        F: FnOnce(&Path) -> anyhow::Result<B>,
    {
        match Self::try_load(model_path, labels_path, confidence_threshold, load_backend) {
            Ok(classifier) => classifier,
            Err(e) => {
                tracing::error!(error = %e, "Error loading model or labels");
                Self::unavailable(e.to_string(), confidence_threshold)
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, ModelState::Ready { .. })
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.state {
            ModelState::Ready { .. } => None,
            ModelState::Unavailable { reason } => Some(reason),
        }
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    /// Run the network and keep the top class if it clears the threshold.
    ///
    /// Never fails: inference errors and panics become [`ModelVerdict::Failed`].
    pub fn classify(&mut self, tensor: &Array<f32, IxDyn>) -> ModelVerdict {
        let _s = span!("custom_model_classify");

        let (backend, labels) = match &mut self.state {
            ModelState::Ready { backend, labels } => (backend, labels),
            ModelState::Unavailable { .. } => return ModelVerdict::Unavailable,
        };

        let output = match catch_unwind(AssertUnwindSafe(|| backend.infer(tensor))) {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Error during prediction");
                return ModelVerdict::Failed(format!("{e:#}"));
            }
            Err(_) => {
                tracing::error!("Inference backend panicked");
                return ModelVerdict::Failed("inference backend panicked".to_string());
            }
        };

        let scores = output.class_scores();
        if scores.len() != labels.len() {
            tracing::error!(
                scores = scores.len(),
                labels = labels.len(),
                "Output size does not match label table"
            );
            return ModelVerdict::Failed(format!(
                "expected {} scores, got {}",
                labels.len(),
                scores.len()
            ));
        }

        let Some((max_index, max_score)) = select_top(&scores) else {
            return ModelVerdict::Failed("network produced no scores".to_string());
        };

        if max_score >= self.confidence_threshold {
            // Lengths match, so the index is always present
            let label = labels.get(max_index).unwrap_or_default();
            tracing::debug!(label, score = max_score, "Custom model match");
            ModelVerdict::Match(Prediction::new(label, max_score))
        } else {
            tracing::debug!(
                score = max_score,
                threshold = self.confidence_threshold,
                "No confident match"
            );
            ModelVerdict::NoConfidentMatch
        }
    }
}

/// Index and value of the highest score. Ties keep the lowest index.
pub fn select_top(scores: &[f32]) -> Option<(usize, f32)> {
    let mut max_index = 0usize;
    let mut max_score = *scores.first()?;

    for (i, &score) in scores.iter().enumerate().skip(1) {
        if score > max_score {
            max_score = score;
            max_index = i;
        }
    }

    Some((max_index, max_score))
}
