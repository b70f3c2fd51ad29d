use common::Prediction;
use image::RgbImage;
use inference::{CustomModelClassifier, InferenceBackend, ModelVerdict};
use labeling::{GeneralLabelClassifier, ImageLabeler, LabelingError};
use preprocess::{PreprocessError, TensorEncoder};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Model or labels not loaded properly")]
    Unavailable,

    #[error("Encoding failed: {0}")]
    Encoding(#[from] PreprocessError),

    #[error("Prediction failed: {0}")]
    Prediction(String),

    #[error("Labeling failed: {0}")]
    Labeling(#[from] LabelingError),

    #[error("Classification cancelled")]
    Cancelled,

    #[error("Classification timed out after {0:?}")]
    TimedOut(Duration),
}

/// Classifies one image region.
///
/// An empty list means the classifier ran but found nothing worth reporting.
pub trait RegionClassifier: Send + Sync + 'static {
    fn classify(
        &self,
        region: RgbImage,
    ) -> impl Future<Output = Result<Vec<Prediction>, ClassifyError>> + Send;
}

struct CustomModelState<B> {
    encoder: TensorEncoder,
    classifier: CustomModelClassifier<B>,
}

/// Encodes a region and runs the custom model on the blocking pool.
pub struct CustomModelBranch<B> {
    state: Arc<Mutex<CustomModelState<B>>>,
    available: bool,
}

impl<B: InferenceBackend + Send + 'static> CustomModelBranch<B> {
    pub fn new(encoder: TensorEncoder, classifier: CustomModelClassifier<B>) -> Self {
        let available = classifier.is_available();
        Self {
            state: Arc::new(Mutex::new(CustomModelState {
                encoder,
                classifier,
            })),
            available,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    fn classify_blocking(
        state: &Mutex<CustomModelState<B>>,
        region: &RgbImage,
    ) -> Result<Vec<Prediction>, ClassifyError> {
        let mut state = state
            .lock()
            .map_err(|_| ClassifyError::Prediction("custom model state poisoned".to_string()))?;
        let CustomModelState {
            encoder,
            classifier,
        } = &mut *state;

        if !classifier.is_available() {
            return Err(ClassifyError::Unavailable);
        }

        let tensor = encoder.encode(region)?;

        match classifier.classify(&tensor) {
            ModelVerdict::Match(prediction) => Ok(vec![prediction]),
            ModelVerdict::NoConfidentMatch => Ok(Vec::new()),
            ModelVerdict::Unavailable => Err(ClassifyError::Unavailable),
            ModelVerdict::Failed(reason) => Err(ClassifyError::Prediction(reason)),
        }
    }
}

impl<B: InferenceBackend + Send + 'static> RegionClassifier for CustomModelBranch<B> {
    fn classify(
        &self,
        region: RgbImage,
    ) -> impl Future<Output = Result<Vec<Prediction>, ClassifyError>> + Send {
        let state = Arc::clone(&self.state);
        async move {
            tokio::task::spawn_blocking(move || Self::classify_blocking(&state, &region))
                .await
                .map_err(|e| ClassifyError::Prediction(format!("inference task failed: {e}")))?
        }
    }
}

impl<L: ImageLabeler> RegionClassifier for GeneralLabelClassifier<L> {
    fn classify(
        &self,
        region: RgbImage,
    ) -> impl Future<Output = Result<Vec<Prediction>, ClassifyError>> + Send {
        async move { Ok(self.classify_async(region).await?) }
    }
}
