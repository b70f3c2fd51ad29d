use crate::errors::LabelingError;
use image::RgbImage;
use std::future::Future;

/// One label returned by a general-purpose labeler.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageLabel {
    pub text: String,
    /// Probability-like score in `[0, 1]`
    pub confidence: f32,
    /// Position of the label in the labeler's own table
    pub index: usize,
}

/// A multi-label image classifier that answers asynchronously.
///
/// Implementations resolve once per call, either with labels ordered by
/// descending confidence or with an error.
pub trait ImageLabeler: Send + Sync + 'static {
    fn process(
        &self,
        image: RgbImage,
    ) -> impl Future<Output = Result<Vec<ImageLabel>, LabelingError>> + Send;
}
