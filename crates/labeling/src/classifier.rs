use crate::{errors::LabelingError, labeler::ImageLabeler};
use common::Prediction;
use image::RgbImage;
use std::sync::Arc;

/// Adapts an [`ImageLabeler`] to the pipeline: builds its input, runs it and
/// turns its labels into [`Prediction`]s.
pub struct GeneralLabelClassifier<L> {
    labeler: Option<Arc<L>>,
}

impl<L: ImageLabeler> GeneralLabelClassifier<L> {
    pub fn new(labeler: L) -> Self {
        Self {
            labeler: Some(Arc::new(labeler)),
        }
    }

    /// A classifier whose every call fails with [`LabelingError::Unavailable`].
    pub fn unavailable() -> Self {
        Self { labeler: None }
    }

    /// Use the labeler if it loaded, otherwise log and degrade.
    pub fn from_load_result(result: Result<L, LabelingError>) -> Self {
        match result {
            Ok(labeler) => Self::new(labeler),
            Err(e) => {
                tracing::error!(error = %e, "General labeler failed to load");
                Self::unavailable()
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.labeler.is_some()
    }

    pub async fn classify_async(&self, region: RgbImage) -> Result<Vec<Prediction>, LabelingError> {
        let labeler = self
            .labeler
            .as_ref()
            .ok_or_else(|| LabelingError::Unavailable("no labeler loaded".to_string()))?;

        if region.width() == 0 || region.height() == 0 {
            return Err(LabelingError::EmptyInput);
        }

        let labels = labeler.process(region).await?;

        Ok(labels
            .into_iter()
            .map(|label| Prediction::new(label.text, label.confidence))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labeler::ImageLabel;
    use image::Rgb;
    use std::future::Future;

    struct StaticLabeler {
        result: Result<Vec<(&'static str, f32)>, &'static str>,
    }

    impl ImageLabeler for StaticLabeler {
        fn process(
            &self,
            _image: RgbImage,
        ) -> impl Future<Output = Result<Vec<ImageLabel>, LabelingError>> + Send {
            let result = self.result.clone();
            async move {
                result
                    .map(|labels| {
                        labels
                            .into_iter()
                            .enumerate()
                            .map(|(index, (text, confidence))| ImageLabel {
                                text: text.to_string(),
                                confidence,
                                index,
                            })
                            .collect()
                    })
                    .map_err(|e| LabelingError::Inference(e.to_string()))
            }
        }
    }

    fn region() -> RgbImage {
        RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]))
    }

    #[tokio::test]
    async fn test_labels_become_predictions_in_order() {
        let classifier = GeneralLabelClassifier::new(StaticLabeler {
            result: Ok(vec![("Flower", 0.92), ("Petal", 0.81), ("Plant", 0.55)]),
        });

        let predictions = classifier.classify_async(region()).await.unwrap();
        assert_eq!(
            predictions,
            vec![
                Prediction::new("Flower", 0.92),
                Prediction::new("Petal", 0.81),
                Prediction::new("Plant", 0.55),
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_is_typed() {
        let classifier = GeneralLabelClassifier::new(StaticLabeler {
            result: Err("service down"),
        });

        let err = classifier.classify_async(region()).await.unwrap_err();
        assert!(matches!(err, LabelingError::Inference(ref m) if m == "service down"));
    }

    #[tokio::test]
    async fn test_unavailable_and_empty_input() {
        let classifier = GeneralLabelClassifier::<StaticLabeler>::unavailable();
        assert!(!classifier.is_available());
        assert!(matches!(
            classifier.classify_async(region()).await,
            Err(LabelingError::Unavailable(_))
        ));

        let classifier = GeneralLabelClassifier::new(StaticLabeler { result: Ok(vec![]) });
        assert!(matches!(
            classifier.classify_async(RgbImage::new(0, 5)).await,
            Err(LabelingError::EmptyInput)
        ));
        assert_eq!(classifier.classify_async(region()).await.unwrap(), vec![]);
    }
}
