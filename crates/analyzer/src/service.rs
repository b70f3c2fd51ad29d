use crate::classifier::{CustomModelBranch, RegionClassifier};
use crate::config::AnalyzerConfig;
use crate::pipeline::{AnalysisOutcome, AnalysisPipeline};
use crate::report::{IMAGE_LOAD_FAILED, MODEL_LOAD_FAILED, Report};
use crate::sink::DisplaySink;
use crate::source::FileImageSource;
use common::span;
use inference::{CustomModelClassifier, InferenceBackend, ModelConfig, OrtBackend};
use labeling::{GeneralLabelClassifier, OnnxImageLabeler};
use preprocess::{RegionPartitioner, TensorEncoder};
use std::path::Path;
use std::sync::Arc;

pub type OnnxAnalyzerService = AnalyzerService<
    CustomModelBranch<OrtBackend>,
    GeneralLabelClassifier<OnnxImageLabeler<OrtBackend>>,
    dyn DisplaySink,
>;

/// Load the custom model. A missing or broken artifact yields a branch that
/// reports itself unavailable instead of an error.
pub fn load_custom_branch<B, F>(config: &ModelConfig, load_backend: F) -> CustomModelBranch<B>
where
    B: InferenceBackend + Send + 'static,
    F: FnOnce(&Path) -> anyhow::Result<B>,
{
    let classifier = CustomModelClassifier::load(
        &config.model_path,
        &config.labels_path,
        config.confidence_threshold,
        load_backend,
    );
    CustomModelBranch::new(TensorEncoder::new(config.input_size), classifier)
}

/// Reads images from disk and feeds them through the analysis pipeline.
pub struct AnalyzerService<M, O, S: ?Sized> {
    source: FileImageSource,
    pipeline: AnalysisPipeline<M, O, S>,
}

impl OnnxAnalyzerService {
    pub fn from_config(config: &AnalyzerConfig, sink: Arc<dyn DisplaySink>) -> Self {
        let _s = span!("load_models");

        let model_provider = config.model.execution_provider;
        let main = load_custom_branch(&config.model, |path| {
            OrtBackend::load_model_with_provider(path, model_provider)
        });

        let other = GeneralLabelClassifier::from_load_result(OnnxImageLabeler::load(
            &config.labeler,
            |path| OrtBackend::load_model_with_provider(path, model_provider),
        ));

        Self::assemble(config, main, other, sink)
    }
}

impl<B, O, S> AnalyzerService<CustomModelBranch<B>, O, S>
where
    B: InferenceBackend + Send + 'static,
    O: RegionClassifier,
    S: DisplaySink + ?Sized,
{
    /// Build the service, telling the user right away if the custom model
    /// could not be loaded.
    pub fn assemble(
        config: &AnalyzerConfig,
        main: CustomModelBranch<B>,
        other: O,
        sink: Arc<S>,
    ) -> Self {
        if !main.is_available() {
            sink.publish(&Report::notice(MODEL_LOAD_FAILED));
        }

        let pipeline = AnalysisPipeline::new(
            RegionPartitioner::new(config.split_ratio),
            main,
            other,
            sink,
        )
        .with_label_timeout(config.label_timeout);

        Self {
            source: FileImageSource::new(config.load_max_dimension),
            pipeline,
        }
    }
}

impl<M, O, S> AnalyzerService<M, O, S>
where
    M: RegionClassifier,
    O: RegionClassifier,
    S: DisplaySink + ?Sized,
{
    pub fn new(source: FileImageSource, pipeline: AnalysisPipeline<M, O, S>) -> Self {
        Self { source, pipeline }
    }

    pub fn pipeline(&self) -> &AnalysisPipeline<M, O, S> {
        &self.pipeline
    }

    /// Load the image at `path` and analyze it.
    pub async fn analyze_path(&self, path: &Path) -> AnalysisOutcome {
        match self.source.load(path).await {
            Ok(image) => self.pipeline.analyze(image).await,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Error loading image");
                self.pipeline
                    .sink()
                    .publish(&Report::notice(IMAGE_LOAD_FAILED));
                AnalysisOutcome::ImageLoadFailed
            }
        }
    }
}
