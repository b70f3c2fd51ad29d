use crate::aggregator::{AggregatorPhase, BranchResult, ResultAggregator};
use crate::classifier::{ClassifyError, RegionClassifier};
use crate::metrics::PipelineMetrics;
use crate::report::{IMAGE_LOAD_FAILED, Report};
use crate::requests::{RequestTicket, RequestTracker};
use crate::sink::DisplaySink;
use image::RgbImage;
use labeling::LabelingError;
use preprocess::RegionPartitioner;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::{AbortHandle, JoinError};
use tracing::Instrument;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    /// Both sections were written and the report published.
    Published(Report),
    /// A newer request started before this one finished.
    Stale,
    /// The image could not be partitioned.
    InvalidImage,
    /// The image could not be read from its source.
    ImageLoadFailed,
}

/// Splits an image in two, classifies the halves concurrently and publishes
/// one combined report per request.
///
/// Starting a new request cancels the labeling branch of the previous one,
/// and the previous request never publishes.
pub struct AnalysisPipeline<M, O, S: ?Sized> {
    partitioner: RegionPartitioner,
    main: Arc<M>,
    other: Arc<O>,
    sink: Arc<S>,
    requests: RequestTracker,
    in_flight: Mutex<Option<AbortHandle>>,
    label_timeout: Option<Duration>,
    metrics: PipelineMetrics,
}

impl<M, O, S> AnalysisPipeline<M, O, S>
where
    M: RegionClassifier,
    O: RegionClassifier,
    S: DisplaySink + ?Sized,
{
    pub fn new(partitioner: RegionPartitioner, main: M, other: O, sink: Arc<S>) -> Self {
        Self {
            partitioner,
            main: Arc::new(main),
            other: Arc::new(other),
            sink,
            requests: RequestTracker::new(),
            in_flight: Mutex::new(None),
            label_timeout: None,
            metrics: PipelineMetrics::new("analyzer"),
        }
    }

    /// Fail the labeling branch if it has not answered within `timeout`.
    pub fn with_label_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.label_timeout = timeout;
        self
    }

    pub fn requests(&self) -> &RequestTracker {
        &self.requests
    }

    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    pub async fn analyze(&self, image: RgbImage) -> AnalysisOutcome {
        let ticket = self.requests.begin();
        self.metrics.request_started();

        let span = tracing::info_span!(
            "analyze_image",
            request_id = ticket.id(),
            width = image.width(),
            height = image.height()
        );
        self.run(ticket, image).instrument(span).await
    }

    async fn run(&self, ticket: RequestTicket, image: RgbImage) -> AnalysisOutcome {
        let started = Instant::now();

        let pair = match self.partitioner.partition(&image) {
            Ok(pair) => pair,
            Err(e) => {
                tracing::error!(error = %e, "Cannot partition image");
                let sink = &self.sink;
                self.requests.run_if_current(ticket, || {
                    sink.publish(&Report::notice(IMAGE_LOAD_FAILED))
                });
                return AnalysisOutcome::InvalidImage;
            }
        };
        tracing::debug!(main = ?pair.main, other = ?pair.other, "Partitioned image");

        let main_region = pair.main.crop(&image);
        let other_region = pair.other.crop(&image);
        drop(image);

        // The labeling branch runs as its own task so a newer request can abort it.
        let other = Arc::clone(&self.other);
        let timeout = self.label_timeout;
        let handle = tokio::spawn(
            async move {
                let region = match other_region {
                    Ok(region) => region,
                    Err(e) => return Err(ClassifyError::from(e)),
                };
                match timeout {
                    Some(limit) => tokio::time::timeout(limit, other.classify(region))
                        .await
                        .unwrap_or(Err(ClassifyError::TimedOut(limit))),
                    None => other.classify(region).await,
                }
            }
            .in_current_span(),
        );
        self.replace_in_flight(handle.abort_handle());

        let main_result = match main_region {
            Ok(region) => self.main.classify(region).await,
            Err(e) => Err(ClassifyError::from(e)),
        };
        if main_result.is_err() {
            self.metrics.branch_failed("main");
        }

        let mut aggregator =
            ResultAggregator::new(ticket, self.requests.clone(), Arc::clone(&self.sink));
        aggregator.record_main(main_result);

        let other_result = join_result(handle.await);
        if other_result.is_err() {
            self.metrics.branch_failed("other");
        }
        aggregator.record_other(other_result);

        match aggregator.phase() {
            AggregatorPhase::Published => {
                let elapsed = started.elapsed();
                self.metrics.request_published(elapsed.as_secs_f64());
                tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "Report published");
                AnalysisOutcome::Published(aggregator.into_report())
            }
            phase => {
                self.metrics.request_stale();
                tracing::debug!(?phase, "Request superseded");
                AnalysisOutcome::Stale
            }
        }
    }

    fn replace_in_flight(&self, handle: AbortHandle) {
        match self.in_flight.lock() {
            Ok(mut in_flight) => {
                if let Some(previous) = in_flight.replace(handle) {
                    previous.abort();
                }
            }
            Err(_) => tracing::warn!("In-flight handle poisoned, previous request not aborted"),
        }
    }
}

fn join_result(joined: Result<BranchResult, JoinError>) -> BranchResult {
    match joined {
        Ok(result) => result,
        Err(e) if e.is_cancelled() => Err(ClassifyError::Cancelled),
        Err(e) => Err(ClassifyError::Labeling(LabelingError::Task(e.to_string()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use common::Prediction;
    use image::Rgb;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        predictions: Vec<Prediction>,
        seen_widths: Arc<Mutex<Vec<u32>>>,
    }

    impl Fixed {
        fn new(predictions: Vec<Prediction>) -> Self {
            Self {
                predictions,
                seen_widths: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl RegionClassifier for Fixed {
        fn classify(
            &self,
            region: RgbImage,
        ) -> impl Future<Output = BranchResult> + Send {
            self.seen_widths.lock().unwrap().push(region.width());
            let predictions = self.predictions.clone();
            async move { Ok(predictions) }
        }
    }

    struct Slow {
        delay: Duration,
        calls: Arc<AtomicUsize>,
    }

    impl RegionClassifier for Slow {
        fn classify(
            &self,
            _region: RgbImage,
        ) -> impl Future<Output = BranchResult> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = self.delay;
            async move {
                tokio::time::sleep(delay).await;
                Ok(vec![Prediction::new("Petal", 0.75)])
            }
        }
    }

    fn image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([120, 80, 40]))
    }

    #[tokio::test]
    async fn test_regions_go_to_their_branches() {
        let main = Fixed::new(vec![Prediction::new("daisy", 0.3)]);
        let main_widths = Arc::clone(&main.seen_widths);
        let other = Fixed::new(Vec::new());
        let other_widths = Arc::clone(&other.seen_widths);
        let sink = Arc::new(MemorySink::new());

        let pipeline = AnalysisPipeline::new(RegionPartitioner::default(), main, other, sink);
        let outcome = pipeline.analyze(image(101, 10)).await;

        assert!(matches!(outcome, AnalysisOutcome::Published(_)));
        assert_eq!(*main_widths.lock().unwrap(), vec![50]);
        assert_eq!(*other_widths.lock().unwrap(), vec![51]);
    }

    #[tokio::test]
    async fn test_zero_sized_image_publishes_load_error() {
        let sink = Arc::new(MemorySink::new());
        let pipeline = AnalysisPipeline::new(
            RegionPartitioner::default(),
            Fixed::new(Vec::new()),
            Fixed::new(Vec::new()),
            Arc::clone(&sink),
        );

        assert_eq!(pipeline.analyze(image(0, 0)).await, AnalysisOutcome::InvalidImage);
        assert_eq!(sink.latest().unwrap().to_plain_text(), "Error loading image.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_label_timeout_fails_the_other_section() {
        let sink = Arc::new(MemorySink::new());
        let pipeline = AnalysisPipeline::new(
            RegionPartitioner::default(),
            Fixed::new(Vec::new()),
            Slow {
                delay: Duration::from_secs(10),
                calls: Arc::new(AtomicUsize::new(0)),
            },
            Arc::clone(&sink),
        )
        .with_label_timeout(Some(Duration::from_secs(1)));

        pipeline.analyze(image(8, 8)).await;

        assert!(
            sink.latest()
                .unwrap()
                .to_plain_text()
                .ends_with("ML Kit prediction failed.")
        );
    }

    #[test]
    fn test_join_error_mapping() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let handle = tokio::spawn(std::future::pending::<BranchResult>());
            handle.abort();
            assert!(matches!(join_result(handle.await), Err(ClassifyError::Cancelled)));

            let exploding = true;
            let handle = tokio::spawn(async move {
                if exploding {
                    panic!("labeler exploded");
                }
                Ok::<Vec<Prediction>, ClassifyError>(Vec::new())
            });
            assert!(matches!(
                join_result(handle.await),
                Err(ClassifyError::Labeling(LabelingError::Task(_)))
            ));
        });
    }
}
