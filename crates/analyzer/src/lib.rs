pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod requests;
pub mod service;
pub mod sink;
pub mod source;

pub use aggregator::{AggregatorPhase, BranchResult, ResultAggregator};
pub use classifier::{ClassifyError, CustomModelBranch, RegionClassifier};
pub use config::AnalyzerConfig;
pub use pipeline::{AnalysisOutcome, AnalysisPipeline};
pub use report::{Report, SectionKind, Segment, Style};
pub use requests::{RequestTicket, RequestTracker};
pub use service::{AnalyzerService, OnnxAnalyzerService, load_custom_branch};
pub use sink::{DisplaySink, MemorySink, TerminalSink};
pub use source::{FileImageSource, ImageLoadError};
