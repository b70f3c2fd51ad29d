use analyzer::{AnalysisOutcome, AnalyzerConfig, DisplaySink, OnnxAnalyzerService, TerminalSink};
use clap::Parser;
use common::{TelemetryGuard, setup_logging};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "analyzer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Classify the two halves of an image with a flower model and a general labeler", long_about = None)]
struct Args {
    /// Image to analyze (PNG or JPEG)
    image: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = AnalyzerConfig::from_env();

    // TelemetryGuard installs the tracing subscriber itself.
    let _telemetry = match config.telemetry() {
        Some(telemetry) => Some(TelemetryGuard::init(&telemetry)?),
        None => {
            setup_logging(config.environment)?;
            None
        }
    };

    tracing::info!("Analyzer starting with config: {:?}", config);

    let sink: Arc<dyn DisplaySink> = Arc::new(TerminalSink::stdout());
    let service = OnnxAnalyzerService::from_config(&config, sink);

    match service.analyze_path(&args.image).await {
        AnalysisOutcome::Published(_) => tracing::info!("Analysis complete"),
        outcome => tracing::warn!(?outcome, "Analysis did not produce predictions"),
    }

    Ok(())
}
