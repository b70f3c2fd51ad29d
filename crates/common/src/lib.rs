pub mod config;
pub mod logging;
pub mod prediction;
pub mod telemetry;

pub use config::{Environment, env_opt, env_or};
pub use logging::setup_logging;
pub use prediction::Prediction;
pub use telemetry::{DEFAULT_METRIC_INTERVAL, TelemetryConfig, TelemetryGuard};
