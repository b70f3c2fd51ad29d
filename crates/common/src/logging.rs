use crate::config::Environment;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Filter from `RUST_LOG`, falling back to `default_level`.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Pretty output for development, JSON lines for production.
pub fn fmt_layer<S>(environment: Environment) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    match environment {
        Environment::Production => tracing_subscriber::fmt::layer()
            .json()
            .with_level(true)
            .with_writer(std::io::stderr)
            .boxed(),
        Environment::Development => tracing_subscriber::fmt::layer()
            .pretty()
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .boxed(),
    }
}

/// Initialize the global tracing subscriber.
///
/// Uses RUST_LOG for filtering (defaults to "info"). Log output goes to
/// stderr so that stdout stays reserved for the rendered report.
///
/// Also adds an OpenTelemetry layer that exports spans if a global tracer
/// provider has been installed (see [`crate::TelemetryGuard`]).
pub fn setup_logging(environment: Environment) -> anyhow::Result<()> {
    let otel_layer = tracing_opentelemetry::layer();

    Registry::default()
        .with(env_filter("info"))
        .with(otel_layer)
        .with(fmt_layer(environment))
        .try_init()?;

    Ok(())
}
