use crate::Environment;
use crate::logging::{env_filter, fmt_layer};
use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    metrics::{PeriodicReader, SdkMeterProvider},
    propagation::TraceContextPropagator,
    trace::{Sampler, SdkTracerProvider},
};
use opentelemetry_semantic_conventions::attribute::{SERVICE_NAME, SERVICE_VERSION};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEPLOYMENT_ENVIRONMENT: &str = "deployment.environment.name";
pub const DEFAULT_METRIC_INTERVAL: Duration = Duration::from_secs(30);

/// Identity and export settings for one binary's telemetry.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub service_version: String,
    pub endpoint: String,
    pub environment: Environment,
    pub metric_interval: Duration,
}

impl TelemetryConfig {
    /// Resource attached to every exported span and metric.
    pub fn resource(&self) -> Resource {
        Resource::builder()
            .with_attributes([
                KeyValue::new(SERVICE_NAME, self.service_name.clone()),
                KeyValue::new(SERVICE_VERSION, self.service_version.clone()),
                KeyValue::new(DEPLOYMENT_ENVIRONMENT, self.environment.as_str()),
            ])
            .build()
    }
}

/// Initializes tracing and metrics providers on creation and shuts them down
/// gracefully when dropped.
///
/// # Example
/// ```ignore
/// let _telemetry = TelemetryGuard::init(&config.telemetry()?)?;
/// // Telemetry is automatically flushed and shut down when guard is dropped
/// ```
pub struct TelemetryGuard {
    tracer_provider: SdkTracerProvider,
    meter_provider: SdkMeterProvider,
}

impl TelemetryGuard {
    /// Install OTLP span and metric export plus the global tracing subscriber.
    ///
    /// Call this instead of [`crate::setup_logging`], not in addition to it.
    /// Must run inside a Tokio runtime (the batch exporters are async).
    pub fn init(config: &TelemetryConfig) -> anyhow::Result<Self> {
        global::set_text_map_propagator(TraceContextPropagator::new());

        let resource = config.resource();
        let tracer_provider = tracer_provider(config, resource.clone())?;
        global::set_tracer_provider(tracer_provider.clone());

        let meter_provider = meter_provider(config, resource)?;
        global::set_meter_provider(meter_provider.clone());

        let otel_layer = tracing_opentelemetry::layer()
            .with_tracer(global::tracer(config.service_name.clone()));

        tracing_subscriber::registry()
            .with(env_filter("info"))
            .with(otel_layer)
            .with(fmt_layer(config.environment))
            .try_init()?;

        tracing::info!(
            service = %config.service_name,
            version = %config.service_version,
            endpoint = %config.endpoint,
            "Telemetry export enabled"
        );

        Ok(Self {
            tracer_provider,
            meter_provider,
        })
    }
}

fn tracer_provider(
    config: &TelemetryConfig,
    resource: Resource,
) -> anyhow::Result<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(config.endpoint.as_str())
        .build()?;

    Ok(SdkTracerProvider::builder()
        .with_resource(resource)
        .with_sampler(Sampler::ParentBased(Box::new(Sampler::AlwaysOn)))
        .with_batch_exporter(exporter)
        .build())
}

fn meter_provider(config: &TelemetryConfig, resource: Resource) -> anyhow::Result<SdkMeterProvider> {
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(config.endpoint.as_str())
        .build()?;

    let reader = PeriodicReader::builder(exporter)
        .with_interval(config.metric_interval)
        .build();

    Ok(SdkMeterProvider::builder()
        .with_resource(resource)
        .with_reader(reader)
        .build())
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Err(e) = self.tracer_provider.shutdown() {
            eprintln!("Failed to shutdown tracer provider: {:?}", e);
        }
        if let Err(e) = self.meter_provider.shutdown() {
            eprintln!("Failed to shutdown meter provider: {:?}", e);
        }
    }
}

/// Creates an info-level span and enters it.
#[macro_export]
macro_rules! span {
    ($name:literal) => {
        tracing::info_span!($name).entered()
    };
}

/// Creates a debug-level span and enters it.
#[macro_export]
macro_rules! span_debug {
    ($name:literal) => {
        tracing::debug_span!($name).entered()
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::{Key, Value};

    fn config() -> TelemetryConfig {
        TelemetryConfig {
            service_name: "analyzer".to_string(),
            service_version: "1.2.3".to_string(),
            endpoint: "http://localhost:4317".to_string(),
            environment: Environment::Production,
            metric_interval: DEFAULT_METRIC_INTERVAL,
        }
    }

    #[test]
    fn resource_carries_service_identity() {
        let resource = config().resource();

        assert_eq!(
            resource.get(&Key::new(SERVICE_NAME)),
            Some(Value::from("analyzer"))
        );
        assert_eq!(
            resource.get(&Key::new(SERVICE_VERSION)),
            Some(Value::from("1.2.3"))
        );
        assert_eq!(
            resource.get(&Key::new(DEPLOYMENT_ENVIRONMENT)),
            Some(Value::from("production"))
        );
    }
}
