use crate::source::DEFAULT_LOAD_MAX_DIMENSION;
use common::{DEFAULT_METRIC_INTERVAL, Environment, TelemetryConfig, env_opt, env_or};
use inference::ModelConfig;
use labeling::LabelerConfig;
use preprocess::RegionPartitioner;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub environment: Environment,
    pub service_name: String,
    pub otel_endpoint: Option<String>,
    pub metric_interval: Duration,
    pub split_ratio: f64,
    pub label_timeout: Option<Duration>,
    pub load_max_dimension: Option<u32>,
    pub model: ModelConfig,
    pub labeler: LabelerConfig,
}

impl AnalyzerConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Self {
        let label_timeout = match env_or("LABEL_TIMEOUT_MS", 0u64) {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };

        let load_max_dimension = match env_or("LOAD_MAX_DIMENSION", DEFAULT_LOAD_MAX_DIMENSION) {
            0 => None,
            max => Some(max),
        };

        let metric_interval = match env_or("OTEL_METRIC_INTERVAL_SECS", 0u64) {
            0 => DEFAULT_METRIC_INTERVAL,
            secs => Duration::from_secs(secs),
        };

        Self {
            environment: Environment::from_env(),
            service_name: env_opt("SERVICE_NAME").unwrap_or_else(|| "analyzer".to_string()),
            otel_endpoint: env_opt("OTEL_ENDPOINT"),
            metric_interval,
            split_ratio: env_or("SPLIT_RATIO", RegionPartitioner::DEFAULT_SPLIT_RATIO),
            label_timeout,
            load_max_dimension,
            model: ModelConfig::from_env(),
            labeler: LabelerConfig::from_env(),
        }
    }

    /// OTLP export settings, present only when an endpoint is configured.
    pub fn telemetry(&self) -> Option<TelemetryConfig> {
        self.otel_endpoint.as_ref().map(|endpoint| TelemetryConfig {
            service_name: self.service_name.clone(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            endpoint: endpoint.clone(),
            environment: self.environment,
            metric_interval: self.metric_interval,
        })
    }

    /// Create default configuration for testing
    pub fn test_default() -> Self {
        Self {
            environment: Environment::Development,
            service_name: "analyzer".to_string(),
            otel_endpoint: None,
            metric_interval: DEFAULT_METRIC_INTERVAL,
            split_ratio: RegionPartitioner::DEFAULT_SPLIT_RATIO,
            label_timeout: None,
            load_max_dimension: Some(DEFAULT_LOAD_MAX_DIMENSION),
            model: ModelConfig::test_default(),
            labeler: LabelerConfig::test_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const KEYS: [&str; 7] = [
        "OTEL_ENDPOINT",
        "OTEL_METRIC_INTERVAL_SECS",
        "SERVICE_NAME",
        "SPLIT_RATIO",
        "LABEL_TIMEOUT_MS",
        "LOAD_MAX_DIMENSION",
        "MODEL_PATH",
    ];

    fn clear() {
        for key in KEYS {
            unsafe { env::remove_var(key) };
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear();
        let config = AnalyzerConfig::from_env();

        assert_eq!(config.otel_endpoint, None);
        assert!(config.telemetry().is_none());
        assert_eq!(config.service_name, "analyzer");
        assert_eq!(config.metric_interval, Duration::from_secs(30));
        assert_eq!(config.split_ratio, 0.5);
        assert_eq!(config.label_timeout, None);
        assert_eq!(config.load_max_dimension, Some(224));
        assert_eq!(config.model.model_path.to_str(), Some("models/flower_model.onnx"));
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear();
        unsafe {
            env::set_var("OTEL_ENDPOINT", "http://collector:4317");
            env::set_var("SPLIT_RATIO", "0.25");
            env::set_var("LABEL_TIMEOUT_MS", "1500");
            env::set_var("LOAD_MAX_DIMENSION", "0");
        }

        let config = AnalyzerConfig::from_env();
        clear();

        assert_eq!(config.otel_endpoint.as_deref(), Some("http://collector:4317"));
        assert_eq!(config.split_ratio, 0.25);
        assert_eq!(config.label_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(config.load_max_dimension, None);
    }

    #[test]
    #[serial]
    fn test_telemetry_identity() {
        clear();
        unsafe {
            env::set_var("OTEL_ENDPOINT", "http://collector:4317");
            env::set_var("SERVICE_NAME", "flower-analyzer");
            env::set_var("OTEL_METRIC_INTERVAL_SECS", "5");
        }

        let telemetry = AnalyzerConfig::from_env().telemetry();
        clear();

        let telemetry = telemetry.unwrap();
        assert_eq!(telemetry.service_name, "flower-analyzer");
        assert_eq!(telemetry.service_version, env!("CARGO_PKG_VERSION"));
        assert_eq!(telemetry.endpoint, "http://collector:4317");
        assert_eq!(telemetry.metric_interval, Duration::from_secs(5));
    }

    #[test]
    #[serial]
    fn test_unparseable_values_fall_back() {
        clear();
        unsafe { env::set_var("LABEL_TIMEOUT_MS", "soon") };

        let config = AnalyzerConfig::from_env();
        clear();

        assert_eq!(config.label_timeout, None);
    }
}
