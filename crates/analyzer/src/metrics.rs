use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};

/// Pipeline instruments. They are no-ops unless telemetry is installed.
#[derive(Clone)]
pub struct PipelineMetrics {
    duration: Histogram<f64>,
    requests: Counter<u64>,
    stale: Counter<u64>,
    failures: Counter<u64>,
}

impl PipelineMetrics {
    pub fn new(meter_name: &'static str) -> Self {
        let meter = global::meter(meter_name);
        let latency_buckets = [
            0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.15, 0.2, 0.3, 0.5, 0.75, 1.0, 2.0, 5.0,
        ];

        Self {
            duration: meter
                .f64_histogram("analysis_duration_seconds")
                .with_description("Time from partitioning to a published report")
                .with_unit("s")
                .with_boundaries(latency_buckets.to_vec())
                .build(),
            requests: meter
                .u64_counter("analysis_requests_total")
                .with_description("Total analysis requests started")
                .build(),
            stale: meter
                .u64_counter("analysis_stale_total")
                .with_description("Requests superseded before publishing")
                .build(),
            failures: meter
                .u64_counter("analysis_branch_failures_total")
                .with_description("Branch results that ended in an error")
                .build(),
        }
    }

    pub fn request_started(&self) {
        self.requests.add(1, &[]);
    }

    pub fn request_published(&self, elapsed_secs: f64) {
        self.duration.record(elapsed_secs, &[]);
    }

    pub fn request_stale(&self) {
        self.stale.add(1, &[]);
    }

    pub fn branch_failed(&self, branch: &'static str) {
        self.failures.add(1, &[KeyValue::new("branch", branch)]);
    }
}
