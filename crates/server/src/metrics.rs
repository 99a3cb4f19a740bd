// crates/server/src/metrics.rs
//! Prometheus counters for the job pipeline.
//!
//! The recorder is installed once at startup; the handle needed to render
//! scrape output lives in a process-wide `OnceLock` so the `/metrics` route
//! can reach it without threading state through the router.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static RECORDER_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus recorder.
///
/// Safe to call more than once; only the first call installs. Returns
/// whether this call did the installation.
pub fn init_metrics() -> bool {
    if RECORDER_HANDLE.get().is_some() {
        return false;
    }

    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    if metrics::set_global_recorder(recorder).is_err() {
        tracing::warn!("metrics recorder already installed elsewhere");
        return false;
    }
    let _ = RECORDER_HANDLE.set(handle);

    describe_counter!(
        "jobs_submitted_total",
        "Total number of accepted job submissions"
    );
    describe_counter!(
        "jobs_finished_total",
        "Total number of jobs that reached a terminal status"
    );
    describe_histogram!(
        "job_duration_seconds",
        "Time from submission to terminal status in seconds"
    );
    describe_gauge!(
        "job_queue_depth",
        "Number of queued jobs waiting for a worker"
    );

    tracing::info!("Prometheus metrics initialized");
    true
}

/// Render the scrape output, or `None` before `init_metrics` has run.
pub fn render_metrics() -> Option<String> {
    RECORDER_HANDLE.get().map(|h| h.render())
}

/// Count an accepted submission, labeled by job kind.
pub fn record_job_submitted(kind: &str) {
    counter!("jobs_submitted_total", "kind" => kind.to_string()).increment(1);
}

/// Count a job reaching a terminal status and record its total lifetime,
/// submission to terminal, labeled by kind and outcome.
pub fn record_job_finished(kind: &str, status: &str, duration: std::time::Duration) {
    counter!("jobs_finished_total", "kind" => kind.to_string(), "status" => status.to_string())
        .increment(1);
    histogram!("job_duration_seconds", "kind" => kind.to_string()).record(duration.as_secs_f64());
}

/// Publish the current queue depth.
pub fn record_queue_depth(depth: usize) {
    gauge!("job_queue_depth").set(depth as f64);
}
