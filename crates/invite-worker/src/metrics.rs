//! Prometheus metrics for the generation worker.

use std::net::SocketAddr;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Serve metrics on `addr`. Must be called inside a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()
}

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_SUBMITTED_TOTAL: &str = "invite_jobs_submitted_total";
    pub const JOBS_REJECTED_TOTAL: &str = "invite_jobs_rejected_total";
    pub const JOBS_FINISHED_TOTAL: &str = "invite_jobs_finished_total";
    pub const JOBS_RUNNING: &str = "invite_jobs_running";
    pub const STAGE_DURATION_SECONDS: &str = "invite_stage_duration_seconds";
    pub const STYLE_FALLBACKS_TOTAL: &str = "invite_style_fallbacks_total";
}

/// Record an accepted generation request.
pub fn record_job_submitted(template_id: &str) {
    let labels = [("template", template_id.to_string())];
    counter!(names::JOBS_SUBMITTED_TOTAL, &labels).increment(1);
}

/// Record a request refused at submit time.
pub fn record_job_rejected(reason: &str) {
    let labels = [("reason", reason.to_string())];
    counter!(names::JOBS_REJECTED_TOTAL, &labels).increment(1);
}

/// Record a job reaching a terminal state ("completed" or an error kind).
pub fn record_job_finished(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::JOBS_FINISHED_TOTAL, &labels).increment(1);
}

pub fn set_jobs_running(count: usize) {
    gauge!(names::JOBS_RUNNING).set(count as f64);
}

/// Record how long one pipeline stage took.
pub fn record_stage_duration(stage: &str, duration_secs: f64) {
    let labels = [("stage", stage.to_string())];
    histogram!(names::STAGE_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_style_fallback(style: &str) {
    let labels = [("style", style.to_string())];
    counter!(names::STYLE_FALLBACKS_TOTAL, &labels).increment(1);
}
