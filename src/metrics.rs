use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Initialize the Prometheus recorder and pre-describe the intake series.
    pub fn init() -> Self {
        // Use default buckets to avoid API differences across crate versions.
        let builder = PrometheusBuilder::new();

        let handle = builder
            .install_recorder()
            .expect("prometheus: install recorder");

        ensure_metrics_described();

        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("intake_submissions_total", "Complaint submissions received.");
        describe_counter!("intake_accepted_total", "Submissions accepted and persisted.");
        describe_counter!(
            "intake_rejected_ai_total",
            "Submissions rejected for AI-generated content."
        );
        describe_counter!(
            "intake_rejected_duplicate_total",
            "Submissions rejected as duplicates of open complaints."
        );
        describe_counter!(
            "intake_rejected_spam_total",
            "Submissions rejected by the content-quality checks."
        );
        describe_counter!("intake_store_failures_total", "Complaint insert failures.");
        describe_counter!(
            "moderation_vision_unavailable_total",
            "Vision classifier calls that degraded to unavailable."
        );
        describe_counter!(
            "geocode_fallback_total",
            "Reverse geocode failures answered with the fallback summary."
        );
        describe_counter!(
            "routing_unassigned_total",
            "Complaints routed to the unassigned ward sentinel."
        );
        describe_counter!(
            "notify_email_failures_total",
            "Officer emails that failed to send."
        );
        describe_counter!(
            "notify_persist_failures_total",
            "Notification rows that failed to persist."
        );
        describe_histogram!(
            "intake_pipeline_ms",
            "End-to-end intake pipeline time in milliseconds."
        );
        describe_gauge!(
            "intake_last_submission_ts",
            "Unix ts of the last submission processed."
        );
    });
}
