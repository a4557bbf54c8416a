//! Client metrics.
//!
//! Provides standardized metrics for monitoring API usage:
//! - Request counters by operation and status
//! - Latency histograms
//! - Job poll outcomes
//! - Degrade-to-memory events

use metrics::{counter, histogram};

// =============================================================================
// Metric Names
// =============================================================================

/// Metric name constants for consistency.
pub mod names {
    /// Total API requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "reclip_requests_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "reclip_request_latency_seconds";

    /// Job polls by outcome.
    pub const JOB_POLLS_TOTAL: &str = "reclip_job_polls_total";

    /// Calls replayed on the in-memory provider after a transport failure.
    pub const MOCK_FALLBACKS_TOTAL: &str = "reclip_mock_fallbacks_total";
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record metrics for a completed request. Status 0 means no response.
pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record a job poll outcome ("progress", "completed", "failed", "transient_error").
pub fn record_poll(outcome: &'static str) {
    counter!(names::JOB_POLLS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record a degrade-to-memory event.
pub fn record_fallback(operation: &str) {
    counter!(
        names::MOCK_FALLBACKS_TOTAL,
        "operation" => operation.to_string()
    )
    .increment(1);
}
