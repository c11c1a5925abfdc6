//! YouTube API metrics.

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total API requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "youtube_requests_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "youtube_latency_seconds";

    /// Bytes streamed to the upload endpoint.
    pub const UPLOAD_BYTES_TOTAL: &str = "youtube_upload_bytes_total";
}

/// Record metrics for a completed API call. `status` is 0 when no HTTP
/// response was received.
pub fn record_request(operation: &'static str, status: u16, latency_secs: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation,
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(names::LATENCY_SECONDS, "operation" => operation).record(latency_secs);
}

pub fn record_upload_bytes(bytes: u64) {
    counter!(names::UPLOAD_BYTES_TOTAL).increment(bytes);
}
