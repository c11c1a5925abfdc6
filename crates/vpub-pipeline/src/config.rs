//! Pipeline configuration.

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Share of composite progress given to rendering (1-99)
    pub render_weight: u8,
    /// Capacity of the per-run event channel
    pub event_buffer: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            render_weight: 50,
            event_buffer: 64,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            render_weight: std::env::var("PIPELINE_RENDER_WEIGHT")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|w: &u8| (1..=99).contains(w))
                .unwrap_or(50),
            event_buffer: std::env::var("PIPELINE_EVENT_BUFFER")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(64),
        }
    }
}
