use thiserror::Error;

/// Analysis failures that can cross the analyzer boundary. Malformed vision
/// replies never become errors (the parser degrades to defaults instead),
/// and enhancement failures are absorbed by the pipeline, so the only
/// surfaced kind is an unreachable capability.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("vision capability unavailable")]
    CapabilityUnavailable(#[source] anyhow::Error),
}
