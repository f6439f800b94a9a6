//! Error types for the simulation harness.

use liquid_core::LiquidError;
use thiserror::Error;

/// Errors raised while loading parameters, running trials, or exporting.
#[derive(Debug, Error)]
pub enum SimError {
    /// Engine rejected the configuration or a trial failed
    #[error(transparent)]
    Engine(#[from] LiquidError),

    /// Parameter file or override could not be interpreted
    #[error("Parameter format error: {0}")]
    ParamFormat(String),

    /// Unknown scenario name
    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    /// Every trial in the run failed
    #[error("All {0} trials failed")]
    AllTrialsFailed(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimError {
    pub fn format(msg: impl Into<String>) -> Self {
        Self::ParamFormat(msg.into())
    }
}
