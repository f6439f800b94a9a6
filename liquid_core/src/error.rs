//! Error types for the liquid-democracy engine.

use thiserror::Error;

/// Errors that can abort a single election trial.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LiquidError {
    /// A required model parameter was not supplied
    #[error("Missing parameter: {name}")]
    MissingParameter { name: String },

    /// A model parameter was supplied but could not be accepted
    #[error("Invalid parameter {name}={value}: {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    /// `graph_type` names no known generator
    #[error("Unsupported graph type: {0}")]
    UnsupportedGraphType(String),

    /// `delegation_rule` names no known rule
    #[error("Unsupported delegation rule: {0}")]
    UnsupportedDelegationRule(String),

    /// Generator inputs cannot produce a well-formed graph
    #[error("Graph construction error: {0}")]
    GraphConstruction(String),

    /// The degree-enforcement loop hit its retry bound
    #[error("Delegation resolution diverged after {iterations} rounds")]
    ResolutionDiverged { iterations: usize },

    /// A voter could not be reached from any root while rebuilding paths
    #[error("Delegation cycle detected at voter {voter}")]
    DelegationCycle { voter: usize },
}

impl LiquidError {
    /// Creates a missing-parameter error.
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    /// Creates an invalid-parameter error.
    pub fn invalid(
        name: impl Into<String>,
        value: impl std::fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns true for errors raised while building a `ModelConfig`.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter { .. }
                | Self::InvalidParameter { .. }
                | Self::UnsupportedGraphType(_)
                | Self::UnsupportedDelegationRule(_)
        )
    }
}

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, LiquidError>;
