//! Error types for the refinement loop
//!
//! Every failure that ends a run early is a [`RefineError`]. When a run has
//! already accumulated attempts, the error travels inside a
//! [`LoopFailure`](crate::refinement::LoopFailure) together with that history.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Boxed error returned by producer and scorer implementations
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// Which external collaborator failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollaboratorStage {
    Producer,
    Scorer,
}

impl fmt::Display for CollaboratorStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollaboratorStage::Producer => write!(f, "producer"),
            CollaboratorStage::Scorer => write!(f, "scorer"),
        }
    }
}

/// Main error type for refinement operations
#[derive(Debug, Error)]
pub enum RefineError {
    #[error("Invariant violation: {message}")]
    InvariantViolation { message: String },

    #[error("Collaborator failure: {stage} failed at iteration {iteration}: {source}")]
    CollaboratorFailure {
        stage: CollaboratorStage,
        iteration: usize,
        #[source]
        source: CollaboratorError,
    },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::config::ConfigError),
}

impl RefineError {
    /// Create invariant violation error
    pub fn invariant_violation<S: Into<String>>(message: S) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Create producer failure at the given iteration
    pub fn producer_failed(iteration: usize, source: CollaboratorError) -> Self {
        Self::CollaboratorFailure {
            stage: CollaboratorStage::Producer,
            iteration,
            source,
        }
    }

    /// Create scorer failure at the given iteration
    pub fn scorer_failed(iteration: usize, source: CollaboratorError) -> Self {
        Self::CollaboratorFailure {
            stage: CollaboratorStage::Scorer,
            iteration,
            source,
        }
    }

    /// Iteration at which a collaborator failed, if this is a collaborator failure
    pub fn iteration(&self) -> Option<usize> {
        match self {
            RefineError::CollaboratorFailure { iteration, .. } => Some(*iteration),
            _ => None,
        }
    }

    /// Short machine-readable tag, used for metrics and JSON reports
    pub fn kind(&self) -> &'static str {
        match self {
            RefineError::InvariantViolation { .. } => "invariant_violation",
            RefineError::CollaboratorFailure { .. } => "collaborator_failure",
            RefineError::ConfigError(_) => "configuration_error",
        }
    }
}

/// Result type for refinement operations
pub type RefineResult<T> = Result<T, RefineError>;
