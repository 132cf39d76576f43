//! Results of a refinement run

use crate::error::RefineError;
use crate::history::{Attempt, ScoreHistory};
use crate::policy::DecisionKind;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Terminal result of a run that was not cut short by an error
#[derive(Debug, Clone, Serialize)]
pub struct RefinementOutcome<C> {
    pub run_id: Uuid,
    pub decision: DecisionKind,
    /// Iteration whose attempt triggered the decision; `None` for cancellation and deadlines
    pub triggered_at: Option<usize>,
    /// Highest-scoring iteration, earliest on ties
    pub best_iteration: Option<usize>,
    pub history: ScoreHistory<C>,
    pub elapsed_ms: u64,
}

impl<C> RefinementOutcome<C> {
    pub fn best(&self) -> Option<&Attempt<C>> {
        self.best_iteration.and_then(|i| self.history.get(i))
    }

    pub fn iterations(&self) -> usize {
        self.history.len()
    }

    pub fn succeeded(&self) -> bool {
        self.decision == DecisionKind::SuccessThresholdMet
    }
}

/// Run aborted by an error, with everything accumulated before it
#[derive(Debug)]
pub struct LoopFailure<C> {
    pub run_id: Uuid,
    pub error: RefineError,
    pub history: ScoreHistory<C>,
}

impl<C> LoopFailure<C> {
    /// Best attempt salvaged from the partial history
    pub fn best(&self) -> Option<&Attempt<C>> {
        self.history.best()
    }

    /// Iteration at which a collaborator failed
    pub fn iteration(&self) -> Option<usize> {
        self.error.iteration()
    }

    pub fn into_parts(self) -> (RefineError, ScoreHistory<C>) {
        (self.error, self.history)
    }
}

impl<C> fmt::Display for LoopFailure<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "refinement run {} failed after {} attempt(s): {}",
            self.run_id,
            self.history.len(),
            self.error
        )
    }
}

impl<C: fmt::Debug> std::error::Error for LoopFailure<C> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<C> From<LoopFailure<C>> for RefineError {
    fn from(failure: LoopFailure<C>) -> Self {
        failure.error
    }
}
