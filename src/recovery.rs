//! Recovery advice for finished runs
//!
//! Turns a terminal decision and the best score into a recommended next step
//! for the caller. Failed runs get advice too: salvage the best scored attempt
//! when there is one, otherwise skip validation or abort.

use crate::error::{CollaboratorStage, RefineError};
use crate::policy::DecisionKind;
use crate::refinement::{LoopFailure, RefinementOutcome};
use serde::Serialize;

/// Recommended follow-up after a refinement run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    /// Goal met
    Accept,
    /// Budget ran out but the best score is acceptable
    AcceptGoodEnough,
    /// Budget ran out with a low best score
    SuggestDecomposition,
    /// Scores stopped moving
    TryDifferentApproach,
    /// Stopped from outside; hand back what exists
    ReturnBestAttempt,
    /// Nothing was produced at all
    Retry,
    /// Scoring failed before anything was scored; any candidate is unvalidated
    SkipValidation,
    /// Nothing to salvage
    Abort,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoveryAdvice {
    pub action: RecoveryAction,
    pub best_score: Option<f64>,
    pub message: String,
}

impl RecoveryAdvice {
    pub fn for_outcome<C>(outcome: &RefinementOutcome<C>, acceptable_score: f64) -> Self {
        let best_score = outcome.best().map(|attempt| attempt.score);
        Self::for_decision(outcome.decision, best_score, acceptable_score)
    }

    /// Advice for a run that ended in an error
    pub fn for_failure<C>(failure: &LoopFailure<C>, acceptable_score: f64) -> Self {
        let best = failure.best();
        let best_score = best.map(|attempt| attempt.score);

        let RefineError::CollaboratorFailure {
            stage, iteration, ..
        } = &failure.error
        else {
            return Self {
                action: RecoveryAction::Abort,
                best_score,
                message: format!("Run aborted: {}", failure.error),
            };
        };

        if let Some(best) = best {
            let action = if best.score >= acceptable_score {
                RecoveryAction::AcceptGoodEnough
            } else {
                RecoveryAction::ReturnBestAttempt
            };
            return Self {
                action,
                best_score,
                message: format!(
                    "{stage} failed at iteration {iteration}; falling back to attempt {} (score {})",
                    best.iteration, best.score
                ),
            };
        }

        let (action, message) = match stage {
            CollaboratorStage::Scorer => (
                RecoveryAction::SkipValidation,
                format!(
                    "Scoring failed at iteration {iteration} before any attempt was scored; proceeding without validation is HIGH RISK"
                ),
            ),
            CollaboratorStage::Producer => (
                RecoveryAction::Abort,
                format!("Producer failed at iteration {iteration}; no candidate to salvage"),
            ),
        };

        Self {
            action,
            best_score,
            message,
        }
    }

    pub fn for_decision(
        decision: DecisionKind,
        best_score: Option<f64>,
        acceptable_score: f64,
    ) -> Self {
        let Some(best) = best_score else {
            return Self {
                action: RecoveryAction::Retry,
                best_score,
                message: format!("Run ended ({decision}) before any attempt was scored"),
            };
        };

        let (action, message) = match decision {
            DecisionKind::SuccessThresholdMet => (
                RecoveryAction::Accept,
                format!("Success threshold met with score {best}"),
            ),
            DecisionKind::BudgetExhausted if best >= acceptable_score => (
                RecoveryAction::AcceptGoodEnough,
                format!(
                    "Iteration budget exhausted with acceptable score {best} (>= {acceptable_score}); consider shipping"
                ),
            ),
            DecisionKind::BudgetExhausted => (
                RecoveryAction::SuggestDecomposition,
                format!(
                    "Iteration budget exhausted with low score {best}; task may be too complex, consider decomposition"
                ),
            ),
            DecisionKind::PlateauDetected => (
                RecoveryAction::TryDifferentApproach,
                format!(
                    "Scores plateaued at {best}; try a fundamentally different implementation strategy"
                ),
            ),
            DecisionKind::DeadlineExceeded => (
                RecoveryAction::ReturnBestAttempt,
                format!(
                    "Time budget exhausted; returning best attempt ({best}). Decompose the task, allocate more time, or accept current quality"
                ),
            ),
            DecisionKind::Cancelled => (
                RecoveryAction::ReturnBestAttempt,
                format!("Run cancelled; returning best attempt ({best})"),
            ),
            // A finished outcome never carries Continue
            DecisionKind::Continue => (
                RecoveryAction::ReturnBestAttempt,
                format!("Run still in progress; best so far {best}"),
            ),
        };

        Self {
            action,
            best_score,
            message,
        }
    }
}
