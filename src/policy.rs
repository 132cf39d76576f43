//! Termination policy for the refinement loop
//!
//! Evaluated after every append, in a fixed priority order:
//! 1. Success threshold met by the latest attempt
//! 2. Iteration budget exhausted
//! 3. Plateau across the trailing window
//! 4. Continue

use crate::config::RefinementConfig;
use crate::history::{Attempt, ScoreHistory};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of decision reached after an iteration, or why a run stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Continue,
    SuccessThresholdMet,
    PlateauDetected,
    BudgetExhausted,
    Cancelled,
    DeadlineExceeded,
}

impl DecisionKind {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DecisionKind::Continue)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionKind::Continue => "continue",
            DecisionKind::SuccessThresholdMet => "success_threshold_met",
            DecisionKind::PlateauDetected => "plateau_detected",
            DecisionKind::BudgetExhausted => "budget_exhausted",
            DecisionKind::Cancelled => "cancelled",
            DecisionKind::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy verdict, borrowing the attempt that triggered it
#[derive(Debug, PartialEq)]
pub enum TerminationDecision<'h, C> {
    Continue,
    SuccessThresholdMet(&'h Attempt<C>),
    PlateauDetected(&'h Attempt<C>),
    BudgetExhausted(&'h Attempt<C>),
}

impl<'h, C> TerminationDecision<'h, C> {
    pub fn kind(&self) -> DecisionKind {
        match self {
            TerminationDecision::Continue => DecisionKind::Continue,
            TerminationDecision::SuccessThresholdMet(_) => DecisionKind::SuccessThresholdMet,
            TerminationDecision::PlateauDetected(_) => DecisionKind::PlateauDetected,
            TerminationDecision::BudgetExhausted(_) => DecisionKind::BudgetExhausted,
        }
    }

    pub fn trigger(&self) -> Option<&'h Attempt<C>> {
        match *self {
            TerminationDecision::Continue => None,
            TerminationDecision::SuccessThresholdMet(attempt)
            | TerminationDecision::PlateauDetected(attempt)
            | TerminationDecision::BudgetExhausted(attempt) => Some(attempt),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind().is_terminal()
    }
}

/// Pure function over a history and the termination settings
#[derive(Debug, Clone, PartialEq)]
pub struct TerminationPolicy {
    pub success_threshold: f64,
    pub max_iterations: usize,
    pub plateau_window: usize,
    pub plateau_epsilon: f64,
}

impl TerminationPolicy {
    pub fn from_config(config: &RefinementConfig) -> Self {
        Self {
            success_threshold: config.success_threshold,
            max_iterations: config.max_iterations,
            plateau_window: config.plateau_window,
            plateau_epsilon: config.plateau_epsilon,
        }
    }

    pub fn evaluate<'h, C>(&self, history: &'h ScoreHistory<C>) -> TerminationDecision<'h, C> {
        let Some(latest) = history.latest() else {
            return TerminationDecision::Continue;
        };

        if latest.score >= self.success_threshold {
            return TerminationDecision::SuccessThresholdMet(latest);
        }

        if history.len() >= self.max_iterations {
            return TerminationDecision::BudgetExhausted(latest);
        }

        if self.is_plateau(history) {
            return TerminationDecision::PlateauDetected(latest);
        }

        TerminationDecision::Continue
    }

    /// Spread of the trailing window is within epsilon
    fn is_plateau<C>(&self, history: &ScoreHistory<C>) -> bool {
        if history.len() < self.plateau_window {
            return false;
        }

        let (min, max) = history.recent(self.plateau_window).fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(min, max), attempt| (min.min(attempt.score), max.max(attempt.score)),
        );

        max - min <= self.plateau_epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn history_from(scores: &[f64]) -> ScoreHistory<()> {
        let mut history = ScoreHistory::new();
        for (i, score) in scores.iter().enumerate() {
            history.append(Attempt::new(i + 1, (), *score, "")).unwrap();
        }
        history
    }

    fn policy(threshold: f64, max_iterations: usize) -> TerminationPolicy {
        TerminationPolicy::from_config(&RefinementConfig::new(threshold, max_iterations))
    }

    #[test]
    fn test_empty_history_continues() {
        let history = history_from(&[]);
        assert_eq!(policy(0.9, 5).evaluate(&history), TerminationDecision::Continue);
    }

    #[test]
    fn test_success_on_threshold() {
        let history = history_from(&[0.60, 0.75, 0.88, 0.92]);
        let decision = policy(0.9, 5).evaluate(&history);
        assert_eq!(decision.kind(), DecisionKind::SuccessThresholdMet);
        assert_eq!(decision.trigger().unwrap().iteration, 4);
    }

    #[test]
    fn test_success_is_inclusive() {
        let history = history_from(&[0.9]);
        assert_eq!(
            policy(0.9, 5).evaluate(&history).kind(),
            DecisionKind::SuccessThresholdMet
        );
    }

    #[test]
    fn test_budget_exhausted() {
        let history = history_from(&[0.60, 0.75, 0.88]);
        let decision = policy(0.9, 3).evaluate(&history);
        assert_eq!(decision.kind(), DecisionKind::BudgetExhausted);
        assert_eq!(decision.trigger().unwrap().iteration, 3);
    }

    #[test]
    fn test_success_beats_exhaustion_on_final_iteration() {
        let history = history_from(&[0.5, 0.6, 0.95]);
        assert_eq!(
            policy(0.9, 3).evaluate(&history).kind(),
            DecisionKind::SuccessThresholdMet
        );
    }

    #[test]
    fn test_exhaustion_beats_plateau() {
        let history = history_from(&[0.5, 0.5, 0.5]);
        assert_eq!(
            policy(0.9, 3).evaluate(&history).kind(),
            DecisionKind::BudgetExhausted
        );
    }

    #[test]
    fn test_success_beats_plateau() {
        let history = history_from(&[0.95, 0.95, 0.95]);
        let policy = TerminationPolicy::from_config(
            &RefinementConfig::new(0.9, 10).with_plateau(3, 0.0),
        );
        assert_eq!(
            policy.evaluate(&history).kind(),
            DecisionKind::SuccessThresholdMet
        );
    }

    #[test]
    fn test_exact_plateau() {
        let history = history_from(&[0.70, 0.82, 0.82, 0.82]);
        let decision = policy(0.9, 5).evaluate(&history);
        assert_eq!(decision.kind(), DecisionKind::PlateauDetected);
        assert_eq!(decision.trigger().unwrap().iteration, 4);
    }

    #[test]
    fn test_plateau_needs_full_window() {
        let history = history_from(&[0.82, 0.82]);
        assert_eq!(policy(0.9, 5).evaluate(&history).kind(), DecisionKind::Continue);
    }

    #[test]
    fn test_single_noisy_step_is_not_plateau() {
        let history = history_from(&[0.70, 0.82, 0.82]);
        assert_eq!(policy(0.9, 5).evaluate(&history).kind(), DecisionKind::Continue);
    }

    #[test]
    fn test_plateau_with_tolerance() {
        let history = history_from(&[0.5, 0.77, 0.79, 0.79]);
        let strict = policy(0.9, 10);
        let tolerant = TerminationPolicy::from_config(
            &RefinementConfig::new(0.9, 10).with_plateau(3, 0.05),
        );
        assert_eq!(strict.evaluate(&history).kind(), DecisionKind::Continue);
        assert_eq!(
            tolerant.evaluate(&history).kind(),
            DecisionKind::PlateauDetected
        );
    }

    #[test]
    fn test_decision_kind_serialization() {
        let json = serde_json::to_string(&DecisionKind::PlateauDetected).unwrap();
        assert_eq!(json, "\"plateau_detected\"");
        assert_eq!(DecisionKind::BudgetExhausted.to_string(), "budget_exhausted");
        assert!(!DecisionKind::Continue.is_terminal());
        assert!(DecisionKind::Cancelled.is_terminal());
    }

    proptest! {
        #[test]
        fn success_is_never_masked(
            prefix in proptest::collection::vec(0.0f64..0.9, 0..8),
            winning in 0.9f64..=1.0,
            window in 2usize..5,
        ) {
            let mut scores = prefix.clone();
            scores.push(winning);
            let history = history_from(&scores);
            let policy = TerminationPolicy::from_config(
                &RefinementConfig::new(0.9, scores.len()).with_plateau(window, 1.0),
            );
            prop_assert_eq!(policy.evaluate(&history).kind(), DecisionKind::SuccessThresholdMet);
        }

        #[test]
        fn below_threshold_at_budget_is_exhaustion(
            scores in proptest::collection::vec(0.0f64..0.9, 1..10),
        ) {
            let history = history_from(&scores);
            let policy = TerminationPolicy::from_config(&RefinementConfig::new(0.9, scores.len()));
            prop_assert_eq!(policy.evaluate(&history).kind(), DecisionKind::BudgetExhausted);
        }
    }
}
