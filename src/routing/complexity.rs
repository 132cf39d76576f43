//! Strategy selection from a complexity assessment
//!
//! An assessor rates a task on a 1-10 scale and recommends how to attack it.
//! Low-confidence assessments are routed back to the user before any work
//! starts. An assessment without a rating but with an actionable
//! recommendation proceeds on a medium-complexity assumption; everything else
//! maps onto one execution strategy.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Minimum confidence below which an assessment is not acted on
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.5;

/// Complexity assumed when the assessor returned no rating
pub const FALLBACK_COMPLEXITY: f64 = 5.0;

/// Assessor recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Recommendation {
    SolveDirectly,
    SinglePassWithReview,
    IterativeRefinement,
    Ensemble,
    Decompose,
    ClarifyRequirements,
    CannotAssess,
}

/// Complexity assessment as returned by an assessor agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityAssessment {
    /// 1-10 rating; absent when the assessor could not rate the task
    pub complexity_score: Option<f64>,
    pub confidence: f64,
    pub recommendation: Recommendation,
    #[serde(default)]
    pub reasoning: String,
    /// Clarifying questions for the user
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<String>,
    /// Context the assessor needs before it can rate the task
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_context: Vec<String>,
}

impl ComplexityAssessment {
    /// Rated complexity, or [`FALLBACK_COMPLEXITY`] when unrated
    pub fn effective_complexity(&self) -> f64 {
        self.complexity_score.unwrap_or(FALLBACK_COMPLEXITY)
    }
}

/// Execution strategy chosen for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    ExecuteImmediately,
    ImplementAndReview,
    UseIterativeRefiner,
    UseEnsembleCoordinator,
    BreakIntoSubtasks,
    ClarifyWithUser,
    ProvideContext,
    /// Rating failed; proceed assuming medium complexity
    UseBestJudgment,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::ExecuteImmediately => "execute_immediately",
            Strategy::ImplementAndReview => "implement_and_review",
            Strategy::UseIterativeRefiner => "use_iterative_refiner",
            Strategy::UseEnsembleCoordinator => "use_ensemble_coordinator",
            Strategy::BreakIntoSubtasks => "break_into_subtasks",
            Strategy::ClarifyWithUser => "clarify_with_user",
            Strategy::ProvideContext => "provide_context",
            Strategy::UseBestJudgment => "use_best_judgment",
        };
        f.write_str(name)
    }
}

/// Pick a strategy; confidence below `min_confidence` always asks the user first
pub fn route(assessment: &ComplexityAssessment, min_confidence: f64) -> Strategy {
    if assessment.confidence < min_confidence {
        warn!(
            confidence = assessment.confidence,
            min_confidence, "Low-confidence assessment, asking for clarification"
        );
        return Strategy::ClarifyWithUser;
    }

    let actionable = !matches!(
        assessment.recommendation,
        Recommendation::ClarifyRequirements | Recommendation::CannotAssess
    );
    if assessment.complexity_score.is_none() && actionable {
        warn!(
            recommendation = ?assessment.recommendation,
            fallback = FALLBACK_COMPLEXITY,
            "Assessment has no complexity rating, assuming medium complexity"
        );
        return Strategy::UseBestJudgment;
    }

    let strategy = match assessment.recommendation {
        Recommendation::SolveDirectly => Strategy::ExecuteImmediately,
        Recommendation::SinglePassWithReview => Strategy::ImplementAndReview,
        Recommendation::IterativeRefinement => Strategy::UseIterativeRefiner,
        Recommendation::Ensemble => Strategy::UseEnsembleCoordinator,
        Recommendation::Decompose => Strategy::BreakIntoSubtasks,
        Recommendation::ClarifyRequirements => Strategy::ClarifyWithUser,
        Recommendation::CannotAssess => Strategy::ProvideContext,
    };

    debug!(
        recommendation = ?assessment.recommendation,
        strategy = %strategy,
        "Routed complexity assessment"
    );
    strategy
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assessment(recommendation: Recommendation, confidence: f64) -> ComplexityAssessment {
        ComplexityAssessment {
            complexity_score: Some(7.0),
            confidence,
            recommendation,
            reasoning: String::new(),
            questions: Vec::new(),
            required_context: Vec::new(),
        }
    }

    #[test]
    fn test_recommendations_map_to_strategies() {
        let cases = [
            (Recommendation::SolveDirectly, Strategy::ExecuteImmediately),
            (Recommendation::SinglePassWithReview, Strategy::ImplementAndReview),
            (Recommendation::IterativeRefinement, Strategy::UseIterativeRefiner),
            (Recommendation::Ensemble, Strategy::UseEnsembleCoordinator),
            (Recommendation::Decompose, Strategy::BreakIntoSubtasks),
            (Recommendation::ClarifyRequirements, Strategy::ClarifyWithUser),
            (Recommendation::CannotAssess, Strategy::ProvideContext),
        ];

        for (recommendation, expected) in cases {
            assert_eq!(
                route(&assessment(recommendation, 0.85), DEFAULT_MIN_CONFIDENCE),
                expected,
                "Failed for {recommendation:?}"
            );
        }
    }

    #[test]
    fn test_low_confidence_overrides_recommendation() {
        let low = assessment(Recommendation::IterativeRefinement, 0.3);
        assert_eq!(route(&low, DEFAULT_MIN_CONFIDENCE), Strategy::ClarifyWithUser);
    }

    #[test]
    fn test_confidence_at_minimum_is_trusted() {
        let edge = assessment(Recommendation::Ensemble, 0.5);
        assert_eq!(
            route(&edge, DEFAULT_MIN_CONFIDENCE),
            Strategy::UseEnsembleCoordinator
        );
    }

    #[test]
    fn test_deserializes_assessor_output() {
        let value = json!({
            "complexity_score": null,
            "confidence": 0.3,
            "recommendation": "clarify-requirements",
            "reasoning": "Task is too ambiguous to assess accurately",
            "questions": ["Which modules should this affect?"]
        });

        let parsed: ComplexityAssessment = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.complexity_score, None);
        assert_eq!(parsed.recommendation, Recommendation::ClarifyRequirements);
        assert_eq!(parsed.questions.len(), 1);
        assert!(parsed.required_context.is_empty());
    }

    #[test]
    fn test_unrated_actionable_assessment_uses_best_judgment() {
        let mut unrated = assessment(Recommendation::IterativeRefinement, 0.8);
        unrated.complexity_score = None;

        assert_eq!(route(&unrated, DEFAULT_MIN_CONFIDENCE), Strategy::UseBestJudgment);
        assert_eq!(unrated.effective_complexity(), FALLBACK_COMPLEXITY);
    }

    #[test]
    fn test_unrated_clarify_and_cannot_assess_keep_their_routes() {
        let mut clarify = assessment(Recommendation::ClarifyRequirements, 0.8);
        clarify.complexity_score = None;
        let mut missing = assessment(Recommendation::CannotAssess, 0.8);
        missing.complexity_score = None;

        assert_eq!(route(&clarify, DEFAULT_MIN_CONFIDENCE), Strategy::ClarifyWithUser);
        assert_eq!(route(&missing, DEFAULT_MIN_CONFIDENCE), Strategy::ProvideContext);
    }

    #[test]
    fn test_rated_assessment_keeps_its_score() {
        assert_eq!(
            assessment(Recommendation::Decompose, 0.9).effective_complexity(),
            7.0
        );
    }

    #[test]
    fn test_strategy_display_matches_serialization() {
        let json = serde_json::to_string(&Strategy::UseIterativeRefiner).unwrap();
        assert_eq!(json, format!("\"{}\"", Strategy::UseIterativeRefiner));
    }
}
