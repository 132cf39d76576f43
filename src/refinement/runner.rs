//! Iteration driver
//!
//! One run processes iterations strictly in sequence: each producer call
//! depends on the feedback of the attempt before it. Independent runs share
//! nothing but the metrics collector.

use super::collaborator::{Producer, Scorer};
use super::control::RunControl;
use super::outcome::{LoopFailure, RefinementOutcome};
use crate::config::RefinementConfig;
use crate::error::{RefineError, RefineResult};
use crate::history::{Attempt, ScoreHistory};
use crate::observability::metrics::metrics;
use crate::policy::{DecisionKind, TerminationPolicy};
use crate::refinement_span;
use tokio::time::Instant;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

/// Drives producer/scorer rounds until the termination policy stops it
#[derive(Debug, Clone)]
pub struct RefinementLoop {
    config: RefinementConfig,
    policy: TerminationPolicy,
}

impl RefinementLoop {
    /// Validate the configuration and build a loop; fails before any iteration runs
    pub fn new(config: RefinementConfig) -> RefineResult<Self> {
        config.validate()?;
        let policy = TerminationPolicy::from_config(&config);
        Ok(Self { config, policy })
    }

    pub fn config(&self) -> &RefinementConfig {
        &self.config
    }

    pub fn policy(&self) -> &TerminationPolicy {
        &self.policy
    }

    /// Run with no cancellation flag and the configured timeout
    pub async fn run<P, S>(
        &self,
        producer: &mut P,
        scorer: &mut S,
    ) -> Result<RefinementOutcome<P::Candidate>, LoopFailure<P::Candidate>>
    where
        P: Producer + ?Sized,
        S: Scorer<P::Candidate> + ?Sized,
    {
        self.run_with(producer, scorer, RunControl::default()).await
    }

    /// Run with caller-supplied cancellation and deadline controls
    pub async fn run_with<P, S>(
        &self,
        producer: &mut P,
        scorer: &mut S,
        control: RunControl,
    ) -> Result<RefinementOutcome<P::Candidate>, LoopFailure<P::Candidate>>
    where
        P: Producer + ?Sized,
        S: Scorer<P::Candidate> + ?Sized,
    {
        let run_id = Uuid::new_v4();
        let span = refinement_span!(
            run_id = %run_id,
            success_threshold = self.config.success_threshold,
            max_iterations = self.config.max_iterations
        );

        self.drive(run_id, producer, scorer, control)
            .instrument(span)
            .await
    }

    async fn drive<P, S>(
        &self,
        run_id: Uuid,
        producer: &mut P,
        scorer: &mut S,
        control: RunControl,
    ) -> Result<RefinementOutcome<P::Candidate>, LoopFailure<P::Candidate>>
    where
        P: Producer + ?Sized,
        S: Scorer<P::Candidate> + ?Sized,
    {
        let started = Instant::now();
        let deadline = control
            .deadline
            .or_else(|| self.config.timeout())
            .and_then(|budget| started.checked_add(budget));
        let mut history = ScoreHistory::with_capacity(self.config.max_iterations.min(64));

        metrics().run_started();
        info!("Starting refinement run");

        loop {
            if control.is_cancelled() {
                info!(completed = history.len(), "Refinement run cancelled");
                return Ok(self.finish(run_id, DecisionKind::Cancelled, None, history, started));
            }

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                warn!(completed = history.len(), "Refinement deadline exceeded");
                return Ok(self.finish(
                    run_id,
                    DecisionKind::DeadlineExceeded,
                    None,
                    history,
                    started,
                ));
            }

            let iteration = history.next_iteration();
            let attempt = match self
                .iterate(iteration, &history, producer, scorer)
                .instrument(crate::iteration_span!(iteration))
                .await
            {
                Ok(attempt) => attempt,
                Err(error) => return Err(self.fail(run_id, error, history, started)),
            };

            if let Err(error) = history.append(attempt) {
                return Err(self.fail(run_id, error, history, started));
            }
            metrics().iteration_completed();

            let decision = self.policy.evaluate(&history);
            let kind = decision.kind();
            let triggered_at = decision.trigger().map(|attempt| attempt.iteration);

            if kind.is_terminal() {
                info!(iteration, decision = %kind, "Refinement run finished");
                return Ok(self.finish(run_id, kind, triggered_at, history, started));
            }
            debug!(iteration, "Continuing refinement");
        }
    }

    /// One producer call followed by one scorer call
    async fn iterate<P, S>(
        &self,
        iteration: usize,
        history: &ScoreHistory<P::Candidate>,
        producer: &mut P,
        scorer: &mut S,
    ) -> RefineResult<Attempt<P::Candidate>>
    where
        P: Producer + ?Sized,
        S: Scorer<P::Candidate> + ?Sized,
    {
        let previous = history.latest();
        let feedback = previous.map(|attempt| attempt.feedback.as_str());

        let candidate = producer
            .produce(previous, feedback)
            .await
            .map_err(|source| RefineError::producer_failed(iteration, source))?;

        let evaluation = scorer
            .score(&candidate)
            .await
            .map_err(|source| RefineError::scorer_failed(iteration, source))?;

        if !evaluation.score.is_finite() {
            return Err(RefineError::scorer_failed(
                iteration,
                format!("score {} is not a finite number", evaluation.score).into(),
            ));
        }

        let scale = self.config.scale;
        if !scale.contains(evaluation.score) {
            warn!(
                iteration,
                score = evaluation.score,
                min = scale.min,
                max = scale.max,
                "Score outside configured scale"
            );
            metrics().score_out_of_scale();
        }

        info!(iteration, score = evaluation.score, "Attempt scored");

        Ok(
            Attempt::new(iteration, candidate, evaluation.score, evaluation.feedback)
                .with_metadata(evaluation.metadata),
        )
    }

    fn finish<C>(
        &self,
        run_id: Uuid,
        decision: DecisionKind,
        triggered_at: Option<usize>,
        history: ScoreHistory<C>,
        started: Instant,
    ) -> RefinementOutcome<C> {
        let elapsed = started.elapsed();
        metrics().run_finished(decision, elapsed);

        RefinementOutcome {
            run_id,
            decision,
            triggered_at,
            best_iteration: history.best().map(|attempt| attempt.iteration),
            history,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }

    fn fail<C>(
        &self,
        run_id: Uuid,
        error: RefineError,
        history: ScoreHistory<C>,
        started: Instant,
    ) -> LoopFailure<C> {
        if let RefineError::CollaboratorFailure { stage, .. } = &error {
            metrics().collaborator_failed(*stage);
        }
        metrics().run_failed(started.elapsed());
        warn!(completed = history.len(), error = %error, "Refinement run failed");

        LoopFailure {
            run_id,
            error,
            history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoreScale;
    use crate::error::CollaboratorError;
    use crate::refinement::collaborator::Evaluation;
    use async_trait::async_trait;
    use std::collections::VecDeque;

    /// Produces "v{n}" and remembers the feedback it received
    #[derive(Default)]
    struct EchoProducer {
        seen_feedback: Vec<Option<String>>,
    }

    #[async_trait]
    impl Producer for EchoProducer {
        type Candidate = String;

        async fn produce(
            &mut self,
            previous: Option<&Attempt<String>>,
            feedback: Option<&str>,
        ) -> Result<String, CollaboratorError> {
            self.seen_feedback.push(feedback.map(str::to_string));
            let next = previous.map_or(1, |attempt| attempt.iteration + 1);
            Ok(format!("v{next}"))
        }
    }

    struct QueueScorer(VecDeque<f64>);

    impl QueueScorer {
        fn new(scores: &[f64]) -> Self {
            Self(scores.iter().copied().collect())
        }
    }

    #[async_trait]
    impl Scorer<String> for QueueScorer {
        async fn score(&mut self, candidate: &String) -> Result<Evaluation, CollaboratorError> {
            let score = self.0.pop_front().ok_or("no scores left")?;
            Ok(Evaluation::new(score, format!("feedback for {candidate}")))
        }
    }

    #[tokio::test]
    async fn test_rejects_invalid_config() {
        let result = RefinementLoop::new(RefinementConfig::new(0.9, 5).with_plateau(1, 0.0));
        assert!(matches!(result, Err(RefineError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_feedback_threads_into_next_iteration() {
        let refinement = RefinementLoop::new(RefinementConfig::new(0.9, 5)).unwrap();
        let mut producer = EchoProducer::default();
        let mut scorer = QueueScorer::new(&[0.5, 0.95]);

        let outcome = refinement.run(&mut producer, &mut scorer).await.unwrap();

        assert_eq!(outcome.decision, DecisionKind::SuccessThresholdMet);
        assert_eq!(
            producer.seen_feedback,
            vec![None, Some("feedback for v1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_non_finite_score_is_scorer_failure() {
        let refinement = RefinementLoop::new(RefinementConfig::new(0.9, 5)).unwrap();
        let mut producer = EchoProducer::default();
        let mut scorer = QueueScorer::new(&[0.4, f64::NAN]);

        let failure = refinement.run(&mut producer, &mut scorer).await.unwrap_err();

        assert_eq!(failure.iteration(), Some(2));
        assert_eq!(failure.history.len(), 1);
        assert!(failure.error.to_string().contains("scorer"));
    }

    #[tokio::test]
    async fn test_out_of_scale_score_is_recorded() {
        let config = RefinementConfig::new(9.0, 3).with_scale(ScoreScale::TEN_POINT);
        let refinement = RefinementLoop::new(config).unwrap();
        let mut producer = EchoProducer::default();
        let mut scorer = QueueScorer::new(&[0.5, 12.0]);

        let outcome = refinement.run(&mut producer, &mut scorer).await.unwrap();

        assert_eq!(outcome.decision, DecisionKind::SuccessThresholdMet);
        assert_eq!(outcome.history.scores(), vec![0.5, 12.0]);
        assert_eq!(outcome.best_iteration, Some(2));
    }

    #[tokio::test]
    async fn test_out_of_scale_score_is_reported() {
        let config = RefinementConfig::new(0.9, 2);
        let refinement = RefinementLoop::new(config).unwrap();
        let mut producer = EchoProducer::default();
        let mut scorer = QueueScorer::new(&[-0.5, 0.3]);

        let before = metrics().get_metrics().iterations.out_of_scale_scores;
        let outcome = refinement.run(&mut producer, &mut scorer).await.unwrap();
        let after = metrics().get_metrics().iterations.out_of_scale_scores;

        assert_eq!(outcome.decision, DecisionKind::BudgetExhausted);
        assert!(after > before, "out-of-scale counter did not move");
    }

    #[tokio::test]
    async fn test_huge_budget_is_not_preallocated() {
        let refinement = RefinementLoop::new(RefinementConfig::new(0.9, usize::MAX)).unwrap();
        let mut producer = EchoProducer::default();
        let mut scorer = QueueScorer::new(&[0.95]);

        let outcome = refinement.run(&mut producer, &mut scorer).await.unwrap();

        assert_eq!(outcome.decision, DecisionKind::SuccessThresholdMet);
        assert_eq!(outcome.iterations(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_timeout_means_no_deadline() {
        let config = RefinementConfig::new(0.9, 3).with_timeout_secs(u64::MAX);
        let refinement = RefinementLoop::new(config).unwrap();
        let mut producer = EchoProducer::default();
        let mut scorer = QueueScorer::new(&[0.95]);

        let outcome = refinement.run(&mut producer, &mut scorer).await.unwrap();
        assert_eq!(outcome.decision, DecisionKind::SuccessThresholdMet);

        let mut scorer = QueueScorer::new(&[0.2, 0.95]);
        let outcome = refinement
            .run_with(
                &mut producer,
                &mut scorer,
                RunControl::new().with_deadline(std::time::Duration::MAX),
            )
            .await
            .unwrap();
        assert_eq!(outcome.decision, DecisionKind::SuccessThresholdMet);
        assert_eq!(outcome.iterations(), 2);
    }
}
