//! Scripted collaborators
//!
//! Replays a fixed sequence of scores through the loop. The CLI `simulate`
//! command uses these to exercise termination settings without a model behind
//! them.

use crate::error::CollaboratorError;
use crate::history::Attempt;
use crate::refinement::{Evaluation, Producer, Scorer};
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

/// Produces `"<task> (attempt N)"` candidates and records the feedback it was given
#[derive(Debug, Clone)]
pub struct ScriptedProducer {
    task: String,
    delay: Option<Duration>,
    received_feedback: Vec<Option<String>>,
}

impl ScriptedProducer {
    pub fn new<S: Into<String>>(task: S) -> Self {
        Self {
            task: task.into(),
            delay: None,
            received_feedback: Vec::new(),
        }
    }

    /// Sleep before every candidate, simulating a slow generator
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Feedback passed in on each call, in call order
    pub fn received_feedback(&self) -> &[Option<String>] {
        &self.received_feedback
    }

    pub fn calls(&self) -> usize {
        self.received_feedback.len()
    }
}

#[async_trait]
impl Producer for ScriptedProducer {
    type Candidate = String;

    async fn produce(
        &mut self,
        previous: Option<&Attempt<String>>,
        feedback: Option<&str>,
    ) -> Result<String, CollaboratorError> {
        self.received_feedback.push(feedback.map(str::to_string));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let attempt = previous.map_or(1, |previous| previous.iteration + 1);
        debug!(attempt, "Scripted producer emitting candidate");
        Ok(format!("{} (attempt {attempt})", self.task))
    }
}

/// Returns scripted scores in order; fails once the script runs out
#[derive(Debug, Clone)]
pub struct ScriptedScorer {
    scores: VecDeque<f64>,
    feedback: VecDeque<String>,
    delay: Option<Duration>,
    calls: usize,
}

impl ScriptedScorer {
    pub fn new(scores: Vec<f64>) -> Self {
        Self {
            scores: scores.into(),
            feedback: VecDeque::new(),
            delay: None,
            calls: 0,
        }
    }

    /// Feedback lines paired with the scores; missing lines get a generic note
    pub fn with_feedback(mut self, feedback: Vec<String>) -> Self {
        self.feedback = feedback.into();
        self
    }

    /// Sleep before every score, simulating a slow evaluator
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn remaining(&self) -> usize {
        self.scores.len()
    }
}

#[async_trait]
impl Scorer<String> for ScriptedScorer {
    async fn score(&mut self, candidate: &String) -> Result<Evaluation, CollaboratorError> {
        self.calls += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let score = self
            .scores
            .pop_front()
            .ok_or_else(|| format!("score script exhausted after {} call(s)", self.calls - 1))?;
        let feedback = self
            .feedback
            .pop_front()
            .unwrap_or_else(|| format!("Scored {score} for {candidate}"));

        Ok(Evaluation::new(score, feedback).with_metadata("scripted_call", json!(self.calls)))
    }
}

/// Parse a comma-separated score list such as `0.6,0.75,0.88`
pub fn parse_scores(input: &str) -> Result<Vec<f64>, String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<f64>()
                .map_err(|e| format!("invalid score '{part}': {e}"))
        })
        .collect()
}
