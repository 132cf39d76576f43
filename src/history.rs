//! Append-only record of scored attempts
//!
//! A [`ScoreHistory`] is owned by exactly one refinement run. Attempts are
//! numbered from 1 and every append must carry the next number in sequence.

use crate::error::{RefineError, RefineResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One scored candidate produced during a single iteration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attempt<C> {
    /// 1-based iteration number
    pub iteration: usize,
    pub candidate: C,
    pub score: f64,
    /// Rationale from the scorer, handed to the producer on the next iteration
    pub feedback: String,
    /// Opaque scorer metadata, forwarded without interpretation
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub recorded_at: DateTime<Utc>,
}

impl<C> Attempt<C> {
    pub fn new<S: Into<String>>(iteration: usize, candidate: C, score: f64, feedback: S) -> Self {
        Self {
            iteration,
            candidate,
            score,
            feedback: feedback.into(),
            metadata: HashMap::new(),
            recorded_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Ordered, append-only sequence of attempts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ScoreHistory<C> {
    attempts: Vec<Attempt<C>>,
}

impl<C> Default for ScoreHistory<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> ScoreHistory<C> {
    pub fn new() -> Self {
        Self {
            attempts: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            attempts: Vec::with_capacity(capacity),
        }
    }

    /// Iteration number the next appended attempt must carry
    pub fn next_iteration(&self) -> usize {
        self.attempts.len() + 1
    }

    /// Append an attempt, rejecting skipped or repeated iteration numbers
    pub fn append(&mut self, attempt: Attempt<C>) -> RefineResult<()> {
        let expected = self.next_iteration();
        if attempt.iteration != expected {
            return Err(RefineError::invariant_violation(format!(
                "attempt iteration {} appended where iteration {} was expected",
                attempt.iteration, expected
            )));
        }
        self.attempts.push(attempt);
        Ok(())
    }

    /// Last `n` attempts in iteration order (fewer if the history is shorter)
    ///
    /// The returned iterator is `Clone`, so it can be restarted.
    pub fn recent(&self, n: usize) -> std::slice::Iter<'_, Attempt<C>> {
        let start = self.attempts.len().saturating_sub(n);
        self.attempts[start..].iter()
    }

    /// Highest-scoring attempt; the earliest one wins ties
    pub fn best(&self) -> Option<&Attempt<C>> {
        self.attempts.iter().fold(None, |best, attempt| match best {
            Some(current) if current.score >= attempt.score => Some(current),
            _ => Some(attempt),
        })
    }

    pub fn latest(&self) -> Option<&Attempt<C>> {
        self.attempts.last()
    }

    /// Attempt recorded for a 1-based iteration number
    pub fn get(&self, iteration: usize) -> Option<&Attempt<C>> {
        iteration
            .checked_sub(1)
            .and_then(|index| self.attempts.get(index))
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attempt<C>> {
        self.attempts.iter()
    }

    pub fn scores(&self) -> Vec<f64> {
        self.attempts.iter().map(|a| a.score).collect()
    }

    pub fn as_slice(&self) -> &[Attempt<C>] {
        &self.attempts
    }

    pub fn into_attempts(self) -> Vec<Attempt<C>> {
        self.attempts
    }
}

impl<'a, C> IntoIterator for &'a ScoreHistory<C> {
    type Item = &'a Attempt<C>;
    type IntoIter = std::slice::Iter<'a, Attempt<C>>;

    fn into_iter(self) -> Self::IntoIter {
        self.attempts.iter()
    }
}
