//! Capability interfaces the refinement loop consumes
//!
//! Generation and evaluation (typically LLM-backed) live outside this crate.
//! The loop treats each call as one atomic, awaited step per iteration.

use crate::error::CollaboratorError;
use crate::history::Attempt;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Scorer verdict for one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: f64,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Evaluation {
    pub fn new<S: Into<String>>(score: f64, feedback: S) -> Self {
        Self {
            score,
            feedback: feedback.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata<K: Into<String>>(mut self, key: K, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Produces a candidate solution, refining the previous attempt when one exists
#[async_trait]
pub trait Producer: Send {
    type Candidate: Send + Sync;

    /// `previous` and `feedback` are `None` on the first iteration
    async fn produce(
        &mut self,
        previous: Option<&Attempt<Self::Candidate>>,
        feedback: Option<&str>,
    ) -> Result<Self::Candidate, CollaboratorError>;
}

/// Scores a candidate and explains the score
#[async_trait]
pub trait Scorer<C: Send + Sync>: Send {
    async fn score(&mut self, candidate: &C) -> Result<Evaluation, CollaboratorError>;
}
