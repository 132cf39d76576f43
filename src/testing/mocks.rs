//! Mock implementations for testing
//!
//! Provides producers and scorers that fail, cancel or count calls on demand.

use crate::error::CollaboratorError;
use crate::history::Attempt;
use crate::refinement::{CancellationFlag, Evaluation, Producer, Scorer};
use async_trait::async_trait;

/// Producer that succeeds until a chosen call, then fails
#[derive(Debug, Default)]
pub struct MockProducer {
    /// 1-based call that returns an error
    pub fail_on_call: Option<usize>,
    /// Flag flipped right after the given call returns
    pub cancel_after_call: Option<(usize, CancellationFlag)>,
    pub calls: usize,
}

impl MockProducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Default::default()
        }
    }

    pub fn cancelling_after(call: usize, flag: CancellationFlag) -> Self {
        Self {
            cancel_after_call: Some((call, flag)),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Producer for MockProducer {
    type Candidate = String;

    async fn produce(
        &mut self,
        _previous: Option<&Attempt<String>>,
        _feedback: Option<&str>,
    ) -> Result<String, CollaboratorError> {
        self.calls += 1;
        if self.fail_on_call == Some(self.calls) {
            return Err(format!("Mock producer failure on call {}", self.calls).into());
        }
        if let Some((call, flag)) = &self.cancel_after_call {
            if *call == self.calls {
                flag.cancel();
            }
        }
        Ok(format!("mock candidate {}", self.calls))
    }
}

/// Scorer that returns one fixed score, or fails on a chosen call
#[derive(Debug)]
pub struct MockScorer {
    pub score: f64,
    pub fail_on_call: Option<usize>,
    pub calls: usize,
}

impl MockScorer {
    pub fn constant(score: f64) -> Self {
        Self {
            score,
            fail_on_call: None,
            calls: 0,
        }
    }

    pub fn failing_on(call: usize) -> Self {
        Self {
            score: 0.5,
            fail_on_call: Some(call),
            calls: 0,
        }
    }
}

#[async_trait]
impl Scorer<String> for MockScorer {
    async fn score(&mut self, candidate: &String) -> Result<Evaluation, CollaboratorError> {
        self.calls += 1;
        if self.fail_on_call == Some(self.calls) {
            return Err(format!("Mock scorer failure on {candidate}").into());
        }
        Ok(Evaluation::new(self.score, format!("Mock feedback for {candidate}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_producer_fails_on_requested_call() {
        let mut producer = MockProducer::failing_on(2);
        assert!(producer.produce(None, None).await.is_ok());
        assert!(producer.produce(None, None).await.is_err());
        assert_eq!(producer.calls, 2);
    }

    #[tokio::test]
    async fn test_producer_cancels_after_call() {
        let flag = CancellationFlag::new();
        let mut producer = MockProducer::cancelling_after(1, flag.clone());
        producer.produce(None, None).await.unwrap();
        assert!(flag.is_cancelled());
    }

    #[tokio::test]
    async fn test_constant_scorer() {
        let mut scorer = MockScorer::constant(0.4);
        let evaluation = scorer.score(&"x".to_string()).await.unwrap();
        assert_eq!(evaluation.score, 0.4);
        assert_eq!(scorer.calls, 1);
    }
}
