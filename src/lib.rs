//! refine-loop - iterative refinement with convergence and plateau detection
//!
//! Drives a caller-supplied producer and scorer in rounds, keeps an
//! append-only history of scored attempts and stops on the first of:
//! success threshold met, iteration budget exhausted, or score plateau.
//! Cancellation and deadlines are honored between iterations.
//!
//! # Overview
//!
//! - [`history`] - attempts and the append-only score history
//! - [`policy`] - the termination policy and its decisions
//! - [`refinement`] - collaborator traits and the loop driver
//! - [`recovery`] - follow-up advice for finished runs
//! - [`routing`] - strategy selection from complexity assessments
//! - [`replay`] - scripted collaborators for simulations
//!
//! # Quick Start
//!
//! ```rust
//! use refine_loop::history::{Attempt, ScoreHistory};
//! use refine_loop::policy::{DecisionKind, TerminationPolicy};
//! use refine_loop::config::RefinementConfig;
//!
//! let config = RefinementConfig::new(0.9, 5);
//! let policy = TerminationPolicy::from_config(&config);
//!
//! let mut history = ScoreHistory::new();
//! for (i, score) in [0.70, 0.82, 0.82, 0.82].into_iter().enumerate() {
//!     history.append(Attempt::new(i + 1, (), score, "")).unwrap();
//! }
//!
//! let decision = policy.evaluate(&history);
//! assert_eq!(decision.kind(), DecisionKind::PlateauDetected);
//! assert_eq!(history.best().unwrap().iteration, 2);
//! ```

pub mod config;
pub mod error;
pub mod history;
pub mod observability;
pub mod policy;
pub mod recovery;
pub mod refinement;
pub mod replay;
pub mod routing;
pub mod testing;

pub use config::{ConfigError, RefinementConfig, ScoreScale};
pub use error::{CollaboratorError, CollaboratorStage, RefineError, RefineResult};
pub use history::{Attempt, ScoreHistory};
pub use policy::{DecisionKind, TerminationDecision, TerminationPolicy};
pub use recovery::{RecoveryAction, RecoveryAdvice};
pub use refinement::{
    CancellationFlag, Evaluation, LoopFailure, Producer, RefinementLoop, RefinementOutcome,
    RunControl, Scorer,
};
