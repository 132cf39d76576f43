//! Iterative refinement with convergence and plateau detection
//!
//! A [`RefinementLoop`] alternates between an external [`Producer`] and
//! [`Scorer`], appends each scored [`Attempt`](crate::history::Attempt) to its
//! history and consults the [`TerminationPolicy`](crate::policy::TerminationPolicy)
//! after every iteration.
//!
//! ```no_run
//! use refine_loop::config::RefinementConfig;
//! use refine_loop::refinement::RefinementLoop;
//! use refine_loop::replay::{ScriptedProducer, ScriptedScorer};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let refinement = RefinementLoop::new(RefinementConfig::new(0.9, 5))?;
//! let mut producer = ScriptedProducer::new("rate limiter");
//! let mut scorer = ScriptedScorer::new(vec![0.60, 0.75, 0.88, 0.92]);
//!
//! let outcome = refinement.run(&mut producer, &mut scorer).await?;
//! assert!(outcome.succeeded());
//! assert_eq!(outcome.best().map(|a| a.iteration), Some(4));
//! # Ok(())
//! # }
//! ```

pub mod collaborator;
pub mod control;
pub mod outcome;
pub mod runner;

pub use collaborator::{Evaluation, Producer, Scorer};
pub use control::{CancellationFlag, RunControl};
pub use outcome::{LoopFailure, RefinementOutcome};
pub use runner::RefinementLoop;
