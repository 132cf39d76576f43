//! Testing utilities and mock collaborators
//!
//! Mock producers and scorers for exercising failure and cancellation paths
//! of the refinement loop without a real generator or evaluator.

pub mod mocks;

pub use mocks::*;
