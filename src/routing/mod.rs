//! Strategy routing
//!
//! Decides how a task should be attacked (solve directly, iterate, ensemble,
//! decompose) from a complexity assessment. Tasks routed to
//! [`Strategy::UseIterativeRefiner`] are the ones driven through a
//! [`RefinementLoop`](crate::refinement::RefinementLoop).

pub mod complexity;

pub use complexity::{
    route, ComplexityAssessment, Recommendation, Strategy, DEFAULT_MIN_CONFIDENCE,
    FALLBACK_COMPLEXITY,
};
