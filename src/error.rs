//! Error types for the ambient edges of the optimizer.
//!
//! The cost-based planner itself is total (see crate-level docs): `optimize`
//! and `build_naive_plan` never fail. This error belongs to the one ambient
//! surface that can fail before a query even exists to plan — the fluent
//! [`crate::query::Query`] builder.

use thiserror::Error;

/// Errors raised by the fluent [`crate::query::Query`] builder.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryBuildError {
    #[error("join() called before from_table(): no base table to join against")]
    JoinBeforeFromTable,
}
