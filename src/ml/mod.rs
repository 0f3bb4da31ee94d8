//! Learning algorithms behind the two workbench engines.
//!
//! Everything here is a pure function of its inputs; state and scheduling
//! live in `engine` and `training`.

pub mod knn;
pub mod logreg;
pub mod metrics;
