//! Shared types and the condition engine for the weather station
//!
//! Everything in this crate is free of I/O: models, the threshold set, the
//! condition engine, and the feedback analysis that tunes it.

pub mod aggregation;
pub mod engine;
pub mod models;
pub mod psychrometrics;
pub mod recommendation;
pub mod snapshot_store;
pub mod thresholds;
pub mod types;
pub mod validation;

pub use models::*;
pub use thresholds::*;
pub use types::*;
pub use validation::*;
