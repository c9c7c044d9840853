//! HTTP handlers

pub mod feedback;
pub mod health;
pub mod ingest;
pub mod thresholds;
pub mod weather;

pub use feedback::*;
pub use health::*;
pub use ingest::*;
pub use thresholds::*;
pub use weather::*;
