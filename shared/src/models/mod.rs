//! Domain models for the weather station

mod analysis;
mod condition;
mod reading;
mod snapshot;

pub use analysis::*;
pub use condition::*;
pub use reading::*;
pub use snapshot::*;
