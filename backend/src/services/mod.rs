//! Services behind the HTTP handlers

pub mod analysis;
pub mod feedback;
pub mod ingestion;
pub mod poller;
pub mod thresholds;

pub use analysis::AnalysisService;
pub use feedback::FeedbackService;
pub use ingestion::IngestionCoordinator;
pub use thresholds::ThresholdStore;
