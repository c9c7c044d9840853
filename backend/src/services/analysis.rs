//! Error patterns and threshold recommendations

use std::sync::Arc;

use serde::Serialize;
use shared::aggregation::aggregate;
use shared::models::{ErrorPattern, Recommendation};
use shared::recommendation::RecommendationEngine;

use crate::error::AppResult;
use crate::repository::ReadingRepository;
use crate::services::thresholds::ThresholdStore;

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationReport {
    pub min_evidence: usize,
    /// Revision of the threshold set the suggestions are relative to
    pub revision: String,
    pub patterns_considered: usize,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Clone)]
pub struct AnalysisService {
    readings: Arc<dyn ReadingRepository>,
    thresholds: Arc<ThresholdStore>,
    engine: RecommendationEngine,
}

impl AnalysisService {
    pub fn new(
        readings: Arc<dyn ReadingRepository>,
        thresholds: Arc<ThresholdStore>,
        min_evidence: usize,
    ) -> Self {
        Self {
            readings,
            thresholds,
            engine: RecommendationEngine::new(min_evidence),
        }
    }

    pub async fn patterns(&self) -> AppResult<Vec<ErrorPattern>> {
        let wrong = self.readings.labelled_wrong().await?;
        Ok(aggregate(&wrong))
    }

    pub async fn recommendations(&self) -> AppResult<RecommendationReport> {
        let patterns = self.patterns().await?;
        let current = self.thresholds.current();
        let recommendations = self.engine.recommend(&patterns, &current.thresholds);

        tracing::debug!(
            "{} recommendation(s) from {} pattern(s)",
            recommendations.len(),
            patterns.len()
        );

        Ok(RecommendationReport {
            min_evidence: self.engine.min_evidence(),
            revision: current.revision.clone(),
            patterns_considered: patterns.len(),
            recommendations,
        })
    }
}
