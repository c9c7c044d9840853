//! Threshold recommendations derived from error patterns
//!
//! Each tunable boundary between two adjacent conditions is listed in
//! [`BOUNDARIES`]. A pattern whose observed and corrected codes straddle a
//! boundary moves that boundary just past the pattern's mean, so the same
//! inputs would have produced the corrected code. Every suggestion is checked
//! by re-deriving the pattern's representative snapshot with the changed set.

use crate::engine;
use crate::models::{ErrorPattern, LinkedChange, PatternMetric, Recommendation, WmoCode};
use crate::thresholds::{ThresholdParam, ThresholdSet};

/// Patterns with fewer occurrences than this are ignored by default
pub const DEFAULT_MIN_EVIDENCE: usize = 3;

/// A threshold separating two groups of codes.
///
/// Inputs whose metric lies beyond the threshold (greater, for every entry
/// here) classify into `above`; the rest into `below`.
#[derive(Debug, Clone, Copy)]
pub struct Boundary {
    pub parameter: ThresholdParam,
    pub metric: PatternMetric,
    pub above: &'static [WmoCode],
    pub below: &'static [WmoCode],
    /// Second parameter on the same edge, kept equal to `parameter`
    pub linked: Option<ThresholdParam>,
}

impl Boundary {
    const fn with_linked(self, linked: ThresholdParam) -> Self {
        Boundary {
            linked: Some(linked),
            ..self
        }
    }

    /// `Some(true)` when the pattern was classified on the `above` side
    fn observed_above(&self, observed: WmoCode, corrected: WmoCode) -> Option<bool> {
        if self.above.contains(&observed) && self.below.contains(&corrected) {
            Some(true)
        } else if self.below.contains(&observed) && self.above.contains(&corrected) {
            Some(false)
        } else {
            None
        }
    }
}

const fn boundary(
    parameter: ThresholdParam,
    metric: PatternMetric,
    above: &'static [WmoCode],
    below: &'static [WmoCode],
) -> Boundary {
    Boundary {
        parameter,
        metric,
        above,
        below,
        linked: None,
    }
}

pub static BOUNDARIES: &[Boundary] = &[
    boundary(
        ThresholdParam::CloudClearDelta,
        PatternMetric::Delta,
        &[WmoCode::Clear],
        &[WmoCode::MainlyClear],
    ),
    boundary(
        ThresholdParam::CloudMainlyClearDelta,
        PatternMetric::Delta,
        &[WmoCode::MainlyClear],
        &[WmoCode::PartlyCloudy],
    ),
    boundary(
        ThresholdParam::CloudPartlyCloudyDelta,
        PatternMetric::Delta,
        &[WmoCode::PartlyCloudy],
        &[WmoCode::Overcast],
    ),
    boundary(
        ThresholdParam::DrizzleLightMaxRate,
        PatternMetric::PrecipRate,
        &[WmoCode::DrizzleModerate],
        &[WmoCode::DrizzleLight],
    ),
    boundary(
        ThresholdParam::DrizzleMaxRate,
        PatternMetric::PrecipRate,
        &[WmoCode::RainSlight],
        &[WmoCode::DrizzleModerate],
    ),
    boundary(
        ThresholdParam::RainLightMaxRate,
        PatternMetric::PrecipRate,
        &[WmoCode::RainModerate],
        &[WmoCode::RainSlight],
    ),
    boundary(
        ThresholdParam::RainModerateMaxRate,
        PatternMetric::PrecipRate,
        &[WmoCode::RainHeavy],
        &[WmoCode::RainModerate],
    ),
    boundary(
        ThresholdParam::FreezingDrizzleDenseRate,
        PatternMetric::PrecipRate,
        &[WmoCode::FreezingDrizzleDense],
        &[WmoCode::FreezingDrizzleLight],
    ),
    // Fog is humidity above fog_humidity_min, mist at or below
    // mist_humidity_max.
    boundary(
        ThresholdParam::FogHumidityMin,
        PatternMetric::Humidity,
        &[WmoCode::Fog],
        &[WmoCode::Mist],
    )
    .with_linked(ThresholdParam::MistHumidityMax),
    boundary(
        ThresholdParam::MistHumidityMin,
        PatternMetric::Humidity,
        &[WmoCode::Mist],
        &[WmoCode::PartlyCloudy, WmoCode::Overcast],
    ),
    boundary(
        ThresholdParam::HazeDeltaMin,
        PatternMetric::Delta,
        &[WmoCode::Haze],
        &[WmoCode::Clear, WmoCode::MainlyClear],
    ),
    boundary(
        ThresholdParam::SleetTempMax,
        PatternMetric::Temperature,
        &[WmoCode::RainSlight, WmoCode::RainModerate],
        &[WmoCode::SleetLight, WmoCode::SleetHeavy],
    ),
];

/// Find the boundary a pattern's codes straddle
pub fn boundary_for(observed: WmoCode, corrected: WmoCode) -> Option<(&'static Boundary, bool)> {
    BOUNDARIES.iter().find_map(|b| {
        b.observed_above(observed, corrected)
            .map(|observed_above| (b, observed_above))
    })
}

#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    min_evidence: usize,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_EVIDENCE)
    }
}

impl RecommendationEngine {
    pub fn new(min_evidence: usize) -> Self {
        Self {
            min_evidence: min_evidence.max(1),
        }
    }

    pub fn min_evidence(&self) -> usize {
        self.min_evidence
    }

    /// Suggest threshold changes for the given patterns.
    ///
    /// Only patterns with enough evidence, a known boundary and a usable mean
    /// contribute. A suggestion is dropped unless it lands on the corrected
    /// side of the mean and moves the threshold the same way, keeps the
    /// threshold set consistent, and turns the pattern's representative
    /// snapshot into the corrected code. Output is ordered by evidence,
    /// largest first.
    pub fn recommend(
        &self,
        patterns: &[ErrorPattern],
        thresholds: &ThresholdSet,
    ) -> Vec<Recommendation> {
        let mut recommendations: Vec<Recommendation> = patterns
            .iter()
            .filter(|p| p.count >= self.min_evidence)
            .filter_map(|p| self.recommend_one(p, thresholds))
            .collect();

        recommendations.sort_by(|a, b| b.evidence_count.cmp(&a.evidence_count));
        recommendations
    }

    fn recommend_one(
        &self,
        pattern: &ErrorPattern,
        thresholds: &ThresholdSet,
    ) -> Option<Recommendation> {
        let observed = pattern.observed_code?;
        let (boundary, observed_above) = boundary_for(observed, pattern.corrected_code)?;
        let mean = pattern.mean(boundary.metric)?;
        let snapshot = pattern.representative_snapshot()?;

        let param = boundary.parameter;
        let margin = boundary.metric.safety_margin();
        let raw = if observed_above {
            mean + margin
        } else {
            mean - margin
        };
        let (min, max) = param.valid_range();
        let suggested = round_to_step(raw, param.step()).clamp(min, max);
        let current = thresholds.get(param);

        let moves_correctly = if observed_above {
            suggested > mean && suggested > current
        } else {
            suggested < mean && suggested < current
        };
        if !moves_correctly {
            return None;
        }

        let mut updated = thresholds.with_value(param, suggested).ok()?;
        let mut linked_changes = Vec::new();
        if let Some(linked) = boundary.linked {
            updated = updated.with_value(linked, suggested).ok()?;
            let linked_current = thresholds.get(linked);
            if linked_current != suggested {
                linked_changes.push(LinkedChange {
                    parameter_name: linked,
                    current_value: linked_current,
                    suggested_value: suggested,
                });
            }
        }

        if engine::derive(&snapshot, &updated).code != Some(pattern.corrected_code) {
            return None;
        }

        Some(Recommendation {
            parameter_name: param,
            current_value: current,
            suggested_value: suggested,
            metric: boundary.metric,
            linked_changes,
            supporting_pattern: pattern.clone(),
            evidence_count: pattern.count,
        })
    }
}

fn round_to_step(value: f64, step: f64) -> f64 {
    let factor = (1.0 / step).round();
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    /// Dry, mostly clear conditions; tests override the means they need.
    fn pattern(observed: WmoCode, corrected: WmoCode, count: usize) -> ErrorPattern {
        ErrorPattern {
            observed_code: Some(observed),
            corrected_code: corrected,
            count,
            mean_temperature: Some(10.0),
            mean_humidity: Some(70.0),
            mean_delta: Some(20.0),
            mean_precip_rate: Some(0.0),
            mean_spread: Some(5.0),
            mean_wind_speed: None,
            first_seen: Utc::now(),
            last_seen: Utc::now(),
        }
    }

    fn near_saturation(observed: WmoCode, corrected: WmoCode, humidity: f64) -> ErrorPattern {
        ErrorPattern {
            mean_temperature: Some(6.0),
            mean_humidity: Some(humidity),
            mean_delta: Some(2.0),
            mean_spread: Some(0.5),
            ..pattern(observed, corrected, 3)
        }
    }

    #[test]
    fn test_boundaries_are_unambiguous() {
        for observed in WmoCode::ALL {
            for corrected in WmoCode::ALL {
                let hits = BOUNDARIES
                    .iter()
                    .filter(|b| b.observed_above(observed, corrected).is_some())
                    .count();
                assert!(hits <= 1, "{} -> {} matches {} boundaries", observed, corrected, hits);
            }
        }
    }

    #[test]
    fn test_mist_corrected_to_fog_lowers_fog_humidity() {
        let engine = RecommendationEngine::default();
        let recs = engine.recommend(
            &[near_saturation(WmoCode::Mist, WmoCode::Fog, 96.0)],
            &ThresholdSet::default(),
        );
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].parameter_name, ThresholdParam::FogHumidityMin);
        assert_eq!(recs[0].current_value, 97.0);
        assert_eq!(recs[0].suggested_value, 95.0);
        assert_eq!(recs[0].evidence_count, 3);
        assert_eq!(
            recs[0].linked_changes,
            vec![LinkedChange {
                parameter_name: ThresholdParam::MistHumidityMax,
                current_value: 97.0,
                suggested_value: 95.0,
            }]
        );
    }

    #[test]
    fn test_fog_corrected_to_mist_moves_both_humidity_edges() {
        let mut p = near_saturation(WmoCode::Fog, WmoCode::Mist, 98.5);
        p.mean_temperature = Some(5.0);
        p.mean_spread = Some(0.2);
        let recs = RecommendationEngine::default().recommend(&[p.clone()], &ThresholdSet::default());
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].suggested_value, 99.5);

        let changes = recs[0].changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[1].parameter, "mist_humidity_max");
        assert_eq!(changes[1].value, 99.5);

        let outcome = ThresholdSet::default().apply_changes(&changes);
        assert!(outcome.rejected.is_empty());
        let snapshot = p.representative_snapshot().unwrap();
        assert_eq!(
            engine::derive(&snapshot, &outcome.thresholds).code,
            Some(WmoCode::Mist)
        );
    }

    #[test]
    fn test_haze_corrected_to_clear_needs_clear_sky_delta() {
        let mut below_clear = pattern(WmoCode::Haze, WmoCode::Clear, 5);
        below_clear.mean_humidity = Some(50.0);
        below_clear.mean_delta = Some(20.0);
        let recs = RecommendationEngine::default().recommend(&[below_clear], &ThresholdSet::default());
        assert!(recs.is_empty());

        let mut clear = pattern(WmoCode::Haze, WmoCode::Clear, 5);
        clear.mean_humidity = Some(50.0);
        clear.mean_delta = Some(30.0);
        let recs = RecommendationEngine::default().recommend(&[clear], &ThresholdSet::default());
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].parameter_name, ThresholdParam::HazeDeltaMin);
        assert_eq!(recs[0].suggested_value, 31.0);
    }

    #[test]
    fn test_evidence_floor() {
        let engine = RecommendationEngine::new(3);
        let mut p = near_saturation(WmoCode::Mist, WmoCode::Fog, 96.0);
        p.count = 2;
        let recs = engine.recommend(&[p], &ThresholdSet::default());
        assert!(recs.is_empty());
    }

    #[test]
    fn test_unmapped_pair_ignored() {
        let engine = RecommendationEngine::default();
        let recs = engine.recommend(
            &[pattern(WmoCode::Clear, WmoCode::SnowHeavy, 10)],
            &ThresholdSet::default(),
        );
        assert!(recs.is_empty());
    }

    #[test]
    fn test_clear_corrected_to_mainly_clear_raises_threshold() {
        let mut p = pattern(WmoCode::Clear, WmoCode::MainlyClear, 4);
        p.mean_delta = Some(26.24);
        let recs = RecommendationEngine::default().recommend(&[p], &ThresholdSet::default());
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].parameter_name, ThresholdParam::CloudClearDelta);
        assert_eq!(recs[0].suggested_value, 27.2);
        assert_eq!(recs[0].metric, PatternMetric::Delta);
        assert!(recs[0].linked_changes.is_empty());
    }

    #[test]
    fn test_suggestion_not_improving_is_dropped() {
        // Clear at delta 30 corrected to haze: lowering haze_delta_min to 29
        // would not move it below the current 15.
        let mut p = pattern(WmoCode::Clear, WmoCode::Haze, 5);
        p.mean_delta = Some(30.0);
        let recs = RecommendationEngine::default().recommend(&[p], &ThresholdSet::default());
        assert!(recs.is_empty());
    }

    #[test]
    fn test_missing_mean_ignored() {
        let mut p = near_saturation(WmoCode::Mist, WmoCode::Fog, 96.0);
        p.mean_humidity = None;
        let recs = RecommendationEngine::default().recommend(&[p], &ThresholdSet::default());
        assert!(recs.is_empty());
    }

    #[test]
    fn test_missing_temperature_ignored() {
        let mut p = near_saturation(WmoCode::Mist, WmoCode::Fog, 96.0);
        p.mean_temperature = None;
        let recs = RecommendationEngine::default().recommend(&[p], &ThresholdSet::default());
        assert!(recs.is_empty());
    }

    #[test]
    fn test_rate_suggestion_rounds_to_hundredths() {
        let mut p = pattern(WmoCode::DrizzleModerate, WmoCode::DrizzleLight, 3);
        p.mean_precip_rate = Some(0.333);
        let recs = RecommendationEngine::default().recommend(&[p], &ThresholdSet::default());
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].parameter_name, ThresholdParam::DrizzleLightMaxRate);
        assert_eq!(recs[0].suggested_value, 0.43);
    }

    #[test]
    fn test_ordered_by_evidence() {
        let mut cloud = pattern(WmoCode::Clear, WmoCode::MainlyClear, 7);
        cloud.mean_delta = Some(26.0);
        let mut fog = near_saturation(WmoCode::Mist, WmoCode::Fog, 96.0);
        fog.count = 4;
        let recs = RecommendationEngine::default().recommend(&[fog, cloud], &ThresholdSet::default());
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].evidence_count, 7);
        assert_eq!(recs[1].evidence_count, 4);
    }
}
