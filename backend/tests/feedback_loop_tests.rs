//! Feedback loop integration tests
//!
//! Tests for the self-tuning path including:
//! - Feedback validation
//! - Error pattern aggregation
//! - Recommendation evidence floor and direction
//! - Applying recommendations back onto the threshold set and re-deriving

use chrono::{Duration, Utc};
use proptest::prelude::*;
use shared::aggregation::aggregate;
use shared::engine::derive;
use shared::models::{
    DerivedCondition, Feedback, FeedbackSubmission, SensorSnapshot, WeatherReading, WmoCode,
};
use shared::recommendation::{boundary_for, RecommendationEngine, BOUNDARIES};
use shared::thresholds::{ThresholdChange, ThresholdParam, ThresholdSet};
use shared::validation::validate_feedback;

fn labelled(
    id: i64,
    observed: WmoCode,
    corrected: WmoCode,
    snapshot: SensorSnapshot,
) -> WeatherReading {
    let timestamp = Utc::now() - Duration::minutes(id);
    WeatherReading {
        id,
        timestamp,
        condition: DerivedCondition::classified(observed, snapshot.delta()),
        snapshot,
        feedback: Some(Feedback {
            is_correct: false,
            corrected_code: Some(corrected),
            comment: None,
            submitted_at: timestamp,
        }),
    }
}

fn misty(humidity: f64) -> SensorSnapshot {
    SensorSnapshot {
        temperature_c: Some(6.0),
        humidity_pct: Some(humidity),
        dewpoint_c: Some(5.5),
        wind_speed_ms: Some(2.0),
        sky_temperature_c: Some(4.0),
        precip_rate_mm: Some(0.0),
        ..Default::default()
    }
}

fn snapshot(
    temperature: f64,
    humidity: f64,
    dewpoint: f64,
    delta: f64,
    rate: f64,
) -> SensorSnapshot {
    SensorSnapshot {
        temperature_c: Some(temperature),
        humidity_pct: Some(humidity),
        dewpoint_c: Some(dewpoint),
        sky_temperature_c: Some(temperature - delta),
        precip_rate_mm: Some(rate),
        ..Default::default()
    }
}

/// One misclassification per boundary, with inputs the default thresholds
/// really do classify as `observed`
fn boundary_cases() -> Vec<(WmoCode, WmoCode, SensorSnapshot)> {
    vec![
        (WmoCode::Clear, WmoCode::MainlyClear, snapshot(10.0, 70.0, 4.7, 26.2, 0.0)),
        (WmoCode::MainlyClear, WmoCode::PartlyCloudy, snapshot(10.0, 70.0, 4.7, 20.0, 0.0)),
        (WmoCode::Overcast, WmoCode::PartlyCloudy, snapshot(10.0, 70.0, 4.7, 7.0, 0.0)),
        (WmoCode::DrizzleModerate, WmoCode::DrizzleLight, snapshot(10.0, 90.0, 8.4, 2.0, 0.3)),
        (WmoCode::RainSlight, WmoCode::DrizzleModerate, snapshot(10.0, 90.0, 8.4, 2.0, 1.2)),
        (WmoCode::RainModerate, WmoCode::RainSlight, snapshot(10.0, 90.0, 8.4, 2.0, 3.0)),
        (WmoCode::RainHeavy, WmoCode::RainModerate, snapshot(10.0, 90.0, 8.4, 2.0, 8.0)),
        (
            WmoCode::FreezingDrizzleDense,
            WmoCode::FreezingDrizzleLight,
            snapshot(0.2, 95.0, -0.5, 2.0, 0.6),
        ),
        (WmoCode::Fog, WmoCode::Mist, snapshot(5.0, 98.5, 4.8, 2.0, 0.0)),
        (WmoCode::Overcast, WmoCode::Mist, snapshot(10.0, 89.0, 8.5, 5.0, 0.0)),
        (WmoCode::Haze, WmoCode::Clear, snapshot(15.0, 40.0, 1.4, 30.0, 0.0)),
        (WmoCode::SleetLight, WmoCode::RainSlight, snapshot(2.5, 95.0, 1.8, 2.0, 1.5)),
    ]
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_wrong_feedback_requires_correction() {
        let submission = FeedbackSubmission {
            is_correct: false,
            corrected_code: None,
            comment: Some("that was fog".to_string()),
            reading_id: None,
        };
        assert!(validate_feedback(&submission, Utc::now()).is_err());
    }

    /// Mist repeatedly corrected to fog lowers the fog humidity floor, and
    /// applying the suggestion turns the same inputs into fog.
    #[test]
    fn test_loop_closes_for_mist_corrected_to_fog() {
        let mut thresholds = ThresholdSet::default();
        let readings: Vec<WeatherReading> = [96.0, 96.5, 95.5, 96.0]
            .iter()
            .enumerate()
            .map(|(i, h)| labelled(i as i64 + 1, WmoCode::Mist, WmoCode::Fog, misty(*h)))
            .collect();

        for r in &readings {
            assert_eq!(derive(&r.snapshot, &thresholds).code, Some(WmoCode::Mist));
        }

        let patterns = aggregate(&readings);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].count, 4);

        let recs = RecommendationEngine::new(3).recommend(&patterns, &thresholds);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].parameter_name, ThresholdParam::FogHumidityMin);
        assert_eq!(recs[0].suggested_value, 95.0);

        let outcome = thresholds.apply_changes(&recs[0].changes());
        assert!(outcome.rejected.is_empty());
        thresholds = outcome.thresholds;

        for r in &readings {
            assert_eq!(derive(&r.snapshot, &thresholds).code, Some(WmoCode::Fog));
        }
    }

    /// Every boundary yields a recommendation for its case, and applying it
    /// reclassifies the original readings as the corrected code
    #[test]
    fn test_each_boundary_recommendation_corrects_its_readings() {
        let defaults = ThresholdSet::default();
        let mut covered = Vec::new();

        for (observed, corrected, snapshot) in boundary_cases() {
            assert_eq!(
                derive(&snapshot, &defaults).code,
                Some(observed),
                "{} case does not start as {}",
                corrected,
                observed
            );
            let readings: Vec<WeatherReading> = (1..=3)
                .map(|id| labelled(id, observed, corrected, snapshot.clone()))
                .collect();

            let recs = RecommendationEngine::new(3).recommend(&aggregate(&readings), &defaults);
            assert_eq!(recs.len(), 1, "{} -> {} yields no recommendation", observed, corrected);
            let (boundary, _) = boundary_for(observed, corrected).unwrap();
            assert_eq!(recs[0].parameter_name, boundary.parameter);
            covered.push(boundary.parameter);

            let outcome = defaults.apply_changes(&recs[0].changes());
            assert!(outcome.rejected.is_empty());
            for r in &readings {
                assert_eq!(
                    derive(&r.snapshot, &outcome.thresholds).code,
                    Some(corrected),
                    "{} -> {} not corrected",
                    observed,
                    corrected
                );
            }
        }

        covered.sort();
        covered.dedup();
        assert_eq!(covered.len(), BOUNDARIES.len());
    }

    /// Haze corrected to clear below the clear-sky delta would only become
    /// mainly clear, so nothing is recommended
    #[test]
    fn test_haze_below_clear_delta_is_not_recommended() {
        let readings: Vec<WeatherReading> = (1..=5)
            .map(|id| {
                labelled(
                    id,
                    WmoCode::Haze,
                    WmoCode::Clear,
                    snapshot(15.0, 50.0, 4.6, 20.0, 0.0),
                )
            })
            .collect();
        let thresholds = ThresholdSet::default();
        assert_eq!(derive(&readings[0].snapshot, &thresholds).code, Some(WmoCode::Haze));

        let recs = RecommendationEngine::new(3).recommend(&aggregate(&readings), &thresholds);
        assert!(recs.is_empty());
    }

    #[test]
    fn test_every_boundary_parameter_is_distinct() {
        let mut params: Vec<ThresholdParam> = BOUNDARIES.iter().map(|b| b.parameter).collect();
        params.sort();
        params.dedup();
        assert_eq!(params.len(), BOUNDARIES.len());
    }

    #[test]
    fn test_boundary_lookup_is_symmetric() {
        let (forward, forward_above) = boundary_for(WmoCode::Clear, WmoCode::MainlyClear).unwrap();
        let (reverse, reverse_above) = boundary_for(WmoCode::MainlyClear, WmoCode::Clear).unwrap();
        assert_eq!(forward.parameter, reverse.parameter);
        assert!(forward_above);
        assert!(!reverse_above);
        assert!(boundary_for(WmoCode::Fog, WmoCode::SnowHeavy).is_none());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn mapped_pair_strategy() -> impl Strategy<Value = (WmoCode, WmoCode)> {
        (0..BOUNDARIES.len(), any::<bool>(), any::<prop::sample::Index>(), any::<prop::sample::Index>())
            .prop_map(|(i, flip, a, b)| {
                let boundary = &BOUNDARIES[i];
                let above = *a.get(boundary.above);
                let below = *b.get(boundary.below);
                if flip {
                    (below, above)
                } else {
                    (above, below)
                }
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Patterns below the evidence floor never yield recommendations;
        /// at or above it the mist/fog pattern always does
        #[test]
        fn prop_evidence_floor(count in 1usize..10, humidity in 92.0f64..97.0) {
            let readings: Vec<WeatherReading> = (0..count)
                .map(|i| labelled(i as i64 + 1, WmoCode::Mist, WmoCode::Fog, misty(humidity)))
                .collect();
            let patterns = aggregate(&readings);
            let recs = RecommendationEngine::new(3).recommend(&patterns, &ThresholdSet::default());

            if count < 3 {
                prop_assert!(recs.is_empty());
            } else {
                prop_assert_eq!(recs.len(), 1);
                prop_assert_eq!(recs[0].evidence_count, count);
            }
        }

        /// Any emitted recommendation is applicable, moves the boundary past
        /// the pattern mean, and reclassifies the pattern as the corrected code
        #[test]
        fn prop_recommendations_apply_cleanly(
            (observed, corrected) in mapped_pair_strategy(),
            count in 3usize..20,
            temperature in -10.0f64..30.0,
            humidity in 40.0f64..100.0,
            delta in 0.0f64..45.0,
            rate in 0.0f64..30.0,
            spread in 0.0f64..8.0,
        ) {
            let pattern = shared::models::ErrorPattern {
                observed_code: Some(observed),
                corrected_code: corrected,
                count,
                mean_temperature: Some(temperature),
                mean_humidity: Some(humidity),
                mean_delta: Some(delta),
                mean_precip_rate: Some(rate),
                mean_spread: Some(spread),
                mean_wind_speed: None,
                first_seen: Utc::now(),
                last_seen: Utc::now(),
            };
            let thresholds = ThresholdSet::default();
            let recs = RecommendationEngine::new(3).recommend(&[pattern.clone()], &thresholds);
            prop_assert!(recs.len() <= 1);

            for rec in recs {
                let (min, max) = rec.parameter_name.valid_range();
                prop_assert!(rec.suggested_value >= min && rec.suggested_value <= max);
                prop_assert!(rec.suggested_value != rec.current_value);
                prop_assert!(thresholds.with_value(rec.parameter_name, rec.suggested_value).is_ok());

                let mean = pattern.mean(rec.metric).unwrap();
                let raised = rec.suggested_value > rec.current_value;
                prop_assert_eq!(raised, rec.suggested_value > mean);

                let outcome = thresholds.apply_changes(&rec.changes());
                prop_assert!(outcome.rejected.is_empty());
                let representative = pattern.representative_snapshot().unwrap();
                prop_assert_eq!(
                    derive(&representative, &outcome.thresholds).code,
                    Some(corrected)
                );
            }
        }

        /// Accepted changes read back exactly; rejected ones leave the set alone
        #[test]
        fn prop_apply_changes_round_trip(value in 50.0f64..100.0) {
            let base = ThresholdSet::default();
            let outcome = base.apply_changes(&[
                ThresholdChange { parameter: "fog_humidity_min".to_string(), value },
                ThresholdChange { parameter: "bogus".to_string(), value },
            ]);
            prop_assert_eq!(outcome.applied.len(), 1);
            prop_assert_eq!(outcome.rejected.len(), 1);
            prop_assert_eq!(outcome.thresholds.get(ThresholdParam::FogHumidityMin), value);

            let json = serde_json::to_string(&outcome.thresholds).unwrap();
            let reread: ThresholdSet = serde_json::from_str(&json).unwrap();
            for (param, v) in outcome.thresholds.iter() {
                prop_assert!((reread.get(param) - v).abs() < 1e-9);
            }
        }
    }
}
