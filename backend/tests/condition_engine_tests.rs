//! Condition engine integration tests
//!
//! Tests for present-weather derivation including:
//! - Determinism of the engine
//! - Precedence of shallow fog over generic fog
//! - Cloud cover requiring the sky temperature
//! - Temperature-zone routing of precipitation

use proptest::prelude::*;
use shared::engine::{derive, evaluate};
use shared::models::{SensorSnapshot, WmoCode};
use shared::thresholds::ThresholdSet;

fn snapshot(temperature_c: f64, humidity_pct: f64, dewpoint_c: f64) -> SensorSnapshot {
    SensorSnapshot {
        temperature_c: Some(temperature_c),
        humidity_pct: Some(humidity_pct),
        dewpoint_c: Some(dewpoint_c),
        precip_rate_mm: Some(0.0),
        wind_speed_ms: Some(3.0),
        ..Default::default()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_heavy_snow_below_certain_snow_floor() {
        let mut s = snapshot(-5.0, 90.0, -6.0);
        s.precip_rate_mm = Some(10.0);
        assert_eq!(derive(&s, &ThresholdSet::default()).code, Some(WmoCode::SnowHeavy));
    }

    #[test]
    fn test_freezing_rain_floor_split() {
        let t = ThresholdSet::default();

        let mut above_floor = snapshot(-0.5, 95.0, -1.0);
        above_floor.precip_rate_mm = Some(3.0);
        assert_eq!(derive(&above_floor, &t).code, Some(WmoCode::FreezingRainHeavy));

        let mut below_floor = snapshot(-1.5, 95.0, -2.0);
        below_floor.precip_rate_mm = Some(3.0);
        assert_eq!(derive(&below_floor, &t).code, Some(WmoCode::SnowModerate));
    }

    #[test]
    fn test_rain_flag_forces_light_drizzle() {
        let mut s = snapshot(12.0, 90.0, 10.0);
        s.is_raining = Some(true);
        s.precip_rate_mm = Some(0.0);
        let evaluation = evaluate(&s, &ThresholdSet::default());
        assert_eq!(evaluation.condition.code, Some(WmoCode::DrizzleLight));
        assert_eq!(evaluation.matched_rule, Some("precipitation"));
    }

    #[test]
    fn test_missing_temperature_is_indeterminate() {
        let s = SensorSnapshot {
            humidity_pct: Some(80.0),
            sky_temperature_c: Some(-20.0),
            ..Default::default()
        };
        let condition = derive(&s, &ThresholdSet::default());
        assert!(condition.is_indeterminate());
        assert!(condition.name.is_none());
    }

    #[test]
    fn test_cloud_cover_bands() {
        let t = ThresholdSet::default();
        let cases = [
            (-20.0, WmoCode::Clear),
            (-5.0, WmoCode::MainlyClear),
            (5.0, WmoCode::PartlyCloudy),
            (12.0, WmoCode::Overcast),
        ];
        for (sky, expected) in cases {
            // 15 °C ambient, humidity too high for haze, spread too wide for fog
            let mut s = snapshot(15.0, 70.0, 9.0);
            s.sky_temperature_c = Some(sky);
            assert_eq!(derive(&s, &t).code, Some(expected), "sky {}", sky);
        }
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn optional(range: std::ops::Range<f64>) -> impl Strategy<Value = Option<f64>> {
        prop_oneof![Just(None), range.prop_map(Some)]
    }

    fn snapshot_strategy() -> impl Strategy<Value = SensorSnapshot> {
        (
            (
                optional(-20.0..35.0),
                optional(10.0..100.0),
                optional(-25.0..30.0),
                optional(0.0..8.0),
            ),
            (
                optional(0.0..15.0),
                optional(-40.0..20.0),
                proptest::option::of(any::<bool>()),
            ),
        )
            .prop_map(
                |((temperature_c, humidity_pct, dewpoint_c, wind_speed_ms), (precip, sky, raining))| {
                    SensorSnapshot {
                        temperature_c,
                        humidity_pct,
                        dewpoint_c,
                        wind_speed_ms,
                        precip_rate_mm: precip,
                        sky_temperature_c: sky,
                        is_raining: raining,
                        ..Default::default()
                    }
                },
            )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Same snapshot and thresholds always give the same condition
        #[test]
        fn prop_derive_is_deterministic(s in snapshot_strategy()) {
            let t = ThresholdSet::default();
            let first = derive(&s, &t);
            for _ in 0..3 {
                prop_assert_eq!(&derive(&s, &t), &first);
            }
        }

        /// A classified condition always comes from a snapshot with a temperature
        #[test]
        fn prop_code_requires_temperature(s in snapshot_strategy()) {
            let condition = derive(&s, &ThresholdSet::default());
            if condition.code.is_some() {
                prop_assert!(s.temperature_c.is_some());
                prop_assert_eq!(condition.name.as_deref(), condition.code.map(|c| c.name()));
            }
        }

        /// Engine never produces codes it has no evidence for
        #[test]
        fn prop_unreachable_codes_never_produced(s in snapshot_strategy()) {
            if let Some(code) = derive(&s, &ThresholdSet::default()).code {
                prop_assert!(!matches!(
                    code,
                    WmoCode::DrizzleDense
                        | WmoCode::RainShowersSlight
                        | WmoCode::RainShowersModerate
                        | WmoCode::RainShowersViolent
                        | WmoCode::SnowShowersSlight
                        | WmoCode::SnowShowersHeavy
                ));
            }
        }

        /// Dewpoint at temperature, near-still air and saturated humidity is
        /// shallow fog even when generic fog bounds hold too
        #[test]
        fn prop_shallow_fog_wins_over_fog(
            temp in 1.0f64..15.0,
            humidity in 97.5f64..100.0,
            wind in 0.0f64..0.9,
            delta in 0.0f64..4.5,
        ) {
            let mut s = snapshot(temp, humidity, temp);
            s.wind_speed_ms = Some(wind);
            s.sky_temperature_c = Some(temp - delta);
            let evaluation = evaluate(&s, &ThresholdSet::default());
            prop_assert_eq!(evaluation.condition.code, Some(WmoCode::ShallowFog));
            prop_assert_eq!(evaluation.matched_rule, Some("shallow_fog"));
        }

        /// Without a sky temperature, a dry clear-air snapshot is indeterminate
        #[test]
        fn prop_cloud_cover_requires_delta(
            temp in -10.0f64..35.0,
            humidity in 10.0f64..85.0,
        ) {
            let s = snapshot(temp, humidity, temp - 10.0);
            prop_assert!(derive(&s, &ThresholdSet::default()).is_indeterminate());
        }

        /// Warm precipitation is always rain or drizzle
        #[test]
        fn prop_warm_precipitation_is_liquid(temp in 3.0f64..35.0, rate in 0.01f64..40.0) {
            let mut s = snapshot(temp, 95.0, temp - 1.0);
            s.precip_rate_mm = Some(rate);
            let code = derive(&s, &ThresholdSet::default()).code;
            prop_assert!(matches!(
                code,
                Some(WmoCode::DrizzleLight)
                    | Some(WmoCode::DrizzleModerate)
                    | Some(WmoCode::RainSlight)
                    | Some(WmoCode::RainModerate)
                    | Some(WmoCode::RainHeavy)
            ));
        }

        /// Below the certain-snow floor precipitation is always snow
        #[test]
        fn prop_cold_precipitation_is_snow(temp in -20.0f64..-2.1, rate in 0.01f64..40.0) {
            let mut s = snapshot(temp, 95.0, temp - 1.0);
            s.precip_rate_mm = Some(rate);
            let code = derive(&s, &ThresholdSet::default()).code;
            prop_assert!(matches!(
                code,
                Some(WmoCode::SnowGrains)
                    | Some(WmoCode::SnowSlight)
                    | Some(WmoCode::SnowModerate)
                    | Some(WmoCode::SnowHeavy)
            ));
        }

        /// More clear sky (larger delta) never yields a cloudier code
        #[test]
        fn prop_cloud_cover_monotonic(a in -30.0f64..14.0, b in -30.0f64..14.0) {
            let t = ThresholdSet::default();
            let cloud = |sky: f64| {
                let mut s = snapshot(15.0, 70.0, 9.0);
                s.sky_temperature_c = Some(sky);
                derive(&s, &t).code.map(|c| c.code())
            };
            let (colder, warmer) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(cloud(colder) <= cloud(warmer));
        }
    }
}
