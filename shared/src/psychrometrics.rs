//! Humidity helpers

/// Dewpoint in °C using the Magnus approximation, rounded to 0.01 °C.
///
/// Returns `None` for non-positive humidity, where the logarithm is undefined.
pub fn dewpoint_magnus(temperature_c: f64, humidity_pct: f64) -> Option<f64> {
    const A: f64 = 17.625;
    const B: f64 = 243.04;

    if humidity_pct <= 0.0 || !temperature_c.is_finite() || !humidity_pct.is_finite() {
        return None;
    }

    let alpha = (humidity_pct / 100.0).ln() + (A * temperature_c) / (B + temperature_c);
    let dewpoint = B * alpha / (A - alpha);
    Some((dewpoint * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturated_air_dewpoint_equals_temperature() {
        let dewpoint = dewpoint_magnus(15.0, 100.0).unwrap();
        assert!((dewpoint - 15.0).abs() < 0.01);
    }

    #[test]
    fn test_known_value() {
        // 20 °C at 50 % gives roughly 9.3 °C
        let dewpoint = dewpoint_magnus(20.0, 50.0).unwrap();
        assert!((dewpoint - 9.26).abs() < 0.05);
    }

    #[test]
    fn test_dry_air_has_no_dewpoint() {
        assert!(dewpoint_magnus(20.0, 0.0).is_none());
        assert!(dewpoint_magnus(20.0, -5.0).is_none());
    }
}
