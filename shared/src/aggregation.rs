//! Grouping of wrong-labelled readings into error patterns

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::{ErrorPattern, WeatherReading, WmoCode};

#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    sum: f64,
    n: usize,
}

impl Mean {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.sum += v;
            self.n += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        (self.n > 0).then(|| self.sum / self.n as f64)
    }
}

#[derive(Debug)]
struct Group {
    count: usize,
    temperature: Mean,
    humidity: Mean,
    delta: Mean,
    precip_rate: Mean,
    spread: Mean,
    wind_speed: Mean,
    first_seen: DateTime<Utc>,
    last_seen: DateTime<Utc>,
}

impl Group {
    fn new(at: DateTime<Utc>) -> Self {
        Self {
            count: 0,
            temperature: Mean::default(),
            humidity: Mean::default(),
            delta: Mean::default(),
            precip_rate: Mean::default(),
            spread: Mean::default(),
            wind_speed: Mean::default(),
            first_seen: at,
            last_seen: at,
        }
    }

    fn add(&mut self, reading: &WeatherReading) {
        self.count += 1;
        self.temperature.push(reading.snapshot.temperature_c);
        self.humidity.push(reading.snapshot.humidity_pct);
        self.delta.push(reading.condition.delta);
        self.precip_rate.push(reading.snapshot.precip_rate_mm);
        self.spread.push(reading.snapshot.spread());
        self.wind_speed.push(reading.snapshot.wind_speed_ms);
        self.first_seen = self.first_seen.min(reading.timestamp);
        self.last_seen = self.last_seen.max(reading.timestamp);
    }
}

/// Group readings labelled wrong by `(observed code, corrected code)`.
///
/// Readings without feedback, or judged correct, are ignored. Means skip
/// missing values. Result is ordered by count descending, then observed
/// code ascending with unclassified readings first.
pub fn aggregate<'a, I>(readings: I) -> Vec<ErrorPattern>
where
    I: IntoIterator<Item = &'a WeatherReading>,
{
    let mut groups: HashMap<(Option<WmoCode>, WmoCode), Group> = HashMap::new();

    for reading in readings {
        let Some(feedback) = reading.feedback.as_ref() else {
            continue;
        };
        if feedback.is_correct {
            continue;
        }
        let Some(corrected) = feedback.corrected_code else {
            continue;
        };
        groups
            .entry((reading.condition.code, corrected))
            .or_insert_with(|| Group::new(reading.timestamp))
            .add(reading);
    }

    let mut patterns: Vec<ErrorPattern> = groups
        .into_iter()
        .map(|((observed_code, corrected_code), g)| ErrorPattern {
            observed_code,
            corrected_code,
            count: g.count,
            mean_temperature: g.temperature.value(),
            mean_humidity: g.humidity.value(),
            mean_delta: g.delta.value(),
            mean_precip_rate: g.precip_rate.value(),
            mean_spread: g.spread.value(),
            mean_wind_speed: g.wind_speed.value(),
            first_seen: g.first_seen,
            last_seen: g.last_seen,
        })
        .collect();

    patterns.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.observed_code.map(WmoCode::code).cmp(&b.observed_code.map(WmoCode::code)))
            .then_with(|| a.corrected_code.code().cmp(&b.corrected_code.code()))
    });
    patterns
}
