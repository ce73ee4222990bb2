use std::collections::HashMap;

use serde::Serialize;

use crate::model::WeatherSnapshot;

/// Default sustained-heat threshold, °C.
pub const DEFAULT_HEAT_THRESHOLD_C: f64 = 35.0;

/// Last observed `max_temp` per city.
///
/// Entries are overwritten on every successful batch and never pruned; a
/// city that drops out of the feed keeps its stale value until it returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertMemory {
    last_max: HashMap<String, f64>,
}

impl AlertMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous_max(&self, city: &str) -> Option<f64> {
        self.last_max.get(city).copied()
    }

    pub fn record(&mut self, city: &str, max_temp: f64) {
        self.last_max.insert(city.to_string(), max_temp);
    }

    pub fn len(&self) -> usize {
        self.last_max.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_max.is_empty()
    }
}

/// A city stayed at or above the threshold for two consecutive batches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatAlert {
    pub city: String,
    pub previous_max: f64,
    pub current_max: f64,
    pub threshold: f64,
}

impl std::fmt::Display for HeatAlert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} has been above {}°C for two consecutive updates!",
            self.city, self.threshold
        )
    }
}

/// Compare a batch against the previous batch's readings.
///
/// Returns the alerts for this batch only, plus the memory to use for the
/// next one. `prior` is not modified.
pub fn evaluate(
    batch: &[WeatherSnapshot],
    prior: &AlertMemory,
    threshold: f64,
) -> (Vec<HeatAlert>, AlertMemory) {
    let mut alerts = Vec::new();
    let mut next = prior.clone();

    for snapshot in batch {
        let current = snapshot.max_temp;

        match prior.previous_max(&snapshot.city) {
            Some(previous) if previous >= threshold && current >= threshold => {
                alerts.push(HeatAlert {
                    city: snapshot.city.clone(),
                    previous_max: previous,
                    current_max: current,
                    threshold,
                });
            }
            _ => {}
        }

        next.record(&snapshot.city, current);
    }

    (alerts, next)
}
