use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{FetchError, FetchResult};

/// One city's reading at a point in time. Temperatures are Celsius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city: String,
    pub current_temp: f64,
    pub max_temp: f64,
    pub min_temp: f64,
    pub feels_like: f64,
    pub condition: String,
    /// Percent.
    pub humidity: f64,
    /// km/h.
    pub wind_speed: f64,
    #[serde(
        rename = "date_time",
        default,
        deserialize_with = "deserialize_observed_at",
        skip_serializing_if = "Option::is_none"
    )]
    pub observed_at: Option<DateTime<Utc>>,
}

/// All snapshots returned by a single fetch cycle, in wire order.
pub type SnapshotBatch = Vec<WeatherSnapshot>;

impl WeatherSnapshot {
    fn check(&self) -> Result<(), String> {
        if self.city.trim().is_empty() {
            return Err("snapshot with blank city name".to_string());
        }

        let numbers = [
            ("current_temp", self.current_temp),
            ("max_temp", self.max_temp),
            ("min_temp", self.min_temp),
            ("feels_like", self.feels_like),
            ("humidity", self.humidity),
            ("wind_speed", self.wind_speed),
        ];
        if let Some((field, _)) = numbers.iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("{}: {field} is not a finite number", self.city));
        }

        if !(0.0..=100.0).contains(&self.humidity) {
            return Err(format!("{}: humidity {} is outside 0..=100", self.city, self.humidity));
        }

        Ok(())
    }
}

/// Decode a dashboard endpoint body into a validated batch.
pub fn decode_batch(body: &str) -> FetchResult<SnapshotBatch> {
    let batch: SnapshotBatch = serde_json::from_str(body)?;
    validate_batch(&batch)?;
    Ok(batch)
}

/// Reject batches that would corrupt the view: bad numbers or repeated cities.
pub fn validate_batch(batch: &[WeatherSnapshot]) -> FetchResult<()> {
    let mut seen = HashSet::with_capacity(batch.len());

    for snapshot in batch {
        snapshot.check().map_err(FetchError::Invalid)?;

        if !seen.insert(snapshot.city.as_str()) {
            return Err(FetchError::Invalid(format!(
                "city '{}' appears more than once in one batch",
                snapshot.city
            )));
        }
    }

    Ok(())
}

// The upstream service writes naive ISO timestamps ("2024-10-16T09:30:00");
// accept those as UTC alongside full RFC 3339.
fn deserialize_observed_at<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }

    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|ndt| Some(ndt.and_utc()))
        .map_err(serde::de::Error::custom)
}
