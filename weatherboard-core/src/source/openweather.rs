use std::{collections::HashSet, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    error::{FetchError, FetchResult, truncate_body},
    model::{self, SnapshotBatch, WeatherSnapshot},
};

use super::WeatherSource;

const CURRENT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Builds a batch by asking OpenWeather about each configured city in turn.
#[derive(Debug, Clone)]
pub struct OpenWeatherSource {
    api_key: String,
    cities: Vec<String>,
    http: Client,
}

impl OpenWeatherSource {
    /// Repeated and blank city names are dropped; each city is asked once.
    pub fn new(api_key: String, cities: Vec<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            cities: unique_cities(cities),
            http,
        })
    }

    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    /// `Ok(None)` when OpenWeather answered but refused the city.
    async fn fetch_city(&self, city: &str) -> FetchResult<Option<WeatherSnapshot>> {
        debug!(city, "requesting OpenWeather current conditions");

        let res = self
            .http
            .get(CURRENT_WEATHER_URL)
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            warn!(city, %status, body = %truncate_body(&body), "OpenWeather skipped city");
            return Ok(None);
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body)?;
        Ok(Some(snapshot_from_response(city, parsed)))
    }
}

/// Trimmed, non-blank city names in first-seen order without repeats.
pub fn unique_cities<I, S>(cities: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    cities
        .into_iter()
        .filter_map(|c| {
            let c = c.as_ref().trim();
            (!c.is_empty() && seen.insert(c.to_string())).then(|| c.to_string())
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    temp_max: f64,
    temp_min: f64,
    feels_like: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

fn snapshot_from_response(city: &str, parsed: OwCurrentResponse) -> WeatherSnapshot {
    let condition = parsed
        .weather
        .first()
        .map(|w| w.description.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    WeatherSnapshot {
        city: city.to_string(),
        current_temp: parsed.main.temp,
        max_temp: parsed.main.temp_max,
        min_temp: parsed.main.temp_min,
        feels_like: parsed.main.feels_like,
        condition,
        humidity: parsed.main.humidity,
        // m/s on the wire, km/h in snapshots.
        wind_speed: parsed.wind.speed * 3.6,
        observed_at: DateTime::<Utc>::from_timestamp(parsed.dt, 0),
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherSource {
    async fn fetch_batch(&self) -> FetchResult<SnapshotBatch> {
        if self.api_key.is_empty() {
            return Err(FetchError::MissingApiKey);
        }

        let mut batch = Vec::with_capacity(self.cities.len());
        for city in &self.cities {
            if let Some(snapshot) = self.fetch_city(city).await? {
                batch.push(snapshot);
            }
        }

        model::validate_batch(&batch)?;
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELHI: &str = r#"{
        "coord": {"lon": 77.2167, "lat": 28.6667},
        "weather": [{"id": 721, "main": "Haze", "description": "haze", "icon": "50d"}],
        "main": {"temp": 33.05, "feels_like": 35.3, "temp_min": 33.05, "temp_max": 36.5,
                 "pressure": 1008, "humidity": 45},
        "wind": {"speed": 2.5, "deg": 290},
        "dt": 1729070400,
        "name": "Delhi"
    }"#;

    #[test]
    fn maps_current_conditions_to_snapshot() {
        let parsed: OwCurrentResponse = serde_json::from_str(DELHI).unwrap();
        let snapshot = snapshot_from_response("Delhi", parsed);

        assert_eq!(snapshot.city, "Delhi");
        assert_eq!(snapshot.max_temp, 36.5);
        assert_eq!(snapshot.min_temp, 33.05);
        assert_eq!(snapshot.current_temp, 33.05);
        assert_eq!(snapshot.condition, "haze");
        assert_eq!(snapshot.humidity, 45.0);
        assert!((snapshot.wind_speed - 9.0).abs() < 1e-9);
        assert_eq!(
            snapshot.observed_at.map(|t| t.to_rfc3339()),
            Some("2024-10-16T09:20:00+00:00".to_string())
        );
    }

    #[test]
    fn missing_weather_entry_is_unknown() {
        let body = DELHI.replace(
            r#"[{"id": 721, "main": "Haze", "description": "haze", "icon": "50d"}]"#,
            "[]",
        );
        let parsed: OwCurrentResponse = serde_json::from_str(&body).unwrap();

        assert_eq!(snapshot_from_response("Delhi", parsed).condition, "Unknown");
    }

    #[test]
    fn repeated_cities_are_requested_once() {
        let source = OpenWeatherSource::new(
            "KEY".into(),
            vec!["Delhi".into(), " Mumbai".into(), "Delhi".into(), "".into(), "Mumbai ".into()],
            Duration::from_secs(1),
        )
        .unwrap();

        assert_eq!(source.cities(), ["Delhi".to_string(), "Mumbai".to_string()]);
    }

    #[tokio::test]
    async fn empty_api_key_fails_before_any_request() {
        let source =
            OpenWeatherSource::new(String::new(), vec!["Delhi".into()], Duration::from_secs(1))
                .unwrap();

        let err = source.fetch_batch().await.unwrap_err();
        assert!(matches!(err, FetchError::MissingApiKey));
    }
}
