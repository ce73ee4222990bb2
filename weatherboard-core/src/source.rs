use crate::{
    Config,
    error::FetchResult,
    model::SnapshotBatch,
    source::{endpoint::EndpointSource, openweather::OpenWeatherSource},
};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug};

pub mod endpoint;
pub mod openweather;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
    Endpoint,
    OpenWeather,
}

impl SourceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Endpoint => "endpoint",
            SourceId::OpenWeather => "openweather",
        }
    }

    pub const fn all() -> &'static [SourceId] {
        &[SourceId::Endpoint, SourceId::OpenWeather]
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SourceId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "endpoint" => Ok(SourceId::Endpoint),
            "openweather" => Ok(SourceId::OpenWeather),
            _ => Err(anyhow::anyhow!(
                "Unknown source '{value}'. Supported sources: endpoint, openweather."
            )),
        }
    }
}

/// Anything that can produce one batch of city snapshots per call.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch_batch(&self) -> FetchResult<SnapshotBatch>;
}

/// Construct a source from config and an explicit SourceId.
pub fn source_from_config(id: SourceId, config: &Config) -> anyhow::Result<Box<dyn WeatherSource>> {
    let boxed: Box<dyn WeatherSource> = match id {
        SourceId::Endpoint => Box::new(EndpointSource::new(
            config.endpoint.clone(),
            config.request_timeout(),
        )?),
        SourceId::OpenWeather => {
            let api_key = config.openweather_api_key().ok_or_else(|| {
                anyhow::anyhow!(
                    "No API key configured for source '{id}'.\n\
                         Hint: run `weatherboard configure {id}` and enter your API key."
                )
            })?;
            Box::new(OpenWeatherSource::new(
                api_key.to_owned(),
                config.openweather.cities.clone(),
                config.request_timeout(),
            )?)
        }
    };

    Ok(boxed)
}

/// Construct the configured source, using the `source` field.
pub fn default_source_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherSource>> {
    let id = config.source_id()?;
    source_from_config(id, config)
}
