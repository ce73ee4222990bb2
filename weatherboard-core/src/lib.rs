//! Core library for the `weatherboard` dashboard.
//!
//! This crate defines:
//! - Weather sources (the dashboard endpoint, or OpenWeather directly)
//! - Statistics and sustained-heat alerts over each fetched batch
//! - The dashboard view state and its unit-converted projection
//! - A cancellable poller that refreshes the view on a fixed interval
//! - Configuration handling
//!
//! It is used by `weatherboard-cli`, but any front end can subscribe to the
//! poller and render [`ViewState`] its own way.

pub mod alert;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod poller;
pub mod source;
pub mod stats;
pub mod units;

pub use alert::{AlertMemory, HeatAlert};
pub use config::Config;
pub use dashboard::{ChartSeries, Dashboard, DisplayView, ViewState};
pub use error::FetchError;
pub use model::{SnapshotBatch, WeatherSnapshot};
pub use poller::{PollSettings, PollerHandle};
pub use source::{SourceId, WeatherSource};
pub use units::Units;
