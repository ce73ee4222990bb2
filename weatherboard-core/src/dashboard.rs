//! View state derived from each successful poll.
//!
//! [`Dashboard`] is the context the poll cycle runs against: it owns the
//! alert memory and the last good [`ViewState`]. Everything a front end
//! needs is in the view; unit conversion happens in [`ViewState::display`]
//! so changing units never touches stored data.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    alert::{self, AlertMemory, DEFAULT_HEAT_THRESHOLD_C, HeatAlert},
    model::{SnapshotBatch, WeatherSnapshot},
    stats,
    units::Units,
};

/// Everything derived from one batch, in canonical Celsius.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub batch: SnapshotBatch,
    /// `None` when the batch was empty.
    pub average_max_temp: Option<f64>,
    pub dominant_condition: String,
    pub alerts: Vec<HeatAlert>,
    pub fetched_at: DateTime<Utc>,
}

/// One city card, already converted to the display unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardView {
    pub city: String,
    pub current_temp: f64,
    pub max_temp: f64,
    pub min_temp: f64,
    pub feels_like: f64,
    pub condition: String,
    pub humidity: f64,
    pub wind_speed: f64,
    pub observed_at: Option<DateTime<Utc>>,
}

/// Labels and values shared by the bar and line charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayView {
    pub units: Units,
    pub cards: Vec<CardView>,
    pub average_max_temp: Option<f64>,
    pub dominant_condition: String,
    pub alerts: Vec<String>,
    pub chart: ChartSeries,
    pub fetched_at: DateTime<Utc>,
}

impl ViewState {
    pub fn from_batch(
        batch: SnapshotBatch,
        alerts: Vec<HeatAlert>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            average_max_temp: stats::average_max_temp(&batch),
            dominant_condition: stats::dominant_condition(&batch),
            alerts,
            batch,
            fetched_at,
        }
    }

    /// Project the view into `units` for rendering.
    pub fn display(&self, units: Units) -> DisplayView {
        let cards = self.batch.iter().map(|s| card(s, units)).collect();

        let chart = ChartSeries {
            title: format!("Max Temperature ({})", units.symbol()),
            labels: self.batch.iter().map(|s| s.city.clone()).collect(),
            values: self.batch.iter().map(|s| units.display(s.max_temp)).collect(),
        };

        DisplayView {
            units,
            cards,
            average_max_temp: self.average_max_temp.map(|t| units.display(t)),
            dominant_condition: self.dominant_condition.clone(),
            alerts: self.alerts.iter().map(ToString::to_string).collect(),
            chart,
            fetched_at: self.fetched_at,
        }
    }
}

fn card(snapshot: &WeatherSnapshot, units: Units) -> CardView {
    CardView {
        city: snapshot.city.clone(),
        current_temp: units.display(snapshot.current_temp),
        max_temp: units.display(snapshot.max_temp),
        min_temp: units.display(snapshot.min_temp),
        feels_like: units.display(snapshot.feels_like),
        condition: snapshot.condition.clone(),
        humidity: snapshot.humidity,
        wind_speed: snapshot.wind_speed,
        observed_at: snapshot.observed_at,
    }
}

/// Poll-cycle context: alert memory plus the last published view.
#[derive(Debug, Clone)]
pub struct Dashboard {
    memory: AlertMemory,
    threshold: f64,
    current: Option<Arc<ViewState>>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(DEFAULT_HEAT_THRESHOLD_C)
    }
}

impl Dashboard {
    pub fn new(threshold: f64) -> Self {
        Self {
            memory: AlertMemory::new(),
            threshold,
            current: None,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn memory(&self) -> &AlertMemory {
        &self.memory
    }

    /// Last good view, if any poll has succeeded yet.
    pub fn current(&self) -> Option<Arc<ViewState>> {
        self.current.clone()
    }

    /// Fold a freshly fetched batch into the dashboard.
    pub fn apply(&mut self, batch: SnapshotBatch) -> Arc<ViewState> {
        self.apply_at(batch, Utc::now())
    }

    pub fn apply_at(&mut self, batch: SnapshotBatch, fetched_at: DateTime<Utc>) -> Arc<ViewState> {
        let (alerts, memory) = alert::evaluate(&batch, &self.memory, self.threshold);
        self.memory = memory;

        let view = Arc::new(ViewState::from_batch(batch, alerts, fetched_at));
        self.current = Some(Arc::clone(&view));
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::snapshot;

    #[test]
    fn first_batch_has_stats_and_no_alerts() {
        let mut dashboard = Dashboard::default();
        let view = dashboard.apply(vec![snapshot("A", 40.0, "Clear"), snapshot("B", 20.0, "Rain")]);

        assert_eq!(view.average_max_temp, Some(30.0));
        assert_eq!(view.dominant_condition, "Clear");
        assert!(view.alerts.is_empty());
        assert_eq!(dashboard.memory().previous_max("A"), Some(40.0));
    }

    #[test]
    fn alerts_are_replaced_each_cycle() {
        let mut dashboard = Dashboard::default();
        dashboard.apply(vec![snapshot("A", 40.0, "Clear")]);

        let second = dashboard.apply(vec![snapshot("A", 41.0, "Clear")]);
        assert_eq!(second.alerts.len(), 1);

        let third = dashboard.apply(vec![snapshot("A", 30.0, "Clear")]);
        assert!(third.alerts.is_empty());
        assert_eq!(dashboard.current().unwrap().alerts.len(), 0);
    }

    #[test]
    fn empty_batch_view() {
        let mut dashboard = Dashboard::default();
        let view = dashboard.apply(Vec::new());

        assert_eq!(view.average_max_temp, None);
        assert_eq!(view.dominant_condition, stats::NO_DOMINANT_CONDITION);

        let shown = view.display(Units::Imperial);
        assert_eq!(shown.average_max_temp, None);
        assert!(shown.chart.labels.is_empty());
    }

    #[test]
    fn display_converts_without_touching_the_batch() {
        let mut dashboard = Dashboard::default();
        let mut hot = snapshot("Delhi", 100.0, "haze");
        hot.current_temp = 0.0;
        hot.min_temp = -40.0;
        hot.feels_like = 100.0;
        let view = dashboard.apply(vec![hot.clone()]);

        let imperial = view.display(Units::Imperial);
        let card = &imperial.cards[0];
        assert_eq!(card.max_temp, 212.0);
        assert_eq!(card.current_temp, 32.0);
        assert_eq!(card.min_temp, -40.0);
        assert_eq!(card.feels_like, 212.0);
        assert_eq!(imperial.average_max_temp, Some(212.0));
        assert_eq!(imperial.chart.title, "Max Temperature (F)");
        assert_eq!(imperial.chart.values, vec![212.0]);

        assert_eq!(view.batch[0], hot);

        let metric = view.display(Units::Metric);
        assert_eq!(metric.cards[0].max_temp, 100.0);
        assert_eq!(metric.chart.labels, vec!["Delhi".to_string()]);
    }

    #[test]
    fn display_lists_alert_messages() {
        let mut dashboard = Dashboard::new(35.0);
        dashboard.apply(vec![snapshot("Chennai", 36.0, "Clear")]);
        let view = dashboard.apply(vec![snapshot("Chennai", 37.0, "Clear")]);

        let shown = view.display(Units::Metric);
        assert_eq!(
            shown.alerts,
            vec!["Chennai has been above 35°C for two consecutive updates!".to_string()]
        );
    }
}
