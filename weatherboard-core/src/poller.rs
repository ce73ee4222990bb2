//! Timer-driven refresh of the dashboard.
//!
//! One task owns the [`Dashboard`]; it fetches immediately, then once per
//! interval, and publishes each new [`ViewState`] on a watch channel.
//! Fetches never overlap: the task awaits each one before looking at the
//! timer again, and ticks missed meanwhile are skipped.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{info, warn};

use crate::{
    alert::DEFAULT_HEAT_THRESHOLD_C, config::DEFAULT_POLL_INTERVAL_SECS, dashboard::Dashboard,
    dashboard::ViewState, source::WeatherSource,
};

pub type ViewReceiver = watch::Receiver<Option<Arc<ViewState>>>;

/// Shortest interval the poller will run at.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSettings {
    pub interval: Duration,
    pub heat_threshold: f64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            heat_threshold: DEFAULT_HEAT_THRESHOLD_C,
        }
    }
}

impl PollSettings {
    pub fn from_config(config: &crate::Config) -> Self {
        Self {
            interval: config.poll_interval(),
            heat_threshold: config.alert_threshold_c,
        }
    }
}

/// Running poller.
///
/// Use [`PollerHandle::stop`] for a clean teardown. Dropping the handle
/// aborts the task at its next await point; a poll already past its fetch
/// may still publish that one view.
#[derive(Debug)]
pub struct PollerHandle {
    views: ViewReceiver,
    refresh: mpsc::Sender<()>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// A receiver that sees every view published from now on.
    pub fn subscribe(&self) -> ViewReceiver {
        self.views.clone()
    }

    /// Latest published view, `None` until the first successful fetch.
    pub fn latest(&self) -> Option<Arc<ViewState>> {
        self.views.borrow().clone()
    }

    /// Ask for an extra poll as soon as the current one (if any) is done.
    /// Requests made while one is already queued are merged.
    pub fn refresh(&self) {
        let _ = self.refresh.try_send(());
    }

    /// Cancel the timer and any in-flight fetch, then wait for the task.
    ///
    /// Once this returns nothing is published again.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "poller task ended abnormally");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Start polling `source` on the current tokio runtime.
///
/// Intervals below [`MIN_POLL_INTERVAL`] are raised to it.
pub fn spawn(source: Arc<dyn WeatherSource>, settings: PollSettings) -> PollerHandle {
    let (view_tx, views) = watch::channel(None);
    let (refresh, refresh_rx) = mpsc::channel(1);
    let (shutdown, shutdown_rx) = oneshot::channel();

    let dashboard = Dashboard::new(settings.heat_threshold);
    let task = tokio::spawn(run(
        source,
        settings.interval.max(MIN_POLL_INTERVAL),
        dashboard,
        view_tx,
        refresh_rx,
        shutdown_rx,
    ));

    PollerHandle {
        views,
        refresh,
        shutdown: Some(shutdown),
        task: Some(task),
    }
}

async fn run(
    source: Arc<dyn WeatherSource>,
    interval: Duration,
    mut dashboard: Dashboard,
    views: watch::Sender<Option<Arc<ViewState>>>,
    mut refresh: mpsc::Receiver<()>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(interval_secs = interval.as_secs(), "poller started");

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
            Some(()) = refresh.recv() => {}
        }

        // Racing the fetch against shutdown drops the request on teardown,
        // so a late response can never reach the dashboard.
        let outcome = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            outcome = source.fetch_batch() => outcome,
        };

        match outcome {
            Ok(batch) => {
                let view = dashboard.apply(batch);
                info!(
                    cities = view.batch.len(),
                    alerts = view.alerts.len(),
                    "weather updated"
                );
                views.send_replace(Some(view));
            }
            Err(e) => {
                warn!(error = %e, "weather fetch failed; keeping previous state");
            }
        }
    }

    info!("poller stopped");
}
