use std::{sync::Arc, time::Duration};

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, Text};
use tokio::sync::mpsc;
use tracing::info;
use weatherboard_core::{
    Config, Dashboard, PollSettings, SourceId, Units, WeatherSource, poller,
    source::{default_source_from_config, openweather::unique_cities},
};

use crate::render::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherboard", version, about = "Live city weather dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure where weather comes from.
    Configure {
        /// Source short name: "endpoint" or "openweather".
        #[arg(default_value = "endpoint")]
        source: String,
    },

    /// Fetch once and print the dashboard.
    Show {
        /// "metric" or "imperial"; defaults to the configured units.
        #[arg(long)]
        units: Option<String>,
    },

    /// Keep the dashboard on screen, refreshing on an interval.
    ///
    /// While running: `u` + Enter toggles units, `r` refreshes, `q` quits.
    Watch {
        /// "metric" or "imperial"; defaults to the configured units.
        #[arg(long)]
        units: Option<String>,

        /// Override the configured poll interval.
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { source } => configure(&source),
            Command::Show { units } => {
                let config = Config::load()?;
                let units = resolve_units(units.as_deref(), &config)?;
                show(&config, units).await
            }
            Command::Watch { units, interval_secs } => {
                let mut config = Config::load()?;
                let units = resolve_units(units.as_deref(), &config)?;
                if let Some(secs) = interval_secs {
                    config.poll_interval_secs = secs;
                }
                watch(&config, units).await
            }
        }
    }
}

fn resolve_units(flag: Option<&str>, config: &Config) -> anyhow::Result<Units> {
    match flag {
        Some(raw) => Units::try_from(raw),
        None => Ok(config.units),
    }
}

fn configure(source: &str) -> anyhow::Result<()> {
    let id = SourceId::try_from(source)?;
    let mut config = Config::load()?;

    match id {
        SourceId::Endpoint => {
            let endpoint = Text::new("Dashboard endpoint URL:")
                .with_default(&config.endpoint)
                .prompt()
                .context("Failed to read endpoint URL")?;
            config.endpoint = endpoint.trim().to_string();
        }
        SourceId::OpenWeather => {
            let api_key = Password::new("OpenWeather API key:")
                .without_confirmation()
                .prompt()
                .context("Failed to read API key")?;
            config.set_openweather_api_key(api_key.trim().to_string());

            let cities = Text::new("Cities (comma separated):")
                .with_default(&config.openweather.cities.join(", "))
                .prompt()
                .context("Failed to read city list")?;
            config.openweather.cities = parse_cities(&cities);
        }
    }

    config.set_source(id);
    config.save()?;

    println!("Saved {id} configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn parse_cities(raw: &str) -> Vec<String> {
    unique_cities(raw.split(','))
}

async fn show(config: &Config, units: Units) -> anyhow::Result<()> {
    let source = default_source_from_config(config)?;
    let batch = source
        .fetch_batch()
        .await
        .context("Failed to fetch weather")?;

    let mut dashboard = Dashboard::new(config.alert_threshold_c);
    let view = dashboard.apply(batch);
    print!("{}", render(&view.display(units)));

    Ok(())
}

async fn watch(config: &Config, mut units: Units) -> anyhow::Result<()> {
    let source: Arc<dyn WeatherSource> = Arc::from(default_source_from_config(config)?);
    let settings = PollSettings::from_config(config);

    info!(source = %config.source, interval_secs = settings.interval.as_secs(), "starting dashboard");
    let handle = poller::spawn(source, settings);
    let mut views = handle.subscribe();
    let mut lines = spawn_stdin_reader();
    let mut stdin_open = true;

    println!(
        "Polling every {}. Type u + Enter to toggle units, r to refresh, q to quit.",
        describe(settings.interval)
    );

    loop {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = views.borrow_and_update().clone();
                if let Some(view) = latest {
                    print!("{}", render(&view.display(units)));
                }
            }
            line = lines.recv(), if stdin_open => {
                match line.as_deref().map(str::trim) {
                    Some("u") => {
                        units = units.toggle();
                        match handle.latest() {
                            Some(view) => print!("{}", render(&view.display(units))),
                            None => println!("Units set to {units}; waiting for first update."),
                        }
                    }
                    Some("r") => handle.refresh(),
                    Some("q") => break,
                    Some(_) => {}
                    None => stdin_open = false,
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.stop().await;
    Ok(())
}

// A plain thread, so a pending read never holds up runtime shutdown.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(8);
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn describe(interval: Duration) -> String {
    let secs = interval.as_secs();
    if secs % 60 == 0 {
        format!("{} min", secs / 60)
    } else {
        format!("{secs} s")
    }
}
