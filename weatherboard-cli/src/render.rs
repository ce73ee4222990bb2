//! Plain-text rendering of a [`DisplayView`].

use std::fmt::Write;

use weatherboard_core::{ChartSeries, DisplayView};

const BAR_WIDTH: usize = 40;

pub fn render(view: &DisplayView) -> String {
    let unit = view.units.symbol();
    let mut out = String::new();

    let _ = writeln!(out, "\nWeather Conditions ({})", view.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(
        out,
        "\n{:<14} {:>8} {:>8} {:>8} {:>8} {:>6} {:>9}  {}",
        "City", "Now", "Max", "Min", "Feels", "Hum%", "Wind km/h", "Condition"
    );
    let _ = writeln!(out, "{}", "-".repeat(90));

    for card in &view.cards {
        let _ = writeln!(
            out,
            "{:<14} {:>7.0}°{} {:>6.2}°{} {:>6.2}°{} {:>6.2}°{} {:>6.0} {:>9.1}  {}",
            card.city,
            card.current_temp,
            unit,
            card.max_temp,
            unit,
            card.min_temp,
            unit,
            card.feels_like,
            unit,
            card.humidity,
            card.wind_speed,
            card.condition,
        );
    }

    let _ = writeln!(out, "\nStatistics");
    match view.average_max_temp {
        Some(avg) => {
            let _ = writeln!(out, "   Average Temperature: {avg:.2}°{unit}");
        }
        None => {
            let _ = writeln!(out, "   Average Temperature: No data");
        }
    }
    let _ = writeln!(out, "   Dominant Weather Condition: {}", view.dominant_condition);

    let _ = writeln!(out, "\n{}", view.chart.title);
    out.push_str(&bar_chart(&view.chart, unit));

    let _ = writeln!(out, "\nTriggered Alerts");
    if view.alerts.is_empty() {
        let _ = writeln!(out, "   No alerts triggered.");
    } else {
        for alert in &view.alerts {
            let _ = writeln!(out, "   ! {alert}");
        }
    }

    out
}

fn bar_chart(series: &ChartSeries, unit: &str) -> String {
    let mut out = String::new();
    let top = series
        .values
        .iter()
        .copied()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));

    for (label, value) in series.labels.iter().zip(&series.values) {
        let len = if top > 0.0 {
            ((value.abs() / top) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        let _ = writeln!(out, "   {label:<14} {} {value:.1}°{unit}", "#".repeat(len));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use weatherboard_core::{Units, ViewState, WeatherSnapshot};

    fn view(batch: Vec<WeatherSnapshot>) -> ViewState {
        let at = Utc.with_ymd_and_hms(2024, 10, 16, 9, 30, 0).unwrap();
        ViewState::from_batch(batch, Vec::new(), at)
    }

    fn city(name: &str, max_temp: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            city: name.to_string(),
            current_temp: max_temp,
            max_temp,
            min_temp: max_temp - 5.0,
            feels_like: max_temp,
            condition: "clear sky".to_string(),
            humidity: 50.0,
            wind_speed: 10.0,
            observed_at: None,
        }
    }

    #[test]
    fn renders_cards_stats_chart_and_alerts() {
        let state = view(vec![city("Delhi", 40.0), city("Mumbai", 20.0)]);
        let text = render(&state.display(Units::Metric));

        assert!(text.contains("Delhi"));
        assert!(text.contains("Average Temperature: 30.00°C"));
        assert!(text.contains("Dominant Weather Condition: clear sky"));
        assert!(text.contains("Max Temperature (C)"));
        assert!(text.contains(&"#".repeat(BAR_WIDTH)));
        assert!(text.contains("No alerts triggered."));
    }

    #[test]
    fn renders_fahrenheit_from_same_state() {
        let state = view(vec![city("Delhi", 100.0)]);
        let text = render(&state.display(Units::Imperial));

        assert!(text.contains("212.00°F"));
        assert!(text.contains("Max Temperature (F)"));
    }

    #[test]
    fn empty_view_says_no_data() {
        let text = render(&view(Vec::new()).display(Units::Metric));

        assert!(text.contains("Average Temperature: No data"));
        assert!(text.contains("No Dominant Condition Found"));
    }
}
