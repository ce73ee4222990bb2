use crate::model::WeatherSnapshot;

/// Reported when no snapshot in the batch carries a condition.
pub const NO_DOMINANT_CONDITION: &str = "No Dominant Condition Found";

/// Mean of `max_temp` across the batch, or `None` for an empty batch.
pub fn average_max_temp(batch: &[WeatherSnapshot]) -> Option<f64> {
    if batch.is_empty() {
        return None;
    }

    let total: f64 = batch.iter().map(|s| s.max_temp).sum();
    Some(total / batch.len() as f64)
}

/// Most frequent condition in the batch.
///
/// Conditions are compared exactly as received. Ties go to whichever
/// condition shows up first in batch order. Empty conditions are not counted.
pub fn dominant_condition(batch: &[WeatherSnapshot]) -> String {
    // Insertion-ordered tally; batches are a handful of cities.
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for condition in batch.iter().map(|s| s.condition.as_str()) {
        if condition.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|(c, _)| *c == condition) {
            Some((_, n)) => *n += 1,
            None => counts.push((condition, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (condition, n) in counts {
        if best.is_none_or(|(_, top)| n > top) {
            best = Some((condition, n));
        }
    }

    best.map(|(c, _)| c.to_string())
        .unwrap_or_else(|| NO_DOMINANT_CONDITION.to_string())
}
