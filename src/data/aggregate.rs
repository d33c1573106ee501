use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use super::model::CleanedEvent;
use super::stats::mean;

// ---------------------------------------------------------------------------
// Per disaster type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TypeBreakdown {
    pub disaster_type: String,
    pub events: usize,
    pub major_events: usize,
    pub total_affected: f64,
    pub total_loss: f64,
    pub avg_response_hours: f64,
    pub avg_severity: f64,
    pub avg_infrastructure_damage: f64,
}

/// One row per disaster type, most frequent first (ties by name).
pub fn by_disaster_type<'a>(events: impl IntoIterator<Item = &'a CleanedEvent>) -> Vec<TypeBreakdown> {
    let mut groups: BTreeMap<&str, Vec<&CleanedEvent>> = BTreeMap::new();
    for e in events {
        groups.entry(e.event.disaster_type.as_str()).or_default().push(e);
    }

    let mut rows: Vec<TypeBreakdown> = groups
        .into_iter()
        .map(|(kind, group)| TypeBreakdown {
            disaster_type: kind.to_string(),
            events: group.len(),
            major_events: group.iter().filter(|e| e.event.is_major_disaster).count(),
            total_affected: group.iter().map(|e| e.event.affected_population as f64).sum(),
            total_loss: group.iter().map(|e| e.event.estimated_economic_loss_usd).sum(),
            avg_response_hours: mean(group.iter().map(|e| e.event.response_time_hours)),
            avg_severity: mean(group.iter().map(|e| e.event.severity_level as f64)),
            avg_infrastructure_damage: mean(
                group.iter().map(|e| e.event.infrastructure_damage_index),
            ),
        })
        .collect();
    rows.sort_by(|a, b| b.events.cmp(&a.events).then_with(|| a.disaster_type.cmp(&b.disaster_type)));
    rows
}

// ---------------------------------------------------------------------------
// Per location
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct LocationBreakdown {
    pub location: String,
    pub events: usize,
    pub total_affected: f64,
    pub total_loss: f64,
    /// Number of distinct disaster types seen at this location.
    pub disaster_types: usize,
    pub latitude: f64,
    pub longitude: f64,
}

/// One row per location, in name order. Coordinates are the mean of the
/// location's events.
pub fn by_location<'a>(events: impl IntoIterator<Item = &'a CleanedEvent>) -> Vec<LocationBreakdown> {
    let mut groups: BTreeMap<&str, Vec<&CleanedEvent>> = BTreeMap::new();
    for e in events {
        groups.entry(e.event.location.as_str()).or_default().push(e);
    }
    groups
        .into_iter()
        .map(|(loc, group)| LocationBreakdown {
            location: loc.to_string(),
            events: group.len(),
            total_affected: group.iter().map(|e| e.event.affected_population as f64).sum(),
            total_loss: group.iter().map(|e| e.event.estimated_economic_loss_usd).sum(),
            disaster_types: group
                .iter()
                .map(|e| e.event.disaster_type.as_str())
                .collect::<BTreeSet<_>>()
                .len(),
            latitude: mean(group.iter().map(|e| e.event.latitude)),
            longitude: mean(group.iter().map(|e| e.event.longitude)),
        })
        .collect()
}

/// The `n` locations ranked by `key`, largest first (ties by name).
pub fn top_locations(
    rows: &[LocationBreakdown],
    n: usize,
    key: impl Fn(&LocationBreakdown) -> f64,
) -> Vec<LocationBreakdown> {
    let mut ranked = rows.to_vec();
    ranked.sort_by(|a, b| key(b).total_cmp(&key(a)).then_with(|| a.location.cmp(&b.location)));
    ranked.truncate(n);
    ranked
}

// ---------------------------------------------------------------------------
// Time series
// ---------------------------------------------------------------------------

/// Event count per calendar day that has at least one event, oldest first.
pub fn daily_counts<'a>(events: impl IntoIterator<Item = &'a CleanedEvent>) -> Vec<(NaiveDate, usize)> {
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for e in events {
        *counts.entry(e.event.date).or_default() += 1;
    }
    counts.into_iter().collect()
}

/// Event count per (year, month), oldest first.
pub fn monthly_counts<'a>(events: impl IntoIterator<Item = &'a CleanedEvent>) -> Vec<((i32, u32), usize)> {
    let mut counts: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for e in events {
        let t = &e.derived.temporal;
        *counts.entry((t.year, t.month)).or_default() += 1;
    }
    counts.into_iter().collect()
}

/// Mean of `value` per (year, month), oldest first.
pub fn monthly_mean<'a>(
    events: impl IntoIterator<Item = &'a CleanedEvent>,
    value: impl Fn(&CleanedEvent) -> f64,
) -> Vec<((i32, u32), f64)> {
    let mut groups: BTreeMap<(i32, u32), Vec<f64>> = BTreeMap::new();
    for e in events {
        let t = &e.derived.temporal;
        groups.entry((t.year, t.month)).or_default().push(value(e));
    }
    groups.into_iter().map(|(k, v)| (k, mean(v))).collect()
}

/// Trailing moving average; the first `window - 1` points average over
/// however many values exist so far.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, v) in values.iter().enumerate() {
        sum += v;
        if i >= window {
            sum -= values[i - window];
        }
        out.push(sum / (i + 1).min(window) as f64);
    }
    out
}

/// Count events by any derived key, in key order.
pub fn count_by<'a, K: Ord>(
    events: impl IntoIterator<Item = &'a CleanedEvent>,
    key: impl Fn(&CleanedEvent) -> K,
) -> BTreeMap<K, usize> {
    let mut counts = BTreeMap::new();
    for e in events {
        *counts.entry(key(e)).or_default() += 1;
    }
    counts
}

// ---------------------------------------------------------------------------
// Response efficiency
// ---------------------------------------------------------------------------

/// Faster responses score higher, and severe events weigh more:
/// `(1 - hours / max_hours) * 100 * (1 + severity / 10)`.
pub fn efficiency_score(response_hours: f64, max_hours: f64, severity: i64) -> f64 {
    let response_score = if max_hours > 0.0 {
        (1.0 - response_hours / max_hours) * 100.0
    } else {
        100.0
    };
    response_score * (1.0 + severity as f64 / 10.0)
}

/// Mean efficiency score per disaster type, best first.
pub fn efficiency_by_type<'a>(events: impl IntoIterator<Item = &'a CleanedEvent>) -> Vec<(String, f64)> {
    let events: Vec<&CleanedEvent> = events.into_iter().collect();
    let max_hours = events
        .iter()
        .map(|e| e.event.response_time_hours)
        .fold(0.0, f64::max);

    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for e in &events {
        groups
            .entry(e.event.disaster_type.as_str())
            .or_default()
            .push(efficiency_score(
                e.event.response_time_hours,
                max_hours,
                e.event.severity_level,
            ));
    }

    let mut rows: Vec<(String, f64)> = groups
        .into_iter()
        .map(|(kind, scores)| (kind.to_string(), mean(scores)))
        .collect();
    rows.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows
}
