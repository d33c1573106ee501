use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::category::{
    EconomicImpactCategory, PopulationImpactCategory, ResponseCategory, SeverityCategory,
};

// ---------------------------------------------------------------------------
// RawRecord – one untyped row of the source file
// ---------------------------------------------------------------------------

/// A row exactly as read from the raw CSV. Every cell is optional text so the
/// cleaner can tell a missing value apart from a malformed one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub event_id: Option<String>,
    pub date: Option<String>,
    pub disaster_type: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub severity_level: Option<String>,
    pub affected_population: Option<String>,
    pub estimated_economic_loss_usd: Option<String>,
    pub response_time_hours: Option<String>,
    pub infrastructure_damage_index: Option<String>,
    pub aid_provided: Option<String>,
    pub is_major_disaster: Option<String>,
}

// ---------------------------------------------------------------------------
// DisasterEvent – the typed base fields of one event
// ---------------------------------------------------------------------------

/// One disaster occurrence with its base (source-provided) fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DisasterEvent {
    pub event_id: String,
    pub date: NaiveDate,
    pub disaster_type: String,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    /// 1..=10 once cleaned.
    pub severity_level: i64,
    pub affected_population: i64,
    pub estimated_economic_loss_usd: f64,
    pub response_time_hours: f64,
    /// Fraction in [0, 1] once cleaned.
    pub infrastructure_damage_index: f64,
    pub aid_provided: String,
    pub is_major_disaster: bool,
}

/// Hashable identity of a full row, used for exact-duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowKey {
    text: [String; 4],
    date: NaiveDate,
    ints: [i64; 2],
    floats: [u64; 5],
    major: bool,
}

fn float_bits(v: f64) -> u64 {
    // -0.0 and 0.0 are the same value
    if v == 0.0 { 0 } else { v.to_bits() }
}

impl DisasterEvent {
    pub fn row_key(&self) -> RowKey {
        RowKey {
            text: [
                self.event_id.clone(),
                self.disaster_type.clone(),
                self.location.clone(),
                self.aid_provided.clone(),
            ],
            date: self.date,
            ints: [self.severity_level, self.affected_population],
            floats: [
                float_bits(self.latitude),
                float_bits(self.longitude),
                float_bits(self.estimated_economic_loss_usd),
                float_bits(self.response_time_hours),
                float_bits(self.infrastructure_damage_index),
            ],
            major: self.is_major_disaster,
        }
    }
}

// ---------------------------------------------------------------------------
// Derived fields
// ---------------------------------------------------------------------------

/// Calendar fields that are pure functions of the event date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalFields {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub quarter: u32,
    pub day_of_week: String,
    pub week_of_year: u32,
}

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("")
}

impl TemporalFields {
    pub fn from_date(date: NaiveDate) -> Self {
        let month = date.month();
        TemporalFields {
            year: date.year(),
            month,
            month_name: month_name(month).to_string(),
            quarter: (month - 1) / 3 + 1,
            day_of_week: weekday_name(date.weekday()).to_string(),
            week_of_year: date.iso_week().week(),
        }
    }
}

/// Everything the cleaner adds on top of the base fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedFields {
    pub temporal: TemporalFields,
    pub severity_category: SeverityCategory,
    pub economic_impact_category: EconomicImpactCategory,
    pub response_category: ResponseCategory,
    pub population_impact_category: PopulationImpactCategory,
}

impl DerivedFields {
    pub fn derive(event: &DisasterEvent) -> Self {
        DerivedFields {
            temporal: TemporalFields::from_date(event.date),
            severity_category: SeverityCategory::from_level(event.severity_level),
            economic_impact_category: EconomicImpactCategory::from_loss(
                event.estimated_economic_loss_usd,
            ),
            response_category: ResponseCategory::from_hours(event.response_time_hours),
            population_impact_category: PopulationImpactCategory::from_population(
                event.affected_population,
            ),
        }
    }
}

/// A cleaned row: validated base fields plus the derived fields.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedEvent {
    pub event: DisasterEvent,
    pub derived: DerivedFields,
}

impl CleanedEvent {
    pub fn new(event: DisasterEvent) -> Self {
        let derived = DerivedFields::derive(&event);
        CleanedEvent { event, derived }
    }
}

// ---------------------------------------------------------------------------
// CleanedRow – flat on-disk layout of a cleaned event
// ---------------------------------------------------------------------------

/// Column layout of the cleaned file: base fields first, then derived ones.
/// Kept flat because the CSV writer cannot serialize nested structs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedRow {
    pub event_id: String,
    pub date: NaiveDate,
    pub disaster_type: String,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub severity_level: i64,
    pub affected_population: i64,
    pub estimated_economic_loss_usd: f64,
    pub response_time_hours: f64,
    pub infrastructure_damage_index: f64,
    pub aid_provided: String,
    pub is_major_disaster: bool,
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub quarter: u32,
    pub day_of_week: String,
    pub week_of_year: u32,
    pub severity_category: SeverityCategory,
    pub economic_impact_category: EconomicImpactCategory,
    pub response_category: ResponseCategory,
    pub population_impact_category: PopulationImpactCategory,
}

impl CleanedRow {
    pub const COLUMNS: [&'static str; 23] = [
        "event_id",
        "date",
        "disaster_type",
        "location",
        "latitude",
        "longitude",
        "severity_level",
        "affected_population",
        "estimated_economic_loss_usd",
        "response_time_hours",
        "infrastructure_damage_index",
        "aid_provided",
        "is_major_disaster",
        "year",
        "month",
        "month_name",
        "quarter",
        "day_of_week",
        "week_of_year",
        "severity_category",
        "economic_impact_category",
        "response_category",
        "population_impact_category",
    ];
}

impl From<&CleanedEvent> for CleanedRow {
    fn from(c: &CleanedEvent) -> Self {
        let e = &c.event;
        let d = &c.derived;
        CleanedRow {
            event_id: e.event_id.clone(),
            date: e.date,
            disaster_type: e.disaster_type.clone(),
            location: e.location.clone(),
            latitude: e.latitude,
            longitude: e.longitude,
            severity_level: e.severity_level,
            affected_population: e.affected_population,
            estimated_economic_loss_usd: e.estimated_economic_loss_usd,
            response_time_hours: e.response_time_hours,
            infrastructure_damage_index: e.infrastructure_damage_index,
            aid_provided: e.aid_provided.clone(),
            is_major_disaster: e.is_major_disaster,
            year: d.temporal.year,
            month: d.temporal.month,
            month_name: d.temporal.month_name.clone(),
            quarter: d.temporal.quarter,
            day_of_week: d.temporal.day_of_week.clone(),
            week_of_year: d.temporal.week_of_year,
            severity_category: d.severity_category,
            economic_impact_category: d.economic_impact_category,
            response_category: d.response_category,
            population_impact_category: d.population_impact_category,
        }
    }
}

impl From<CleanedRow> for CleanedEvent {
    fn from(r: CleanedRow) -> Self {
        CleanedEvent {
            event: DisasterEvent {
                event_id: r.event_id,
                date: r.date,
                disaster_type: r.disaster_type,
                location: r.location,
                latitude: r.latitude,
                longitude: r.longitude,
                severity_level: r.severity_level,
                affected_population: r.affected_population,
                estimated_economic_loss_usd: r.estimated_economic_loss_usd,
                response_time_hours: r.response_time_hours,
                infrastructure_damage_index: r.infrastructure_damage_index,
                aid_provided: r.aid_provided,
                is_major_disaster: r.is_major_disaster,
            },
            derived: DerivedFields {
                temporal: TemporalFields {
                    year: r.year,
                    month: r.month,
                    month_name: r.month_name,
                    quarter: r.quarter,
                    day_of_week: r.day_of_week,
                    week_of_year: r.week_of_year,
                },
                severity_category: r.severity_category,
                economic_impact_category: r.economic_impact_category,
                response_category: r.response_category,
                population_impact_category: r.population_impact_category,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the immutable cleaned snapshot
// ---------------------------------------------------------------------------

/// The cleaned dataset with pre-computed value indices.
///
/// There are no `&mut` accessors: once built, a `Dataset` is shared through
/// `Arc<Dataset>` and read by every consumer. Filtering yields a
/// [`View`](super::filter::View) that borrows it.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    events: Vec<CleanedEvent>,
    disaster_types: BTreeSet<String>,
    locations: BTreeSet<String>,
    aid_types: BTreeSet<String>,
    location_counts: BTreeMap<String, usize>,
    date_bounds: Option<(NaiveDate, NaiveDate)>,
}

impl Dataset {
    /// Build value indices from the cleaned events.
    pub fn from_events(events: Vec<CleanedEvent>) -> Self {
        let mut disaster_types = BTreeSet::new();
        let mut locations = BTreeSet::new();
        let mut aid_types = BTreeSet::new();
        let mut location_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut date_bounds: Option<(NaiveDate, NaiveDate)> = None;

        for c in &events {
            let e = &c.event;
            disaster_types.insert(e.disaster_type.clone());
            locations.insert(e.location.clone());
            aid_types.insert(e.aid_provided.clone());
            *location_counts.entry(e.location.clone()).or_default() += 1;
            date_bounds = Some(match date_bounds {
                None => (e.date, e.date),
                Some((lo, hi)) => (lo.min(e.date), hi.max(e.date)),
            });
        }

        Dataset {
            events,
            disaster_types,
            locations,
            aid_types,
            location_counts,
            date_bounds,
        }
    }

    pub fn events(&self) -> &[CleanedEvent] {
        &self.events
    }

    pub fn get(&self, index: usize) -> Option<&CleanedEvent> {
        self.events.get(index)
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn disaster_types(&self) -> &BTreeSet<String> {
        &self.disaster_types
    }

    pub fn locations(&self) -> &BTreeSet<String> {
        &self.locations
    }

    pub fn aid_types(&self) -> &BTreeSet<String> {
        &self.aid_types
    }

    /// Earliest and latest event date, `None` when empty.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.date_bounds
    }

    /// The `n` locations with the most events (ties broken by name).
    pub fn top_locations(&self, n: usize) -> Vec<String> {
        let mut counts: Vec<(&String, &usize)> = self.location_counts.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        counts.into_iter().take(n).map(|(loc, _)| loc.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::event;

    #[test]
    fn temporal_fields_follow_the_date() {
        // 2025-01-05 is a Sunday in ISO week 1
        let t = TemporalFields::from_date(NaiveDate::from_ymd_opt(2025, 1, 5).unwrap());
        assert_eq!(t.year, 2025);
        assert_eq!(t.month, 1);
        assert_eq!(t.month_name, "January");
        assert_eq!(t.quarter, 1);
        assert_eq!(t.day_of_week, "Sunday");
        assert_eq!(t.week_of_year, 1);

        let t = TemporalFields::from_date(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());
        assert_eq!(t.quarter, 4);
        assert_eq!(t.month_name, "October");
        assert_eq!(t.day_of_week, "Wednesday");
    }

    #[test]
    fn duplicate_rows_share_a_key() {
        let a = event("E1", (2025, 3, 1), "Lima");
        let mut b = a.clone();
        assert_eq!(a.row_key(), b.row_key());
        b.latitude = 10.5;
        assert_ne!(a.row_key(), b.row_key());
    }

    #[test]
    fn flat_row_round_trips_the_event() {
        let cleaned = CleanedEvent::new(event("E1", (2025, 3, 1), "Lima"));
        let row = CleanedRow::from(&cleaned);
        assert_eq!(CleanedEvent::from(row), cleaned);
    }

    #[test]
    fn dataset_indexes_values() {
        let ds = Dataset::from_events(vec![
            CleanedEvent::new(event("E1", (2025, 3, 1), "Lima")),
            CleanedEvent::new(event("E2", (2025, 1, 9), "Oslo")),
            CleanedEvent::new(event("E3", (2025, 7, 2), "Lima")),
        ]);
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.locations().len(), 2);
        assert_eq!(
            ds.date_bounds(),
            Some((
                NaiveDate::from_ymd_opt(2025, 1, 9).unwrap(),
                NaiveDate::from_ymd_opt(2025, 7, 2).unwrap()
            ))
        );
        assert_eq!(ds.top_locations(1), vec!["Lima".to_string()]);
        assert!(Dataset::from_events(Vec::new()).date_bounds().is_none());
    }
}
