use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};

use super::model::{CleanedEvent, DisasterEvent, RawRecord};
use super::{loader, writer};

// ---------------------------------------------------------------------------
// Errors and report
// ---------------------------------------------------------------------------

/// Input the cleaner refuses to guess about. Any of these aborts the run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CleanError {
    #[error("row {row}: unparseable date '{value}'")]
    InvalidDate { row: usize, value: String },

    #[error("row {row}: column '{column}' has invalid value '{value}'")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },
}

/// Rows dropped by each range check. A row is counted once, under the first
/// check it fails, in the order the fields are listed here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeViolations {
    pub severity_level: usize,
    pub response_time_hours: usize,
    pub affected_population: usize,
    pub estimated_economic_loss_usd: usize,
    pub infrastructure_damage_index: usize,
}

impl RangeViolations {
    pub fn total(&self) -> usize {
        self.severity_level
            + self.response_time_hours
            + self.affected_population
            + self.estimated_economic_loss_usd
            + self.infrastructure_damage_index
    }
}

/// Row counts at each stage of a cleaning run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleaningReport {
    pub initial_rows: usize,
    pub missing_dropped: usize,
    pub duplicates_dropped: usize,
    pub out_of_range: RangeViolations,
    pub final_rows: usize,
}

#[derive(Debug, Clone)]
pub struct Cleaned {
    pub events: Vec<CleanedEvent>,
    pub report: CleaningReport,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Read a raw CSV, clean it and overwrite `output` with the result.
/// Nothing is written when cleaning fails.
pub fn clean_file(input: &Path, output: &Path) -> Result<Cleaned> {
    let raw = loader::read_raw_csv(input)?;
    let cleaned = clean(&raw).with_context(|| format!("cleaning {}", input.display()))?;
    writer::write_file(output, &cleaned.events)?;
    log::info!(
        "Saved {} cleaned events to {}",
        cleaned.events.len(),
        output.display()
    );
    Ok(cleaned)
}

/// Validate raw rows, drop the unusable ones and derive the categorical fields.
///
/// Stages run in a fixed order: date parsing, missing values, exact
/// duplicates, range checks, then derivation. Insertion order is kept.
pub fn clean(raw: &[RawRecord]) -> Result<Cleaned, CleanError> {
    let mut report = CleaningReport {
        initial_rows: raw.len(),
        ..Default::default()
    };

    // 1. Dates first: a malformed date anywhere fails the whole run.
    let dates = raw
        .iter()
        .enumerate()
        .map(|(i, rec)| parse_date_cell(i + 1, rec.date.as_deref()))
        .collect::<Result<Vec<_>, _>>()?;
    log::debug!("Parsed {} date cells", dates.len());

    // 2. Missing values
    let mut events = Vec::with_capacity(raw.len());
    for (i, (rec, date)) in raw.iter().zip(dates).enumerate() {
        match typed_event(i + 1, rec, date)? {
            Some(event) => events.push(event),
            None => report.missing_dropped += 1,
        }
    }
    log::info!("Rows removed for missing values: {}", report.missing_dropped);

    // 3. Exact duplicates, first occurrence wins
    let mut seen = HashSet::with_capacity(events.len());
    events.retain(|e| seen.insert(e.row_key()));
    report.duplicates_dropped = raw.len() - report.missing_dropped - events.len();
    if report.duplicates_dropped > 0 {
        log::info!("Duplicates removed: {}", report.duplicates_dropped);
    } else {
        log::info!("No duplicates found");
    }

    // 4. Range invariants
    events.retain(|e| match range_violation(e) {
        Some(violation) => {
            report.out_of_range.record(violation);
            false
        }
        None => true,
    });
    if report.out_of_range.total() > 0 {
        log::info!(
            "Out-of-range rows removed: {} ({:?})",
            report.out_of_range.total(),
            report.out_of_range
        );
    }

    // 5 + 6. Temporal fields and bands
    let events: Vec<CleanedEvent> = events.into_iter().map(CleanedEvent::new).collect();
    report.final_rows = events.len();
    log::info!(
        "Cleaning kept {} of {} rows",
        report.final_rows,
        report.initial_rows
    );

    Ok(Cleaned { events, report })
}

// ---------------------------------------------------------------------------
// Range checks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Violation {
    Severity,
    ResponseTime,
    Population,
    EconomicLoss,
    InfrastructureDamage,
}

impl RangeViolations {
    fn record(&mut self, violation: Violation) {
        let counter = match violation {
            Violation::Severity => &mut self.severity_level,
            Violation::ResponseTime => &mut self.response_time_hours,
            Violation::Population => &mut self.affected_population,
            Violation::EconomicLoss => &mut self.estimated_economic_loss_usd,
            Violation::InfrastructureDamage => &mut self.infrastructure_damage_index,
        };
        *counter += 1;
    }
}

/// The first invariant `event` breaks, if any.
fn range_violation(event: &DisasterEvent) -> Option<Violation> {
    if !(1..=10).contains(&event.severity_level) {
        Some(Violation::Severity)
    } else if event.response_time_hours < 0.0 {
        Some(Violation::ResponseTime)
    } else if event.affected_population < 0 {
        Some(Violation::Population)
    } else if event.estimated_economic_loss_usd < 0.0 {
        Some(Violation::EconomicLoss)
    } else if !(0.0..=1.0).contains(&event.infrastructure_damage_index) {
        Some(Violation::InfrastructureDamage)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Cell parsing
// ---------------------------------------------------------------------------

/// Tokens read as "no value", mirroring the usual dataframe NA markers.
const NA_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "<NA>", "#N/A",
];

fn present(cell: Option<&str>) -> Option<&str> {
    let cell = cell?.trim();
    if NA_TOKENS.contains(&cell) {
        None
    } else {
        Some(cell)
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse a calendar date in any of the accepted layouts.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn parse_date_cell(row: usize, cell: Option<&str>) -> Result<Option<NaiveDate>, CleanError> {
    match present(cell) {
        None => Ok(None),
        Some(s) => parse_date(s).map(Some).ok_or_else(|| CleanError::InvalidDate {
            row,
            value: s.to_string(),
        }),
    }
}

fn invalid(row: usize, column: &'static str, value: &str) -> CleanError {
    CleanError::InvalidValue {
        row,
        column,
        value: value.to_string(),
    }
}

fn parse_f64(row: usize, column: &'static str, cell: Option<&str>) -> Result<Option<f64>, CleanError> {
    let Some(s) = present(cell) else {
        return Ok(None);
    };
    let v: f64 = s.parse().map_err(|_| invalid(row, column, s))?;
    if v.is_nan() {
        return Ok(None);
    }
    if v.is_infinite() {
        return Err(invalid(row, column, s));
    }
    Ok(Some(v))
}

/// Integers may be written as `42` or `42.0`; a fractional part or a value
/// outside the `i64` range is invalid.
fn parse_i64(row: usize, column: &'static str, cell: Option<&str>) -> Result<Option<i64>, CleanError> {
    let Some(s) = present(cell) else {
        return Ok(None);
    };
    if let Ok(i) = s.parse::<i64>() {
        return Ok(Some(i));
    }
    match s.parse::<f64>() {
        // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound
        Ok(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => Ok(Some(f as i64)),
        _ => Err(invalid(row, column, s)),
    }
}

fn parse_bool(row: usize, column: &'static str, cell: Option<&str>) -> Result<Option<bool>, CleanError> {
    let Some(s) = present(cell) else {
        return Ok(None);
    };
    match s.to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" => Ok(Some(true)),
        "0" | "0.0" | "false" => Ok(Some(false)),
        _ => Err(invalid(row, column, s)),
    }
}

fn parse_text(cell: Option<&str>) -> Option<String> {
    present(cell).map(str::to_string)
}

/// Type every cell of a raw row. `Ok(None)` means some cell was missing.
fn typed_event(
    row: usize,
    rec: &RawRecord,
    date: Option<NaiveDate>,
) -> Result<Option<DisasterEvent>, CleanError> {
    // Parse every numeric cell before bailing on missing ones so malformed
    // values are reported even on incomplete rows.
    let latitude = parse_f64(row, "latitude", rec.latitude.as_deref())?;
    let longitude = parse_f64(row, "longitude", rec.longitude.as_deref())?;
    let severity_level = parse_i64(row, "severity_level", rec.severity_level.as_deref())?;
    let affected_population =
        parse_i64(row, "affected_population", rec.affected_population.as_deref())?;
    let estimated_economic_loss_usd = parse_f64(
        row,
        "estimated_economic_loss_usd",
        rec.estimated_economic_loss_usd.as_deref(),
    )?;
    let response_time_hours =
        parse_f64(row, "response_time_hours", rec.response_time_hours.as_deref())?;
    let infrastructure_damage_index = parse_f64(
        row,
        "infrastructure_damage_index",
        rec.infrastructure_damage_index.as_deref(),
    )?;
    let is_major_disaster = parse_bool(row, "is_major_disaster", rec.is_major_disaster.as_deref())?;

    let event = (|| {
        Some(DisasterEvent {
            event_id: parse_text(rec.event_id.as_deref())?,
            date: date?,
            disaster_type: parse_text(rec.disaster_type.as_deref())?,
            location: parse_text(rec.location.as_deref())?,
            latitude: latitude?,
            longitude: longitude?,
            severity_level: severity_level?,
            affected_population: affected_population?,
            estimated_economic_loss_usd: estimated_economic_loss_usd?,
            response_time_hours: response_time_hours?,
            infrastructure_damage_index: infrastructure_damage_index?,
            aid_provided: parse_text(rec.aid_provided.as_deref())?,
            is_major_disaster: is_major_disaster?,
        })
    })();
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::category::*;

    fn raw(id: &str, date: &str, severity: &str, response: &str, pop: &str, loss: &str) -> RawRecord {
        RawRecord {
            event_id: Some(id.into()),
            date: Some(date.into()),
            disaster_type: Some("Flood".into()),
            location: Some("Lima".into()),
            latitude: Some("-12.05".into()),
            longitude: Some("-77.04".into()),
            severity_level: Some(severity.into()),
            affected_population: Some(pop.into()),
            estimated_economic_loss_usd: Some(loss.into()),
            response_time_hours: Some(response.into()),
            infrastructure_damage_index: Some("0.5".into()),
            aid_provided: Some("Food".into()),
            is_major_disaster: Some("0".into()),
        }
    }

    #[test]
    fn end_to_end_example_keeps_two_rows() {
        let rows = vec![
            raw("E1", "2025-01-05", "2", "3", "500", "500000"),
            raw("E2", "2025-06-10", "9", "80", "150000", "200000000"),
            raw("E2", "2025-06-10", "9", "80", "150000", "200000000"),
        ];
        let cleaned = clean(&rows).unwrap();
        assert_eq!(cleaned.events.len(), 2);
        assert_eq!(cleaned.report.duplicates_dropped, 1);

        let d = &cleaned.events[0].derived;
        assert_eq!(d.severity_category, SeverityCategory::Low);
        assert_eq!(d.economic_impact_category, EconomicImpactCategory::Minor);
        assert_eq!(d.response_category, ResponseCategory::Immediate);
        assert_eq!(d.population_impact_category, PopulationImpactCategory::Small);

        let d = &cleaned.events[1].derived;
        assert_eq!(d.severity_category, SeverityCategory::Critical);
        assert_eq!(d.economic_impact_category, EconomicImpactCategory::Catastrophic);
        assert_eq!(d.response_category, ResponseCategory::Slow);
        assert_eq!(d.population_impact_category, PopulationImpactCategory::VeryLarge);
    }

    #[test]
    fn missing_cells_drop_the_row() {
        let mut no_location = raw("E1", "2025-01-05", "2", "3", "500", "500000");
        no_location.location = None;
        let mut na_loss = raw("E2", "2025-01-06", "2", "3", "500", "NaN");
        na_loss.aid_provided = Some("  ".into());
        let mut no_date = raw("E3", "", "2", "3", "500", "1");
        no_date.date = Some(String::new());
        let keep = raw("E4", "2025-01-07", "2", "3", "500", "10");

        let cleaned = clean(&[no_location, na_loss, no_date, keep]).unwrap();
        assert_eq!(cleaned.report.missing_dropped, 3);
        assert_eq!(cleaned.events.len(), 1);
        assert_eq!(cleaned.events[0].event.event_id, "E4");
    }

    #[test]
    fn out_of_range_rows_are_counted_not_repaired() {
        let mut bad_infra = raw("E5", "2025-01-05", "5", "3", "500", "10");
        bad_infra.infrastructure_damage_index = Some("1.2".into());
        let rows = vec![
            raw("E1", "2025-01-05", "0", "3", "500", "10"),
            raw("E2", "2025-01-05", "11", "3", "500", "10"),
            raw("E3", "2025-01-05", "5", "-1", "500", "10"),
            raw("E4", "2025-01-05", "5", "3", "-5", "-10"),
            bad_infra,
            raw("E6", "2025-01-05", "10", "0", "0", "0"),
        ];
        let cleaned = clean(&rows).unwrap();
        let v = cleaned.report.out_of_range;
        assert_eq!(v.severity_level, 2);
        assert_eq!(v.response_time_hours, 1);
        assert_eq!(v.affected_population, 1);
        assert_eq!(v.estimated_economic_loss_usd, 0);
        assert_eq!(v.infrastructure_damage_index, 1);
        assert_eq!(cleaned.events.len(), 1);
        assert_eq!(cleaned.events[0].event.event_id, "E6");
    }

    #[test]
    fn malformed_date_is_fatal() {
        let rows = vec![
            raw("E1", "2025-01-05", "2", "3", "500", "10"),
            raw("E2", "fifth of May", "2", "3", "500", "10"),
        ];
        assert_eq!(
            clean(&rows).unwrap_err(),
            CleanError::InvalidDate {
                row: 2,
                value: "fifth of May".into()
            }
        );
    }

    #[test]
    fn malformed_number_is_fatal() {
        let rows = vec![raw("E1", "2025-01-05", "2.5", "3", "500", "10")];
        assert!(matches!(
            clean(&rows),
            Err(CleanError::InvalidValue { row: 1, column: "severity_level", .. })
        ));
    }

    #[test]
    fn infinite_amount_is_fatal() {
        for cell in ["inf", "-inf", "Infinity"] {
            let rows = vec![raw("E1", "2025-01-05", "2", "3", "500", cell)];
            assert_eq!(
                clean(&rows).unwrap_err(),
                CleanError::InvalidValue {
                    row: 1,
                    column: "estimated_economic_loss_usd",
                    value: cell.into()
                }
            );
        }
    }

    #[test]
    fn integer_outside_i64_is_fatal() {
        let rows = vec![raw("E1", "2025-01-05", "2", "3", "1e30", "10")];
        assert!(matches!(
            clean(&rows),
            Err(CleanError::InvalidValue { row: 1, column: "affected_population", .. })
        ));
        assert_eq!(parse_i64(1, "p", Some("9.2e18")), Ok(Some(9_200_000_000_000_000_000)));
        assert!(parse_i64(1, "p", Some("9.3e18")).is_err());
        assert!(parse_i64(1, "p", Some("-inf")).is_err());
    }

    #[test]
    fn accepted_date_layouts() {
        let expected = NaiveDate::from_ymd_opt(2025, 6, 10);
        assert_eq!(parse_date("2025-06-10"), expected);
        assert_eq!(parse_date("2025/06/10"), expected);
        assert_eq!(parse_date("06/10/2025"), expected);
        assert_eq!(parse_date("2025-06-10 13:45:00"), expected);
        assert_eq!(parse_date("2025-06-10T13:45:00"), expected);
        assert_eq!(parse_date("10.06.2025"), None);
    }

    #[test]
    fn major_flag_accepts_numbers_and_words() {
        assert_eq!(parse_bool(1, "m", Some("1")), Ok(Some(true)));
        assert_eq!(parse_bool(1, "m", Some("False")), Ok(Some(false)));
        assert_eq!(parse_bool(1, "m", Some("")), Ok(None));
        assert!(parse_bool(1, "m", Some("maybe")).is_err());
    }

    #[test]
    fn cleaning_is_idempotent() {
        let rows = vec![
            raw("E1", "2025-01-05", "2", "3", "500", "500000"),
            raw("E2", "2025-06-10", "9", "80", "150000", "200000000"),
            raw("E2", "2025-06-10", "9", "80", "150000", "200000000"),
            raw("E3", "2025-06-11", "12", "80", "150000", "200000000"),
        ];
        let once = clean(&rows).unwrap().events;
        let twice = clean(&rows).unwrap().events;
        assert_eq!(once, twice);
    }
}
