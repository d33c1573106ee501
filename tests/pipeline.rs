use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use disaster_dash::data::category::{
    EconomicImpactCategory, PopulationImpactCategory, ResponseCategory, SeverityCategory,
};
use disaster_dash::data::clean::clean_file;
use disaster_dash::data::filter::{FilterConfig, LocationFilter, filter};
use disaster_dash::data::loader::{DatasetCache, RAW_COLUMNS};
use disaster_dash::data::model::Dataset;
use disaster_dash::data::stats::summarize;
use tempfile::tempdir;

/// Twelve raw rows: eight usable, one duplicate, one missing a location,
/// one with severity 11 and one with a negative response time.
const RAW_ROWS: &[&str] = &[
    "E1,2025-01-05,Flood,Lima,-12.05,-77.04,2,500,500000,3,0.10,Food,0",
    "E2,2025/02/14,Storm,Oslo,59.91,10.75,5,4000,3000000,10,0.35,Medical,0",
    "E3,03/03/2025,Earthquake,Lima,-12.05,-77.04,9,150000,200000000,80,0.90,Shelter,1",
    "E4,2025-03-20 08:15:00,Earthquake,Kobe,34.69,135.19,7,20000,40000000,30,0.70,Medical,1",
    "E5,2025-06-10,Flood,Oslo,59.91,10.75,4,2000,1500000,8,0.25,Food,0",
    "E6,2025-06-11,Storm,Kobe,34.69,135.19,8,60000,12000000,50,0.60,Shelter,1",
    "E6,2025-06-11,Storm,Kobe,34.69,135.19,8,60000,12000000,50,0.60,Shelter,1",
    "E7,2025-07-01,Flood,,0,0,3,100,1000,4,0.1,Food,0",
    "E8,2025-07-02,Flood,Lima,-12.05,-77.04,11,100,1000,4,0.1,Food,0",
    "E9,2025-07-03,Flood,Lima,-12.05,-77.04,3,100,1000,-4,0.1,Food,0",
    "E10,2025-09-30,Wildfire,Perth,-31.95,115.86,6,12000,8000000,20,0.40,Water,NaN",
    "E11,2025-12-31,Wildfire,Perth,-31.95,115.86,6,9000,6000000,12,0.45,Water,false",
];

fn write_raw(path: &Path) {
    let mut text = RAW_COLUMNS.join(",");
    text.push('\n');
    for row in RAW_ROWS {
        text.push_str(row);
        text.push('\n');
    }
    fs::write(path, text).unwrap();
}

fn assert_invariants(ds: &Dataset) {
    let mut ids = HashSet::new();
    for e in ds.events() {
        let ev = &e.event;
        assert!((1..=10).contains(&ev.severity_level));
        assert!(ev.response_time_hours >= 0.0);
        assert!(ev.affected_population >= 0);
        assert!(ev.estimated_economic_loss_usd >= 0.0);
        assert!((0.0..=1.0).contains(&ev.infrastructure_damage_index));
        assert!(!ev.location.is_empty());

        let d = &e.derived;
        assert_eq!(d.severity_category, SeverityCategory::from_level(ev.severity_level));
        assert_eq!(
            d.economic_impact_category,
            EconomicImpactCategory::from_loss(ev.estimated_economic_loss_usd)
        );
        assert_eq!(d.response_category, ResponseCategory::from_hours(ev.response_time_hours));
        assert_eq!(
            d.population_impact_category,
            PopulationImpactCategory::from_population(ev.affected_population)
        );
        assert_eq!(d.temporal.year, 2025);
        assert!(ids.insert(e.event.row_key()), "duplicate row {}", ev.event_id);
    }
}

#[test]
fn raw_csv_to_filtered_summary() {
    let dir = tempdir().unwrap();
    let raw = dir.path().join("raw.csv");
    let cleaned = dir.path().join("cleaned.csv");
    write_raw(&raw);

    let report = clean_file(&raw, &cleaned).unwrap().report;
    assert_eq!(report.initial_rows, 12);
    // E7 is missing a location, E10 has NaN in the major flag.
    assert_eq!(report.missing_dropped, 2);
    assert_eq!(report.duplicates_dropped, 1);
    assert_eq!(report.out_of_range.severity_level, 1);
    assert_eq!(report.out_of_range.response_time_hours, 1);
    assert_eq!(report.final_rows, 7);

    let cache = DatasetCache::new(&cleaned);
    let ds = cache.get().unwrap();
    assert!(Arc::ptr_eq(&ds, &cache.get().unwrap()));
    assert_eq!(ds.len(), 7);
    assert_invariants(&ds);

    let ids: Vec<&str> = ds.events().iter().map(|e| e.event.event_id.as_str()).collect();
    assert_eq!(ids, ["E1", "E2", "E3", "E4", "E5", "E6", "E11"]);

    let everything = filter(&ds, &FilterConfig::all(&ds));
    assert_eq!(everything.len(), 7);
    let all = summarize(&everything);
    assert_eq!(all.total_events, 7);
    assert_eq!(all.major_disasters, 3);
    assert_eq!(all.unique_locations, 4);
    assert_eq!(all.date_range_days, Some(360));

    let mut config = FilterConfig::all(&ds);
    config.major_only = true;
    config.locations = LocationFilter::from_selection(["Kobe"]);
    let view = filter(&ds, &config);
    let ids: Vec<&str> = view.iter().map(|e| e.event.event_id.as_str()).collect();
    assert_eq!(ids, ["E4", "E6"]);
    let summary = summarize(&view);
    assert_eq!(summary.affected_population.sum, 80_000.0);
    assert_eq!(summary.response_time.mean, 40.0);
    assert_eq!(summary.most_common_type.as_deref(), Some("Earthquake"));
}

#[test]
fn cleaning_cleaned_output_changes_nothing() {
    let dir = tempdir().unwrap();
    let raw = dir.path().join("raw.csv");
    let first = dir.path().join("first.csv");
    let second = dir.path().join("second.csv");
    write_raw(&raw);

    clean_file(&raw, &first).unwrap();
    let report = clean_file(&first, &second).unwrap().report;
    assert_eq!(report.initial_rows, report.final_rows);
    assert_eq!(report.missing_dropped + report.duplicates_dropped, 0);
    assert_eq!(report.out_of_range.total(), 0);

    let a = DatasetCache::new(&first).get().unwrap();
    let b = DatasetCache::new(&second).get().unwrap();
    assert_eq!(a.events(), b.events());
}

#[test]
fn every_output_format_loads_the_same_events() {
    let dir = tempdir().unwrap();
    let raw = dir.path().join("raw.csv");
    write_raw(&raw);

    let mut loaded = Vec::new();
    for name in ["out.csv", "out.json", "out.parquet"] {
        let out = dir.path().join(name);
        clean_file(&raw, &out).unwrap();
        let ds = DatasetCache::new(&out).get().unwrap();
        assert_invariants(&ds);
        loaded.push(ds);
    }
    assert_eq!(loaded[0].events(), loaded[1].events());
    assert_eq!(loaded[0].events(), loaded[2].events());

    let types: BTreeSet<&str> = loaded[2].disaster_types().iter().map(String::as_str).collect();
    assert_eq!(types, BTreeSet::from(["Earthquake", "Flood", "Storm", "Wildfire"]));
}

#[test]
fn saved_filters_reproduce_the_same_view() {
    let dir = tempdir().unwrap();
    let raw = dir.path().join("raw.csv");
    let cleaned = dir.path().join("cleaned.json");
    write_raw(&raw);
    clean_file(&raw, &cleaned).unwrap();
    let ds = DatasetCache::new(&cleaned).get().unwrap();

    let mut config = FilterConfig::all(&ds);
    config.severity_categories = BTreeSet::from([SeverityCategory::High, SeverityCategory::Critical]);
    let json = config.to_json().unwrap();
    fs::write(dir.path().join("filters.json"), &json).unwrap();

    let restored = FilterConfig::from_json(&fs::read_to_string(dir.path().join("filters.json")).unwrap()).unwrap();
    assert_eq!(restored, config);
    assert_eq!(
        filter(&ds, &restored).indices(),
        filter(&ds, &config).indices()
    );
}

#[test]
fn malformed_date_fails_without_touching_output() {
    let dir = tempdir().unwrap();
    let raw = dir.path().join("raw.csv");
    let out = dir.path().join("cleaned.csv");
    fs::write(
        &raw,
        format!(
            "{}\nE1,not-a-date,Flood,Lima,0,0,2,500,500000,3,0.1,Food,0\n",
            RAW_COLUMNS.join(",")
        ),
    )
    .unwrap();
    fs::write(&out, "previous contents").unwrap();

    let err = clean_file(&raw, &out).unwrap_err();
    assert!(format!("{err:#}").contains("not-a-date"));
    assert_eq!(fs::read_to_string(&out).unwrap(), "previous contents");
}

#[test]
fn infinite_loss_is_rejected_before_json_is_written() {
    let dir = tempdir().unwrap();
    let raw = dir.path().join("raw.csv");
    let out = dir.path().join("cleaned.json");
    fs::write(
        &raw,
        format!(
            "{}\nE1,2025-01-05,Flood,Lima,0,0,2,500,inf,3,0.1,Food,0\n",
            RAW_COLUMNS.join(",")
        ),
    )
    .unwrap();

    let err = clean_file(&raw, &out).unwrap_err();
    assert!(format!("{err:#}").contains("estimated_economic_loss_usd"));
    assert!(!out.exists());
}

#[test]
fn cleaned_events_match_what_was_written() {
    let dir = tempdir().unwrap();
    let raw = dir.path().join("raw.csv");
    let out = dir.path().join("cleaned.parquet");
    write_raw(&raw);

    let cleaned = clean_file(&raw, &out).unwrap();
    assert_eq!(cleaned.report.final_rows, cleaned.events.len());
    let ds = DatasetCache::new(&out).get().unwrap();
    assert_eq!(ds.events(), cleaned.events.as_slice());
}
