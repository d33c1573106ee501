use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    ArrayRef, BooleanArray, Float64Array, Int32Array, Int64Array, StringArray, UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use super::model::{CleanedEvent, CleanedRow};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Write cleaned events to `path`, replacing any existing file.
/// Dispatch by extension: `.csv`, `.json`, `.parquet` / `.pq`.
///
/// Output goes to a sibling `*.tmp` file first and is renamed into place, so
/// a failure never leaves a truncated dataset behind.
pub fn write_file(path: &Path, events: &[CleanedEvent]) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if !matches!(ext.as_str(), "csv" | "json" | "parquet" | "pq") {
        bail!("Unsupported output extension: .{ext}");
    }

    let tmp = temp_path(path);
    let rows: Vec<CleanedRow> = events.iter().map(CleanedRow::from).collect();

    let result = match ext.as_str() {
        "csv" => write_csv(&tmp, &rows),
        "json" => write_json(&tmp, &rows),
        _ => write_parquet(&tmp, &rows),
    }
    .and_then(|()| {
        std::fs::rename(&tmp, path)
            .with_context(|| format!("moving output into place at {}", path.display()))
    });

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result.with_context(|| format!("writing {}", path.display()))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

// ---------------------------------------------------------------------------
// CSV / JSON writers
// ---------------------------------------------------------------------------

fn write_csv(path: &Path, rows: &[CleanedRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    if rows.is_empty() {
        // serialize() only emits the header alongside the first record
        writer.write_record(CleanedRow::COLUMNS)?;
    }
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_json(path: &Path, rows: &[CleanedRow]) -> Result<()> {
    let file = File::create(path).context("creating JSON file")?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, rows).context("serializing JSON")?;
    out.flush().context("flushing JSON")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Parquet writer
// ---------------------------------------------------------------------------

fn strings<'a>(rows: &'a [CleanedRow], f: impl Fn(&'a CleanedRow) -> &'a str) -> ArrayRef {
    Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
}

fn write_parquet(path: &Path, rows: &[CleanedRow]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("event_id", DataType::Utf8, false),
        Field::new("date", DataType::Utf8, false),
        Field::new("disaster_type", DataType::Utf8, false),
        Field::new("location", DataType::Utf8, false),
        Field::new("latitude", DataType::Float64, false),
        Field::new("longitude", DataType::Float64, false),
        Field::new("severity_level", DataType::Int64, false),
        Field::new("affected_population", DataType::Int64, false),
        Field::new("estimated_economic_loss_usd", DataType::Float64, false),
        Field::new("response_time_hours", DataType::Float64, false),
        Field::new("infrastructure_damage_index", DataType::Float64, false),
        Field::new("aid_provided", DataType::Utf8, false),
        Field::new("is_major_disaster", DataType::Boolean, false),
        Field::new("year", DataType::Int32, false),
        Field::new("month", DataType::UInt32, false),
        Field::new("month_name", DataType::Utf8, false),
        Field::new("quarter", DataType::UInt32, false),
        Field::new("day_of_week", DataType::Utf8, false),
        Field::new("week_of_year", DataType::UInt32, false),
        Field::new("severity_category", DataType::Utf8, false),
        Field::new("economic_impact_category", DataType::Utf8, false),
        Field::new("response_category", DataType::Utf8, false),
        Field::new("population_impact_category", DataType::Utf8, false),
    ]));

    let dates: Vec<String> = rows.iter().map(|r| r.date.format("%Y-%m-%d").to_string()).collect();

    let columns: Vec<ArrayRef> = vec![
        strings(rows, |r| r.event_id.as_str()),
        Arc::new(StringArray::from(dates)),
        strings(rows, |r| r.disaster_type.as_str()),
        strings(rows, |r| r.location.as_str()),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.latitude))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.longitude))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.severity_level))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.affected_population))),
        Arc::new(Float64Array::from_iter_values(
            rows.iter().map(|r| r.estimated_economic_loss_usd),
        )),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.response_time_hours))),
        Arc::new(Float64Array::from_iter_values(
            rows.iter().map(|r| r.infrastructure_damage_index),
        )),
        strings(rows, |r| r.aid_provided.as_str()),
        Arc::new(BooleanArray::from(
            rows.iter().map(|r| r.is_major_disaster).collect::<Vec<_>>(),
        )),
        Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.year))),
        Arc::new(UInt32Array::from_iter_values(rows.iter().map(|r| r.month))),
        strings(rows, |r| r.month_name.as_str()),
        Arc::new(UInt32Array::from_iter_values(rows.iter().map(|r| r.quarter))),
        strings(rows, |r| r.day_of_week.as_str()),
        Arc::new(UInt32Array::from_iter_values(rows.iter().map(|r| r.week_of_year))),
        strings(rows, |r| r.severity_category.label()),
        strings(rows, |r| r.economic_impact_category.label()),
        strings(rows, |r| r.response_category.label()),
        strings(rows, |r| r.population_impact_category.label()),
    ];

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::small_dataset;

    #[test]
    fn csv_has_header_and_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleaned.csv");
        write_file(&path, small_dataset().events()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), CleanedRow::COLUMNS.join(","));
        let ids: Vec<&str> = lines.map(|l| l.split(',').next().unwrap()).collect();
        assert_eq!(ids, ["E1", "E2", "E3", "E4", "E5", "E6"]);
        assert!(text.contains(",Very Large"));
        assert!(!dir.path().join("cleaned.csv.tmp").exists());
    }

    #[test]
    fn empty_dataset_still_writes_a_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_file(&path, &[]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.trim_end(), CleanedRow::COLUMNS.join(","));
    }

    #[test]
    fn rewriting_overwrites_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleaned.json");
        let ds = small_dataset();
        write_file(&path, ds.events()).unwrap();
        write_file(&path, &ds.events()[..2]).unwrap();
        let rows: Vec<CleanedRow> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn unwritable_destination_fails_without_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("cleaned.csv");
        assert!(write_file(&path, small_dataset().events()).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(write_file(&dir.path().join("cleaned.txt"), &[]).is_err());
    }
}
