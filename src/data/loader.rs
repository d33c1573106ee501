use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result, anyhow, bail};
use arrow::array::{Array, BooleanArray, Float64Array, Int32Array, Int64Array, StringArray, UInt32Array};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{CleanedEvent, CleanedRow, Dataset, RawRecord};

/// Base columns every raw file must carry.
pub const RAW_COLUMNS: [&str; 13] = [
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
];

// ---------------------------------------------------------------------------
// Load-once cache
// ---------------------------------------------------------------------------

/// Reads the cleaned dataset on first access and hands out the same
/// `Arc<Dataset>` on every later call.
#[derive(Debug)]
pub struct DatasetCache {
    path: PathBuf,
    cell: OnceLock<Arc<Dataset>>,
}

impl DatasetCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DatasetCache {
            path: path.into(),
            cell: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    /// The shared dataset, loading it if this is the first call.
    pub fn get(&self) -> Result<Arc<Dataset>> {
        if let Some(ds) = self.cell.get() {
            return Ok(Arc::clone(ds));
        }
        let ds = Arc::new(load_file(&self.path)?);
        log::info!(
            "Loaded {} events from {}",
            ds.len(),
            self.path.display()
        );
        Ok(Arc::clone(self.cell.get_or_init(|| ds)))
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a cleaned dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, base columns then derived columns
/// * `.json`    – `[{ "event_id": ..., "date": "2025-01-05", ... }, ...]`
/// * `.parquet` – one column per field, `date` stored as ISO text
pub fn load_file(path: &Path) -> Result<Dataset> {
    if !path.exists() {
        bail!("Dataset file not found: {}", path.display());
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let rows = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    Ok(Dataset::from_events(
        rows.into_iter().map(CleanedEvent::from).collect(),
    ))
}

/// Read the raw (pre-cleaning) rows of a CSV file.
///
/// Every base column must be present in the header; extra columns are
/// ignored. Cells are kept as text for the cleaner to validate.
pub fn read_raw_csv(path: &Path) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening raw CSV {}", path.display()))?;

    let headers = reader.headers().context("reading CSV headers")?.clone();
    let missing: Vec<&str> = RAW_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        bail!(
            "{} is missing required column(s): {}",
            path.display(),
            missing.join(", ")
        );
    }

    let mut records = Vec::new();
    for (row_no, result) in reader.deserialize::<RawRecord>().enumerate() {
        let record = result.with_context(|| format!("raw CSV row {}", row_no + 1))?;
        records.push(record);
    }
    log::info!("Read {} raw rows from {}", records.len(), path.display());
    Ok(records)
}

// ---------------------------------------------------------------------------
// CSV / JSON loaders
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Vec<CleanedRow>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let mut rows = Vec::new();
    for (row_no, result) in reader.deserialize::<CleanedRow>().enumerate() {
        rows.push(result.with_context(|| format!("CSV row {}", row_no + 1))?);
    }
    Ok(rows)
}

fn load_json(path: &Path) -> Result<Vec<CleanedRow>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    serde_json::from_str(&text).context("parsing JSON (expected an array of event objects)")
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

fn load_parquet(path: &Path) -> Result<Vec<CleanedRow>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        rows.extend(rows_from_batch(&batch)?);
    }
    Ok(rows)
}

/// Downcast a named column to a concrete Arrow array type.
fn column<'a, A: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a A> {
    let col = batch
        .column_by_name(name)
        .ok_or_else(|| anyhow!("Parquet file missing '{name}' column"))?;
    if col.null_count() > 0 {
        bail!("Parquet column '{name}' contains nulls");
    }
    col.as_any()
        .downcast_ref::<A>()
        .with_context(|| format!("column '{name}' has type {:?}", col.data_type()))
}

fn rows_from_batch(batch: &RecordBatch) -> Result<Vec<CleanedRow>> {
    let event_id = column::<StringArray>(batch, "event_id")?;
    let date = column::<StringArray>(batch, "date")?;
    let disaster_type = column::<StringArray>(batch, "disaster_type")?;
    let location = column::<StringArray>(batch, "location")?;
    let latitude = column::<Float64Array>(batch, "latitude")?;
    let longitude = column::<Float64Array>(batch, "longitude")?;
    let severity_level = column::<Int64Array>(batch, "severity_level")?;
    let affected_population = column::<Int64Array>(batch, "affected_population")?;
    let loss = column::<Float64Array>(batch, "estimated_economic_loss_usd")?;
    let response = column::<Float64Array>(batch, "response_time_hours")?;
    let infra = column::<Float64Array>(batch, "infrastructure_damage_index")?;
    let aid_provided = column::<StringArray>(batch, "aid_provided")?;
    let is_major = column::<BooleanArray>(batch, "is_major_disaster")?;
    let year = column::<Int32Array>(batch, "year")?;
    let month = column::<UInt32Array>(batch, "month")?;
    let month_name = column::<StringArray>(batch, "month_name")?;
    let quarter = column::<UInt32Array>(batch, "quarter")?;
    let day_of_week = column::<StringArray>(batch, "day_of_week")?;
    let week_of_year = column::<UInt32Array>(batch, "week_of_year")?;
    let severity_category = column::<StringArray>(batch, "severity_category")?;
    let economic_category = column::<StringArray>(batch, "economic_impact_category")?;
    let response_category = column::<StringArray>(batch, "response_category")?;
    let population_category = column::<StringArray>(batch, "population_impact_category")?;

    (0..batch.num_rows())
        .map(|row| {
            let date_text = date.value(row);
            Ok(CleanedRow {
                event_id: event_id.value(row).to_string(),
                date: NaiveDate::parse_from_str(date_text, "%Y-%m-%d")
                    .with_context(|| format!("Row {row}: bad date '{date_text}'"))?,
                disaster_type: disaster_type.value(row).to_string(),
                location: location.value(row).to_string(),
                latitude: latitude.value(row),
                longitude: longitude.value(row),
                severity_level: severity_level.value(row),
                affected_population: affected_population.value(row),
                estimated_economic_loss_usd: loss.value(row),
                response_time_hours: response.value(row),
                infrastructure_damage_index: infra.value(row),
                aid_provided: aid_provided.value(row).to_string(),
                is_major_disaster: is_major.value(row),
                year: year.value(row),
                month: month.value(row),
                month_name: month_name.value(row).to_string(),
                quarter: quarter.value(row),
                day_of_week: day_of_week.value(row).to_string(),
                week_of_year: week_of_year.value(row),
                severity_category: severity_category
                    .value(row)
                    .parse()
                    .with_context(|| format!("Row {row}: severity_category"))?,
                economic_impact_category: economic_category
                    .value(row)
                    .parse()
                    .with_context(|| format!("Row {row}: economic_impact_category"))?,
                response_category: response_category
                    .value(row)
                    .parse()
                    .with_context(|| format!("Row {row}: response_category"))?,
                population_impact_category: population_category
                    .value(row)
                    .parse()
                    .with_context(|| format!("Row {row}: population_impact_category"))?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::small_dataset;
    use crate::data::writer::write_file;

    #[test]
    fn cache_reads_the_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleaned.csv");
        write_file(&path, small_dataset().events()).unwrap();

        let cache = DatasetCache::new(&path);
        assert!(!cache.is_loaded());
        let first = cache.get().unwrap();

        // Later calls must not touch the file again.
        std::fs::remove_file(&path).unwrap();
        let second = cache.get().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 6);
    }

    #[test]
    fn missing_file_is_an_error() {
        let cache = DatasetCache::new("/definitely/not/here.csv");
        let err = cache.get().unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert!(!cache.is_loaded());
    }

    #[test]
    fn every_format_loads_back_the_same_events() {
        let dir = tempfile::tempdir().unwrap();
        let ds = small_dataset();
        for name in ["out.csv", "out.json", "out.parquet"] {
            let path = dir.path().join(name);
            write_file(&path, ds.events()).unwrap();
            let loaded = load_file(&path).unwrap();
            assert_eq!(loaded.events(), ds.events(), "format {name}");
        }
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.xlsx");
        std::fs::write(&path, b"").unwrap();
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn raw_csv_requires_base_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        std::fs::write(&path, "event_id,date\nE1,2025-01-01\n").unwrap();
        let err = read_raw_csv(&path).unwrap_err();
        assert!(format!("{err:#}").contains("disaster_type"));
    }

    #[test]
    fn raw_csv_keeps_empty_cells_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        let header = RAW_COLUMNS.join(",");
        std::fs::write(
            &path,
            format!(
                "{header},notes\nE1,2025-01-05,Flood,Lima,1.5,2.5,3,100,5000,4,0.2,Food,1,extra\n\
                 E2,2025-01-06,Storm,,1.5,2.5,3,100,5000,4,0.2,Food,0,\n"
            ),
        )
        .unwrap();
        let rows = read_raw_csv(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].location.as_deref(), Some("Lima"));
        assert!(rows[1].location.as_deref().unwrap_or("").is_empty());
    }
}
