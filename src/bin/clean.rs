use std::path::PathBuf;

use clap::Parser;

use disaster_dash::data::clean::clean_file;
use disaster_dash::data::stats::Summary;

/// Cleaning stage: validate raw events, derive categories, write the cleaned table.
#[derive(Parser)]
#[command(name = "disaster-clean")]
#[command(about = "Clean a raw disaster-events CSV and derive categorical features", long_about = None)]
struct Cli {
    /// Raw events CSV
    #[arg(long, default_value = "synthetic_disaster_events_2025.csv")]
    input: PathBuf,
    /// Destination (.csv, .json or .parquet); overwritten on every run
    #[arg(long, default_value = "disaster_events_cleaned.csv")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let cleaned = clean_file(&cli.input, &cli.output)?;

    let report = cleaned.report;
    let summary = Summary::compute(&cleaned.events);

    println!("Cleaning summary");
    println!("  Rows read:            {}", report.initial_rows);
    println!("  Missing values:       {}", report.missing_dropped);
    println!("  Duplicates:           {}", report.duplicates_dropped);
    println!("  Out of range:         {}", report.out_of_range.total());
    println!("  Rows written:         {}", report.final_rows);
    if let (Some(first), Some(last)) = (
        cleaned.events.iter().map(|e| e.event.date).min(),
        cleaned.events.iter().map(|e| e.event.date).max(),
    ) {
        println!("  Date range:           {first} to {last}");
    }
    println!("  Disaster types:       {}", summary.unique_disaster_types);
    println!("  Locations:            {}", summary.unique_locations);
    println!("Cleaned data saved to {}", cli.output.display());
    Ok(())
}
