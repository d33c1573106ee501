use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use disaster_dash::data::aggregate::by_disaster_type;
use disaster_dash::data::filter::{FilterConfig, View, filter};
use disaster_dash::data::loader::DatasetCache;
use disaster_dash::data::stats::summarize;

/// Print headline metrics for a cleaned dataset, optionally filtered.
#[derive(Parser)]
#[command(name = "disaster-report")]
#[command(about = "Summarize a cleaned disaster-events dataset", long_about = None)]
struct Cli {
    /// Cleaned dataset (.csv, .json or .parquet)
    #[arg(default_value = "disaster_events_cleaned.csv")]
    dataset: PathBuf,
    /// JSON filter configuration to apply before summarizing
    #[arg(long)]
    filter: Option<PathBuf>,
    /// Print the filter that selects everything and exit
    #[arg(long)]
    print_default_filter: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let cache = DatasetCache::new(&cli.dataset);
    let dataset = cache.get()?;

    if cli.print_default_filter {
        println!("{}", FilterConfig::all(&dataset).to_json()?);
        return Ok(());
    }

    let view = match &cli.filter {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading filter {}", path.display()))?;
            let config = FilterConfig::from_json(&text)
                .with_context(|| format!("parsing filter {}", path.display()))?;
            filter(&dataset, &config)
        }
        None => View::full(&dataset),
    };

    let summary = summarize(&view);
    println!(
        "{} of {} events selected",
        summary.total_events,
        dataset.len()
    );
    for (name, value) in summary.metrics() {
        println!("  {name:<48} {value:>18.3}");
    }

    println!();
    println!("{:<16} {:>7} {:>7} {:>16} {:>10}", "type", "events", "major", "affected", "avg resp");
    for row in by_disaster_type(view.iter()) {
        println!(
            "{:<16} {:>7} {:>7} {:>16.0} {:>10.1}",
            row.disaster_type, row.events, row.major_events, row.total_affected, row.avg_response_hours
        );
    }
    Ok(())
}
