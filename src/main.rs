mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;

use app::DisasterDashApp;
use clap::Parser;
use eframe::egui;

/// Interactive dashboard over a cleaned disaster-events file.
#[derive(Parser)]
#[command(name = "disaster-dash")]
struct Cli {
    /// Cleaned dataset (csv, json or parquet) to open at start-up.
    path: Option<PathBuf>,
}

fn main() -> eframe::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut app = DisasterDashApp::default();
    if let Some(path) = &cli.path {
        app.state.open(path);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Disaster Events Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
}
