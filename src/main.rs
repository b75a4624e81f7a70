mod app;
mod chart;
mod color;
mod config;
mod data;
mod state;
mod stats;
mod ui;

use anyhow::{Context, Result};
use app::IpoLensApp;
use clap::Parser;
use config::Config;
use eframe::egui;
use state::AppState;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    log::debug!("Starting with {config:?}");

    // A dataset that cannot be loaded at startup is fatal.
    let dataset = data::loader::load_file(&config.data)
        .with_context(|| format!("cannot start without IPO data from {}", config.data.display()))?;

    let mut state = AppState::default().with_bins(config.bins);
    state.set_dataset(dataset, Some(config.data.clone()));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "IPO Lens – Indian IPO Market Analysis",
        options,
        Box::new(|_cc| Ok(Box::new(IpoLensApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("UI terminated with an error: {e}"))
}
