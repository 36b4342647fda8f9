mod app;
mod callbacks;
mod color;
mod config;
mod data;
mod server;
mod state;
mod ui;

use anyhow::{Context, Result};

use app::DashApp;
use config::DashboardConfig;
use state::AppState;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = DashboardConfig::default();

    let dataset = data::loader::load_bundled().context("loading iris dataset")?;
    log::info!(
        "Loaded {} records across species {:?}",
        dataset.len(),
        dataset.categories()
    );

    let app = DashApp::new(AppState::new(config, dataset)).context("registering callbacks")?;
    server::serve(&app)
}
