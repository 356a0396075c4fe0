pub mod calendar;
pub mod dashboard;
pub mod db;
pub mod digest;
pub mod error;
pub mod inflight;
pub mod insights;
pub mod milestones;
pub mod schedules;
pub mod settings;
pub mod snapshot;
pub mod store;
mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};

use calendar::dates;
use dashboard::Dashboard;
use db::Database;
use settings::SettingsStore;

const ENABLE_LOGS: bool = true;

const DB_FILE: &str = "opsdesk.sqlite3";
const SETTINGS_FILE: &str = "settings.json";

/// Open the local store and print today's digest.
pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let data_dir = settings::data_dir();
    log_info!("opsdesk starting, data in {}", data_dir.display());

    let settings_store = SettingsStore::new(data_dir.join(SETTINGS_FILE))?;
    let settings = settings_store.get();
    let database = Database::new(data_dir.join(DB_FILE))?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(async move {
        let dashboard = match Dashboard::load(Arc::new(database), settings.clone()).await {
            Ok(dashboard) => dashboard,
            Err(err) => {
                log_error!("Failed to load dashboard: {err:#}");
                return Err(err);
            }
        };

        let today = dates::today();
        let mut days = Vec::new();
        for day in digest::digest_days(today, settings.digest_days) {
            days.push(dashboard.day_agenda(day).await);
        }
        let plans = dashboard.key_plans(today).await;
        let progress = dashboard.progress(today).await;
        let snapshot = dashboard.snapshot().await;

        print!("{}", digest::render_digest(&snapshot, &days, &plans, &progress));
        Ok(())
    })
}
