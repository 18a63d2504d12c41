use api::AppState;
use axum::{routing::get, Router};
use core_sim::GbmPathGenerator;
use result_cache::{CacheError, SqliteResultCache};
use runtime::{Simulator, SimulatorConfig};

use crate::config::Config;

pub type DiskSimulator = Simulator<SqliteResultCache, GbmPathGenerator>;

pub fn open_simulator(config: &Config) -> Result<DiskSimulator, CacheError> {
    let cache = SqliteResultCache::open(&config.cache_dir)?;
    let generator = match config.seed {
        Some(seed) => GbmPathGenerator::seeded(seed),
        None => GbmPathGenerator::from_entropy(),
    };

    Ok(Simulator::new(cache, generator).with_config(SimulatorConfig {
        max_path_cells: config.max_path_cells,
    }))
}

/// Shares the simulator with the handlers, carrying the request limits for
/// the uncached endpoints.
pub fn app_state(config: &Config, simulator: DiskSimulator) -> AppState {
    AppState::new(simulator)
        .with_max_cells(config.max_path_cells)
        .with_max_history_days(config.max_history_days)
}

pub fn build_app(state: AppState) -> Router {
    api::app(state).route("/health", get(healthcheck))
}

async fn healthcheck() -> &'static str {
    "ok"
}
