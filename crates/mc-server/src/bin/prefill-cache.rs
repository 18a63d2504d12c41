//! Warms the result cache over the default drift, volatility and horizon grid.

use std::error::Error;

use mc_server::{config::Config, init_tracing, wiring};
use runtime::{run_prefill, PrefillGrid};

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let config = Config::from_env()?;
    let mut simulator = wiring::open_simulator(&config)?;
    let grid = PrefillGrid::default();

    let report = run_prefill(&mut simulator, &grid, config.prefill_progress_every)?;
    match &report.compute_latency {
        Some(latency) => tracing::info!(
            computed = report.computed,
            cache_hits = report.cache_hits,
            p50_micros = latency.p50_micros,
            p99_micros = latency.p99_micros,
            max_micros = latency.max_micros,
            cells_per_sec = report.cells_per_sec,
            "prefill finished"
        ),
        None => tracing::info!(cache_hits = report.cache_hits, "prefill finished, nothing to compute"),
    }

    simulator.into_cache().close()?;
    Ok(())
}
