use std::time::Instant;

use core_sim::{PathGenerator, SimulationKey};
use result_cache::ResultCache;

use crate::benchmark::calculate_cells_per_sec;
use crate::engine::{CacheOutcome, SimulateError, Simulator};
use crate::logging::{RunLogEvent, RunLogEventKind, RunLogWriter};
use crate::metrics::LatencyPercentiles;

pub const DEFAULT_PROGRESS_EVERY: usize = 1_000;

/// Cartesian grid of drift, volatility and horizon at fixed `s0`, `sims`
/// and `total_shares`.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefillGrid {
    pub s0: f64,
    pub sims: usize,
    pub total_shares: f64,
    pub mus: Vec<f64>,
    pub sigmas: Vec<f64>,
    pub horizons: Vec<usize>,
}

impl Default for PrefillGrid {
    /// Drift -1% and 0%, volatility 0% to 100% in 1% steps, horizons 60 to
    /// 295 days in 5-day steps. Values are built as `i / 100.0` so they match
    /// what a percent-based control produces bit for bit.
    fn default() -> Self {
        Self {
            s0: 100.0,
            sims: 10_000,
            total_shares: 100.0,
            mus: (-1..1).map(|pct| pct as f64 / 100.0).collect(),
            sigmas: (0..=100).map(|pct| pct as f64 / 100.0).collect(),
            horizons: (60..300).step_by(5).collect(),
        }
    }
}

impl PrefillGrid {
    pub fn len(&self) -> usize {
        self.mus.len() * self.sigmas.len() * self.horizons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drift-major, then volatility, then horizon.
    pub fn keys(&self) -> impl Iterator<Item = SimulationKey> + '_ {
        self.mus.iter().flat_map(move |&mu| {
            self.sigmas.iter().flat_map(move |&sigma| {
                self.horizons.iter().map(move |&horizon| {
                    SimulationKey::new(self.s0, mu, sigma, horizon, self.sims, self.total_shares)
                })
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefillReport {
    pub total: usize,
    pub computed: usize,
    pub cache_hits: usize,
    pub compute_latency: Option<LatencyPercentiles>,
    pub cells_per_sec: u64,
}

#[derive(Debug, thiserror::Error)]
#[error("prefill aborted at run {index} ({key:?}): {source}")]
pub struct PrefillError {
    pub index: usize,
    pub key: SimulationKey,
    #[source]
    pub source: SimulateError,
}

/// Runs every grid point through the simulator, in order, one at a time.
///
/// The first failure aborts the run. Points already cached count as hits and
/// are not recomputed.
pub fn run_prefill<C, G, L>(
    simulator: &mut Simulator<C, G, L>,
    grid: &PrefillGrid,
    progress_every: usize,
) -> Result<PrefillReport, PrefillError>
where
    C: ResultCache,
    G: PathGenerator,
    L: RunLogWriter,
{
    let total = grid.len();
    let progress_every = progress_every.max(1);
    let computed_before = simulator.timings().count();
    let cells_before = simulator.timings().path_cells();
    let started = Instant::now();

    simulator.log_writer_mut().write(RunLogEvent::new(
        0,
        RunLogEventKind::PrefillStarted { total },
        None,
    ));

    let mut computed = 0;
    let mut cache_hits = 0;
    for (offset, key) in grid.keys().enumerate() {
        let index = offset + 1;
        let (_, outcome) = simulator
            .simulate_traced(key)
            .map_err(|source| PrefillError { index, key, source })?;
        match outcome {
            CacheOutcome::Computed => computed += 1,
            CacheOutcome::Hit => cache_hits += 1,
        }

        if index == 1 || index % progress_every == 0 || index == total {
            simulator.log_writer_mut().write(RunLogEvent::new(
                index as u64,
                RunLogEventKind::PrefillProgress {
                    completed: index,
                    total,
                },
                Some(key),
            ));
        }
    }

    simulator.log_writer_mut().write(RunLogEvent::new(
        total as u64,
        RunLogEventKind::PrefillCompleted { total },
        None,
    ));

    let elapsed_micros = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    let cells = simulator.timings().path_cells() - cells_before;
    let compute_latency = if simulator.timings().count() > computed_before {
        simulator.timings().percentiles()
    } else {
        None
    };

    Ok(PrefillReport {
        total,
        computed,
        cache_hits,
        compute_latency,
        cells_per_sec: calculate_cells_per_sec(cells, elapsed_micros),
    })
}
