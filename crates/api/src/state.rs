use std::sync::{Arc, Mutex};

use core_sim::{history::DEFAULT_MAX_HISTORY_DAYS, SimulationKey, SimulationResult};
use runtime::{SimulationService, DEFAULT_MAX_PATH_CELLS};

use crate::error::ApiError;

/// Shares one simulator between handlers.
///
/// Calls run on the blocking pool and hold the lock for their whole
/// duration, so concurrent requests for the same missing key compute once.
#[derive(Clone)]
pub struct AppState {
    simulator: Arc<Mutex<Box<dyn SimulationService>>>,
    max_cells: usize,
    max_history_days: usize,
}

impl AppState {
    pub fn new<S>(simulator: S) -> Self
    where
        S: SimulationService + 'static,
    {
        Self {
            simulator: Arc::new(Mutex::new(Box::new(simulator))),
            max_cells: DEFAULT_MAX_PATH_CELLS,
            max_history_days: DEFAULT_MAX_HISTORY_DAYS,
        }
    }

    /// Bound on `(horizon + 1) * sims` for uncached sample paths.
    pub fn with_max_cells(mut self, max_cells: usize) -> Self {
        self.max_cells = max_cells;
        self
    }

    pub fn max_cells(&self) -> usize {
        self.max_cells
    }

    pub fn with_max_history_days(mut self, max_history_days: usize) -> Self {
        self.max_history_days = max_history_days;
        self
    }

    pub fn max_history_days(&self) -> usize {
        self.max_history_days
    }

    pub async fn simulate(&self, key: SimulationKey) -> Result<SimulationResult, ApiError> {
        let simulator = Arc::clone(&self.simulator);

        run_blocking(move || {
            let mut simulator = simulator
                .lock()
                .map_err(|_| ApiError::Internal("simulator lock poisoned".to_string()))?;
            simulator.simulate_key(key).map_err(ApiError::from)
        })
        .await
    }
}

/// Runs CPU-bound work off the async workers.
pub async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| ApiError::Internal(format!("blocking task failed: {err}")))?
}
