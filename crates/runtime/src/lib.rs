pub mod benchmark;
pub mod engine;
pub mod logging;
pub mod metrics;
pub mod prefill;

pub use engine::{
    CacheOutcome, SimulateError, SimulationService, Simulator, SimulatorConfig,
    DEFAULT_MAX_PATH_CELLS,
};
pub use prefill::{run_prefill, PrefillError, PrefillGrid, PrefillReport, DEFAULT_PROGRESS_EVERY};
