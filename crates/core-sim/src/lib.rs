//! Monte Carlo comparison of fixed-dollar and fixed-share buying schedules
//! over Geometric Brownian Motion price paths.

pub mod benchmarks;
mod config;
mod error;
mod execution;
pub mod history;
mod key;
mod paths;
mod result;

pub use config::{SimDefaults, TRADING_DAYS_PER_YEAR};
pub use error::SimError;
pub use execution::{aggregate, ExecutionPrices};
pub use key::{PathParams, SimulationKey};
pub use paths::{GbmPathGenerator, PathGenerator, PricePathMatrix};
pub use result::{
    DeltaHistogram, ResultRow, SimulationResult, SimulationSummary, DEFAULT_HISTOGRAM_BINS,
};
