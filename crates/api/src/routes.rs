use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use core_sim::{
    benchmarks::{running_benchmarks, RunningBenchmark, VolumeBar},
    history::{check_history_span, generate_gbm_history, history_rng, PricePoint},
    DeltaHistogram, GbmPathGenerator, PathGenerator, SimDefaults, SimError, SimulationKey,
    SimulationSummary, DEFAULT_HISTOGRAM_BINS,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    state::{run_blocking, AppState},
};

pub const MAX_SAMPLE_PATHS: usize = 100;
const MAX_HISTOGRAM_BINS: usize = 1_000;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/simulate", get(simulate))
        .route("/paths", get(sample_paths))
        .route("/history", get(history))
        .route("/benchmarks", post(benchmarks))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SimulateQuery {
    s0: f64,
    mu: f64,
    sigma: f64,
    horizon: usize,
    sims: usize,
    total_shares: f64,
    bins: usize,
}

impl Default for SimulateQuery {
    fn default() -> Self {
        let defaults = SimDefaults::default();
        Self {
            s0: defaults.s0,
            mu: defaults.mu,
            sigma: defaults.sigma,
            horizon: defaults.horizon,
            sims: defaults.sims,
            total_shares: defaults.total_shares,
            bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

impl SimulateQuery {
    fn key(&self) -> SimulationKey {
        SimulationKey::new(
            self.s0,
            self.mu,
            self.sigma,
            self.horizon,
            self.sims,
            self.total_shares,
        )
    }
}

#[derive(Debug, Serialize)]
struct SimulateResponse {
    key: SimulationKey,
    p_twap: Vec<f64>,
    p_usd: Vec<f64>,
    summary: Option<SimulationSummary>,
    histogram: Option<DeltaHistogram>,
}

async fn simulate(
    State(state): State<AppState>,
    query: Result<Query<SimulateQuery>, QueryRejection>,
) -> Result<Json<SimulateResponse>, ApiError> {
    let Query(query) = query.map_err(|err| ApiError::BadRequest(err.body_text()))?;
    if query.bins == 0 || query.bins > MAX_HISTOGRAM_BINS {
        return Err(ApiError::BadRequest(format!(
            "bins must be between 1 and {MAX_HISTOGRAM_BINS}"
        )));
    }
    let key = query.key();
    let result = state.simulate(key).await?;
    let summary = result.summary();
    let histogram = result.delta_histogram(query.bins);

    Ok(Json(SimulateResponse {
        key,
        p_twap: result.p_twap,
        p_usd: result.p_usd,
        summary,
        histogram,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct PathsQuery {
    s0: f64,
    mu: f64,
    sigma: f64,
    horizon: usize,
    sims: usize,
    seed: Option<u64>,
}

impl Default for PathsQuery {
    fn default() -> Self {
        let defaults = SimDefaults::default();
        Self {
            s0: defaults.s0,
            mu: defaults.mu,
            sigma: defaults.sigma,
            horizon: defaults.horizon,
            sims: MAX_SAMPLE_PATHS,
            seed: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct PathsResponse {
    horizon: usize,
    /// One price series per simulation, day 0 first.
    paths: Vec<Vec<f64>>,
}

/// A handful of raw GBM paths for plotting. Never cached.
async fn sample_paths(
    State(state): State<AppState>,
    query: Result<Query<PathsQuery>, QueryRejection>,
) -> Result<Json<PathsResponse>, ApiError> {
    let Query(query) = query.map_err(|err| ApiError::BadRequest(err.body_text()))?;
    let sims = query.sims.min(MAX_SAMPLE_PATHS);
    let key = SimulationKey::new(query.s0, query.mu, query.sigma, query.horizon, sims, 1.0);
    key.validate()?;

    let limit = state.max_cells();
    match key.path_cells() {
        Some(cells) if cells <= limit => {}
        _ => {
            return Err(SimError::ResourceExhausted {
                horizon: key.horizon,
                sims,
                limit,
            }
            .into())
        }
    }

    let mut generator = match query.seed {
        Some(seed) => GbmPathGenerator::seeded(seed),
        None => GbmPathGenerator::from_entropy(),
    };
    let paths: Vec<Vec<f64>> = run_blocking(move || {
        let matrix = generator.generate(&key.path_params())?;
        Ok((0..matrix.sims())
            .filter_map(|sim| matrix.path(sim))
            .map(|path| path.to_vec())
            .collect())
    })
    .await?;

    Ok(Json(PathsResponse {
        horizon: key.horizon,
        paths,
    }))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    start: String,
    end: String,
    #[serde(default = "default_s0")]
    s0: f64,
    #[serde(default)]
    mu: f64,
    #[serde(default = "default_sigma")]
    sigma: f64,
    seed: Option<u64>,
}

fn default_s0() -> f64 {
    SimDefaults::default().s0
}

fn default_sigma() -> f64 {
    SimDefaults::default().sigma
}

fn parse_date(name: &str, value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| ApiError::BadRequest(format!("invalid {name} date {value:?}: {err}")))
}

async fn history(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Vec<PricePoint>>, ApiError> {
    let Query(query) = query.map_err(|err| ApiError::BadRequest(err.body_text()))?;
    let start = parse_date("start", &query.start)?;
    let end = parse_date("end", &query.end)?;
    if end < start {
        return Err(ApiError::BadRequest(
            "end date must not precede start date".to_string(),
        ));
    }
    check_history_span(start, end, state.max_history_days())?;

    let HistoryQuery {
        s0, mu, sigma, seed, ..
    } = query;
    let points = run_blocking(move || {
        let mut rng = history_rng(seed);
        Ok(generate_gbm_history(start, end, s0, mu, sigma, &mut rng)?)
    })
    .await?;

    Ok(Json(points))
}

async fn benchmarks(
    bars: Result<Json<Vec<VolumeBar>>, JsonRejection>,
) -> Result<Json<Vec<RunningBenchmark>>, ApiError> {
    let Json(bars) = bars.map_err(|err| ApiError::BadRequest(err.body_text()))?;
    Ok(Json(running_benchmarks(&bars)?))
}
