use std::time::Instant;

use core_sim::{aggregate, PathGenerator, SimError, SimulationKey, SimulationResult};
use result_cache::{CacheError, ResultCache};

use crate::logging::{RunLogEvent, RunLogEventKind, RunLogWriter, TracingRunLogWriter};
use crate::metrics::SimulationTimings;

/// Upper bound on `(horizon + 1) * sims` for a single request.
pub const DEFAULT_MAX_PATH_CELLS: usize = 200_000_000;

#[derive(Debug, thiserror::Error)]
pub enum SimulateError {
    #[error(transparent)]
    Simulation(#[from] SimError),

    /// The store could not be read or written; the request fails rather than
    /// computing without a cache.
    #[error("cache unavailable: {0}")]
    CacheUnavailable(#[from] CacheError),
}

impl SimulateError {
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::Simulation(SimError::InvalidParameter { .. }))
    }

    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, Self::Simulation(SimError::ResourceExhausted { .. }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatorConfig {
    pub max_path_cells: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            max_path_cells: DEFAULT_MAX_PATH_CELLS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Computed,
}

/// Cache-first simulation: a stored result is returned as is, a miss is
/// simulated, aggregated, stored and then returned.
///
/// There is no in-flight de-duplication; wrap the simulator in a lock when
/// several callers share it.
pub struct Simulator<C, G, L = TracingRunLogWriter> {
    cache: C,
    generator: G,
    log_writer: L,
    config: SimulatorConfig,
    timings: SimulationTimings,
    tick: u64,
}

impl<C, G> Simulator<C, G, TracingRunLogWriter>
where
    C: ResultCache,
    G: PathGenerator,
{
    pub fn new(cache: C, generator: G) -> Self {
        Self::with_log_writer(cache, generator, TracingRunLogWriter)
    }
}

impl<C, G, L> Simulator<C, G, L>
where
    C: ResultCache,
    G: PathGenerator,
    L: RunLogWriter,
{
    pub fn with_log_writer(cache: C, generator: G, log_writer: L) -> Self {
        Self {
            cache,
            generator,
            log_writer,
            config: SimulatorConfig::default(),
            timings: SimulationTimings::new(),
            tick: 0,
        }
    }

    pub fn with_config(mut self, config: SimulatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn simulate(
        &mut self,
        s0: f64,
        mu: f64,
        sigma: f64,
        horizon: usize,
        sims: usize,
        total_shares: f64,
    ) -> Result<SimulationResult, SimulateError> {
        self.simulate_key(SimulationKey::new(s0, mu, sigma, horizon, sims, total_shares))
    }

    pub fn simulate_key(&mut self, key: SimulationKey) -> Result<SimulationResult, SimulateError> {
        self.simulate_traced(key).map(|(result, _)| result)
    }

    pub fn simulate_traced(
        &mut self,
        key: SimulationKey,
    ) -> Result<(SimulationResult, CacheOutcome), SimulateError> {
        key.validate()?;
        let cells = self.admit(&key)?;
        self.tick += 1;

        if let Some(stored) = self.cache.get(&key)? {
            self.log(RunLogEvent::new(self.tick, RunLogEventKind::CacheHit, Some(key)));
            return Ok((stored, CacheOutcome::Hit));
        }
        self.log(RunLogEvent::new(self.tick, RunLogEventKind::CacheMiss, Some(key)));

        let started = Instant::now();
        let prices = {
            let paths = self.generator.generate(&key.path_params())?;
            aggregate(paths.future_prices(), key.s0, key.total_shares)?
        };
        let result = SimulationResult::from(prices);
        self.cache.put(&key, &result)?;

        let micros = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        self.timings.record(micros, cells);
        self.log(
            RunLogEvent::new(self.tick, RunLogEventKind::ResultStored, Some(key))
                .with_latency(micros),
        );

        Ok((result, CacheOutcome::Computed))
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn log_writer(&self) -> &L {
        &self.log_writer
    }

    pub(crate) fn log_writer_mut(&mut self) -> &mut L {
        &mut self.log_writer
    }

    pub fn timings(&self) -> &SimulationTimings {
        &self.timings
    }

    pub fn config(&self) -> SimulatorConfig {
        self.config
    }

    /// Hands back the cache so its owner can close it.
    pub fn into_cache(self) -> C {
        self.cache
    }

    fn admit(&self, key: &SimulationKey) -> Result<usize, SimError> {
        let limit = self.config.max_path_cells;
        match key.path_cells() {
            Some(cells) if cells <= limit => Ok(cells),
            _ => Err(SimError::ResourceExhausted {
                horizon: key.horizon,
                sims: key.sims,
                limit,
            }),
        }
    }

    fn log(&mut self, event: RunLogEvent) {
        self.log_writer.write(event);
    }
}

/// Object-safe entry point for callers that hold a simulator behind a lock.
pub trait SimulationService: Send {
    fn simulate_key(&mut self, key: SimulationKey) -> Result<SimulationResult, SimulateError>;
}

impl<C, G, L> SimulationService for Simulator<C, G, L>
where
    C: ResultCache + Send,
    G: PathGenerator + Send,
    L: RunLogWriter + Send,
{
    fn simulate_key(&mut self, key: SimulationKey) -> Result<SimulationResult, SimulateError> {
        self.simulate_traced(key).map(|(result, _)| result)
    }
}

#[cfg(test)]
mod tests {
    use core_sim::{
        GbmPathGenerator, PathGenerator, PathParams, PricePathMatrix, SimError, SimulationKey,
        SimulationResult,
    };
    use result_cache::{CacheError, InMemoryResultCache, ResultCache};

    use crate::logging::{InMemoryRunLogWriter, RunLogEventKind};

    use super::{CacheOutcome, SimulateError, Simulator, SimulatorConfig};

    struct CountingGenerator {
        inner: GbmPathGenerator,
        calls: usize,
    }

    impl CountingGenerator {
        fn new() -> Self {
            Self {
                inner: GbmPathGenerator::from_entropy(),
                calls: 0,
            }
        }
    }

    impl PathGenerator for CountingGenerator {
        fn generate(&mut self, params: &PathParams) -> Result<PricePathMatrix, SimError> {
            self.calls += 1;
            self.inner.generate(params)
        }
    }

    struct BrokenCache;

    impl ResultCache for BrokenCache {
        fn get(&self, _key: &SimulationKey) -> Result<Option<SimulationResult>, CacheError> {
            Err(disk_unavailable())
        }

        fn put(&mut self, _key: &SimulationKey, _result: &SimulationResult) -> Result<(), CacheError> {
            Err(disk_unavailable())
        }

        fn len(&self) -> Result<usize, CacheError> {
            Ok(0)
        }
    }

    fn disk_unavailable() -> CacheError {
        CacheError::Io {
            path: "mc_cache_disk".into(),
            source: std::io::Error::other("disk unavailable"),
        }
    }

    fn simulator() -> Simulator<InMemoryResultCache, CountingGenerator, InMemoryRunLogWriter> {
        Simulator::with_log_writer(
            InMemoryResultCache::new(),
            CountingGenerator::new(),
            InMemoryRunLogWriter::new(),
        )
    }

    #[test]
    fn repeated_key_is_served_from_cache_without_regenerating() {
        let mut sim = simulator();

        let first = sim.simulate(100.0, 0.0, 0.25, 30, 200, 100.0).unwrap();
        let second = sim.simulate(100.0, 0.0, 0.25, 30, 200, 100.0).unwrap();

        assert_eq!(sim.generator.calls, 1);
        let bits = |values: &[f64]| values.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&first.p_twap), bits(&second.p_twap));
        assert_eq!(bits(&first.p_usd), bits(&second.p_usd));
    }

    #[test]
    fn traced_outcome_distinguishes_hits_from_computation() {
        let mut sim = simulator();
        let key = SimulationKey::new(100.0, 0.0, 0.25, 10, 5, 100.0);

        let (_, first) = sim.simulate_traced(key).unwrap();
        let (_, second) = sim.simulate_traced(key).unwrap();

        assert_eq!(first, CacheOutcome::Computed);
        assert_eq!(second, CacheOutcome::Hit);
        assert_eq!(sim.timings().count(), 1);
        assert_eq!(sim.timings().path_cells(), 55);
    }

    #[test]
    fn keys_differing_in_horizon_create_two_entries() {
        let mut sim = simulator();

        let short = sim.simulate(100.0, 0.0, 0.25, 125, 20, 100.0).unwrap();
        let long = sim.simulate(100.0, 0.0, 0.25, 126, 20, 100.0).unwrap();

        assert_eq!(sim.generator.calls, 2);
        assert_eq!(sim.cache().len().unwrap(), 2);
        let stored_short = sim
            .cache()
            .get(&SimulationKey::new(100.0, 0.0, 0.25, 125, 20, 100.0))
            .unwrap();
        let stored_long = sim
            .cache()
            .get(&SimulationKey::new(100.0, 0.0, 0.25, 126, 20, 100.0))
            .unwrap();
        assert_eq!(stored_short, Some(short));
        assert_eq!(stored_long, Some(long));
    }

    #[test]
    fn result_has_one_row_per_simulation() {
        let mut sim = simulator();

        let result = sim.simulate(50.0, 0.1, 0.3, 12, 77, 10.0).unwrap();

        assert_eq!(result.p_twap.len(), 77);
        assert_eq!(result.p_usd.len(), 77);
    }

    #[test]
    fn fixed_notional_average_never_exceeds_twap() {
        let mut sim = simulator();

        let result = sim.simulate(100.0, -0.01, 0.8, 60, 1_000, 100.0).unwrap();

        for row in result.rows() {
            assert!(row.p_usd <= row.p_twap);
        }
    }

    #[test]
    fn flat_market_fills_both_schedules_at_initial_price() {
        let mut sim = simulator();

        let result = sim.simulate(100.0, 0.0, 0.0, 125, 100, 100.0).unwrap();

        for row in result.rows() {
            assert!((row.p_twap - 100.0).abs() < 1e-9);
            assert!((row.p_usd - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn invalid_parameters_fail_before_generation() {
        let mut sim = simulator();

        let zero_horizon = sim.simulate(100.0, 0.0, 0.25, 0, 10, 100.0).unwrap_err();
        let zero_sims = sim.simulate(100.0, 0.0, 0.25, 10, 0, 100.0).unwrap_err();
        let negative_sigma = sim.simulate(100.0, 0.0, -0.25, 10, 10, 100.0).unwrap_err();

        assert!(zero_horizon.is_invalid_parameter());
        assert!(zero_sims.is_invalid_parameter());
        assert!(negative_sigma.is_invalid_parameter());
        assert_eq!(sim.generator.calls, 0);
        assert!(sim.cache().is_empty().unwrap());
    }

    #[test]
    fn oversized_request_is_resource_exhausted() {
        let mut sim = simulator().with_config(SimulatorConfig {
            max_path_cells: 1_000,
        });

        let err = sim.simulate(100.0, 0.0, 0.25, 100, 10, 100.0).unwrap_err();
        let overflow = sim
            .simulate(100.0, 0.0, 0.25, usize::MAX, 2, 100.0)
            .unwrap_err();

        assert!(err.is_resource_exhausted());
        assert!(overflow.is_resource_exhausted());
        assert_eq!(sim.generator.calls, 0);
    }

    #[test]
    fn cache_failure_fails_the_request() {
        let mut sim = Simulator::with_log_writer(
            BrokenCache,
            CountingGenerator::new(),
            InMemoryRunLogWriter::new(),
        );

        let err = sim.simulate(100.0, 0.0, 0.25, 10, 10, 100.0).unwrap_err();

        assert!(matches!(err, SimulateError::CacheUnavailable(_)));
        assert_eq!(sim.generator.calls, 0);
    }

    #[test]
    fn lookups_are_logged_in_order() {
        let mut sim = simulator();

        sim.simulate(100.0, 0.0, 0.25, 10, 10, 100.0).unwrap();
        sim.simulate(100.0, 0.0, 0.25, 10, 10, 100.0).unwrap();

        let log = sim.log_writer();
        assert_eq!(
            log.kinds(),
            vec![
                RunLogEventKind::CacheMiss,
                RunLogEventKind::ResultStored,
                RunLogEventKind::CacheHit,
            ]
        );
        assert_eq!(log.events()[1].tick, 1);
        assert_eq!(log.events()[2].tick, 2);
        assert!(log.events()[1].compute_latency_micros.is_some());
    }
}
