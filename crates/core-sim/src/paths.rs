use ndarray::{s, Array2, ArrayView1, ArrayView2, Axis};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::config::TRADING_DAYS_PER_YEAR;
use crate::error::SimError;
use crate::key::PathParams;

/// Simulated price levels, one column per simulation.
///
/// Row 0 holds the initial price; rows `1..=horizon` are the simulated days.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePathMatrix {
    levels: Array2<f64>,
}

impl PricePathMatrix {
    pub fn from_levels(levels: Array2<f64>) -> Self {
        Self { levels }
    }

    pub fn rows(&self) -> usize {
        self.levels.nrows()
    }

    pub fn sims(&self) -> usize {
        self.levels.ncols()
    }

    pub fn horizon(&self) -> usize {
        self.rows().saturating_sub(1)
    }

    pub fn levels(&self) -> ArrayView2<'_, f64> {
        self.levels.view()
    }

    /// Days `1..=horizon`, excluding the initial price row.
    pub fn future_prices(&self) -> ArrayView2<'_, f64> {
        self.levels.slice(s![1.., ..])
    }

    pub fn path(&self, sim: usize) -> Option<ArrayView1<'_, f64>> {
        (sim < self.sims()).then(|| self.levels.column(sim))
    }
}

pub trait PathGenerator {
    fn generate(&mut self, params: &PathParams) -> Result<PricePathMatrix, SimError>;
}

impl<G: PathGenerator + ?Sized> PathGenerator for &mut G {
    fn generate(&mut self, params: &PathParams) -> Result<PricePathMatrix, SimError> {
        (**self).generate(params)
    }
}

impl<G: PathGenerator + ?Sized> PathGenerator for Box<G> {
    fn generate(&mut self, params: &PathParams) -> Result<PricePathMatrix, SimError> {
        (**self).generate(params)
    }
}

/// Geometric Brownian Motion paths on a daily grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GbmPathGenerator {
    seed: Option<u64>,
}

impl GbmPathGenerator {
    /// Fresh randomness on every call.
    pub fn from_entropy() -> Self {
        Self { seed: None }
    }

    /// Same parameters always yield the same paths, independent of call order.
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn rng_for(&self, params: &PathParams) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed ^ params.fingerprint()),
            None => ChaCha8Rng::from_entropy(),
        }
    }
}

impl Default for GbmPathGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl PathGenerator for GbmPathGenerator {
    fn generate(&mut self, params: &PathParams) -> Result<PricePathMatrix, SimError> {
        let PathParams {
            s0,
            mu,
            sigma,
            horizon,
            sims,
        } = *params;
        let exhausted = || SimError::ResourceExhausted {
            horizon,
            sims,
            limit: isize::MAX as usize / std::mem::size_of::<f64>(),
        };

        let rows = horizon.checked_add(1).ok_or_else(exhausted)?;
        let cells = rows.checked_mul(sims).ok_or_else(exhausted)?;
        let mut log_levels: Vec<f64> = Vec::new();
        log_levels
            .try_reserve_exact(cells)
            .map_err(|_| exhausted())?;

        let mu_period = mu / TRADING_DAYS_PER_YEAR;
        let sigma_period = sigma / TRADING_DAYS_PER_YEAR.sqrt();
        let drift = mu_period - 0.5 * sigma_period * sigma_period;

        let mut rng = self.rng_for(params);
        log_levels.resize(sims, 0.0);
        for _ in 0..horizon * sims {
            let z: f64 = StandardNormal.sample(&mut rng);
            log_levels.push(drift + sigma_period * z);
        }

        let mut levels = Array2::from_shape_vec((rows, sims), log_levels)?;
        levels.accumulate_axis_inplace(Axis(0), |&previous, current| *current += previous);
        levels.mapv_inplace(|log_price| s0 * log_price.exp());

        Ok(PricePathMatrix::from_levels(levels))
    }
}

#[cfg(test)]
mod tests {
    use crate::key::PathParams;

    use super::{GbmPathGenerator, PathGenerator};

    fn params(sigma: f64) -> PathParams {
        PathParams {
            s0: 100.0,
            mu: 0.05,
            sigma,
            horizon: 20,
            sims: 50,
        }
    }

    #[test]
    fn output_has_horizon_plus_one_rows_and_one_column_per_sim() {
        let paths = GbmPathGenerator::from_entropy()
            .generate(&params(0.25))
            .unwrap();

        assert_eq!(paths.rows(), 21);
        assert_eq!(paths.sims(), 50);
        assert_eq!(paths.horizon(), 20);
        assert_eq!(paths.future_prices().dim(), (20, 50));
    }

    #[test]
    fn first_row_is_initial_price_for_every_simulation() {
        let paths = GbmPathGenerator::seeded(1).generate(&params(0.4)).unwrap();

        assert!(paths.levels().row(0).iter().all(|&price| price == 100.0));
    }

    #[test]
    fn simulated_prices_stay_positive() {
        let paths = GbmPathGenerator::seeded(2)
            .generate(&PathParams {
                mu: -0.5,
                sigma: 1.0,
                ..params(1.0)
            })
            .unwrap();

        assert!(paths.levels().iter().all(|&price| price > 0.0));
    }

    #[test]
    fn seeded_generators_are_deterministic() {
        let mut first = GbmPathGenerator::seeded(42);
        let mut second = GbmPathGenerator::seeded(42);

        assert_eq!(
            first.generate(&params(0.3)).unwrap(),
            second.generate(&params(0.3)).unwrap()
        );
    }

    #[test]
    fn seeded_output_does_not_depend_on_call_order() {
        let mut warmed = GbmPathGenerator::seeded(9);
        let _ = warmed.generate(&params(0.1)).unwrap();
        let after_warmup = warmed.generate(&params(0.3)).unwrap();
        let direct = GbmPathGenerator::seeded(9).generate(&params(0.3)).unwrap();

        assert_eq!(after_warmup, direct);
    }

    #[test]
    fn different_seeds_give_different_paths() {
        let a = GbmPathGenerator::seeded(1).generate(&params(0.3)).unwrap();
        let b = GbmPathGenerator::seeded(2).generate(&params(0.3)).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn zero_volatility_and_drift_keeps_price_flat() {
        let paths = GbmPathGenerator::from_entropy()
            .generate(&PathParams {
                mu: 0.0,
                ..params(0.0)
            })
            .unwrap();

        assert!(paths.levels().iter().all(|&price| price == 100.0));
    }

    #[test]
    fn zero_volatility_compounds_drift_deterministically() {
        let paths = GbmPathGenerator::from_entropy()
            .generate(&PathParams {
                mu: 0.252,
                ..params(0.0)
            })
            .unwrap();

        let expected_last = 100.0 * (0.001_f64 * 20.0).exp();
        let last = paths.path(0).unwrap()[20];
        assert!((last - expected_last).abs() < 1e-9);
    }

    #[test]
    fn path_accessor_rejects_out_of_range_simulation() {
        let paths = GbmPathGenerator::seeded(3).generate(&params(0.2)).unwrap();

        assert!(paths.path(49).is_some());
        assert!(paths.path(50).is_none());
    }
}
