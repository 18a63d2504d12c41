use crate::key::SimulationKey;

/// Trading days per year used to scale annualised drift and volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Parameters a dashboard starts from before the user touches any control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimDefaults {
    pub s0: f64,
    pub mu: f64,
    pub sigma: f64,
    pub horizon: usize,
    pub sims: usize,
    pub total_shares: f64,
}

impl Default for SimDefaults {
    fn default() -> Self {
        Self {
            s0: 100.0,
            mu: 0.0,
            sigma: 0.25,
            horizon: 125,
            sims: 10_000,
            total_shares: 100.0,
        }
    }
}

impl SimDefaults {
    pub fn key(&self) -> SimulationKey {
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
