use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Exact identity of one simulation configuration.
///
/// Equality and hashing compare the bit patterns of every field, so two keys
/// match only when all six values are identical. `0.05` and `0.0500001` are
/// different keys, and so are `0.0` and `-0.0`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimulationKey {
    pub s0: f64,
    pub mu: f64,
    pub sigma: f64,
    pub horizon: usize,
    pub sims: usize,
    pub total_shares: f64,
}

impl SimulationKey {
    pub fn new(
        s0: f64,
        mu: f64,
        sigma: f64,
        horizon: usize,
        sims: usize,
        total_shares: f64,
    ) -> Self {
        Self {
            s0,
            mu,
            sigma,
            horizon,
            sims,
            total_shares,
        }
    }

    /// Raw bit patterns in field order, used for storage and identity.
    pub fn bits(&self) -> [u64; 6] {
        [
            self.s0.to_bits(),
            self.mu.to_bits(),
            self.sigma.to_bits(),
            self.horizon as u64,
            self.sims as u64,
            self.total_shares.to_bits(),
        ]
    }

    pub fn path_params(&self) -> PathParams {
        PathParams {
            s0: self.s0,
            mu: self.mu,
            sigma: self.sigma,
            horizon: self.horizon,
            sims: self.sims,
        }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if !self.s0.is_finite() || self.s0 <= 0.0 {
            return Err(SimError::invalid("s0", "must be finite and positive"));
        }
        if !self.mu.is_finite() {
            return Err(SimError::invalid("mu", "must be finite"));
        }
        if !self.sigma.is_finite() || self.sigma < 0.0 {
            return Err(SimError::invalid("sigma", "must be finite and non-negative"));
        }
        if self.horizon == 0 {
            return Err(SimError::invalid("horizon", "must be at least one day"));
        }
        if self.sims == 0 {
            return Err(SimError::invalid("sims", "must be at least one simulation"));
        }
        if !self.total_shares.is_finite() || self.total_shares <= 0.0 {
            return Err(SimError::invalid(
                "total_shares",
                "must be finite and positive",
            ));
        }

        Ok(())
    }

    /// Number of cells in the price path matrix, `None` on overflow.
    pub fn path_cells(&self) -> Option<usize> {
        self.horizon.checked_add(1)?.checked_mul(self.sims)
    }
}

impl PartialEq for SimulationKey {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for SimulationKey {}

impl Hash for SimulationKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

/// The subset of a key the path generator needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathParams {
    pub s0: f64,
    pub mu: f64,
    pub sigma: f64,
    pub horizon: usize,
    pub sims: usize,
}

impl PathParams {
    pub(crate) fn fingerprint(&self) -> u64 {
        let words = [
            self.s0.to_bits(),
            self.mu.to_bits(),
            self.sigma.to_bits(),
            self.horizon as u64,
            self.sims as u64,
        ];
        words
            .iter()
            .fold(0xcbf2_9ce4_8422_2325_u64, |acc, word| mix(acc ^ word))
    }
}

fn mix(state: u64) -> u64 {
    state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407)
        .rotate_left(29)
}
