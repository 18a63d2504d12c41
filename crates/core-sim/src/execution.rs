use ndarray::{ArrayView2, Axis};

use crate::error::SimError;

/// Per-simulation average execution prices for the two buying schedules.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPrices {
    /// Constant shares per day; the arithmetic mean of daily prices.
    pub p_twap: Vec<f64>,
    /// Constant dollars per day; the harmonic mean of daily prices.
    pub p_usd: Vec<f64>,
}

impl ExecutionPrices {
    pub fn len(&self) -> usize {
        self.p_twap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.p_twap.is_empty()
    }
}

/// Reduces daily prices (`horizon` rows x `sims` columns) to average fills.
///
/// `s0` sets the daily notional of the fixed-dollar schedule: the budget is
/// what `total_shares` would cost at the initial price, spread evenly.
pub fn aggregate(
    future_prices: ArrayView2<'_, f64>,
    s0: f64,
    total_shares: f64,
) -> Result<ExecutionPrices, SimError> {
    let horizon = future_prices.nrows();
    if horizon == 0 {
        return Err(SimError::invalid(
            "horizon",
            "needs at least one trading day to aggregate",
        ));
    }
    let days = horizon as f64;

    let shares_per_day = total_shares / days;
    let twap_cost = future_prices.mapv(|price| price * shares_per_day).sum_axis(Axis(0));
    let p_twap = twap_cost.mapv(|cost| cost / total_shares);

    let daily_notional = total_shares * s0 / days;
    let shares_bought = future_prices
        .mapv(|price| daily_notional / price)
        .sum_axis(Axis(0));
    let p_usd = shares_bought.mapv(|shares| daily_notional * days / shares);

    Ok(ExecutionPrices {
        p_twap: p_twap.to_vec(),
        p_usd: p_usd.to_vec(),
    })
}
