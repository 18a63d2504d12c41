use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeBar {
    pub date: NaiveDate,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunningBenchmark {
    pub date: NaiveDate,
    pub price: f64,
    /// `None` until some volume has traded.
    pub running_vwap: Option<f64>,
    pub running_twap: f64,
    /// `(vwap - twap) / twap` in basis points.
    pub diff_bps: Option<f64>,
    pub daily_value: f64,
}

/// Running VWAP and TWAP of a daily series, sorted by date first.
pub fn running_benchmarks(bars: &[VolumeBar]) -> Result<Vec<RunningBenchmark>, SimError> {
    if bars
        .iter()
        .any(|bar| !bar.close.is_finite() || bar.close <= 0.0)
    {
        return Err(SimError::invalid("close", "must be finite and positive"));
    }
    if bars
        .iter()
        .any(|bar| !bar.volume.is_finite() || bar.volume < 0.0)
    {
        return Err(SimError::invalid("volume", "must be finite and non-negative"));
    }

    let mut sorted = bars.to_vec();
    sorted.sort_by_key(|bar| bar.date);

    let mut cum_value = 0.0;
    let mut cum_volume = 0.0;
    let mut cum_close = 0.0;

    let rows = sorted
        .iter()
        .enumerate()
        .map(|(index, bar)| {
            let daily_value = bar.close * bar.volume;
            cum_value += daily_value;
            cum_volume += bar.volume;
            cum_close += bar.close;

            let running_twap = cum_close / (index + 1) as f64;
            let running_vwap = (cum_volume > 0.0).then(|| cum_value / cum_volume);
            let diff_bps = running_vwap.map(|vwap| (vwap - running_twap) / running_twap * 10_000.0);

            RunningBenchmark {
                date: bar.date,
                price: bar.close,
                running_vwap,
                running_twap,
                diff_bps,
                daily_value,
            }
        })
        .collect();

    Ok(rows)
}
