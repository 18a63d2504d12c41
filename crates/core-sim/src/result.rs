use serde::{Deserialize, Serialize};

use crate::execution::ExecutionPrices;

const BPS_PER_UNIT: f64 = 10_000.0;

pub const DEFAULT_HISTOGRAM_BINS: usize = 200;

/// Per-simulation average prices for one key. This is what the cache stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub p_twap: Vec<f64>,
    pub p_usd: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub p_twap: f64,
    pub p_usd: f64,
}

/// Headline numbers for how much cheaper the fixed-dollar schedule fills.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub sims: usize,
    pub mean_p_twap: f64,
    pub mean_p_usd: f64,
    pub mean_delta_bps: f64,
    pub std_delta_bps: f64,
}

/// Equal-width bins over the delta range. `edges` has one more entry than
/// `counts`; the last bin includes its upper edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaHistogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl SimulationResult {
    pub fn len(&self) -> usize {
        self.p_twap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.p_twap.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = ResultRow> + '_ {
        self.p_twap
            .iter()
            .zip(&self.p_usd)
            .map(|(&p_twap, &p_usd)| ResultRow { p_twap, p_usd })
    }

    /// `(p_twap - p_usd) / p_twap` in basis points, one value per simulation.
    /// Positive means the fixed-dollar schedule bought cheaper.
    pub fn delta_bps(&self) -> Vec<f64> {
        self.rows()
            .map(|row| (row.p_twap - row.p_usd) / row.p_twap * BPS_PER_UNIT)
            .collect()
    }

    pub fn summary(&self) -> Option<SimulationSummary> {
        if self.is_empty() {
            return None;
        }

        let deltas = self.delta_bps();
        let mean_delta_bps = mean(&deltas);
        // Population standard deviation.
        let variance = deltas
            .iter()
            .map(|delta| (delta - mean_delta_bps).powi(2))
            .sum::<f64>()
            / deltas.len() as f64;

        Some(SimulationSummary {
            sims: self.len(),
            mean_p_twap: mean(&self.p_twap),
            mean_p_usd: mean(&self.p_usd),
            mean_delta_bps,
            std_delta_bps: variance.sqrt(),
        })
    }
}

impl SimulationResult {
    /// `None` for an empty result or zero bins. A single repeated value is
    /// centred in a bin one basis point wide.
    pub fn delta_histogram(&self, bins: usize) -> Option<DeltaHistogram> {
        let deltas: Vec<f64> = self
            .delta_bps()
            .into_iter()
            .filter(|delta| delta.is_finite())
            .collect();
        if bins == 0 || deltas.is_empty() {
            return None;
        }

        let mut low = deltas.iter().copied().fold(f64::INFINITY, f64::min);
        let mut high = deltas.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if low == high {
            low -= 0.5;
            high += 0.5;
        }
        let width = (high - low) / bins as f64;

        let edges = (0..=bins).map(|index| low + width * index as f64).collect();
        let mut counts = vec![0; bins];
        for delta in deltas {
            let index = ((delta - low) / width) as usize;
            counts[index.min(bins - 1)] += 1;
        }

        Some(DeltaHistogram { edges, counts })
    }
}

impl From<ExecutionPrices> for SimulationResult {
    fn from(prices: ExecutionPrices) -> Self {
        Self {
            p_twap: prices.p_twap,
            p_usd: prices.p_usd,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::{ResultRow, SimulationResult, DEFAULT_HISTOGRAM_BINS};

    fn result() -> SimulationResult {
        SimulationResult {
            p_twap: vec![100.0, 200.0],
            p_usd: vec![99.0, 200.0],
        }
    }

    #[test]
    fn rows_pair_the_two_columns() {
        let rows: Vec<ResultRow> = result().rows().collect();

        assert_eq!(
            rows,
            vec![
                ResultRow {
                    p_twap: 100.0,
                    p_usd: 99.0,
                },
                ResultRow {
                    p_twap: 200.0,
                    p_usd: 200.0,
                },
            ]
        );
    }

    #[test]
    fn delta_is_expressed_in_basis_points_of_twap() {
        let deltas = result().delta_bps();

        assert!((deltas[0] - 100.0).abs() < 1e-9);
        assert_eq!(deltas[1], 0.0);
    }

    #[test]
    fn summary_reports_means_and_population_std() {
        let summary = result().summary().unwrap();

        assert_eq!(summary.sims, 2);
        assert!((summary.mean_p_twap - 150.0).abs() < 1e-12);
        assert!((summary.mean_p_usd - 149.5).abs() < 1e-12);
        assert!((summary.mean_delta_bps - 50.0).abs() < 1e-9);
        assert!((summary.std_delta_bps - 50.0).abs() < 1e-9);
    }

    #[test]
    fn empty_result_has_no_summary() {
        let empty = SimulationResult {
            p_twap: Vec::new(),
            p_usd: Vec::new(),
        };

        assert!(empty.summary().is_none());
    }

    #[test]
    fn histogram_counts_every_simulation_once() {
        let spread = SimulationResult {
            p_twap: vec![100.0; 5],
            p_usd: vec![100.0, 99.9, 99.4, 98.9, 98.0],
        };

        let histogram = spread.delta_histogram(4).unwrap();

        assert_eq!(histogram.edges.len(), 5);
        assert!((histogram.edges[0] - 0.0).abs() < 1e-9);
        assert!((histogram.edges[4] - 200.0).abs() < 1e-9);
        assert_eq!(histogram.counts, vec![2, 1, 1, 1]);
    }

    #[test]
    fn constant_deltas_fall_in_one_centred_bin() {
        let flat = SimulationResult {
            p_twap: vec![100.0; 3],
            p_usd: vec![100.0; 3],
        };

        let histogram = flat.delta_histogram(DEFAULT_HISTOGRAM_BINS).unwrap();

        assert_eq!(histogram.counts.len(), DEFAULT_HISTOGRAM_BINS);
        assert_eq!(histogram.counts.iter().sum::<usize>(), 3);
        assert!((histogram.edges[0] + 0.5).abs() < 1e-12);
        assert!((histogram.edges[DEFAULT_HISTOGRAM_BINS] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn histogram_needs_bins_and_rows() {
        let empty = SimulationResult {
            p_twap: Vec::new(),
            p_usd: Vec::new(),
        };

        assert!(result().delta_histogram(0).is_none());
        assert!(empty.delta_histogram(10).is_none());
    }

    #[test]
    fn json_round_trip_preserves_every_bit() {
        let original = SimulationResult {
            p_twap: vec![0.1 + 0.2, 1.0 / 3.0, 98.765_432_101_234],
            p_usd: vec![f64::MIN_POSITIVE, 1e300, 97.296_703_296_703_3],
        };

        let encoded = serde_json::to_vec(&original).unwrap();
        let decoded: SimulationResult = serde_json::from_slice(&encoded).unwrap();

        let bits = |values: &[f64]| values.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&decoded.p_twap), bits(&original.p_twap));
        assert_eq!(bits(&decoded.p_usd), bits(&original.p_usd));
    }
}
