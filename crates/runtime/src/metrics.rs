#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencyPercentiles {
    pub count: usize,
    pub p50_micros: u64,
    pub p90_micros: u64,
    pub p95_micros: u64,
    pub p99_micros: u64,
    pub max_micros: u64,
}

/// Wall-clock time spent computing cache misses.
#[derive(Debug, Default, Clone)]
pub struct SimulationTimings {
    compute_micros: Vec<u64>,
    path_cells: u64,
}

impl SimulationTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, compute_micros: u64, path_cells: usize) {
        self.compute_micros.push(compute_micros);
        self.path_cells = self.path_cells.saturating_add(path_cells as u64);
    }

    pub fn count(&self) -> usize {
        self.compute_micros.len()
    }

    pub fn total_micros(&self) -> u64 {
        self.compute_micros
            .iter()
            .fold(0_u64, |total, micros| total.saturating_add(*micros))
    }

    pub fn path_cells(&self) -> u64 {
        self.path_cells
    }

    pub fn percentiles(&self) -> Option<LatencyPercentiles> {
        if self.compute_micros.is_empty() {
            return None;
        }

        let mut sorted = self.compute_micros.clone();
        sorted.sort_unstable();
        let count = sorted.len();

        Some(LatencyPercentiles {
            count,
            p50_micros: percentile_nearest_rank(&sorted, 50),
            p90_micros: percentile_nearest_rank(&sorted, 90),
            p95_micros: percentile_nearest_rank(&sorted, 95),
            p99_micros: percentile_nearest_rank(&sorted, 99),
            max_micros: sorted[count - 1],
        })
    }
}

fn percentile_nearest_rank(sorted: &[u64], percentile: usize) -> u64 {
    let count = sorted.len();
    let rank = (percentile * count).div_ceil(100);
    sorted[rank.saturating_sub(1)]
}
