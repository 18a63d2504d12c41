use chrono::{Datelike, NaiveDate, Weekday};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::config::TRADING_DAYS_PER_YEAR;
use crate::error::SimError;

/// Cap on business days in one generated history, about 200 years.
pub const DEFAULT_MAX_HISTORY_DAYS: usize = 52_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Seeded stream for reproducible histories, fresh entropy otherwise.
pub fn history_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Weekdays from `start` through `end`, both inclusive. Holidays are not skipped.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut current = start;
    while current <= end {
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push(current);
        }
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    days
}

/// Number of entries `business_days` would return, computed without walking
/// the range.
pub fn business_day_count(start: NaiveDate, end: NaiveDate) -> u64 {
    if end < start {
        return 0;
    }
    let days = (end - start).num_days() + 1;
    let first = i64::from(start.weekday().num_days_from_monday());
    let partial = (0..days % 7)
        .filter(|offset| (first + offset) % 7 < 5)
        .count() as i64;

    (days / 7 * 5 + partial) as u64
}

/// Rejects ranges with more than `limit` business days before anything is
/// generated. Returns the day count otherwise.
pub fn check_history_span(
    start: NaiveDate,
    end: NaiveDate,
    limit: usize,
) -> Result<usize, SimError> {
    let count = business_day_count(start, end);
    match usize::try_from(count) {
        Ok(count) if count <= limit => Ok(count),
        _ => Err(SimError::ResourceExhausted {
            horizon: usize::try_from(count).unwrap_or(usize::MAX),
            sims: 1,
            limit,
        }),
    }
}

/// One GBM close series over the business days between two dates.
///
/// The first business day closes at `s0`; each later day applies one daily
/// log-return. An empty range yields an empty series.
pub fn generate_gbm_history<R: Rng + ?Sized>(
    start: NaiveDate,
    end: NaiveDate,
    s0: f64,
    mu: f64,
    sigma: f64,
    rng: &mut R,
) -> Result<Vec<PricePoint>, SimError> {
    if !s0.is_finite() || s0 <= 0.0 {
        return Err(SimError::invalid("s0", "must be finite and positive"));
    }
    if !mu.is_finite() {
        return Err(SimError::invalid("mu", "must be finite"));
    }
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(SimError::invalid("sigma", "must be finite and non-negative"));
    }

    let mu_daily = mu / TRADING_DAYS_PER_YEAR;
    let sigma_daily = sigma / TRADING_DAYS_PER_YEAR.sqrt();
    let drift = mu_daily - 0.5 * sigma_daily * sigma_daily;

    let mut log_price = s0.ln();
    let points = business_days(start, end)
        .into_iter()
        .enumerate()
        .map(|(index, date)| {
            if index > 0 {
                let z: f64 = StandardNormal.sample(&mut *rng);
                log_price += drift + sigma_daily * z;
            }
            PricePoint {
                date,
                close: log_price.exp(),
            }
        })
        .collect();

    Ok(points)
}
