//! Persistent memo of simulation results keyed by the exact parameter tuple.
//!
//! Lookups never round or normalise: a key hits only when all six fields are
//! bit-for-bit identical to the stored one. Nothing is ever evicted.

mod memory;
mod sqlite;

use std::path::PathBuf;

use core_sim::{SimulationKey, SimulationResult};

pub use memory::InMemoryResultCache;
pub use sqlite::{SqliteResultCache, CACHE_FILE_NAME, DEFAULT_CACHE_DIR};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache directory {} is not usable: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("cache payload could not be encoded or decoded: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("cache entry holds {found} rows but its key asks for {expected}")]
    Corrupt { expected: usize, found: usize },
}

/// Exact-key store for simulation results.
///
/// Implementations do not lock; callers that share a cache across threads
/// serialise access themselves.
pub trait ResultCache {
    fn get(&self, key: &SimulationKey) -> Result<Option<SimulationResult>, CacheError>;

    /// Stores `result` under `key`, replacing any earlier entry.
    fn put(&mut self, key: &SimulationKey, result: &SimulationResult) -> Result<(), CacheError>;

    fn len(&self) -> Result<usize, CacheError>;

    fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }
}

impl<C: ResultCache + ?Sized> ResultCache for Box<C> {
    fn get(&self, key: &SimulationKey) -> Result<Option<SimulationResult>, CacheError> {
        (**self).get(key)
    }

    fn put(&mut self, key: &SimulationKey, result: &SimulationResult) -> Result<(), CacheError> {
        (**self).put(key, result)
    }

    fn len(&self) -> Result<usize, CacheError> {
        (**self).len()
    }
}

pub(crate) fn check_rows(key: &SimulationKey, result: &SimulationResult) -> Result<(), CacheError> {
    for found in [result.p_twap.len(), result.p_usd.len()] {
        if found != key.sims {
            return Err(CacheError::Corrupt {
                expected: key.sims,
                found,
            });
        }
    }
    Ok(())
}
