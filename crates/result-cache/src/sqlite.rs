use std::fs;
use std::path::{Path, PathBuf};

use core_sim::{SimulationKey, SimulationResult};
use rusqlite::{params, Connection, OptionalExtension};

use crate::{check_rows, CacheError, ResultCache};

pub const DEFAULT_CACHE_DIR: &str = "mc_cache_disk";
pub const CACHE_FILE_NAME: &str = "cache.db";

const SELECT_PAYLOAD: &str = "SELECT payload FROM simulation_results
    WHERE s0_bits = ?1 AND mu_bits = ?2 AND sigma_bits = ?3
      AND horizon = ?4 AND sims = ?5 AND total_shares_bits = ?6";

const UPSERT_PAYLOAD: &str = "INSERT OR REPLACE INTO simulation_results
    (s0_bits, mu_bits, sigma_bits, horizon, sims, total_shares_bits, payload)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

/// SQLite-backed cache. One row per key; the six key fields are stored as
/// their raw bit patterns so identity survives the round trip exactly.
#[derive(Debug)]
pub struct SqliteResultCache {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteResultCache {
    /// Opens `dir/cache.db`, creating the directory and schema when missing.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, CacheError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| CacheError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = dir.join(CACHE_FILE_NAME);
        let conn = Connection::open(&path)?;
        init_schema(&conn)?;

        Ok(Self {
            conn,
            path: Some(path),
        })
    }

    pub fn open_in_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;

        Ok(Self { conn, path: None })
    }

    /// Database file, `None` for an in-memory store.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn close(self) -> Result<(), CacheError> {
        self.conn
            .close()
            .map_err(|(_, err)| CacheError::Sqlite(err))
    }
}

impl ResultCache for SqliteResultCache {
    fn get(&self, key: &SimulationKey) -> Result<Option<SimulationResult>, CacheError> {
        let [s0, mu, sigma, horizon, sims, total_shares] = key_columns(key);
        let mut stmt = self.conn.prepare_cached(SELECT_PAYLOAD)?;
        let payload: Option<Vec<u8>> = stmt
            .query_row(params![s0, mu, sigma, horizon, sims, total_shares], |row| {
                row.get(0)
            })
            .optional()?;

        let Some(payload) = payload else {
            return Ok(None);
        };
        let result: SimulationResult = serde_json::from_slice(&payload)?;
        check_rows(key, &result)?;

        Ok(Some(result))
    }

    fn put(&mut self, key: &SimulationKey, result: &SimulationResult) -> Result<(), CacheError> {
        check_rows(key, result)?;
        let payload = serde_json::to_vec(result)?;
        let [s0, mu, sigma, horizon, sims, total_shares] = key_columns(key);

        let mut stmt = self.conn.prepare_cached(UPSERT_PAYLOAD)?;
        stmt.execute(params![s0, mu, sigma, horizon, sims, total_shares, payload])?;
        Ok(())
    }

    fn len(&self) -> Result<usize, CacheError> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM simulation_results", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS simulation_results (
            s0_bits INTEGER NOT NULL,
            mu_bits INTEGER NOT NULL,
            sigma_bits INTEGER NOT NULL,
            horizon INTEGER NOT NULL,
            sims INTEGER NOT NULL,
            total_shares_bits INTEGER NOT NULL,
            payload BLOB NOT NULL,
            created_at INTEGER DEFAULT (strftime('%s', 'now')),
            PRIMARY KEY (s0_bits, mu_bits, sigma_bits, horizon, sims, total_shares_bits)
        )",
        [],
    )?;
    Ok(())
}

// SQLite integers are signed; reinterpret the bits rather than convert.
fn key_columns(key: &SimulationKey) -> [i64; 6] {
    key.bits().map(|bits| bits as i64)
}
