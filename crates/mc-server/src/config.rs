use std::{
    env,
    net::{AddrParseError, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use core_sim::history::DEFAULT_MAX_HISTORY_DAYS;
use result_cache::DEFAULT_CACHE_DIR;
use runtime::{DEFAULT_MAX_PATH_CELLS, DEFAULT_PROGRESS_EVERY};

const DEFAULT_LISTEN_PORT: u16 = 8080;

const ENV_ADDR: &str = "MC_SERVER_ADDR";
const ENV_CACHE_DIR: &str = "MC_CACHE_DIR";
const ENV_SEED: &str = "MC_SEED";
const ENV_MAX_PATH_CELLS: &str = "MC_MAX_PATH_CELLS";
const ENV_PROGRESS_EVERY: &str = "MC_PREFILL_PROGRESS_EVERY";
const ENV_MAX_HISTORY_DAYS: &str = "MC_MAX_HISTORY_DAYS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub cache_dir: PathBuf,
    /// Fixed seed for reproducible stores; fresh entropy when unset.
    pub seed: Option<u64>,
    pub max_path_cells: usize,
    pub max_history_days: usize,
    pub prefill_progress_every: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("MC_SERVER_ADDR is not a valid socket address: {0}")]
    InvalidListenAddr(#[source] AddrParseError),

    #[error("MC_CACHE_DIR must not be empty or whitespace")]
    InvalidCacheDir,

    #[error("MC_SEED must be an unsigned 64-bit integer")]
    InvalidSeed,

    #[error("MC_MAX_PATH_CELLS must be a positive integer")]
    InvalidMaxPathCells,

    #[error("MC_PREFILL_PROGRESS_EVERY must be a positive integer")]
    InvalidProgressEvery,

    #[error("MC_MAX_HISTORY_DAYS must be a positive integer")]
    InvalidMaxHistoryDays,

    #[error("{0} contains non-unicode data")]
    NonUnicode(&'static str),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let listen_addr = match read_env(ENV_ADDR)? {
            Some(value) => value.parse().map_err(ConfigError::InvalidListenAddr)?,
            None => SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_LISTEN_PORT)),
        };

        let cache_dir = match read_env(ENV_CACHE_DIR)? {
            Some(value) => {
                if value.trim().is_empty() {
                    return Err(ConfigError::InvalidCacheDir);
                }
                PathBuf::from(value)
            }
            None => PathBuf::from(DEFAULT_CACHE_DIR),
        };

        let seed = match read_env(ENV_SEED)? {
            Some(value) => Some(value.trim().parse().map_err(|_| ConfigError::InvalidSeed)?),
            None => None,
        };

        let max_path_cells = parse_positive_env(
            ENV_MAX_PATH_CELLS,
            DEFAULT_MAX_PATH_CELLS,
            ConfigError::InvalidMaxPathCells,
        )?;

        let max_history_days = parse_positive_env(
            ENV_MAX_HISTORY_DAYS,
            DEFAULT_MAX_HISTORY_DAYS,
            ConfigError::InvalidMaxHistoryDays,
        )?;

        let prefill_progress_every = parse_positive_env(
            ENV_PROGRESS_EVERY,
            DEFAULT_PROGRESS_EVERY,
            ConfigError::InvalidProgressEvery,
        )?;

        Ok(Self {
            listen_addr,
            cache_dir,
            seed,
            max_path_cells,
            max_history_days,
            prefill_progress_every,
        })
    }
}

fn read_env(key: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::NonUnicode(key)),
    }
}

fn parse_positive_env(
    key: &'static str,
    default_value: usize,
    invalid_error: ConfigError,
) -> Result<usize, ConfigError> {
    match read_env(key)? {
        Some(value) => match value.trim().parse::<usize>() {
            Ok(parsed) if parsed > 0 => Ok(parsed),
            _ => Err(invalid_error),
        },
        None => Ok(default_value),
    }
}
