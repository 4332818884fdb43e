//! Configuration for tenant stores and application bootstrap.
//!
//! Tenant stores live as `SQLite` files under a single data directory. The
//! directory comes from the `DATA_DIR` environment variable (falling back to
//! `./data`), or from an optional `config.toml` for deployments that prefer a
//! file. The module also exposes the tracing bootstrap the embedding
//! application calls once at startup.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Where tenant stores are kept.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding one `SQLite` file per tenant
    pub data_dir: PathBuf,
    /// Use in-memory stores instead of files (tests)
    pub in_memory: bool,
}

impl StoreConfig {
    /// Builds the configuration from the environment.
    ///
    /// Loads `.env` first (non-fatal if absent), then reads `DATA_DIR`,
    /// defaulting to `./data`.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());
        Self {
            data_dir: PathBuf::from(data_dir),
            in_memory: false,
        }
    }

    /// Configuration backed by in-memory stores, for tests.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            data_dir: PathBuf::new(),
            in_memory: true,
        }
    }
}

/// Structure of the optional `config.toml` file
#[derive(Debug, Deserialize)]
struct ConfigFile {
    store: StoreSection,
}

/// `[store]` section of `config.toml`
#[derive(Debug, Deserialize)]
struct StoreSection {
    data_dir: String,
}

/// Loads store configuration from a TOML file.
///
/// Expected shape:
/// ```toml
/// [store]
/// data_dir = "/var/lib/credit-ledger"
/// ```
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_store_config<P: AsRef<Path>>(path: P) -> Result<StoreConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    let parsed: ConfigFile = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    Ok(StoreConfig {
        data_dir: PathBuf::from(parsed.store.data_dir),
        in_memory: false,
    })
}

/// Initializes tracing with an env-filter subscriber.
///
/// Call once from the embedding application, as early as possible. Honors
/// `RUST_LOG`; defaults to `info`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_config() {
        let config = StoreConfig::in_memory();
        assert!(config.in_memory);
    }

    #[test]
    fn test_load_store_config_parses_toml() -> Result<()> {
        let dir = std::env::temp_dir().join("credit_ledger_config_test");
        std::fs::create_dir_all(&dir)?;
        let path = dir.join("config.toml");
        std::fs::write(&path, "[store]\ndata_dir = \"/tmp/stores\"\n")?;

        let config = load_store_config(&path)?;
        assert_eq!(config.data_dir, PathBuf::from("/tmp/stores"));
        assert!(!config.in_memory);

        Ok(())
    }

    #[test]
    fn test_load_store_config_rejects_bad_toml() -> Result<()> {
        let dir = std::env::temp_dir().join("credit_ledger_config_test");
        std::fs::create_dir_all(&dir)?;
        let path = dir.join("broken.toml");
        std::fs::write(&path, "[store\n")?;

        let result = load_store_config(&path);
        assert!(matches!(result, Err(Error::Config { .. })));

        Ok(())
    }

    #[test]
    fn test_load_store_config_missing_file() {
        let result = load_store_config("/nonexistent/config.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
