//! Setup configuration
//!
//! All values the bootstrapper needs for a run: the three input
//! directories and the PostgreSQL connection settings. Values are
//! collected once at invocation and are immutable afterwards.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default PostgreSQL server host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default target database name.
pub const DEFAULT_DBNAME: &str = "mimic";

/// Default PostgreSQL server port.
pub const DEFAULT_PORT: u16 = 5432;

/// Errors raised by configuration validation
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One of the three input paths does not reference an existing directory
    #[error("{role} directory does not exist at {path}")]
    MissingDirectory {
        /// Human-readable name of the input (e.g. "mimic-code repository")
        role: &'static str,
        /// The path as supplied by the user
        path: String,
    },
}

/// PostgreSQL connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    /// Server host
    pub host: String,
    /// Target database name (created by the build step)
    pub name: String,
    /// Database user (created by the build step if missing)
    pub user: String,
    /// Database password (may be empty)
    pub password: String,
    /// Server port
    pub port: u16,
}

/// Full configuration for one setup run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupConfig {
    /// Directory containing the compressed MIMIC-III dump
    pub dump_dir: PathBuf,
    /// mimic-code repository checkout
    pub code_repo: PathBuf,
    /// MIMIC-Extract repository checkout
    pub extract_repo: PathBuf,
    /// PostgreSQL connection settings
    pub db: DbConfig,
}

impl SetupConfig {
    /// Creates a configuration from the raw invocation values
    ///
    /// Trailing path separators are stripped here so that every path later
    /// derived from these roots is free of doubled separators.
    pub fn new(
        dump_dir: impl AsRef<str>,
        code_repo: impl AsRef<str>,
        extract_repo: impl AsRef<str>,
        db: DbConfig,
    ) -> Self {
        Self {
            dump_dir: normalize_path(dump_dir.as_ref()),
            code_repo: normalize_path(code_repo.as_ref()),
            extract_repo: normalize_path(extract_repo.as_ref()),
            db,
        }
    }

    /// Validates that every input path references an existing directory
    ///
    /// Returns the first failure, naming the offending input. Runs before
    /// any connection is opened or any external tool is invoked.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_directory(&self.dump_dir, "MIMIC-III dump")?;
        check_directory(&self.code_repo, "mimic-code repository")?;
        check_directory(&self.extract_repo, "MIMIC-Extract repository")?;
        Ok(())
    }
}

fn check_directory(path: &Path, role: &'static str) -> Result<(), ConfigError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(ConfigError::MissingDirectory {
            role,
            path: path.display().to_string(),
        })
    }
}

/// Strips trailing separators from a user-supplied path string
///
/// A bare root ("/") is kept as-is.
fn normalize_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim_end_matches('/');
    if trimmed.is_empty() {
        PathBuf::from("/")
    } else {
        PathBuf::from(trimmed)
    }
}
