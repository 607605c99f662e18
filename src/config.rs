//! # Configuration Module
//!
//! Locates the catalog database. By default it lives in the platform data
//! directory:
//! - Linux: `~/.local/share/moodmix/catalog.db`
//! - macOS: `~/Library/Application Support/moodmix/catalog.db`
//! - Windows: `%APPDATA%\moodmix\catalog.db`
//!
//! `--db <PATH>` (or `MOODMIX_DB`) overrides the location. Scoring weights
//! and playlist shape are not configurable at runtime; see
//! [`crate::algorithm::ScoringContext`] and [`crate::playlist::GeneratorConfig`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const APP_DIR: &str = "moodmix";
const DB_FILE: &str = "catalog.db";

/// Returns the platform-appropriate data directory for Moodmix, creating it if needed.
///
/// # Errors
///
/// Fails when the platform has no data directory or it cannot be created.
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| anyhow::anyhow!(
            "Could not determine system data directory. Pass --db or set MOODMIX_DB instead."
        ))?;

    let app_dir = data_dir.join(APP_DIR);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!(
            "Failed to create Moodmix data directory at {}. Please check file permissions.",
            app_dir.display()
        ))?;

    Ok(app_dir)
}

/// Returns the default catalog database path.
///
/// ```no_run
/// let db_path = moodmix::config::get_db_path()?;
/// println!("Catalog location: {}", db_path.display());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn get_db_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join(DB_FILE))
}

/// Configuration for runtime behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Path to the database file
    pub db_path: PathBuf,
}

impl RuntimeConfig {
    /// Use `db_override` when given, the platform default otherwise.
    pub fn resolve(db_override: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_override {
            Some(path) => path,
            None => get_db_path()?,
        };
        log::debug!("Using catalog database {}", db_path.display());
        Ok(Self::with_db_path(db_path))
    }

    /// Create configuration with explicit database path
    pub fn with_db_path(db_path: PathBuf) -> Self {
        Self { db_path }
    }
}
