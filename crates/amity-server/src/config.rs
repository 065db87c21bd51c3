//! Server configuration.
//!
//! Loaded from `amity.toml` in the data directory (or `--config`). Every
//! field is optional; a missing file means all defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use amity_graph::EngineConfig;

use crate::paths::AmityPaths;

/// Which edge store backs the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    #[default]
    Sqlite,
    /// Nothing survives a restart
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener socket (default: `<data_dir>/amity.sock`).
    pub socket_path: Option<PathBuf>,
    /// `SQLite` database file (default: `<data_dir>/amity.db`).
    pub db_path: Option<PathBuf>,
    pub store: StoreKind,
    pub max_connections: u32,
    /// Used when `RUST_LOG` is unset.
    pub log_filter: String,
    pub serialize_pair_writes: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_path: None,
            db_path: None,
            store: StoreKind::Sqlite,
            max_connections: 4,
            log_filter: "info".to_string(),
            serialize_pair_writes: true,
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn socket_path(&self, paths: &AmityPaths) -> PathBuf {
        self.socket_path
            .clone()
            .unwrap_or_else(|| paths.socket_path.clone())
    }

    pub fn db_path(&self, paths: &AmityPaths) -> PathBuf {
        self.db_path.clone().unwrap_or_else(|| paths.db_path.clone())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            serialize_pair_writes: self.serialize_pair_writes,
        }
    }
}
