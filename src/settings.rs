// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Runtime settings, layered from `pursebook.toml` in the platform config
//! dir, `./pursebook.toml`, then `PURSEBOOK_*` environment variables
//! (e.g. `PURSEBOOK_DATABASE__PATH`, `PURSEBOOK_LOG__LEVEL`).

use std::path::PathBuf;

use anyhow::Result;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::db;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Database {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: String,
}

impl Default for Log {
    fn default() -> Self {
        Log {
            level: "warn".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub database: Database,
    #[serde(default)]
    pub log: Log,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let mut builder = Config::builder().set_default("log.level", "warn")?;
        if let Some(proj) = db::project_dirs() {
            builder = builder
                .add_source(File::from(proj.config_dir().join("pursebook.toml")).required(false));
        }
        builder
            .add_source(File::with_name("pursebook").required(false))
            .add_source(Environment::with_prefix("PURSEBOOK").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Configured database file, falling back to the platform data dir.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database.path {
            Some(p) => Ok(p.clone()),
            None => db::default_db_path(),
        }
    }
}
