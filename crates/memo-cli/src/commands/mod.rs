//! Subcommand implementations.

pub mod add_pair;
pub mod grade;
pub mod init;
pub mod pairs;
pub mod prepare;
pub mod ranking;
pub mod show;

use std::path::PathBuf;

use anyhow::{Context, Result};
use memo_core::config::{load_config_from, MemoConfig};
use memo_core::gateway::Gateway;
use memo_core::model::{Test, TestId};
use memo_store::SqliteGateway;

/// Options shared by every subcommand.
pub struct Globals {
    pub config: Option<PathBuf>,
    pub database: Option<PathBuf>,
}

impl Globals {
    /// Load the config, applying `--database` on top of it.
    pub fn load_config(&self) -> Result<MemoConfig> {
        let mut config = load_config_from(self.config.as_deref())?;
        if let Some(database) = &self.database {
            config.database = database.clone();
        }
        Ok(config)
    }

    /// Load the config and open its database.
    pub fn open(&self) -> Result<(MemoConfig, SqliteGateway)> {
        let config = self.load_config()?;
        let store = SqliteGateway::open(&config.database)
            .with_context(|| format!("failed to open database {}", config.database.display()))?;
        Ok((config, store))
    }
}

/// The requested test, or the latest one.
pub fn select_test(store: &SqliteGateway, requested: Option<TestId>) -> Result<Test> {
    match requested {
        Some(id) => Ok(store.find_test(id)?),
        None => store
            .latest_test()?
            .context("no tests yet; create one with `memo prepare`"),
    }
}
