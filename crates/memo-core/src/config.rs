//! memo configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::assembler::DEFAULT_QUESTIONS_PER_TEST;
use crate::reply::GradeOptions;

/// Top-level memo configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoConfig {
    /// SQLite database file. `${VAR}` references are expanded.
    #[serde(default = "default_database")]
    pub database: PathBuf,
    /// Maximum number of questions in a new test.
    #[serde(default = "default_questions_per_test")]
    pub questions_per_test: usize,
    /// Accept answers that differ from the expected phrase only in case.
    #[serde(default)]
    pub ignore_case: bool,
}

fn default_database() -> PathBuf {
    home_dir()
        .map(|h| h.join(".memo").join("db"))
        .unwrap_or_else(|| PathBuf::from("memo.db"))
}

fn default_questions_per_test() -> usize {
    DEFAULT_QUESTIONS_PER_TEST
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            questions_per_test: default_questions_per_test(),
            ignore_case: false,
        }
    }
}

impl MemoConfig {
    pub fn grade_options(&self) -> GradeOptions {
        GradeOptions {
            ignore_case: self.ignore_case,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not scanned again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order:
/// 1. `memo.toml` in the current directory
/// 2. `~/.config/memo/config.toml`
///
/// An explicit path must exist. Environment variable overrides:
/// `MEMO_DATABASE`, `MEMO_QUESTIONS_PER_TEST`.
pub fn load_config_from(path: Option<&Path>) -> Result<MemoConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("memo.toml");
        if local.exists() {
            Some(local)
        } else {
            config_dir()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => MemoConfig::default(),
    };

    if let Ok(database) = std::env::var("MEMO_DATABASE") {
        config.database = PathBuf::from(database);
    }

    if let Ok(n) = std::env::var("MEMO_QUESTIONS_PER_TEST") {
        config.questions_per_test = n
            .trim()
            .parse()
            .with_context(|| format!("invalid MEMO_QUESTIONS_PER_TEST: {n:?}"))?;
    }

    config.database = PathBuf::from(resolve_env_vars(&config.database.to_string_lossy()));

    Ok(config)
}

/// Parse a TOML string into a config.
pub fn parse_config(content: &str) -> Result<MemoConfig> {
    Ok(toml::from_str::<MemoConfig>(content)?)
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

fn config_dir() -> Option<PathBuf> {
    home_dir().map(|h| h.join(".config").join("memo"))
}
