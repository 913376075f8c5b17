//! Engine configuration stored in `.life/config.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::io::store::StorageConfig;

pub const DEFAULT_CONFIG_PATH: &str = ".life/config.toml";

/// Engine configuration (TOML).
///
/// Missing fields default to values that work for a local checkout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LifeConfig {
    pub storage: StorageConfig,
    pub convergence: ConvergenceConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConvergenceConfig {
    /// Step budget used when a caller does not name one.
    pub default_max_steps: u64,

    /// Largest step budget a single convergence call may request.
    pub max_steps_limit: u64,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            default_max_steps: 100,
            max_steps_limit: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl LifeConfig {
    pub fn validate(&self) -> Result<()> {
        self.storage.validate()?;
        if self.convergence.max_steps_limit == 0 {
            return Err(anyhow!("convergence.max_steps_limit must be > 0"));
        }
        if self.convergence.default_max_steps > self.convergence.max_steps_limit {
            return Err(anyhow!(
                "convergence.default_max_steps ({}) exceeds max_steps_limit ({})",
                self.convergence.default_max_steps,
                self.convergence.max_steps_limit
            ));
        }
        if self.server.bind.trim().is_empty() {
            return Err(anyhow!("server.bind must be non-empty"));
        }
        if self.server.port == 0 {
            return Err(anyhow!("server.port must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `LifeConfig::default()`.
pub fn load_config(path: &Path) -> Result<LifeConfig> {
    if !path.exists() {
        let cfg = LifeConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: LifeConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &LifeConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
