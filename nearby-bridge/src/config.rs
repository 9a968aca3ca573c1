//! Load config from file and environment.

use nearby_core::CoreConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Bridge configuration. File: ~/.config/nearby-bridge/config.toml or /etc/nearby-bridge/config.toml.
/// Env overrides: NEARBY_BRIDGE_LOG, NEARBY_BRIDGE_CHANNEL_CAPACITY, NEARBY_BRIDGE_LEGACY_NULL_NAME.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// tracing filter directive (default "info"). RUST_LOG still wins when set.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Depth of the event queue in front of the core (default 64).
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default)]
    pub core: CoreConfig,
}

fn default_log_filter() -> String {
    "info".to_string()
}
fn default_channel_capacity() -> usize {
    64
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            channel_capacity: default_channel_capacity(),
            core: CoreConfig::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value {value:?} for {name}")]
    Env { name: &'static str, value: String },
}

/// Load config: default, then config file (explicit path or first existing default path), then env.
pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let mut c = match explicit {
        Some(p) => load_file(p)?,
        None => match config_paths().into_iter().find(|p| p.exists()) {
            Some(p) => load_file(&p)?,
            None => Config::default(),
        },
    };
    apply_env(&mut c, |name| std::env::var(name).ok())?;
    Ok(c)
}

/// Apply environment overrides through `lookup`.
pub fn apply_env(
    c: &mut Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(s) = lookup("NEARBY_BRIDGE_LOG") {
        c.log_filter = s;
    }
    if let Some(s) = lookup("NEARBY_BRIDGE_CHANNEL_CAPACITY") {
        c.channel_capacity = match s.parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                return Err(ConfigError::Env {
                    name: "NEARBY_BRIDGE_CHANNEL_CAPACITY",
                    value: s,
                })
            }
        };
    }
    if let Some(s) = lookup("NEARBY_BRIDGE_LEGACY_NULL_NAME") {
        c.core.legacy_null_name = match s.as_str() {
            "1" | "true" => true,
            "0" | "false" => false,
            _ => {
                return Err(ConfigError::Env {
                    name: "NEARBY_BRIDGE_LEGACY_NULL_NAME",
                    value: s,
                })
            }
        };
    }
    Ok(())
}

fn config_paths() -> Vec<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut out = Vec::new();
    if let Some(h) = home {
        out.push(h.join(".config/nearby-bridge/config.toml"));
    }
    out.push(PathBuf::from("/etc/nearby-bridge/config.toml"));
    out
}

fn load_file(path: &Path) -> Result<Config, ConfigError> {
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&s).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(s)
}
