use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::Config;
use crate::ops::exchange::Briefing;

/// Error type for config loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Get the config file path: `TASKLINE_CONFIG`, else under
/// `XDG_CONFIG_HOME`, else `~/.config`.
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("TASKLINE_CONFIG") {
        return PathBuf::from(path);
    }
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_home().join(".config"));
    config_dir.join("taskline").join("config.toml")
}

/// Get the user's home directory
fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

/// Read the config from a specific path. A missing file means defaults.
pub fn read_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Build the briefing settings. A relative template path is resolved
/// against the directory holding the config file.
pub fn load_briefing(config: &Config, config_file: &Path) -> Result<Briefing, ConfigError> {
    let mut briefing = Briefing::default();
    if let Some(template) = &config.assistant.template {
        let mut path = PathBuf::from(template);
        if path.is_relative()
            && let Some(dir) = config_file.parent()
        {
            path = dir.join(path);
        }
        briefing.template = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            source: e,
        })?;
    }
    if let Some(instructions) = &config.assistant.instructions {
        briefing.instructions = instructions.clone();
    }
    Ok(briefing)
}
