//! Configuration model for avmux.
//!
//! An optional YAML file supplies defaults that CLI flags override.
//! Parsing is forward compatible (unknown fields are ignored), optional
//! fields have sensible defaults, and values are validated before use.
//!
//! Lookup order when no `--config` flag is given: the `AVMUX_CONFIG`
//! environment variable, then `avmux.yaml` in the current directory, then
//! built-in defaults.

use crate::error::{AvmuxError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an alternate config file.
pub const ENV_CONFIG: &str = "AVMUX_CONFIG";

/// Default config file name looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "avmux.yaml";

fn default_timeout_seconds() -> u64 {
    30
}

fn default_reader_grace_ms() -> u64 {
    1000
}

/// Configuration for avmux runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the FFmpeg binary. When unset, resolution falls back to the
    /// `AVMUX_FFMPEG`/`FFMPEG_PATH` environment variables and then PATH.
    pub ffmpeg_path: Option<PathBuf>,

    /// Directory holding FFmpeg's shared libraries. Exported to the child
    /// as `LD_LIBRARY_PATH` (bundled-binary layout).
    pub lib_dir: Option<PathBuf>,

    /// Wall-clock timeout for the merge run, in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Grace period granted to the output reader after the process ends,
    /// in milliseconds.
    #[serde(default = "default_reader_grace_ms")]
    pub reader_grace_ms: u64,

    /// Extra arguments inserted before the output path, as a single
    /// shell-quoted string (e.g. `-loglevel error`).
    pub extra_args: Option<String>,

    /// Path to an append-only NDJSON event log. Disabled when unset.
    pub event_log: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            lib_dir: None,
            timeout_seconds: default_timeout_seconds(),
            reader_grace_ms: default_reader_grace_ms(),
            extra_args: None,
            event_log: None,
        }
    }
}

impl Config {
    /// Load configuration, preferring an explicit path over the environment
    /// variable and the default file location.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file just yields built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(AvmuxError::UserError(format!(
                    "config file not found: '{}'",
                    path.display()
                )));
            }
            return Self::from_file(path);
        }

        if let Ok(value) = std::env::var(ENV_CONFIG) {
            if !value.is_empty() {
                let path = PathBuf::from(&value);
                if !path.exists() {
                    return Err(AvmuxError::UserError(format!(
                        "config file named by {} not found: '{}'",
                        ENV_CONFIG, value
                    )));
                }
                return Self::from_file(&path);
            }
        }

        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            return Self::from_file(default_path);
        }

        Ok(Self::default())
    }

    /// Parse and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AvmuxError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = serde_yaml::from_str(&contents).map_err(|e| {
            AvmuxError::UserError(format!(
                "failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate config values.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_seconds == 0 {
            return Err(AvmuxError::UserError(
                "timeout_seconds must be at least 1".to_string(),
            ));
        }
        if let Some(extra) = &self.extra_args {
            shell_words::split(extra).map_err(|e| {
                AvmuxError::UserError(format!("failed to parse extra_args '{}': {}", extra, e))
            })?;
        }
        Ok(())
    }

    /// Extra FFmpeg arguments, split with shell quoting rules.
    pub fn extra_ffmpeg_args(&self) -> Result<Vec<String>> {
        match &self.extra_args {
            Some(extra) => shell_words::split(extra).map_err(|e| {
                AvmuxError::UserError(format!("failed to parse extra_args '{}': {}", extra, e))
            }),
            None => Ok(Vec::new()),
        }
    }
}
