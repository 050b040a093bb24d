//! Configuration file loading with precedence handling.

use super::WindowConfig;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to read config file (file may not exist or have permission issues).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },

    /// A value parsed but makes no sense (e.g. zero-width window).
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/pwin/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Blocks buffered on each side of the visible span.
    #[serde(default)]
    pub buffer_blocks: Option<usize>,

    /// Hysteresis margin in blocks.
    #[serde(default)]
    pub hysteresis_blocks: Option<usize>,

    /// Maximum blocks mounted at once.
    #[serde(default)]
    pub max_loaded_blocks: Option<usize>,

    /// Cooldown between range emissions, in milliseconds.
    #[serde(default)]
    pub cooldown_ms: Option<u64>,

    /// Settle debounce, in milliseconds.
    #[serde(default)]
    pub settle_debounce_ms: Option<u64>,

    /// Fallback block height in pixels.
    #[serde(default)]
    pub default_block_height: Option<f64>,

    /// Tolerance below which measured heights are ignored, in pixels.
    #[serde(default)]
    pub dom_tolerance: Option<f64>,

    /// Quiet window before height corrections are flushed, in milliseconds.
    #[serde(default)]
    pub flush_quiet_window_ms: Option<u64>,

    /// Width change (px) that invalidates measured heights.
    #[serde(default)]
    pub reflow_threshold: Option<f64>,

    /// Consecutive flush failures tolerated before going session-only.
    #[serde(default)]
    pub max_flush_failures: Option<u32>,

    /// Body font family used by the estimator.
    #[serde(default)]
    pub font_family: Option<String>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Window tunables.
    pub window: WindowConfig,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            log_file_path: default_log_path(),
        }
    }
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/pwin/pwin.log` on Unix-like systems,
/// or appropriate platform path on other systems.
///
/// If state directory cannot be determined, falls back to current directory.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("pwin").join("pwin.log")
    } else {
        PathBuf::from("pwin.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
/// Returns `Err` if file exists but cannot be read or parsed.
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    // Missing file is not an error - use defaults
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/pwin/config.toml` on Unix, appropriate path on other platforms.
/// Returns `None` if home directory cannot be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pwin").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (like CLI `--config`)
/// 2. `PWIN_CONFIG` environment variable
/// 3. Default path `~/.config/pwin/config.toml`
///
/// Missing config files are NOT errors - defaults are used.
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var("PWIN_CONFIG") {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Apply environment variable overrides to resolved config.
///
/// Checks for:
/// - `PWIN_LOG_FILE`: Override log file path
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Ok(path) = std::env::var("PWIN_LOG_FILE") {
        config.log_file_path = PathBuf::from(path);
    }

    config
}

/// Merge config file into defaults to create resolved config.
///
/// For each field in `ConfigFile`, if `Some(value)`, use it; otherwise use default.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] for values that would wedge the
/// window (zero max-loaded blocks, non-positive default height).
pub fn merge_config(config_file: Option<ConfigFile>) -> Result<ResolvedConfig, ConfigError> {
    let defaults = ResolvedConfig::default();

    let Some(file) = config_file else {
        return Ok(defaults);
    };

    let mut window = defaults.window;
    let viewport = &mut window.viewport;
    viewport.buffer_blocks = file.buffer_blocks.unwrap_or(viewport.buffer_blocks);
    viewport.hysteresis_blocks = file.hysteresis_blocks.unwrap_or(viewport.hysteresis_blocks);
    viewport.max_loaded_blocks = file.max_loaded_blocks.unwrap_or(viewport.max_loaded_blocks);
    if let Some(ms) = file.cooldown_ms {
        viewport.cooldown = Duration::from_millis(ms);
    }
    if let Some(ms) = file.settle_debounce_ms {
        viewport.settle_debounce = Duration::from_millis(ms);
    }

    let oracle = &mut window.oracle;
    oracle.default_block_height = file
        .default_block_height
        .unwrap_or(oracle.default_block_height);
    oracle.dom_tolerance = file.dom_tolerance.unwrap_or(oracle.dom_tolerance);
    if let Some(ms) = file.flush_quiet_window_ms {
        oracle.flush_quiet_window = Duration::from_millis(ms);
    }
    oracle.reflow_threshold = file.reflow_threshold.unwrap_or(oracle.reflow_threshold);
    oracle.max_flush_failures = file.max_flush_failures.unwrap_or(oracle.max_flush_failures);

    if let Some(family) = file.font_family {
        window.typography = window.typography.with_font_family(&family);
    }

    if window.viewport.max_loaded_blocks == 0 {
        return Err(ConfigError::InvalidValue {
            field: "max_loaded_blocks",
            reason: "must be at least 1".to_string(),
        });
    }
    if !(window.oracle.default_block_height > 0.0) {
        return Err(ConfigError::InvalidValue {
            field: "default_block_height",
            reason: format!("must be positive, got {}", window.oracle.default_block_height),
        });
    }

    Ok(ResolvedConfig {
        window,
        log_file_path: file.log_file_path.unwrap_or(defaults.log_file_path),
    })
}

/// Apply CLI argument overrides to resolved config.
///
/// CLI args have the highest precedence and override all other sources.
/// Only applies overrides for flags that were explicitly set by the user.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(
    mut config: ResolvedConfig,
    buffer_override: Option<usize>,
    max_loaded_override: Option<usize>,
    log_file_override: Option<PathBuf>,
) -> ResolvedConfig {
    if let Some(buffer) = buffer_override {
        config.window.viewport.buffer_blocks = buffer;
    }

    if let Some(max_loaded) = max_loaded_override {
        config.window.viewport.max_loaded_blocks = max_loaded.max(1);
    }

    if let Some(path) = log_file_override {
        config.log_file_path = path;
    }

    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
