//! Configuration module.
//!
//! Everything tunable about the window lives here: buffering and gating
//! constants for the coordinator, correction and flush constants for the
//! oracle, and the typography the estimator works from.

pub mod loader;

pub use loader::{
    apply_cli_overrides, apply_env_overrides, default_config_path, default_log_path,
    load_config_file, load_config_with_precedence, merge_config, ConfigError, ConfigFile,
    ResolvedConfig,
};

use crate::estimator::Typography;
use std::time::Duration;

/// Constants driving the viewport coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportTuning {
    /// Blocks loaded beyond the visible span on each side.
    pub buffer_blocks: usize,
    /// How close (in blocks) `first_visible` must come to a loaded edge
    /// before a new range may be requested.
    pub hysteresis_blocks: usize,
    /// Upper bound on the width of any emitted range.
    pub max_loaded_blocks: usize,
    /// Minimum time between two gated emissions.
    pub cooldown: Duration,
    /// Inactivity after which a settle update fires.
    pub settle_debounce: Duration,
}

impl Default for ViewportTuning {
    fn default() -> Self {
        Self {
            buffer_blocks: 100,
            hysteresis_blocks: 40,
            max_loaded_blocks: 300,
            cooldown: Duration::from_millis(500),
            settle_debounce: Duration::from_millis(200),
        }
    }
}

/// Constants driving the layout oracle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OracleTuning {
    /// Height used when nothing better is known (no measurement surface).
    pub default_block_height: f64,
    /// Measured heights within this many pixels of the cache are ignored.
    pub dom_tolerance: f64,
    /// Quiet period after the last correction before a flush.
    pub flush_quiet_window: Duration,
    /// Container width change (px) that invalidates measured heights.
    pub reflow_threshold: f64,
    /// Consecutive flush failures before persistence is abandoned for the session.
    pub max_flush_failures: u32,
}

impl Default for OracleTuning {
    fn default() -> Self {
        Self {
            default_block_height: 28.0,
            dom_tolerance: 2.0,
            flush_quiet_window: Duration::from_millis(200),
            reflow_threshold: 4.0,
            max_flush_failures: 5,
        }
    }
}

/// Complete window configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowConfig {
    /// Coordinator constants.
    pub viewport: ViewportTuning,
    /// Oracle constants.
    pub oracle: OracleTuning,
    /// Typography used by the estimator.
    pub typography: Typography,
}
