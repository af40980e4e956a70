//! Pledge runtime configuration
//!
//! Diagnostics switches and scheduler limits, with merge semantics.
//!
//! # Configuration hierarchy
//!
//! ```text
//! Priority (high → low):
//! 1. Values installed with `install()`
//! 2. Environment variables (PLEDGE_TRACE, PLEDGE_TASK_BUDGET)
//! 3. Config file (pledge.toml)
//! 4. Default values
//! ```
//!
//! # Usage
//!
//! ```rust
//! use pledge::util::config::{self, RuntimeConfig};
//!
//! let cfg = RuntimeConfig::from_toml_str("[trace]\ntransitions = true\n").unwrap();
//! config::install(cfg);
//! assert!(config::trace_transitions());
//! # config::install(RuntimeConfig::default());
//! ```

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable enabling per-transition tracing
pub const ENV_TRACE: &str = "PLEDGE_TRACE";

/// Environment variable overriding the scheduler task budget
pub const ENV_TASK_BUDGET: &str = "PLEDGE_TASK_BUDGET";

/// Top-level runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RuntimeConfig {
    /// Diagnostics settings
    #[serde(default)]
    pub trace: TraceConfig,
    /// Scheduler settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Diagnostics configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Emit an event for every feed, settle and registration
    #[serde(default)]
    pub transitions: bool,
    /// Warn when a cell is fed or settled out of state
    #[serde(default = "default_warn_on_misuse")]
    pub warn_on_misuse: bool,
}

fn default_warn_on_misuse() -> bool {
    true
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            transitions: false,
            warn_on_misuse: true,
        }
    }
}

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum tasks executed by a single `run` call
    #[serde(default = "default_task_budget")]
    pub task_budget: usize,
}

fn default_task_budget() -> usize {
    100_000
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            task_budget: default_task_budget(),
        }
    }
}

impl RuntimeConfig {
    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Defaults overridden by `PLEDGE_TRACE` / `PLEDGE_TASK_BUDGET`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().merge_env()
    }

    /// Apply environment overrides on top of `self`
    pub fn merge_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(raw) = std::env::var(ENV_TRACE) {
            self.trace.transitions = parse_flag(ENV_TRACE, &raw)?;
        }
        if let Ok(raw) = std::env::var(ENV_TASK_BUDGET) {
            self.scheduler.task_budget = raw.trim().parse().map_err(|_| ConfigError::Env {
                var: ENV_TASK_BUDGET,
                value: raw.clone(),
            })?;
        }
        Ok(self)
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn parse_flag(
    var: &'static str,
    raw: &str,
) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Env {
            var,
            value: raw.to_string(),
        }),
    }
}

/// Load a config file, then apply environment overrides
pub fn load_config(path: &Path) -> Result<RuntimeConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    RuntimeConfig::from_toml_str(&content)?.merge_env()
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid value {value:?} for {var}")]
    Env { var: &'static str, value: String },
}

// ============================================================================
// Process-wide current configuration
// ============================================================================

static CURRENT: Lazy<RwLock<RuntimeConfig>> = Lazy::new(|| RwLock::new(RuntimeConfig::default()));

// Hot-path mirrors of the trace switches and budget
static TRACE_TRANSITIONS: AtomicBool = AtomicBool::new(false);
static WARN_ON_MISUSE: AtomicBool = AtomicBool::new(true);
static TASK_BUDGET: AtomicUsize = AtomicUsize::new(100_000);

/// Install `config` as the process-wide configuration
pub fn install(config: RuntimeConfig) {
    TRACE_TRANSITIONS.store(config.trace.transitions, Ordering::SeqCst);
    WARN_ON_MISUSE.store(config.trace.warn_on_misuse, Ordering::SeqCst);
    TASK_BUDGET.store(config.scheduler.task_budget, Ordering::SeqCst);
    *CURRENT.write() = config;
}

/// Snapshot of the process-wide configuration
pub fn current() -> RuntimeConfig {
    CURRENT.read().clone()
}

/// Whether per-transition events are enabled
#[inline]
pub fn trace_transitions() -> bool {
    TRACE_TRANSITIONS.load(Ordering::Relaxed)
}

/// Whether out-of-state feeds and settles are reported
#[inline]
pub fn warn_on_misuse() -> bool {
    WARN_ON_MISUSE.load(Ordering::Relaxed)
}

/// Maximum tasks a single scheduler run may execute
#[inline]
pub fn task_budget() -> usize {
    TASK_BUDGET.load(Ordering::Relaxed)
}
