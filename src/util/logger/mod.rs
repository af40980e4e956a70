//! Logging for cell transitions and scheduler events
//!
//! Output is one `[LEVEL] message` line per event. What shows up at each level:
//!
//! - `TRACE`: every feed, settle and registration, plus queued scheduler tasks,
//!   when `trace.transitions` is on
//! - `DEBUG`: rejections that reach a cell with no dependents, late setup
//!   faults, per-run scheduler totals
//! - `WARN`: out-of-state feeds and settles, panicking tasks, a spent task
//!   budget
//!
//! Nothing is printed until one of the `init*` functions installs a
//! subscriber; only the first call in a process takes effect.
//!
//! # Usage
//!
//! ```rust
//! use pledge::util::{config::RuntimeConfig, logger};
//!
//! logger::init_for(&RuntimeConfig::default());
//! tracing::warn!("shown at the default level");
//! ```

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

use crate::util::config::RuntimeConfig;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Most verbose level `config` asks for: `Trace` when transitions are
    /// traced, `Warn` otherwise.
    pub fn for_config(config: &RuntimeConfig) -> Self {
        if config.trace.transitions {
            LogLevel::Trace
        } else {
            LogLevel::Warn
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Install the subscriber at INFO
pub fn init() {
    init_with_level(LogLevel::Info);
}

/// Install the `[LEVEL] message` subscriber, filtered at `level`
pub fn init_with_level(level: LogLevel) {
    let filter = tracing_subscriber::filter::LevelFilter::from_level(level.into());

    // Transcript lines go to stdout; keep log lines bare
    let layer = tracing_subscriber::fmt::layer()
        .without_time()
        .with_target(false)
        .with_level(true)
        .with_ansi(false)
        .compact()
        .with_filter(filter);

    let _ = Registry::default().with(layer).try_init();
}

/// Install the subscriber at the level `config` calls for
pub fn init_for(config: &RuntimeConfig) {
    init_with_level(LogLevel::for_config(config));
}

/// Misuse and task warnings only
pub fn init_cli() {
    init_with_level(LogLevel::Warn);
}

/// Everything, including per-transition events
pub fn init_debug() {
    init_with_level(LogLevel::Trace);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mapping() {
        assert_eq!(tracing::Level::from(LogLevel::Trace), tracing::Level::TRACE);
        assert_eq!(tracing::Level::from(LogLevel::Warn), tracing::Level::WARN);
        assert_eq!(tracing::Level::from(LogLevel::Error), tracing::Level::ERROR);
    }

    #[test]
    fn test_level_follows_trace_switch() {
        let mut config = RuntimeConfig::default();
        assert_eq!(LogLevel::for_config(&config), LogLevel::Warn);
        config.trace.transitions = true;
        assert_eq!(LogLevel::for_config(&config), LogLevel::Trace);
        assert!(LogLevel::Trace < LogLevel::Warn);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_for(&RuntimeConfig::default());
        init_debug();
        init_cli();
        tracing::trace!("still alive");
    }
}
