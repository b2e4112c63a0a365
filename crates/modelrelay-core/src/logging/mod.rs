//! Logging abstractions for runtime-agnostic logging

mod traits;
mod noop;
mod console;
mod memory;
pub mod file_logger;

pub use traits::{Logger, SharedLogger};
pub use noop::NoOpLogger;
pub use console::ConsoleLogger;
pub use memory::MemoryLogger;

// Re-export file logger functions for convenience
pub use file_logger::{
    log, trace, debug, info, warn, error,
    is_enabled, log_file_path, clear_log, FileLogger, LogLevel,
};

use std::sync::Arc;

/// Selects the logging target (`console`, `file` or `off`)
pub const ENV_LOG: &str = "MODELRELAY_LOG";
/// Minimum level for the console and file targets
pub const ENV_LOG_LEVEL: &str = "MODELRELAY_LOG_LEVEL";

/// Where `default_logger()` sends records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Console(LogLevel),
    File,
    Off,
}

impl LogTarget {
    /// Pick a target from environment lookups
    ///
    /// `MODELRELAY_LOG` wins when set to a known value. Otherwise the file
    /// logger is used if `MODELRELAY_DEBUG` enabled it, else nothing.
    pub fn from_env<F>(lookup: F, file_enabled: bool) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let level = lookup(ENV_LOG_LEVEL)
            .and_then(|v| LogLevel::parse(&v))
            .unwrap_or(LogLevel::Info);

        match lookup(ENV_LOG).map(|v| v.trim().to_lowercase()).as_deref() {
            Some("console") | Some("stderr") => LogTarget::Console(level),
            Some("file") => LogTarget::File,
            Some("off") | Some("none") => LogTarget::Off,
            _ if file_enabled => LogTarget::File,
            _ => LogTarget::Off,
        }
    }

    /// Build the logger for this target
    pub fn into_logger(self) -> SharedLogger {
        match self {
            LogTarget::Console(level) => Arc::new(ConsoleLogger::new().with_min_level(level)),
            LogTarget::File => Arc::new(FileLogger::new("modelrelay")),
            LogTarget::Off => NoOpLogger::shared(),
        }
    }
}

/// Logger picked from the environment
///
/// See `LogTarget::from_env` for the precedence.
pub fn default_logger() -> SharedLogger {
    LogTarget::from_env(|key| std::env::var(key).ok(), file_logger::is_enabled()).into_logger()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn target(env: &[(&str, &str)], file_enabled: bool) -> LogTarget {
        let env: HashMap<&str, &str> = env.iter().copied().collect();
        LogTarget::from_env(|k| env.get(k).map(|v| v.to_string()), file_enabled)
    }

    #[test]
    fn test_log_target_selection() {
        assert_eq!(target(&[], false), LogTarget::Off);
        assert_eq!(target(&[], true), LogTarget::File);
        assert_eq!(target(&[(ENV_LOG, "Console")], true), LogTarget::Console(LogLevel::Info));
        assert_eq!(
            target(&[(ENV_LOG, "console"), (ENV_LOG_LEVEL, "debug")], false),
            LogTarget::Console(LogLevel::Debug)
        );
        assert_eq!(target(&[(ENV_LOG, "off")], true), LogTarget::Off);
        assert_eq!(target(&[(ENV_LOG, "syslog")], false), LogTarget::Off);
    }

    #[test]
    fn test_console_target_builds_logger() {
        let logger = LogTarget::Console(LogLevel::Warn).into_logger();
        logger.warn("visible");
        logger.debug("filtered");
    }
}
