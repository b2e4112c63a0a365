//! Stderr logger for CLIs and local development

use super::file_logger::LogLevel;
use super::traits::Logger;

/// Writes `[ModelRelay] LEVEL: message` lines to stderr
///
/// stdout belongs to the embedding app, so nothing is printed there.
/// Records below `min_level` are dropped.
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    prefix: String,
    min_level: LogLevel,
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleLogger {
    /// Console logger showing info and above
    pub fn new() -> Self {
        Self {
            prefix: "[ModelRelay]".to_string(),
            min_level: LogLevel::Info,
        }
    }

    /// Use a different line prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Drop records below `level`
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Check if a record at `level` would be written
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    fn format(&self, level: LogLevel, message: &str) -> Option<String> {
        self.enabled(level)
            .then(|| format!("{} {}: {}", self.prefix, level.to_string().trim_end(), message))
    }

    fn emit(&self, level: LogLevel, message: &str) {
        if let Some(line) = self.format(level, message) {
            eprintln!("{}", line);
        }
    }
}

impl Logger for ConsoleLogger {
    fn debug(&self, message: &str) {
        self.emit(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.emit(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.emit(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.emit(LogLevel::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filtering() {
        let logger = ConsoleLogger::new();
        assert!(!logger.enabled(LogLevel::Debug));
        assert!(logger.enabled(LogLevel::Info));
        assert!(logger.enabled(LogLevel::Error));

        let verbose = ConsoleLogger::new().with_min_level(LogLevel::Debug);
        assert!(verbose.enabled(LogLevel::Debug));
    }

    #[test]
    fn test_line_format() {
        let logger = ConsoleLogger::new().with_prefix("[Chat]");
        assert_eq!(
            logger.format(LogLevel::Warn, "skipping malformed line").as_deref(),
            Some("[Chat] WARN: skipping malformed line")
        );
        assert_eq!(logger.format(LogLevel::Debug, "hidden"), None);
    }
}
