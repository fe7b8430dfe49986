//! Time and Logging Abstractions
//!
//! Injectable time source for session timestamps, and a sink that mirrors the
//! core's structured logs into the host logging pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::Result;

/// Time source trait
///
/// Abstracts wall-clock time so session timestamps are deterministic in tests.
pub trait Clock: Send + Sync {
    /// Get current UTC time
    fn now(&self) -> DateTime<Utc>;

    /// Get current Unix timestamp in milliseconds
    fn unix_timestamp_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// System clock implementation using actual system time
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Structured log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
    /// Target module/component
    pub target: String,
    pub message: String,
    pub fields: HashMap<String, String>,
    /// Name of the innermost span, if any
    pub span_id: Option<String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            target: target.into(),
            message: message.into(),
            fields: HashMap::new(),
            span_id: None,
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_span_id(mut self, span_id: impl Into<String>) -> Self {
        self.span_id = Some(span_id.into());
        self
    }
}

/// Logger sink trait
///
/// Forwards structured logs from the core to host logging pipelines:
/// - **Android**: Logcat, under the host's tag
/// - **iOS**: OSLog
/// - **Desktop**: Console or file logs
#[async_trait::async_trait]
pub trait LoggerSink: Send + Sync {
    /// Forward a log entry to the host logging system
    async fn log(&self, entry: LogEntry) -> Result<()>;

    /// Flush any buffered logs
    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Logs below this level are dropped before reaching the sink.
    fn min_level(&self) -> LogLevel {
        LogLevel::Info
    }
}

/// Console logger that prints entries in a logcat-like layout.
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    pub tag: String,
    pub min_level: LogLevel,
}

impl ConsoleLogger {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            min_level: LogLevel::Info,
        }
    }

    pub fn format(&self, entry: &LogEntry) -> String {
        let mut line = format!(
            "{} {}/{}: [{}] {}",
            entry.timestamp.format("%m-%d %H:%M:%S%.3f"),
            &entry.level.as_str()[..1],
            self.tag,
            entry.target,
            entry.message
        );
        if !entry.fields.is_empty() {
            let mut keys: Vec<_> = entry.fields.keys().collect();
            keys.sort();
            for key in keys {
                line.push_str(&format!(" {}={}", key, entry.fields[key]));
            }
        }
        line
    }
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new("NativeAudio")
    }
}

#[async_trait::async_trait]
impl LoggerSink for ConsoleLogger {
    async fn log(&self, entry: LogEntry) -> Result<()> {
        if entry.level >= self.min_level {
            println!("{}", self.format(&entry));
        }
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        self.min_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock() {
        let clock = SystemClock;
        assert!(clock.unix_timestamp_millis() > 0);
    }

    #[test]
    fn test_log_entry_builder() {
        let entry = LogEntry::new(LogLevel::Info, "core_playback", "play")
            .with_field("asset", "unit1.mp3")
            .with_span_id("controller");

        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.target, "core_playback");
        assert_eq!(entry.fields.get("asset"), Some(&"unit1.mp3".to_string()));
        assert_eq!(entry.span_id, Some("controller".to_string()));
    }

    #[test]
    fn test_console_format_is_logcat_like() {
        let logger = ConsoleLogger::new("NativeAudioBridge");
        let entry = LogEntry::new(LogLevel::Warn, "core_playback", "Failed to play")
            .with_field("code", "-38");
        let line = logger.format(&entry);
        assert!(line.contains("W/NativeAudioBridge: [core_playback] Failed to play"));
        assert!(line.ends_with("code=-38"));
    }

    #[tokio::test]
    async fn test_console_logger() {
        let logger = ConsoleLogger::default();
        let entry = LogEntry::new(LogLevel::Info, "test", "Test log");

        logger.log(entry).await.unwrap();
    }
}
