//! Bounded event log.
//!
//! A fixed-capacity ring of timestamped entries recording device transitions,
//! rule firings and failures.  Appends are O(1), never allocate and never
//! fail: messages longer than [`MESSAGE_CAPACITY`] are truncated on a
//! character boundary and, once the ring is full, the oldest entry is
//! overwritten.  Every append is mirrored to the `log` facade so the serial
//! console shows the same history.

use core::fmt::{self, Write as _};

use heapless::HistoryBuffer;
use serde::Serialize;

/// Number of entries retained.
pub const LOG_CAPACITY: usize = 64;
/// Maximum message length in bytes.
pub const MESSAGE_CAPACITY: usize = 96;

pub type Message = heapless::String<MESSAGE_CAPACITY>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Success,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Success => "SUCCESS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub timestamp_ms: u64,
    pub level: LogLevel,
    pub message: Message,
}

/// `fmt::Write` sink that silently drops whatever no longer fits.
struct Truncating<'a>(&'a mut Message);

impl fmt::Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

pub struct EventLog {
    entries: HistoryBuffer<LogEntry, LOG_CAPACITY>,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            entries: HistoryBuffer::new(),
        }
    }

    pub fn append(&mut self, now_ms: u64, level: LogLevel, message: &str) {
        let mut msg = Message::new();
        let _ = Truncating(&mut msg).write_str(message);
        self.push(now_ms, level, msg);
    }

    /// Like [`append`](Self::append) but formats straight into the entry
    /// buffer.
    pub fn append_fmt(&mut self, now_ms: u64, level: LogLevel, args: fmt::Arguments<'_>) {
        let mut msg = Message::new();
        let _ = Truncating(&mut msg).write_fmt(args);
        self.push(now_ms, level, msg);
    }

    fn push(&mut self, timestamp_ms: u64, level: LogLevel, message: Message) {
        match level {
            LogLevel::Info => log::info!("[{}] {}", timestamp_ms, message),
            LogLevel::Success => log::info!("[{}] OK {}", timestamp_ms, message),
            LogLevel::Warn => log::warn!("[{}] {}", timestamp_ms, message),
            LogLevel::Error => log::error!("[{}] {}", timestamp_ms, message),
        }
        self.entries.write(LogEntry {
            timestamp_ms,
            level,
            message,
        });
    }

    /// All retained entries, oldest first.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.oldest_ordered().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() == 0
    }

    /// Most recent entry, if any.
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.recent()
    }

    pub fn count_level(&self, level: LogLevel) -> usize {
        self.entries.oldest_ordered().filter(|e| e.level == level).count()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}
