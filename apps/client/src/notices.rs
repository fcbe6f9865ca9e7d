//! Transient user-facing notices (the toast surface).
//!
//! The API client owes the user exactly one notice per failed call; it emits
//! them through this seam so the surface is swappable and countable in tests.

use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

pub trait NoticeSink: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);
}

/// Default sink: notices land in the structured log.
pub struct TracingNotices;

impl NoticeSink for TracingNotices {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => info!(target: "notice", "{message}"),
            NoticeLevel::Warning => warn!(target: "notice", "{message}"),
            NoticeLevel::Error => error!(target: "notice", "{message}"),
        }
    }
}

#[cfg(test)]
pub struct RecordingNotices {
    entries: std::sync::Mutex<Vec<(NoticeLevel, String)>>,
}

#[cfg(test)]
impl RecordingNotices {
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self {
            entries: std::sync::Mutex::new(Vec::new()),
        })
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries
            .lock()
            .expect("poisoned notice log")
            .iter()
            .map(|(_, m)| m.clone())
            .collect()
    }
}

#[cfg(test)]
impl NoticeSink for RecordingNotices {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.entries
            .lock()
            .expect("poisoned notice log")
            .push((level, message.to_string()));
    }
}
