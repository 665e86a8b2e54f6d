//! Notification sink (toasts). Every notice is also logged.
use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);

    fn success(&self, message: String) {
        self.notify(Notice {
            level: NoticeLevel::Success,
            message,
            at: Utc::now(),
        });
    }

    fn error(&self, message: String) {
        self.notify(Notice {
            level: NoticeLevel::Error,
            message,
            at: Utc::now(),
        });
    }
}

/// Keeps the last `capacity` notices for the UI to poll.
#[derive(Debug)]
pub struct RecordingNotifier {
    capacity: usize,
    notices: Mutex<VecDeque<Notice>>,
}

impl RecordingNotifier {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            notices: Mutex::new(VecDeque::new()),
        }
    }

    /// Oldest first.
    pub fn recent(&self) -> Vec<Notice> {
        let notices = self.notices.lock().unwrap_or_else(|e| e.into_inner());
        notices.iter().cloned().collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => tracing::info!(notice = %notice.message, "success"),
            NoticeLevel::Error => tracing::warn!(notice = %notice.message, "error"),
        }

        let mut notices = self.notices.lock().unwrap_or_else(|e| e.into_inner());
        if notices.len() == self.capacity {
            notices.pop_front();
        }
        notices.push_back(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_latest_notices() {
        let sink = RecordingNotifier::new(2);
        sink.error("one".into());
        sink.success("two".into());
        sink.error("three".into());

        let recent = sink.recent();
        let messages: Vec<_> = recent.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, ["two", "three"]);
        assert_eq!(recent[1].level, NoticeLevel::Error);
    }
}
