//! Last-pushed body per channel, so unchanged WRITE sections are not
//! re-sent on every tick.

use std::collections::HashMap;

/// In-memory record of what was last pushed to each channel.
///
/// Starts empty and is lost on restart; the first tick after a restart may
/// therefore re-push content that was already sent.
#[derive(Debug, Default)]
pub struct DedupTracker {
    last_pushed: HashMap<String, String>,
}

impl DedupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff `body` is non-empty and differs from what was last pushed.
    pub fn should_push(&self, channel_id: &str, body: &str) -> bool {
        !body.is_empty() && self.last_pushed.get(channel_id).map(String::as_str) != Some(body)
    }

    /// Record a confirmed push.
    pub fn record(&mut self, channel_id: &str, body: &str) {
        self.last_pushed.insert(channel_id.to_string(), body.to_string());
    }

    pub fn last_pushed(&self, channel_id: &str) -> Option<&str> {
        self.last_pushed.get(channel_id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_never_pushes() {
        let mut tracker = DedupTracker::new();
        assert!(!tracker.should_push("C1", ""));
        tracker.record("C1", "");
        assert!(!tracker.should_push("C1", ""));
    }

    #[test]
    fn missing_entry_pushes() {
        let tracker = DedupTracker::new();
        assert!(tracker.should_push("C1", "hi"));
        assert_eq!(tracker.last_pushed("C1"), None);
    }

    #[test]
    fn recorded_body_is_suppressed() {
        let mut tracker = DedupTracker::new();
        tracker.record("C1", "hi");
        assert!(!tracker.should_push("C1", "hi"));
        assert!(tracker.should_push("C1", "hi there"));
        assert!(tracker.should_push("C2", "hi"));
    }

    #[test]
    fn record_overwrites() {
        let mut tracker = DedupTracker::new();
        tracker.record("C1", "one");
        tracker.record("C1", "two");
        assert_eq!(tracker.last_pushed("C1"), Some("two"));
        assert!(tracker.should_push("C1", "one"));
    }
}
