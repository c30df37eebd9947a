//! Notification/alert emitter.
//!
//! The core never touches a presentation or audio runtime directly; it
//! talks to a [`Notifier`] capability injected at startup. Notifications
//! are fire-and-forget: no deduplication, no backpressure, repeated
//! identical messages produce repeated entries.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::warn;

/// How long a transient notification stays visible.
pub const NOTIFICATION_TTL_SECS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Critical,
}

/// Sound cues the presentation layer may map to actual audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// Order moved to preparing.
    Start,
    /// Order moved to ready.
    Ready,
    /// Order delivered.
    Delivered,
    /// An order crossed the critical elapsed-time threshold.
    Alarm,
    /// The offline queue finished draining.
    Synced,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Capability interface for surfacing messages, sounds, and vibration.
/// All methods are fire-and-forget.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);

    fn sound(&self, cue: SoundCue) {
        let _ = cue;
    }

    fn vibrate(&self, pattern_ms: &[u32]) {
        let _ = pattern_ms;
    }
}

/// In-memory notifier: stacks self-expiring notifications and records
/// sound cues. The default port for headless embedders and tests.
#[derive(Default)]
pub struct MemoryNotifier {
    entries: Mutex<Vec<Notification>>,
    cues: Mutex<Vec<SoundCue>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently visible notifications. Expired entries are pruned on
    /// read rather than by a background task.
    pub fn active(&self) -> Vec<Notification> {
        let now = Utc::now();
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.retain(|n| n.expires_at > now);
                entries.clone()
            }
            Err(_) => Vec::new(),
        }
    }

    /// Every sound cue played so far, in order.
    pub fn played_cues(&self) -> Vec<SoundCue> {
        self.cues.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        let now = Utc::now();
        let entry = Notification {
            message: message.to_string(),
            severity,
            created_at: now,
            expires_at: now + Duration::seconds(NOTIFICATION_TTL_SECS),
        };
        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry),
            Err(_) => warn!(message, "notification dropped: emitter lock poisoned"),
        }
    }

    fn sound(&self, cue: SoundCue) {
        if let Ok(mut cues) = self.cues.lock() {
            cues.push(cue);
        }
    }
}
