//! Display preferences: loaded at startup, persisted on every change.
//!
//! Stored as individual scalars in `local_settings` under the
//! `preferences` category, so a partial write can never corrupt the
//! whole set.

use crate::db::{self, DbState};
use tracing::warn;

pub const DEFAULT_ALERT_MINUTES: u32 = 20;
pub const DEFAULT_CRITICAL_MINUTES: u32 = 40;

#[derive(Debug, Clone, PartialEq)]
pub struct Preferences {
    /// Minutes after which a pending/preparing order is flagged warning.
    pub alert_minutes: u32,
    /// Minutes after which it is flagged critical (alarm sound fires).
    pub critical_minutes: u32,
    pub sound_enabled: bool,
    pub theme: String,
    pub compact_view: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            alert_minutes: DEFAULT_ALERT_MINUTES,
            critical_minutes: DEFAULT_CRITICAL_MINUTES,
            sound_enabled: true,
            theme: "dark".to_string(),
            compact_view: false,
        }
    }
}

impl Preferences {
    /// Read preferences from the database, falling back to defaults for
    /// any absent or unparseable value.
    pub fn load(db: &DbState) -> Self {
        let defaults = Preferences::default();
        let conn = match db.conn.lock() {
            Ok(c) => c,
            Err(_) => return defaults,
        };
        let read_u32 = |key: &str, fallback: u32| {
            db::get_setting(&conn, "preferences", key)
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(fallback)
        };
        let read_bool = |key: &str, fallback: bool| {
            db::get_setting(&conn, "preferences", key)
                .map(|v| v == "true" || v == "1")
                .unwrap_or(fallback)
        };
        Preferences {
            alert_minutes: read_u32("alert_minutes", defaults.alert_minutes),
            critical_minutes: read_u32("critical_minutes", defaults.critical_minutes),
            sound_enabled: read_bool("sound_enabled", defaults.sound_enabled),
            theme: db::get_setting(&conn, "preferences", "theme").unwrap_or(defaults.theme),
            compact_view: read_bool("compact_view", defaults.compact_view),
        }
    }

    /// Persist every scalar. Best-effort: a failed write is logged and
    /// the in-memory values stay authoritative.
    pub fn save(&self, db: &DbState) {
        let conn = match db.conn.lock() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "preferences not persisted: database lock poisoned");
                return;
            }
        };
        let pairs: [(&str, String); 5] = [
            ("alert_minutes", self.alert_minutes.to_string()),
            ("critical_minutes", self.critical_minutes.to_string()),
            ("sound_enabled", self.sound_enabled.to_string()),
            ("theme", self.theme.clone()),
            ("compact_view", self.compact_view.to_string()),
        ];
        for (key, value) in pairs {
            if let Err(e) = db::set_setting(&conn, "preferences", key, &value) {
                warn!(key, error = %e, "preference write failed");
            }
        }
    }

    pub fn set_alert_minutes(&mut self, db: &DbState, minutes: u32) {
        self.alert_minutes = minutes;
        self.save(db);
    }

    pub fn set_critical_minutes(&mut self, db: &DbState, minutes: u32) {
        self.critical_minutes = minutes;
        self.save(db);
    }

    pub fn set_sound_enabled(&mut self, db: &DbState, enabled: bool) {
        self.sound_enabled = enabled;
        self.save(db);
    }

    pub fn set_theme(&mut self, db: &DbState, theme: &str) {
        self.theme = theme.to_string();
        self.save(db);
    }

    pub fn set_compact_view(&mut self, db: &DbState, compact: bool) {
        self.compact_view = compact;
        self.save(db);
    }
}
