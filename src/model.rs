//! Core data model for the kitchen board.
//!
//! An [`Order`] carries both the authoritative lifecycle state and the
//! presentation state the board derives from it (alert level, progress
//! percentage, pending-sync marker). The whole order set is mirrored to
//! the local database as one JSON snapshot; see `store`.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Lifecycle status. Strictly linear: pending -> preparing -> ready ->
/// delivered, with `delivered` terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Delivered,
}

impl OrderStatus {
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    DineIn,
    Takeout,
    Delivery,
}

/// Kitchen priority. `rank` gives the sort order used by the priority
/// comparator: high before normal before low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Normal,
    Low,
}

impl Priority {
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Normal => 1,
            Priority::Low => 2,
        }
    }
}

/// Visual urgency flag maintained by the elapsed-time monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    #[default]
    None,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Positive count or a quantity label ("2", "1/2 portion").
    pub quantity: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Stable identifier, assigned externally. Never mutated.
    pub id: String,
    pub order_type: OrderType,
    #[serde(default)]
    pub priority: Priority,
    /// Table/location label; present only for dine-in orders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_label: Option<String>,
    /// Insertion order preserved for display. Empty is tolerated.
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: OrderStatus,
    /// Monotonically non-decreasing while not delivered; frozen after.
    /// Only the elapsed-time monitor mutates this.
    #[serde(default)]
    pub elapsed_minutes: u32,
    /// RFC 3339, set once at creation.
    pub received_at: String,
    #[serde(default)]
    pub alert_level: AlertLevel,
    /// Dedup latches so threshold notifications fire once per order even
    /// when a tick is skipped (level trigger, not edge trigger).
    #[serde(default)]
    pub alert_notified: bool,
    #[serde(default)]
    pub critical_notified: bool,
    /// Progress indicator for preparing orders, 0-98.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_percent: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<String>,
    /// Optimistic display status applied while an action sits in the
    /// offline queue. Cleared when the real transition replays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimistic_status: Option<OrderStatus>,
    #[serde(default)]
    pub pending_sync: bool,
}

impl Order {
    /// Minimal constructor for orders arriving from the backend snapshot.
    pub fn new(id: impl Into<String>, order_type: OrderType) -> Self {
        Order {
            id: id.into(),
            order_type,
            priority: Priority::Normal,
            table_label: None,
            items: Vec::new(),
            notes: None,
            status: OrderStatus::Pending,
            elapsed_minutes: 0,
            received_at: Utc::now().to_rfc3339(),
            alert_level: AlertLevel::None,
            alert_notified: false,
            critical_notified: false,
            progress_percent: None,
            delivered_at: None,
            optimistic_status: None,
            pending_sync: false,
        }
    }

    /// What the board shows: the optimistic status while an offline
    /// action is queued, the real status otherwise.
    pub fn display_status(&self) -> OrderStatus {
        self.optimistic_status.unwrap_or(self.status)
    }

    /// Short display label like "#42 · Table 07".
    pub fn display_label(&self) -> String {
        match &self.table_label {
            Some(table) => format!("#{} · Table {}", self.id, table),
            None => format!("#{}", self.id),
        }
    }
}

/// A queued offline intent, persisted so a reload while disconnected
/// does not lose user actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    pub id: String,
    pub order_id: String,
    pub action: crate::lifecycle::OrderAction,
    pub enqueued_at: String,
}

impl PendingAction {
    pub fn new(order_id: &str, action: crate::lifecycle::OrderAction) -> Self {
        PendingAction {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            action,
            enqueued_at: Utc::now().to_rfc3339(),
        }
    }
}
