//! Order lifecycle state machine.
//!
//! Transitions are strictly forward, one step at a time:
//! pending -> preparing -> ready -> delivered. `apply_action` is
//! deliberately not idempotent: repeating an action on an
//! already-transitioned order fails with `InvalidTransition` rather
//! than silently no-opping, so callers must check state first or handle
//! the error.

use crate::errors::KitchenError;
use crate::model::{AlertLevel, OrderStatus};
use crate::notify::{Severity, SoundCue};
use crate::KitchenPanel;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Progress shown the moment an order starts preparing. The monitor
/// takes over on subsequent ticks.
pub const START_PROGRESS_PERCENT: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderAction {
    Start,
    Complete,
    Deliver,
}

impl OrderAction {
    /// The status an order must currently hold for this action.
    pub fn required_status(&self) -> OrderStatus {
        match self {
            OrderAction::Start => OrderStatus::Pending,
            OrderAction::Complete => OrderStatus::Preparing,
            OrderAction::Deliver => OrderStatus::Ready,
        }
    }

    /// The status the action moves the order to.
    pub fn target_status(&self) -> OrderStatus {
        match self {
            OrderAction::Start => OrderStatus::Preparing,
            OrderAction::Complete => OrderStatus::Ready,
            OrderAction::Deliver => OrderStatus::Delivered,
        }
    }

    pub fn sound_cue(&self) -> SoundCue {
        match self {
            OrderAction::Start => SoundCue::Start,
            OrderAction::Complete => SoundCue::Ready,
            OrderAction::Deliver => SoundCue::Delivered,
        }
    }

    fn past_label(&self) -> &'static str {
        match self {
            OrderAction::Start => "is now preparing",
            OrderAction::Complete => "is ready",
            OrderAction::Deliver => "was delivered",
        }
    }
}

/// Validate and apply one lifecycle transition.
///
/// On success the order's status advances, the action's side effects are
/// applied (progress indicator, delivery timestamp), the snapshot is
/// persisted, and a success notification with an action-specific sound
/// cue is emitted. On failure nothing changes.
pub fn apply_action(
    panel: &KitchenPanel,
    order_id: &str,
    action: OrderAction,
) -> Result<(), KitchenError> {
    let current = panel.store.get(order_id).ok_or_else(|| {
        warn!(order_id, ?action, "action aborted: order not in snapshot");
        KitchenError::NotFound(order_id.to_string())
    })?;

    if current.status != action.required_status() {
        warn!(
            order_id,
            ?action,
            status = current.status.label(),
            "rejected invalid transition"
        );
        return Err(KitchenError::InvalidTransition {
            status: current.status,
            action,
        });
    }

    panel.store.update(&panel.db, order_id, |order| {
        order.status = action.target_status();
        order.optimistic_status = None;
        order.pending_sync = false;
        match action {
            OrderAction::Start => {
                order.progress_percent = Some(START_PROGRESS_PERCENT);
            }
            OrderAction::Complete => {
                // The progress bar is replaced by the "ready" indicator;
                // ready staleness is tracked fresh by the monitor.
                order.progress_percent = None;
                order.alert_level = AlertLevel::None;
            }
            OrderAction::Deliver => {
                order.delivered_at = Some(Utc::now().to_rfc3339());
                order.progress_percent = None;
                order.alert_level = AlertLevel::None;
            }
        }
    })?;

    info!(order_id, ?action, "order transition applied");
    panel.notifier.notify(
        &format!("Order {} {}", current.display_label(), action.past_label()),
        Severity::Success,
    );
    if panel.sound_enabled() {
        panel.notifier.sound(action.sound_cue());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Order, OrderType};
    use crate::test_support::panel_with;

    fn pending_order(id: &str) -> Order {
        Order::new(id, OrderType::DineIn)
    }

    #[test]
    fn full_lifecycle_moves_one_step_per_action() {
        let (panel, _, _) = panel_with(vec![pending_order("42")]);

        apply_action(&panel, "42", OrderAction::Start).unwrap();
        assert_eq!(panel.store.get("42").unwrap().status, OrderStatus::Preparing);

        apply_action(&panel, "42", OrderAction::Complete).unwrap();
        assert_eq!(panel.store.get("42").unwrap().status, OrderStatus::Ready);

        apply_action(&panel, "42", OrderAction::Deliver).unwrap();
        let order = panel.store.get("42").unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
        assert!(order.delivered_at.is_some());
        assert!(order.progress_percent.is_none());
    }

    #[test]
    fn deliver_on_pending_fails_and_leaves_state_unchanged() {
        let (panel, _, _) = panel_with(vec![pending_order("7")]);

        let err = apply_action(&panel, "7", OrderAction::Deliver).unwrap_err();
        assert!(matches!(
            err,
            KitchenError::InvalidTransition {
                status: OrderStatus::Pending,
                action: OrderAction::Deliver,
            }
        ));
        assert_eq!(panel.store.get("7").unwrap().status, OrderStatus::Pending);
    }

    #[test]
    fn repeating_an_action_is_rejected_not_noop() {
        let (panel, _, _) = panel_with(vec![pending_order("7")]);
        apply_action(&panel, "7", OrderAction::Start).unwrap();
        let err = apply_action(&panel, "7", OrderAction::Start).unwrap_err();
        assert!(matches!(err, KitchenError::InvalidTransition { .. }));
        assert_eq!(panel.store.get("7").unwrap().status, OrderStatus::Preparing);
    }

    #[test]
    fn unknown_order_is_not_found() {
        let (panel, _, _) = panel_with(vec![]);
        let err = apply_action(&panel, "missing", OrderAction::Start).unwrap_err();
        assert!(matches!(err, KitchenError::NotFound(_)));
    }

    #[test]
    fn start_attaches_progress_indicator() {
        let (panel, _, _) = panel_with(vec![pending_order("42")]);
        apply_action(&panel, "42", OrderAction::Start).unwrap();
        assert_eq!(
            panel.store.get("42").unwrap().progress_percent,
            Some(START_PROGRESS_PERCENT)
        );
    }

    #[test]
    fn success_emits_notification_and_action_sound() {
        let (panel, notifier, _) = panel_with(vec![pending_order("42")]);
        apply_action(&panel, "42", OrderAction::Start).unwrap();
        let active = notifier.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].severity, Severity::Success);
        assert_eq!(notifier.played_cues(), vec![SoundCue::Start]);
    }

    #[test]
    fn sound_is_suppressed_when_disabled() {
        let (panel, notifier, _) = panel_with(vec![pending_order("42")]);
        panel.prefs.lock().unwrap().set_sound_enabled(&panel.db, false);
        apply_action(&panel, "42", OrderAction::Start).unwrap();
        assert_eq!(notifier.active().len(), 1);
        assert!(notifier.played_cues().is_empty());
    }

    #[test]
    fn transition_persists_the_snapshot() {
        let (panel, _, _) = panel_with(vec![pending_order("42")]);
        apply_action(&panel, "42", OrderAction::Start).unwrap();

        let restored = crate::store::SnapshotStore::load(&panel.db, Vec::new());
        assert_eq!(restored.get("42").unwrap().status, OrderStatus::Preparing);
    }
}
