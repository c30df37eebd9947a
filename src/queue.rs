//! Offline action queue.
//!
//! Lifecycle actions taken while disconnected are persisted, applied
//! optimistically to the display, and replayed in enqueue order once
//! connectivity returns. The replay is best-effort: an individual
//! failure is logged and skipped, and the action is dropped after the
//! drain. Duplicate application on a crash mid-replay is a known,
//! accepted risk (no idempotency key is tracked).

use crate::db::{self, DbState};
use crate::errors::KitchenError;
use crate::lifecycle::{self, OrderAction};
use crate::model::PendingAction;
use crate::notify::{Severity, SoundCue};
use crate::KitchenPanel;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, warn};

const QUEUE_KEY: &str = "pending_actions";

/// Gap between replayed actions so a burst of queued work does not
/// flood the backend at once.
pub const REPLAY_STAGGER: Duration = Duration::from_millis(400);

/// Remote submit endpoint for status-changing actions. The wire shape
/// is owned by the backend collaborator; the core only sees
/// success/failure.
pub trait RemoteEndpoint: Send + Sync {
    fn submit(&self, order_id: &str, action: OrderAction) -> Result<(), String>;
}

/// Default port: accepts everything. Embedders without a backend (demo
/// mode) run on this.
pub struct NoopRemote;

impl RemoteEndpoint for NoopRemote {
    fn submit(&self, _order_id: &str, _action: OrderAction) -> Result<(), String> {
        Ok(())
    }
}

/// Recording port for tests and dry runs: remembers every submission
/// and can be told to fail.
#[derive(Default)]
pub struct RecordingRemote {
    pub submitted: Mutex<Vec<(String, OrderAction)>>,
    pub fail_for: Mutex<Vec<String>>,
}

impl RemoteEndpoint for RecordingRemote {
    fn submit(&self, order_id: &str, action: OrderAction) -> Result<(), String> {
        if let Ok(fail_for) = self.fail_for.lock() {
            if fail_for.iter().any(|id| id == order_id) {
                return Err(format!("backend rejected order {order_id}"));
            }
        }
        if let Ok(mut submitted) = self.submitted.lock() {
            submitted.push((order_id.to_string(), action));
        }
        Ok(())
    }
}

/// The persisted queue of offline intents, in enqueue order.
pub struct OfflineQueue {
    actions: Mutex<Vec<PendingAction>>,
}

impl OfflineQueue {
    /// Restore the queue from the database; absent or corrupt payloads
    /// start empty.
    pub fn load(db: &DbState) -> Self {
        let actions = db::read_local_json(db, QUEUE_KEY)
            .and_then(|v| serde_json::from_value::<Vec<PendingAction>>(v).ok())
            .unwrap_or_default();
        if !actions.is_empty() {
            info!(count = actions.len(), "restored pending offline actions");
        }
        OfflineQueue {
            actions: Mutex::new(actions),
        }
    }

    /// Persist the queue. Called after every enqueue and after a drain
    /// so a reload or crash never loses pending actions.
    fn persist(&self, db: &DbState) {
        let actions = match self.actions.lock() {
            Ok(a) => a.clone(),
            Err(_) => return,
        };
        match serde_json::to_value(&actions) {
            Ok(value) => {
                if let Err(e) = db::write_local_json(db, QUEUE_KEY, &value) {
                    warn!(error = %e, "pending-action queue not persisted");
                }
            }
            Err(e) => warn!(error = %e, "pending-action queue serialization failed"),
        }
    }

    fn push(&self, db: &DbState, action: PendingAction) {
        if let Ok(mut actions) = self.actions.lock() {
            actions.push(action);
        }
        self.persist(db);
    }

    /// Snapshot of the queue contents, in enqueue order.
    pub fn pending(&self) -> Vec<PendingAction> {
        self.actions.lock().map(|a| a.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.actions.lock().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&self, db: &DbState) {
        if let Ok(mut actions) = self.actions.lock() {
            actions.clear();
        }
        self.persist(db);
    }
}

/// Entry point for user-triggered lifecycle actions.
///
/// Online, this is a straight delegate to the state machine plus a
/// best-effort remote submit. Offline, the intent is queued and an
/// optimistic effect is applied without running the state-machine
/// guard; the user is told the action is queued, never rejected.
pub fn dispatch(
    panel: &KitchenPanel,
    order_id: &str,
    action: OrderAction,
) -> Result<(), KitchenError> {
    if !panel.is_offline() {
        lifecycle::apply_action(panel, order_id, action)?;
        if let Err(e) = panel.remote.submit(order_id, action) {
            // Local state already moved; the backend catches up on the
            // next snapshot push.
            warn!(order_id, ?action, error = %e, "remote submit failed, keeping local state");
        }
        return Ok(());
    }

    // Optimistic effect: display label advances, order marked pending
    // sync. The real guard runs at replay time.
    panel.store.update(&panel.db, order_id, |order| {
        order.optimistic_status = Some(action.target_status());
        order.pending_sync = true;
    })?;

    panel
        .queue
        .push(&panel.db, PendingAction::new(order_id, action));
    info!(
        order_id,
        ?action,
        queued = panel.queue.len(),
        "offline: action queued for sync"
    );
    panel.notifier.notify(
        "Offline: action saved, will sync when back online",
        Severity::Info,
    );
    Ok(())
}

/// Replay every queued action in enqueue order, spaced by
/// [`REPLAY_STAGGER`]. Individual failures are logged and skipped; the
/// queue is cleared and persisted after the full drain.
pub async fn drain(panel: &KitchenPanel) {
    let pending = panel.queue.pending();
    if pending.is_empty() {
        return;
    }
    info!(count = pending.len(), "draining offline action queue");

    let mut replayed = 0usize;
    let mut failed = 0usize;
    for (i, entry) in pending.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(REPLAY_STAGGER).await;
        }
        match replay_one(panel, entry) {
            Ok(()) => replayed += 1,
            Err(e) => {
                failed += 1;
                warn!(
                    order_id = %entry.order_id,
                    action = ?entry.action,
                    error = %e,
                    "replay failed, action dropped"
                );
                // Revert the optimistic marker so the display falls back
                // to the authoritative status.
                let _ = panel.store.update(&panel.db, &entry.order_id, |order| {
                    order.optimistic_status = None;
                    order.pending_sync = false;
                });
            }
        }
    }

    panel.queue.clear(&panel.db);
    info!(replayed, failed, "offline queue drained");
    panel
        .notifier
        .notify("All queued actions synced", Severity::Success);
    if panel.sound_enabled() {
        panel.notifier.sound(SoundCue::Synced);
    }
}

fn replay_one(panel: &KitchenPanel, entry: &PendingAction) -> Result<(), KitchenError> {
    lifecycle::apply_action(panel, &entry.order_id, entry.action).map_err(|e| {
        KitchenError::Replay {
            order_id: entry.order_id.clone(),
            reason: e.to_string(),
        }
    })?;
    panel
        .remote
        .submit(&entry.order_id, entry.action)
        .map_err(|reason| KitchenError::Replay {
            order_id: entry.order_id.clone(),
            reason,
        })
}

/// Connectivity-restored handler: flip the flag, then drain.
pub async fn on_reconnect(panel: &KitchenPanel) {
    panel.set_online();
    drain(panel).await;
}
