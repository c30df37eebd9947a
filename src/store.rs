//! Order snapshot store.
//!
//! Owns the canonical in-memory order set for the running session and
//! mirrors it to the `order_snapshot` key in the local database after
//! every mutation. The mirror is never a second source of truth: on any
//! conflict the in-memory snapshot wins and is immediately re-persisted.

use crate::db::{self, DbState};
use crate::errors::KitchenError;
use crate::model::Order;
use std::sync::Mutex;
use tracing::{info, warn};

const SNAPSHOT_KEY: &str = "order_snapshot";

pub struct SnapshotStore {
    orders: Mutex<Vec<Order>>,
}

impl SnapshotStore {
    /// Load the persisted snapshot. On absence or corruption, rebuild
    /// from the fallback source (the surrounding presentation layer's
    /// view of pending orders) and persist the rebuilt result right
    /// away. Never fails.
    pub fn load(db: &DbState, fallback: Vec<Order>) -> Self {
        let persisted = db::read_local_json(db, SNAPSHOT_KEY)
            .and_then(|v| match serde_json::from_value::<Vec<Order>>(v) {
                Ok(orders) => Some(orders),
                Err(e) => {
                    warn!(error = %e, "snapshot payload does not match schema, rebuilding");
                    None
                }
            });

        match persisted {
            Some(orders) => {
                info!(count = orders.len(), "order snapshot restored");
                SnapshotStore {
                    orders: Mutex::new(orders),
                }
            }
            None => {
                info!(count = fallback.len(), "order snapshot rebuilt from fallback");
                let store = SnapshotStore {
                    orders: Mutex::new(fallback),
                };
                store.save(db);
                store
            }
        }
    }

    /// Serialize and persist the snapshot. Best-effort: a failed write
    /// is logged and the session continues on in-memory state.
    pub fn save(&self, db: &DbState) {
        let orders = match self.orders.lock() {
            Ok(o) => o,
            Err(e) => {
                warn!(error = %e, "snapshot not persisted: lock poisoned");
                return;
            }
        };
        let value = match serde_json::to_value(&*orders) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "snapshot not persisted: serialization failed");
                return;
            }
        };
        if let Err(e) = db::write_local_json(db, SNAPSHOT_KEY, &value) {
            warn!(error = %e, "snapshot not persisted: write failed");
        }
    }

    /// Apply an in-place change to one order, then re-persist the whole
    /// snapshot synchronously before returning.
    pub fn update(
        &self,
        db: &DbState,
        order_id: &str,
        mutator: impl FnOnce(&mut Order),
    ) -> Result<(), KitchenError> {
        {
            let mut orders = self
                .orders
                .lock()
                .map_err(|e| KitchenError::Persistence(format!("snapshot lock: {e}")))?;
            let order = orders
                .iter_mut()
                .find(|o| o.id == order_id)
                .ok_or_else(|| KitchenError::NotFound(order_id.to_string()))?;
            mutator(order);
        }
        self.save(db);
        Ok(())
    }

    /// Mutate every order, then re-persist once. Used by the monitor's
    /// tick pass so N orders do not cause N writes.
    pub fn update_all(&self, db: &DbState, mut mutator: impl FnMut(&mut Order)) {
        {
            let mut orders = match self.orders.lock() {
                Ok(o) => o,
                Err(e) => {
                    warn!(error = %e, "tick skipped: snapshot lock poisoned");
                    return;
                }
            };
            for order in orders.iter_mut() {
                mutator(order);
            }
        }
        self.save(db);
    }

    /// Clone of one order, if present.
    pub fn get(&self, order_id: &str) -> Option<Order> {
        self.orders
            .lock()
            .ok()
            .and_then(|orders| orders.iter().find(|o| o.id == order_id).cloned())
    }

    /// Clone of the full order set, in insertion order.
    pub fn orders(&self) -> Vec<Order> {
        self.orders.lock().map(|o| o.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.orders.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the whole snapshot (fresh data pushed by the backend
    /// collaborator) and mirror it immediately.
    pub fn replace(&self, db: &DbState, orders: Vec<Order>) {
        if let Ok(mut current) = self.orders.lock() {
            *current = orders;
        }
        self.save(db);
    }
}
