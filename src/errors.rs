//! Error taxonomy for the kitchen board core.
//!
//! None of these are fatal to a running session: invalid transitions and
//! unknown orders are rejected and logged, persistence failures degrade
//! to in-memory-only operation, and replay failures skip to the next
//! queued action.

use crate::lifecycle::OrderAction;
use crate::model::OrderStatus;

#[derive(Debug, thiserror::Error)]
pub enum KitchenError {
    /// The action's precondition does not match the order's current
    /// status. State is left untouched.
    #[error("invalid transition: cannot {action:?} an order that is {status:?}")]
    InvalidTransition {
        status: OrderStatus,
        action: OrderAction,
    },

    /// The referenced order no longer exists in the snapshot (stale UI
    /// reference). The action is aborted.
    #[error("order not found: {0}")]
    NotFound(String),

    /// The durable-storage write failed. The session continues with
    /// in-memory state only.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// A queued action failed to apply during the reconnect drain. The
    /// drain continues; the action is dropped afterwards.
    #[error("replay failed for order {order_id}: {reason}")]
    Replay { order_id: String, reason: String },
}
