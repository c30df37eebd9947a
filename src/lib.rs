//! Kitchen board core.
//!
//! Layout-agnostic heart of the kitchen display: the order lifecycle
//! state machine, the elapsed-time monitor, the filter/sort engine, and
//! the offline action queue, all working over one persisted order
//! snapshot. Presentation variants (list view, kanban columns) are thin
//! read-only projections over [`KitchenPanel`]; the core reaches the
//! outside world only through the [`notify::Notifier`] and
//! [`queue::RemoteEndpoint`] capability ports.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod db;
pub mod errors;
pub mod filters;
pub mod lifecycle;
pub mod model;
pub mod monitor;
pub mod notify;
pub mod prefs;
pub mod queue;
pub mod store;

pub use errors::KitchenError;
pub use filters::{visible_orders, FilterCriteria, SortKey, StatusFilter};
pub use lifecycle::{apply_action, OrderAction};
pub use model::{AlertLevel, Order, OrderItem, OrderStatus, OrderType, PendingAction, Priority};
pub use notify::{MemoryNotifier, Notifier, Severity, SoundCue};
pub use prefs::Preferences;
pub use queue::{dispatch, on_reconnect, NoopRemote, RemoteEndpoint};
pub use store::SnapshotStore;

/// Initialize structured console logging. Embedders that install their
/// own subscriber skip this.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kitchen_board=debug"));
    let console_layer = fmt::layer().with_target(true);
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init();
}

/// Session context for one running board: the snapshot, the pending
/// queue, the preferences, the connectivity flag, and the injected
/// ports. Everything a component needs is reached through this struct;
/// there is no process-global state.
pub struct KitchenPanel {
    pub db: db::DbState,
    pub store: store::SnapshotStore,
    pub queue: queue::OfflineQueue,
    pub prefs: Mutex<prefs::Preferences>,
    pub notifier: Arc<dyn notify::Notifier>,
    pub remote: Arc<dyn queue::RemoteEndpoint>,
    offline: AtomicBool,
    pub(crate) monitor_running: AtomicBool,
}

impl KitchenPanel {
    /// Open a board backed by the database at `data_dir`. Restores the
    /// snapshot (or rebuilds it from `fallback_orders`), the pending
    /// queue, and the preferences.
    pub fn open(
        data_dir: &Path,
        fallback_orders: Vec<model::Order>,
        notifier: Arc<dyn notify::Notifier>,
        remote: Arc<dyn queue::RemoteEndpoint>,
    ) -> Result<Self, KitchenError> {
        let db = db::init(data_dir).map_err(KitchenError::Persistence)?;
        Ok(Self::with_db(db, fallback_orders, notifier, remote))
    }

    /// Open a volatile board on an in-memory database (demo mode).
    pub fn open_in_memory(
        fallback_orders: Vec<model::Order>,
        notifier: Arc<dyn notify::Notifier>,
        remote: Arc<dyn queue::RemoteEndpoint>,
    ) -> Result<Self, KitchenError> {
        let db = db::init_in_memory().map_err(KitchenError::Persistence)?;
        Ok(Self::with_db(db, fallback_orders, notifier, remote))
    }

    fn with_db(
        db: db::DbState,
        fallback_orders: Vec<model::Order>,
        notifier: Arc<dyn notify::Notifier>,
        remote: Arc<dyn queue::RemoteEndpoint>,
    ) -> Self {
        let store = store::SnapshotStore::load(&db, fallback_orders);
        let pending = queue::OfflineQueue::load(&db);
        let preferences = prefs::Preferences::load(&db);
        info!(
            orders = store.len(),
            queued = pending.len(),
            "kitchen panel ready"
        );
        KitchenPanel {
            db,
            store,
            queue: pending,
            prefs: Mutex::new(preferences),
            notifier,
            remote,
            offline: AtomicBool::new(false),
            monitor_running: AtomicBool::new(false),
        }
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    /// Connectivity-lost signal from the environment.
    pub fn set_offline(&self) {
        if !self.offline.swap(true, Ordering::SeqCst) {
            info!("connectivity lost; lifecycle actions will be queued");
        }
    }

    /// Connectivity-restored signal. The caller is expected to follow
    /// with [`queue::drain`] (or use [`queue::on_reconnect`]).
    pub fn set_online(&self) {
        if self.offline.swap(false, Ordering::SeqCst) {
            info!("connectivity restored");
        }
    }

    pub(crate) fn sound_enabled(&self) -> bool {
        self.prefs.lock().map(|p| p.sound_enabled).unwrap_or(false)
    }

    /// The orders currently visible under `criteria`, in display order.
    pub fn visible_orders(&self, criteria: &filters::FilterCriteria) -> Vec<model::Order> {
        filters::visible_orders(&self.store.orders(), criteria)
    }
}

// ===========================================================================
// Test support
// ===========================================================================


// ===========================================================================
// Scenario tests
// ===========================================================================
