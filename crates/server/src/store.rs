//! Call session store
//!
//! Exclusively owns every `CallSession`. Sessions are created lazily on
//! first use, serialized per call through an async mutex, and — once a call
//! ends — kept addressable for a grace window as tombstones before removal.
//! Expired tombstones are dropped lazily on lookup and by a periodic sweep.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;

use call_agent_core::{CallSession, Clock};

/// Shared handle to one call's session.
///
/// The async mutex is the per-call serialization point: turns for the same
/// call queue here in arrival order while other calls proceed independently.
pub struct CallHandle {
    session: tokio::sync::Mutex<CallSession>,
    /// Tombstone expiry, set once the call has ended
    expires_at: Mutex<Option<DateTime<Utc>>>,
}

impl CallHandle {
    fn new(session: CallSession) -> Self {
        Self {
            session: tokio::sync::Mutex::new(session),
            expires_at: Mutex::new(None),
        }
    }

    /// Acquire the session for the duration of one turn
    pub async fn lock(&self) -> tokio::sync::MutexGuard<'_, CallSession> {
        self.session.lock().await
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(*self.expires_at.lock(), Some(expiry) if now >= expiry)
    }
}

/// In-memory mapping from call id to session
pub struct CallStore {
    calls: RwLock<HashMap<String, Arc<CallHandle>>>,
    clock: Arc<dyn Clock>,
    grace: Duration,
}

impl CallStore {
    /// Create a store whose ended calls linger for `grace_secs`
    pub fn new(clock: Arc<dyn Clock>, grace_secs: u64) -> Self {
        Self {
            calls: RwLock::new(HashMap::new()),
            clock,
            grace: Duration::seconds(grace_secs as i64),
        }
    }

    /// Return the session for `call_id`, creating one for an unseen id.
    /// The bool is true when a new session was created. An entry whose grace
    /// window has lapsed counts as unseen.
    pub fn resolve(&self, call_id: &str) -> (Arc<CallHandle>, bool) {
        let now = self.clock.now();
        let mut calls = self.calls.write();

        if let Some(handle) = calls.get(call_id) {
            if !handle.is_expired(now) {
                return (handle.clone(), false);
            }
            calls.remove(call_id);
        }

        let handle = Arc::new(CallHandle::new(CallSession::new(call_id, now)));
        calls.insert(call_id.to_string(), handle.clone());
        (handle, true)
    }

    /// Look up an existing session without creating one
    pub fn get(&self, call_id: &str) -> Option<Arc<CallHandle>> {
        let now = self.clock.now();
        let mut calls = self.calls.write();

        match calls.get(call_id) {
            Some(handle) if handle.is_expired(now) => {
                calls.remove(call_id);
                None
            }
            Some(handle) => Some(handle.clone()),
            None => None,
        }
    }

    /// Start the grace countdown for an ended call
    pub fn schedule_removal(&self, call_id: &str) {
        let expiry = self.clock.now() + self.grace;
        if let Some(handle) = self.calls.read().get(call_id) {
            *handle.expires_at.lock() = Some(expiry);
            tracing::debug!(%call_id, "scheduled removal after grace window");
        }
    }

    /// Remove an entry outright
    pub fn remove(&self, call_id: &str) {
        if self.calls.write().remove(call_id).is_some() {
            tracing::info!(%call_id, "removed call from store");
        }
    }

    /// Number of stored sessions, after purging lapsed tombstones
    pub fn count(&self) -> usize {
        self.purge_expired();
        self.calls.read().len()
    }

    /// Drop every entry whose grace window has lapsed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut calls = self.calls.write();
        let before = calls.len();
        calls.retain(|_, handle| !handle.is_expired(now));
        before - calls.len()
    }

    /// Spawn a periodic sweep of expired tombstones.
    ///
    /// Returns a shutdown sender; send `true` to stop the task.
    pub fn start_sweep_task(self: &Arc<Self>, interval: StdDuration) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let store = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = store.purge_expired();
                        if removed > 0 {
                            tracing::info!(removed, remaining = store.calls.read().len(), "swept ended calls");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("call store sweep task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }
}
