//! Reconciles provider-originated session changes into the store.
//!
//! Reconciling can make the provider emit again (a `set_user` that touches
//! provider state, a logout that signs the provider out). A single in-progress
//! flag drops every notification that arrives while a reconciliation is
//! running, so one external event causes at most one store mutation.

use crate::error::{AuthError, AuthResult};
use crate::provider::IdentityProvider;
use crate::store::SessionStore;
use crate::types::Session;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

/// What a notification did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Provider reported a session the store did not have.
    SignedIn,
    /// Provider reported no session while the store was authenticated.
    SignedOut,
    /// Store already agreed with the provider.
    Unchanged,
    /// Another reconciliation was running; the notification was ignored.
    Dropped,
}

/// Counters of bridge outcomes since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub signed_in: usize,
    pub signed_out: usize,
    pub unchanged: usize,
    pub dropped: usize,
}

#[derive(Default)]
struct Counters {
    signed_in: AtomicUsize,
    signed_out: AtomicUsize,
    unchanged: AtomicUsize,
    dropped: AtomicUsize,
}

impl Counters {
    fn record(&self, outcome: Reconciliation) {
        let counter = match outcome {
            Reconciliation::SignedIn => &self.signed_in,
            Reconciliation::SignedOut => &self.signed_out,
            Reconciliation::Unchanged => &self.unchanged,
            Reconciliation::Dropped => &self.dropped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Holds the in-progress flag; clears it on drop.
struct ReconcileGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for ReconcileGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Subscribes to provider notifications and applies them to a store.
#[derive(Clone)]
pub struct ProviderEventBridge {
    store: SessionStore,
    in_progress: Arc<AtomicBool>,
    attached: Arc<AtomicBool>,
    counters: Arc<Counters>,
}

impl ProviderEventBridge {
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            in_progress: Arc::new(AtomicBool::new(false)),
            attached: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Register with the provider. Must be called from inside a tokio
    /// runtime; notifications are reconciled on that runtime. A second call
    /// is a no-op.
    pub fn attach(&self, provider: &dyn IdentityProvider) -> AuthResult<()> {
        let handle = Handle::try_current().map_err(|err| {
            AuthError::Runtime(format!("event bridge needs a tokio runtime: {err}"))
        })?;
        if self.attached.swap(true, Ordering::AcqRel) {
            warn!("Event bridge already attached, ignoring");
            return Ok(());
        }

        let bridge = self.clone();
        provider.on_change(Box::new(move |session| {
            let Some(guard) = bridge.try_enter() else {
                bridge.counters.record(Reconciliation::Dropped);
                debug!("Provider notification dropped: reconciliation in progress");
                return;
            };
            let bridge = bridge.clone();
            handle.spawn(async move {
                bridge.reconcile(session, guard).await;
            });
        }));
        info!("Event bridge attached to identity provider");
        Ok(())
    }

    /// Apply one provider notification.
    pub async fn handle_notification(&self, session: Option<Session>) -> Reconciliation {
        match self.try_enter() {
            Some(guard) => self.reconcile(session, guard).await,
            None => {
                self.counters.record(Reconciliation::Dropped);
                debug!("Provider notification dropped: reconciliation in progress");
                Reconciliation::Dropped
            }
        }
    }

    pub fn is_reconciling(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            signed_in: self.counters.signed_in.load(Ordering::Relaxed),
            signed_out: self.counters.signed_out.load(Ordering::Relaxed),
            unchanged: self.counters.unchanged.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }

    fn try_enter(&self) -> Option<ReconcileGuard> {
        self.in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ReconcileGuard {
                flag: Arc::clone(&self.in_progress),
            })
    }

    async fn reconcile(&self, session: Option<Session>, _guard: ReconcileGuard) -> Reconciliation {
        let authenticated = self.store.is_authenticated();
        let outcome = match (session, authenticated) {
            (Some(session), false) => {
                debug!(user_id = %session.user.id, "Provider reported a session, adopting it");
                if self.store.apply_user(session.clone()).await {
                    self.store.post_candidate(session);
                    Reconciliation::SignedIn
                } else {
                    Reconciliation::Unchanged
                }
            }
            (None, true) => {
                debug!("Provider reported sign-out, logging out locally");
                self.store.logout().await;
                Reconciliation::SignedOut
            }
            _ => Reconciliation::Unchanged,
        };
        self.counters.record(outcome);
        outcome
    }
}
