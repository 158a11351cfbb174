//! The session store: the single source of truth for who is signed in.
//!
//! Every mutation goes through [`Inner::update`], which holds the cell lock
//! for the whole read-modify-write, publishes the new snapshot to watchers
//! and, once the lock is released, fires the state-change callback.
//! Provider calls and downstream hooks always run outside the lock.

use crate::debounce::{DebounceGuard, Suppressed};
use crate::error::{AuthError, AuthResult};
use crate::provider::{DownstreamModuleInitializer, IdentityProvider, NoopInitializer};
use crate::retry::{RetryContext, RetryPolicy};
use crate::session_fsm::{
    SessionMachine, SessionMachineInput, SessionState, SessionStateChangedPayload,
};
use crate::types::{Credentials, LoginMethod, RegistrationData, Session, SessionSnapshot};
use crate::validator::SessionIntegrityValidator;
use crate::watchdog::CheckWatchdog;
use session_config_and_utils::CoordinatorSettings;
use session_storage::{PersistedSession, SessionPersistence, User};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Callback type for session state change notifications.
pub type SessionStateCallback = Box<dyn Fn(SessionStateChangedPayload) + Send + Sync>;

/// Timing and validation knobs for a [`SessionStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub debounce_window: Duration,
    pub check_timeout: Duration,
    pub retry: RetryPolicy,
    pub rehydrate_delay: Duration,
    pub watchdog_timeout: Duration,
    pub logout_timeout: Duration,
    pub force_logout_timeout: Duration,
    pub min_password_len: usize,
}

impl From<&CoordinatorSettings> for StoreConfig {
    fn from(settings: &CoordinatorSettings) -> Self {
        Self {
            debounce_window: Duration::from_millis(settings.debounce_window_ms),
            check_timeout: Duration::from_millis(settings.check_timeout_ms),
            retry: RetryPolicy::new(
                settings.retry_max_attempts,
                Duration::from_millis(u64::from(settings.retry_base_delay_ms)),
            ),
            rehydrate_delay: Duration::from_millis(settings.rehydrate_delay_ms),
            watchdog_timeout: Duration::from_millis(settings.watchdog_timeout_ms),
            logout_timeout: Duration::from_millis(settings.logout_timeout_ms),
            force_logout_timeout: Duration::from_millis(settings.force_logout_timeout_ms),
            min_password_len: settings.min_password_len,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::from(&CoordinatorSettings::default())
    }
}

/// Per-user module work to run after the lock is released.
#[derive(Debug, Default)]
struct ScopeChange {
    teardown: Option<String>,
    initialize: Option<String>,
}

struct SessionCell {
    machine: SessionMachine,
    state: SessionState,
    is_loading: bool,
    error: Option<String>,
    retry: Option<RetryContext>,
    guard: DebounceGuard,
    /// Bumped by every explicit session change; checks started under an
    /// older generation drop their result.
    generation: u64,
    /// Bumped on every entry into `Checking`.
    check_epoch: u64,
    /// User whose downstream scope is currently initialized.
    user_scope: Option<String>,
    /// Session observed by the event bridge, consumed by the next check.
    candidate: Option<Session>,
}

impl SessionCell {
    fn new(debounce_window: Duration) -> Self {
        Self {
            machine: SessionMachine::new(),
            state: SessionState::Unauthenticated,
            is_loading: false,
            error: None,
            retry: None,
            guard: DebounceGuard::new(debounce_window),
            generation: 0,
            check_epoch: 0,
            user_scope: None,
            candidate: None,
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state.clone(),
            is_loading: self.is_loading,
            error: self.error.clone(),
            retry_attempt: self.retry.map(|r| r.attempt).unwrap_or(0),
            check_epoch: self.check_epoch,
        }
    }

    fn transition(&mut self, input: SessionMachineInput, next: SessionState) -> AuthResult<()> {
        self.machine.consume(&input).map_err(|_| {
            AuthError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                self.state.kind()
            ))
        })?;
        debug_assert_eq!(
            crate::session_fsm::SessionStateKind::from(self.machine.state()),
            next.kind()
        );
        if next.is_checking() {
            self.check_epoch += 1;
        }
        self.state = next;
        Ok(())
    }

    /// Like `transition`, logging instead of failing.
    fn apply(&mut self, input: SessionMachineInput, next: SessionState) -> bool {
        match self.transition(input, next) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "Ignoring session transition");
                false
            }
        }
    }

    fn claim_scope(&mut self, user_id: &str) -> ScopeChange {
        if self.user_scope.as_deref() == Some(user_id) {
            return ScopeChange::default();
        }
        ScopeChange {
            teardown: self.user_scope.replace(user_id.to_string()),
            initialize: Some(user_id.to_string()),
        }
    }

    fn release_scope(&mut self) -> ScopeChange {
        ScopeChange {
            teardown: self.user_scope.take(),
            initialize: None,
        }
    }
}

struct Inner {
    provider: Arc<dyn IdentityProvider>,
    downstream: Arc<dyn DownstreamModuleInitializer>,
    persistence: SessionPersistence,
    config: StoreConfig,
    cell: Mutex<SessionCell>,
    snapshots: watch::Sender<SessionSnapshot>,
    state_callback: Mutex<Option<SessionStateCallback>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Inner {
    fn update<R>(&self, f: impl FnOnce(&mut SessionCell) -> R) -> R {
        let (result, changed) = {
            let mut cell = lock(&self.cell);
            let before = cell.state.clone();
            let result = f(&mut cell);
            let snapshot = cell.snapshot();
            let changed = (snapshot.state != before).then(|| {
                debug!(
                    old_state = ?before.kind(),
                    new_state = ?snapshot.state.kind(),
                    "Session state transition"
                );
                SessionStateChangedPayload::from(&snapshot.state)
            });
            self.snapshots.send_replace(snapshot);
            (result, changed)
        };

        if let Some(payload) = changed {
            self.notify_state_change(payload);
        }
        result
    }

    fn notify_state_change(&self, payload: SessionStateChangedPayload) {
        let callback = lock(&self.state_callback);
        if let Some(callback) = callback.as_ref() {
            callback(payload);
        }
    }

    fn persist(&self, session: &Session) {
        if let Err(err) = self.persistence.save(&PersistedSession::from(session)) {
            warn!(error = %err, "Failed to persist session");
        }
    }

    fn unpersist(&self) {
        if let Err(err) = self.persistence.clear() {
            warn!(error = %err, "Failed to clear persisted session");
        }
    }

    /// Enter `Authenticated` with `session` and persist it.
    fn confirm(&self, cell: &mut SessionCell, session: &Session) -> ScopeChange {
        let next = SessionState::Authenticated {
            user: session.user.clone(),
            token: session.token.clone(),
        };
        if !cell.apply(SessionMachineInput::Confirm, next) {
            return ScopeChange::default();
        }
        cell.is_loading = false;
        cell.retry = None;
        self.persist(session);
        cell.claim_scope(&session.user.id)
    }

    /// Drop to `Unauthenticated` and forget the persisted session.
    fn sign_out(&self, cell: &mut SessionCell) -> ScopeChange {
        cell.apply(SessionMachineInput::Clear, SessionState::Unauthenticated);
        cell.is_loading = false;
        cell.retry = None;
        self.unpersist();
        cell.release_scope()
    }

    /// Full local reset used by logout.
    fn reset(&self, cell: &mut SessionCell) -> ScopeChange {
        cell.generation += 1;
        cell.error = None;
        cell.guard.reset();
        cell.candidate = None;
        self.sign_out(cell)
    }

    async fn run_scope_change(&self, change: ScopeChange) {
        if let Some(user_id) = change.teardown {
            match self.downstream.teardown_user_scope(&user_id).await {
                Ok(()) => debug!(user_id = %user_id, "User scope torn down"),
                Err(err) => warn!(user_id = %user_id, error = %err, "User scope teardown failed"),
            }
        }
        if let Some(user_id) = change.initialize {
            match self.downstream.initialize_user_scope(&user_id).await {
                Ok(()) => debug!(user_id = %user_id, "User scope initialized"),
                Err(err) => {
                    warn!(user_id = %user_id, error = %err, "User scope initialization failed")
                }
            }
        }
    }

    fn mark_retry_pending(&self, generation: u64, attempt: u8, err: &AuthError, delay: Duration) {
        warn!(
            attempt,
            error = %err,
            retry_in_ms = delay.as_millis() as u64,
            "Session check attempt failed"
        );
        self.update(|cell| {
            if cell.generation != generation {
                return;
            }
            if let Some(retry) = cell.retry.as_mut() {
                retry.attempt = attempt;
            }
            if cell.state.is_checking() {
                cell.apply(
                    SessionMachineInput::RetryPending,
                    SessionState::Failed {
                        reason: err.user_message(),
                        retryable: true,
                        attempt,
                    },
                );
            }
        });
    }

    fn resume_check(&self, generation: u64) {
        self.update(|cell| {
            if cell.generation != generation {
                return;
            }
            if matches!(cell.state, SessionState::Failed { retryable: true, .. }) {
                cell.apply(SessionMachineInput::Resume, SessionState::checking_now());
            }
        });
    }
}

/// Take the bridge candidate if it still describes the signed-in user.
fn take_candidate(cell: &mut SessionCell) -> Option<Session> {
    let candidate = cell.candidate.take()?;
    match cell.state.user() {
        Some(user) if user.id == candidate.user.id => Some(candidate),
        _ => {
            debug!(user_id = %candidate.user.id, "Dropping stale bridge candidate");
            None
        }
    }
}

/// Releases the debounce guard when a check ends, however it ends.
struct InFlightCheck<'a> {
    cell: &'a Mutex<SessionCell>,
}

impl Drop for InFlightCheck<'_> {
    fn drop(&mut self) {
        lock(self.cell).guard.finish();
    }
}

enum Admission {
    Suppressed,
    Healed(ScopeChange),
    Started {
        generation: u64,
        candidate: Option<Session>,
    },
}

/// Builder for [`SessionStore`].
pub struct SessionStoreBuilder {
    provider: Arc<dyn IdentityProvider>,
    persistence: SessionPersistence,
    downstream: Arc<dyn DownstreamModuleInitializer>,
    config: StoreConfig,
}

impl SessionStoreBuilder {
    pub fn downstream(mut self, downstream: Arc<dyn DownstreamModuleInitializer>) -> Self {
        self.downstream = downstream;
        self
    }

    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> SessionStore {
        let cell = SessionCell::new(self.config.debounce_window);
        let (snapshots, _) = watch::channel(cell.snapshot());
        SessionStore {
            inner: Arc::new(Inner {
                provider: self.provider,
                downstream: self.downstream,
                persistence: self.persistence,
                config: self.config,
                cell: Mutex::new(cell),
                snapshots,
                state_callback: Mutex::new(None),
            }),
        }
    }
}

/// Coordinates the client-side authentication session.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

/// Non-owning handle to a [`SessionStore`].
#[derive(Clone)]
pub struct WeakSessionStore {
    inner: Weak<Inner>,
}

impl WeakSessionStore {
    pub fn upgrade(&self) -> Option<SessionStore> {
        self.inner.upgrade().map(|inner| SessionStore { inner })
    }
}

impl SessionStore {
    pub fn builder(
        provider: Arc<dyn IdentityProvider>,
        persistence: SessionPersistence,
    ) -> SessionStoreBuilder {
        SessionStoreBuilder {
            provider,
            persistence,
            downstream: Arc::new(NoopInitializer),
            config: StoreConfig::default(),
        }
    }

    /// Store with default settings and no downstream modules.
    pub fn new(provider: Arc<dyn IdentityProvider>, persistence: SessionPersistence) -> Self {
        Self::builder(provider, persistence).build()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.snapshots.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.inner.snapshots.borrow().state.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.snapshots.borrow().is_authenticated()
    }

    /// Receiver that sees every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.snapshots.subscribe()
    }

    /// Set a callback to be notified of session state changes.
    ///
    /// The callback runs on the thread that caused the change, after the
    /// store's lock has been released.
    pub fn on_state_change(&self, callback: SessionStateCallback) {
        *lock(&self.inner.state_callback) = Some(callback);
    }

    pub fn downgrade(&self) -> WeakSessionStore {
        WeakSessionStore {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Start the watchdog that resets a `Checking` state stuck for longer
    /// than the configured timeout.
    pub fn spawn_watchdog(&self) -> JoinHandle<()> {
        CheckWatchdog::spawn(self, self.inner.config.watchdog_timeout)
    }

    /// Restore from persistence on process start.
    ///
    /// The restored session is never trusted directly: the store is put
    /// in `Unauthenticated` (tearing down any live session in memory) and a
    /// validating check is scheduled after the configured delay.
    pub fn rehydrate(&self) -> JoinHandle<()> {
        let inner = &self.inner;
        let record = match inner.persistence.load() {
            Ok(record) => record,
            Err(err) => {
                warn!(error = %err, "Failed to read persisted session");
                PersistedSession::default()
            }
        };

        if !SessionIntegrityValidator::validate_persisted(&record) {
            warn!("Persisted session is inconsistent, clearing it");
            inner.unpersist();
        } else if let Some(user) = &record.user {
            info!(user_id = %user.id, "Restored persisted session, validating with provider");
        } else {
            info!("No persisted session found on startup");
        }

        // Restart from a blank in-memory state; the record stays on disk
        // for the check to confirm or clear
        let scope = inner.update(|cell| {
            if cell.state == SessionState::Unauthenticated {
                return ScopeChange::default();
            }
            debug!(state = ?cell.state.kind(), "Resetting active store before rehydrating");
            cell.generation += 1;
            cell.candidate = None;
            cell.guard.reset();
            cell.apply(SessionMachineInput::Clear, SessionState::Unauthenticated);
            cell.is_loading = false;
            cell.retry = None;
            cell.release_scope()
        });

        let store = self.clone();
        let delay = inner.config.rehydrate_delay;
        tokio::spawn(async move {
            store.inner.run_scope_change(scope).await;
            tokio::time::sleep(delay).await;
            store.check_auth_status().await;
        })
    }

    /// Sign in. Identifiers containing `@` go to the email login, anything
    /// else to the username login. Failures are not retried: the store
    /// passes through `Failed` to `Unauthenticated`, keeping the error.
    pub async fn login(&self, credentials: Credentials) -> AuthResult<()> {
        let inner = &self.inner;
        if let Err(err) = credentials.validate() {
            inner.update(|cell| cell.error = Some(err.user_message()));
            return Err(err);
        }

        let method = credentials.method();
        info!(method = ?method, "Login requested");
        inner.update(|cell| {
            cell.apply(SessionMachineInput::BeginLogin, SessionState::checking_now());
            cell.is_loading = true;
            cell.error = None;
        });

        let result = match method {
            LoginMethod::Email => {
                inner
                    .provider
                    .login(&credentials.identifier, &credentials.password)
                    .await
            }
            LoginMethod::Username => {
                inner
                    .provider
                    .login_with_username(&credentials.identifier, &credentials.password)
                    .await
            }
        };
        let result = result.and_then(|session| {
            if session.is_complete() {
                Ok(session)
            } else {
                Err(AuthError::Provider(
                    "login returned a session without user id or token".to_string(),
                ))
            }
        });

        match result {
            Ok(session) => {
                info!(user_id = %session.user.id, "Login successful");
                self.apply_user(session).await;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Login failed");
                let message = err.user_message();
                inner.update(|cell| {
                    cell.apply(
                        SessionMachineInput::Reject,
                        SessionState::Failed {
                            reason: message.clone(),
                            retryable: false,
                            attempt: 0,
                        },
                    );
                    cell.is_loading = false;
                    cell.retry = None;
                    cell.error = Some(message);
                });
                // The previous session does not survive a failed sign-in
                let scope = inner.update(|cell| {
                    cell.generation += 1;
                    cell.candidate = None;
                    inner.sign_out(cell)
                });
                inner.run_scope_change(scope).await;
                Err(err)
            }
        }
    }

    /// Create an account. Does not sign in.
    pub async fn register(&self, data: RegistrationData) -> AuthResult<()> {
        let inner = &self.inner;
        if let Err(err) = data.validate(inner.config.min_password_len) {
            inner.update(|cell| cell.error = Some(err.user_message()));
            return Err(err);
        }

        info!(username = %data.username, "Registration requested");
        inner.update(|cell| {
            cell.is_loading = true;
            cell.error = None;
        });

        let result = inner
            .provider
            .register(data.username.trim(), data.email.trim(), &data.password)
            .await;

        match result {
            Ok(user) => {
                info!(user_id = %user.id, "Registration successful");
                inner.update(|cell| cell.is_loading = cell.state.is_checking());
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Registration failed");
                inner.update(|cell| {
                    cell.is_loading = cell.state.is_checking();
                    cell.error = Some(err.user_message());
                });
                Err(err)
            }
        }
    }

    /// Sign out. Local state is cleared first and unconditionally; the
    /// provider call and downstream teardown are best-effort.
    pub async fn logout(&self) {
        let inner = &self.inner;
        info!("Logout requested");
        let scope = inner.update(|cell| inner.reset(cell));

        match tokio::time::timeout(inner.config.logout_timeout, inner.provider.logout()).await {
            Ok(Ok(())) => debug!("Provider session ended"),
            Ok(Err(err)) => {
                warn!(error = %err, "Provider logout failed, local session cleared anyway")
            }
            Err(_) => warn!(
                timeout_ms = inner.config.logout_timeout.as_millis() as u64,
                "Provider logout timed out, local session cleared anyway"
            ),
        }

        inner.run_scope_change(scope).await;
        info!("Logged out");
    }

    /// Emergency sign-out: also wipes every locally persisted key. Never
    /// fails and never waits longer than the force-logout timeout on the
    /// provider.
    pub async fn force_logout(&self) {
        let inner = &self.inner;
        warn!("Force logout requested");
        let scope = inner.update(|cell| {
            let scope = inner.reset(cell);
            if let Err(err) = inner.persistence.clear_all() {
                warn!(error = %err, "Failed to wipe local application state");
            }
            scope
        });

        match tokio::time::timeout(inner.config.force_logout_timeout, inner.provider.logout()).await
        {
            Ok(Ok(())) => {}
            Ok(Err(err)) => debug!(error = %err, "Provider logout failed during force logout"),
            Err(_) => debug!("Provider logout timed out during force logout"),
        }

        inner.run_scope_change(scope).await;
        info!("Force logout complete");
    }

    /// Validate the current session with the provider.
    ///
    /// Fire-and-forget: calls made while a check or login is running, or
    /// within the debounce window of the last check, return immediately.
    pub async fn check_auth_status(&self) {
        let inner = &self.inner;
        let now = Instant::now();

        let admission = inner.update(|cell| {
            if cell.state.is_checking() {
                debug!("Session check suppressed: a check or login is in progress");
                return Admission::Suppressed;
            }
            match cell.guard.admit(now) {
                Ok(()) => {}
                Err(Suppressed::InFlight) => {
                    debug!("Session check suppressed: a check is in flight");
                    return Admission::Suppressed;
                }
                Err(Suppressed::WithinWindow { remaining }) => {
                    debug!(
                        remaining_ms = remaining.as_millis() as u64,
                        "Session check suppressed by debounce window"
                    );
                    return Admission::Suppressed;
                }
            }
            if !SessionIntegrityValidator::validate(&cell.state) {
                warn!(
                    state = ?cell.state.kind(),
                    "Session state failed integrity check, resetting"
                );
                return Admission::Healed(inner.reset(cell));
            }

            let candidate = take_candidate(cell);
            cell.guard.begin(now);
            cell.apply(SessionMachineInput::BeginCheck, SessionState::checking_now());
            cell.is_loading = true;
            cell.retry = Some(inner.config.retry.context());
            Admission::Started {
                generation: cell.generation,
                candidate,
            }
        });

        let (generation, candidate) = match admission {
            Admission::Suppressed => return,
            Admission::Healed(scope) => {
                inner.run_scope_change(scope).await;
                return;
            }
            Admission::Started {
                generation,
                candidate,
            } => (generation, candidate),
        };
        let _in_flight = InFlightCheck { cell: &inner.cell };

        let outcome = match candidate {
            Some(session) => {
                debug!(user_id = %session.user.id, "Using session observed by the event bridge");
                Ok(Some(session))
            }
            None => self.fetch_session(generation).await,
        };
        self.finish_check(generation, outcome).await;
    }

    async fn fetch_session(&self, generation: u64) -> AuthResult<Option<Session>> {
        let inner = &self.inner;
        let check_timeout = inner.config.check_timeout;
        inner
            .config
            .retry
            .run_with_observer(
                |attempt| async move {
                    if attempt > 1 {
                        inner.resume_check(generation);
                    }
                    match tokio::time::timeout(check_timeout, inner.provider.get_session()).await {
                        Ok(result) => result,
                        Err(_) => Err(AuthError::Timeout),
                    }
                },
                |attempt, err: &AuthError, delay| {
                    inner.mark_retry_pending(generation, attempt, err, delay)
                },
            )
            .await
    }

    async fn finish_check(&self, generation: u64, outcome: AuthResult<Option<Session>>) {
        let inner = &self.inner;
        let scope = inner.update(|cell| {
            if cell.generation != generation {
                debug!("Discarding session check result superseded by a newer session change");
                return ScopeChange::default();
            }
            match outcome {
                Ok(Some(session)) if session.is_complete() => {
                    info!(user_id = %session.user.id, "Session confirmed by provider");
                    inner.confirm(cell, &session)
                }
                Ok(Some(_)) => {
                    warn!(
                        "Provider returned a session without user id or token, signing out locally"
                    );
                    inner.sign_out(cell)
                }
                Ok(None) => {
                    info!("No active session");
                    inner.sign_out(cell)
                }
                Err(err) => {
                    warn!(error = %err, "Session check failed after retries, signing out locally");
                    inner.sign_out(cell)
                }
            }
        });
        inner.run_scope_change(scope).await;
    }

    /// Adopt a session handed in from outside (event bridge, embedding app).
    /// Sessions without a user id or token are rejected with a warning.
    pub async fn set_user(&self, user: User, token: impl Into<String>) {
        self.apply_user(Session::new(user, token)).await;
    }

    pub(crate) async fn apply_user(&self, session: Session) -> bool {
        if !session.is_complete() {
            warn!("Rejecting session without a user id or token");
            return false;
        }
        let inner = &self.inner;
        let scope = inner.update(|cell| {
            cell.generation += 1;
            cell.error = None;
            cell.candidate = None;
            inner.confirm(cell, &session)
        });
        inner.run_scope_change(scope).await;
        true
    }

    /// Clear the user-facing error. The state is left alone.
    pub fn clear_error(&self) {
        self.inner.update(|cell| cell.error = None);
    }

    /// Hand a bridge-observed session to the next check. Replaces any
    /// unconsumed one.
    pub(crate) fn post_candidate(&self, session: Session) {
        self.inner.update(|cell| cell.candidate = Some(session));
    }

    /// Force `Unauthenticated` if the check that began at `epoch` is still
    /// running. Returns whether anything changed.
    pub(crate) fn expire_check(&self, epoch: u64) -> bool {
        self.inner.update(|cell| {
            if !cell.state.is_checking() || cell.check_epoch != epoch {
                return false;
            }
            warn!(epoch, "Session check exceeded the watchdog timeout, forcing signed-out state");
            cell.apply(SessionMachineInput::Clear, SessionState::Unauthenticated);
            cell.is_loading = false;
            cell.retry = None;
            true
        })
    }

    #[cfg(test)]
    pub(crate) fn force_state(&self, state: SessionState) {
        use crate::session_fsm::SessionStateKind;
        let path: &[SessionMachineInput] = match state.kind() {
            SessionStateKind::Unauthenticated => &[],
            SessionStateKind::Checking => &[SessionMachineInput::BeginCheck],
            SessionStateKind::Authenticated => &[SessionMachineInput::Confirm],
            SessionStateKind::Failed => &[SessionMachineInput::Reject],
        };
        self.inner.update(|cell| {
            let mut machine = SessionMachine::new();
            for input in path {
                let _ = machine.consume(input);
            }
            cell.machine = machine;
            cell.state = state;
        });
    }
}
