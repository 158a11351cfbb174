//! Test harness for the session coordinator.
//!
//! Provides:
//! - MockProvider: scripted identity provider with call counters
//! - RecordingInitializer: downstream hook that records every call
//! - TestContext: a store wired to both, over in-memory storage

use crate::error::{AuthError, AuthResult};
use crate::provider::{DownstreamModuleInitializer, IdentityProvider, SessionListener};
use crate::store::{SessionStore, StoreConfig};
use crate::types::Session;
use async_trait::async_trait;
use session_storage::{MemoryStorage, PersistedSession, SessionPersistence, User};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

pub const ALICE_PASSWORD: &str = "correct-horse";

pub fn alice() -> User {
    User::new("user-alice", "alice@example.com", "Alice").with_username("alice")
}

pub fn alice_session() -> Session {
    Session::new(alice(), "token-alice")
}

pub fn bob_session() -> Session {
    Session::new(
        User::new("user-bob", "bob@example.com", "Bob").with_username("bob"),
        "token-bob",
    )
}

/// Scripted answer to one `get_session` call.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum SessionResponse {
    Session(Option<Session>),
    NetworkError,
    /// Never resolves
    Hang,
}

/// Identity provider driven entirely by the test.
pub struct MockProvider {
    script: Mutex<VecDeque<SessionResponse>>,
    default_session: Mutex<Option<Session>>,
    session_delay: Mutex<Duration>,
    accounts: Mutex<HashMap<String, (String, Session)>>,
    listeners: Mutex<Vec<SessionListener>>,
    get_session_times: Mutex<Vec<Instant>>,
    login_calls: AtomicUsize,
    register_calls: AtomicUsize,
    logout_calls: AtomicUsize,
    fail_logout: AtomicBool,
    hang_logout: AtomicBool,
    emit_on_logout: AtomicBool,
}

impl MockProvider {
    pub fn new() -> Self {
        let provider = Self {
            script: Mutex::new(VecDeque::new()),
            default_session: Mutex::new(None),
            session_delay: Mutex::new(Duration::ZERO),
            accounts: Mutex::new(HashMap::new()),
            listeners: Mutex::new(Vec::new()),
            get_session_times: Mutex::new(Vec::new()),
            login_calls: AtomicUsize::new(0),
            register_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            fail_logout: AtomicBool::new(false),
            hang_logout: AtomicBool::new(false),
            emit_on_logout: AtomicBool::new(false),
        };
        provider.add_account(alice_session(), ALICE_PASSWORD);
        provider
    }

    pub fn add_account(&self, session: Session, password: &str) {
        self.accounts
            .lock()
            .unwrap()
            .insert(session.user.id.clone(), (password.to_string(), session));
    }

    /// Queue an answer for the next `get_session` call.
    pub fn queue_session(&self, response: SessionResponse) {
        self.script.lock().unwrap().push_back(response);
    }

    /// Forget scripted answers no check has consumed.
    pub fn clear_session_script(&self) {
        self.script.lock().unwrap().clear();
    }

    /// Answer for `get_session` once the script is empty.
    pub fn set_default_session(&self, session: Option<Session>) {
        *self.default_session.lock().unwrap() = session;
    }

    pub fn set_session_delay(&self, delay: Duration) {
        *self.session_delay.lock().unwrap() = delay;
    }

    pub fn fail_logout(&self) {
        self.fail_logout.store(true, Ordering::SeqCst);
    }

    pub fn hang_logout(&self) {
        self.hang_logout.store(true, Ordering::SeqCst);
    }

    /// Make `logout` notify listeners of a signed-out session.
    pub fn emit_on_logout(&self) {
        self.emit_on_logout.store(true, Ordering::SeqCst);
    }

    /// Deliver a notification to every listener, synchronously.
    pub fn emit(&self, session: Option<Session>) {
        let listeners = self.listeners.lock().unwrap();
        for listener in listeners.iter() {
            listener(session.clone());
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }

    pub fn get_session_calls(&self) -> usize {
        self.get_session_times.lock().unwrap().len()
    }

    pub fn get_session_times(&self) -> Vec<Instant> {
        self.get_session_times.lock().unwrap().clone()
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    fn authenticate(&self, matches: impl Fn(&User) -> bool, password: &str) -> AuthResult<Session> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        let accounts = self.accounts.lock().unwrap();
        accounts
            .values()
            .find(|(stored, session)| matches(&session.user) && stored == password)
            .map(|(_, session)| session.clone())
            .ok_or_else(|| {
                AuthError::InvalidCredentials("Invalid username or password".to_string())
            })
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    async fn login(&self, email: &str, password: &str) -> AuthResult<Session> {
        self.authenticate(|user| user.email == email, password)
    }

    async fn login_with_username(&self, username: &str, password: &str) -> AuthResult<Session> {
        self.authenticate(|user| user.username.as_deref() == Some(username), password)
    }

    async fn register(&self, username: &str, email: &str, _password: &str) -> AuthResult<User> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        let accounts = self.accounts.lock().unwrap();
        let taken = accounts.values().any(|(_, session)| {
            session.user.username.as_deref() == Some(username) || session.user.email == email
        });
        if taken {
            return Err(AuthError::UsernameTaken(
                "That username or email is already registered".to_string(),
            ));
        }
        Ok(User::new(format!("user-{username}"), email, username).with_username(username))
    }

    async fn logout(&self) -> AuthResult<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if self.emit_on_logout.load(Ordering::SeqCst) {
            self.emit(None);
        }
        if self.hang_logout.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_logout.load(Ordering::SeqCst) {
            return Err(AuthError::NetworkUnavailable);
        }
        Ok(())
    }

    async fn get_session(&self) -> AuthResult<Option<Session>> {
        self.get_session_times.lock().unwrap().push(Instant::now());
        let delay = *self.session_delay.lock().unwrap();
        let response = self.script.lock().unwrap().pop_front();
        let response = response.unwrap_or_else(|| {
            SessionResponse::Session(self.default_session.lock().unwrap().clone())
        });

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match response {
            SessionResponse::Session(session) => Ok(session),
            SessionResponse::NetworkError => Err(AuthError::NetworkUnavailable),
            SessionResponse::Hang => {
                std::future::pending::<()>().await;
                Ok(None)
            }
        }
    }

    fn on_change(&self, listener: SessionListener) {
        self.listeners.lock().unwrap().push(listener);
    }
}

type InitHook = Box<dyn Fn(&str) + Send + Sync>;

/// Downstream hook that records `init:<id>` and `teardown:<id>`.
#[derive(Default)]
pub struct RecordingInitializer {
    calls: Mutex<Vec<String>>,
    on_initialize: Mutex<Option<InitHook>>,
}

impl RecordingInitializer {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn init_count(&self) -> usize {
        self.calls().iter().filter(|c| c.starts_with("init:")).count()
    }

    /// Run `hook` inside every `initialize_user_scope` call.
    pub fn set_on_initialize(&self, hook: InitHook) {
        *self.on_initialize.lock().unwrap() = Some(hook);
    }
}

#[async_trait]
impl DownstreamModuleInitializer for RecordingInitializer {
    async fn initialize_user_scope(&self, user_id: &str) -> AuthResult<()> {
        self.calls.lock().unwrap().push(format!("init:{user_id}"));
        if let Some(hook) = self.on_initialize.lock().unwrap().as_ref() {
            hook(user_id);
        }
        Ok(())
    }

    async fn teardown_user_scope(&self, user_id: &str) -> AuthResult<()> {
        self.calls.lock().unwrap().push(format!("teardown:{user_id}"));
        Ok(())
    }
}

/// A store wired to mocks over in-memory storage.
pub struct TestContext {
    pub provider: Arc<MockProvider>,
    pub downstream: Arc<RecordingInitializer>,
    pub storage: Arc<MemoryStorage>,
    pub store: SessionStore,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self::with_storage(config, Arc::new(MemoryStorage::new()))
    }

    pub fn with_storage(config: StoreConfig, storage: Arc<MemoryStorage>) -> Self {
        let provider = Arc::new(MockProvider::new());
        let downstream = Arc::new(RecordingInitializer::default());
        let store = SessionStore::builder(
            provider.clone(),
            SessionPersistence::new(Box::new(storage.clone())),
        )
        .downstream(downstream.clone())
        .config(config)
        .build();
        Self {
            provider,
            downstream,
            storage,
            store,
        }
    }

    /// Read what is currently persisted.
    pub fn persisted(&self) -> PersistedSession {
        SessionPersistence::new(Box::new(self.storage.clone()))
            .load()
            .unwrap()
    }

    /// Write a persisted session as a previous process would have.
    pub fn seed_persisted(&self, session: &Session) {
        SessionPersistence::new(Box::new(self.storage.clone()))
            .save(&PersistedSession::from(session))
            .unwrap();
    }

    /// Move past the debounce window.
    pub async fn past_debounce(&self) {
        tokio::time::sleep(self.store.config().debounce_window + Duration::from_millis(1)).await;
    }
}
