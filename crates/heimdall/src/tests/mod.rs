//! Behavioural tests for the session coordinator.
//!
//! - `harness.rs`   - Mock identity provider, recording initializer, test context
//! - `scenarios.rs` - End-to-end login, logout, registration and rehydration flows
//! - `debounce.rs`  - Check admission: single flight and the debounce window
//! - `retry.rs`     - Backoff timing, exhaustion and per-attempt timeouts
//! - `bridge.rs`    - Provider notifications, loop prevention, candidate handoff
//! - `watchdog.rs`  - Stuck `Checking` recovery
//! - `invariants.rs`- Randomised action sequences checked against state invariants

pub(crate) mod harness;
