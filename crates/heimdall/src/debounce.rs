//! Admission control for session checks.
//!
//! At most one check runs at a time, and two checks never start within one
//! debounce window of each other.

use std::time::Duration;
use tokio::time::Instant;

/// Where the check cycle is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckPhase {
    Idle { last_started: Option<Instant> },
    InFlight { started_at: Instant },
}

/// Why a check was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppressed {
    InFlight,
    WithinWindow { remaining: Duration },
}

#[derive(Debug)]
pub struct DebounceGuard {
    window: Duration,
    phase: CheckPhase,
}

impl DebounceGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            phase: CheckPhase::Idle { last_started: None },
        }
    }

    pub fn phase(&self) -> CheckPhase {
        self.phase
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.phase, CheckPhase::InFlight { .. })
    }

    /// Whether a check may start at `now`. Does not record anything.
    pub fn admit(&self, now: Instant) -> Result<(), Suppressed> {
        match self.phase {
            CheckPhase::InFlight { .. } => Err(Suppressed::InFlight),
            CheckPhase::Idle {
                last_started: Some(last),
            } => {
                let elapsed = now.saturating_duration_since(last);
                if elapsed < self.window {
                    Err(Suppressed::WithinWindow {
                        remaining: self.window - elapsed,
                    })
                } else {
                    Ok(())
                }
            }
            CheckPhase::Idle { last_started: None } => Ok(()),
        }
    }

    /// Mark a check as started at `now`.
    pub fn begin(&mut self, now: Instant) {
        self.phase = CheckPhase::InFlight { started_at: now };
    }

    /// Mark the running check as finished. The window counts from its start.
    pub fn finish(&mut self) {
        if let CheckPhase::InFlight { started_at } = self.phase {
            self.phase = CheckPhase::Idle {
                last_started: Some(started_at),
            };
        }
    }

    /// Forget the last start time. A running check stays in flight until it
    /// finishes on its own.
    pub fn reset(&mut self) {
        if let CheckPhase::Idle { .. } = self.phase {
            self.phase = CheckPhase::Idle { last_started: None };
        }
    }
}
