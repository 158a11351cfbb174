//! Resets a session check that never resolves.
//!
//! The store bounds each provider call on its own; the watchdog is the outer
//! guarantee that the UI never spins forever on `Checking`.

use crate::store::{SessionStore, WeakSessionStore};
use crate::types::SessionSnapshot;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

pub struct CheckWatchdog {
    store: WeakSessionStore,
    timeout: Duration,
}

impl CheckWatchdog {
    /// Spawn a watchdog for `store`. The task ends once every strong
    /// handle to the store has been dropped.
    pub fn spawn(store: &SessionStore, timeout: Duration) -> JoinHandle<()> {
        let watchdog = Self {
            store: store.downgrade(),
            timeout,
        };
        let snapshots = store.subscribe();
        tokio::spawn(watchdog.run(snapshots))
    }

    async fn run(self, mut snapshots: watch::Receiver<SessionSnapshot>) {
        // (epoch, deadline) of the Checking state being watched
        let mut armed: Option<(u64, Instant)> = None;

        loop {
            let checking_epoch = {
                let snapshot = snapshots.borrow_and_update();
                snapshot
                    .state
                    .is_checking()
                    .then_some(snapshot.check_epoch)
            };

            armed = match (checking_epoch, armed) {
                (Some(epoch), Some((armed_epoch, deadline))) if epoch == armed_epoch => {
                    Some((epoch, deadline))
                }
                (Some(epoch), _) => Some((epoch, Instant::now() + self.timeout)),
                (None, _) => None,
            };

            match armed {
                Some((epoch, deadline)) => {
                    tokio::select! {
                        _ = tokio::time::sleep_until(deadline) => {
                            let Some(store) = self.store.upgrade() else { break };
                            store.expire_check(epoch);
                            armed = None;
                        }
                        changed = snapshots.changed() => {
                            if changed.is_err() {
                                break;
                            }
                        }
                    }
                }
                None => {
                    if snapshots.changed().await.is_err() {
                        break;
                    }
                }
            }
        }
        debug!("Check watchdog stopped");
    }
}
