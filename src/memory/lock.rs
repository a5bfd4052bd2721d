//! Per-node shared/exclusive lock with open-share admission.

use std::sync::{Mutex, MutexGuard};

use tokio::sync::Notify;

use crate::fs::FileShare;

/// Lock word: `-1` exclusive, `0` free, `> 0` number of shared holders.
///
/// `share` is the mode recorded by the first open that carried one; it only
/// constrains later entries that also carry a mode. The admission rule is
/// asymmetric: a request is admitted iff `requested & current == requested`.
#[derive(Default)]
struct LockState {
    shared_count: i32,
    share: Option<FileShare>,
}

/// Outcome of one non-blocking shared-entry attempt.
enum SharedEntry {
    Acquired,
    /// An exclusive holder is active; the caller may wait.
    Blocked,
    /// The recorded share mode rejects the request; waiting cannot help.
    Incompatible,
}

/// Reader/writer lock embedded in every node, and used for the
/// filesystem-wide lock.
///
/// Every state transition wakes all waiters. Fairness is not guaranteed;
/// writer starvation is acceptable.
pub(crate) struct NodeLock {
    state: Mutex<LockState>,
    waiters: Notify,
}

impl NodeLock {
    pub fn new() -> NodeLock {
        NodeLock { state: Mutex::new(LockState::default()), waiters: Notify::new() }
    }

    fn state(&self) -> MutexGuard<'_, LockState> {
        self.state.lock().expect("node lock state poisoned")
    }

    fn try_shared(&self, share: Option<FileShare>) -> SharedEntry {
        let mut state = self.state();
        if state.shared_count < 0 {
            return SharedEntry::Blocked;
        }
        if let Some(requested) = share {
            match state.share {
                Some(current) if !requested.is_subset_of(current) => {
                    return SharedEntry::Incompatible;
                }
                Some(_) => {}
                None => state.share = Some(requested),
            }
        }
        state.shared_count += 1;
        SharedEntry::Acquired
    }

    /// Enters the lock shared, waiting out any exclusive holder.
    ///
    /// Returns `false` without waiting when `share` is incompatible with the
    /// mode already recorded on the lock.
    pub async fn enter_shared(&self, share: Option<FileShare>) -> bool {
        loop {
            match self.try_shared(share) {
                SharedEntry::Acquired => return true,
                SharedEntry::Incompatible => return false,
                SharedEntry::Blocked => {}
            }
            let notified = self.waiters.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            // Re-check after registering so a release between the first
            // check and here cannot be missed.
            match self.try_shared(share) {
                SharedEntry::Acquired => return true,
                SharedEntry::Incompatible => return false,
                SharedEntry::Blocked => notified.await,
            }
        }
    }

    /// Non-blocking [`NodeLock::enter_shared`].
    pub fn try_enter_shared(&self, share: Option<FileShare>) -> bool {
        matches!(self.try_shared(share), SharedEntry::Acquired)
    }

    /// Enters the lock exclusively, waiting until no holder remains.
    pub async fn enter_exclusive(&self) {
        loop {
            if self.try_enter_exclusive() {
                return;
            }
            let notified = self.waiters.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.try_enter_exclusive() {
                return;
            }
            notified.await;
        }
    }

    /// Non-blocking [`NodeLock::enter_exclusive`].
    pub fn try_enter_exclusive(&self) -> bool {
        let mut state = self.state();
        if state.shared_count == 0 {
            state.shared_count = -1;
            true
        } else {
            false
        }
    }

    pub fn exit_shared(&self) {
        {
            let mut state = self.state();
            debug_assert!(state.shared_count > 0, "exit_shared without a shared holder");
            state.shared_count -= 1;
            if state.shared_count == 0 {
                state.share = None;
            }
        }
        self.waiters.notify_waiters();
    }

    pub fn exit_exclusive(&self) {
        {
            let mut state = self.state();
            debug_assert_eq!(state.shared_count, -1, "exit_exclusive without the exclusive holder");
            state.shared_count = 0;
        }
        self.waiters.notify_waiters();
    }

    /// Whether any holder is active. Used by tree-manipulation assertions.
    pub fn is_locked(&self) -> bool {
        self.state().shared_count != 0
    }

    /// Whether the exclusive holder is active.
    pub fn is_exclusive(&self) -> bool {
        self.state().shared_count < 0
    }
}
