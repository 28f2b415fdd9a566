//! # Session Store
//!
//! Tab-lifetime holder of the session state. Exactly one store exists per
//! application instance and is passed by reference (`Arc<SessionStore>`) to
//! every consumer.
//!
//! ## Writers
//!
//! Only the verifier, the logout action and the transport interceptor
//! mutate the store. Everything else observes it through
//! [`SessionStore::subscribe`] or [`SessionStore::on_change`].
//!
//! ## Epochs
//!
//! Every verification start, `set_user` and `clear_user` bumps a monotonic
//! epoch. A verification result carries the [`VerificationTicket`] issued when
//! it started and is applied only while that ticket is still current, so a
//! slow response can never overwrite a newer logout.

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::types::{MountId, SessionSnapshot, SessionState, User};

/// Callback invoked synchronously after each observable mutation.
pub type SessionListener = Arc<dyn Fn(&SessionSnapshot) + Send + Sync>;

/// Handle returned by [`SessionStore::on_change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Proof that a verification round-trip was started at a given epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationTicket {
    epoch: u64,
    mount: MountId,
}

impl VerificationTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn mount(&self) -> MountId {
        self.mount
    }
}

struct Inner {
    epoch: u64,
    next_listener: u64,
    listeners: Vec<(ListenerId, SessionListener)>,
}

pub struct SessionStore {
    sender: watch::Sender<SessionSnapshot>,
    inner: Mutex<Inner>,
}

impl SessionStore {
    /// New store in the `Unknown` state.
    pub fn new() -> Self {
        let (sender, _) = watch::channel(SessionSnapshot::default());
        Self {
            sender,
            inner: Mutex::new(Inner {
                epoch: 0,
                next_listener: 0,
                listeners: Vec::new(),
            }),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.sender.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.sender.borrow().state.clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.sender.borrow().current_user().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.sender.borrow().loading
    }

    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.sender.subscribe()
    }

    /// Register a listener called after every mutation that changes the
    /// snapshot. Listeners run on the mutating task, outside the store lock.
    pub fn on_change<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&SessionSnapshot) + Send + Sync + 'static,
    {
        let mut inner = self.lock();
        let id = ListenerId(inner.next_listener);
        inner.next_listener += 1;
        inner.listeners.push((id, Arc::new(listener)));
        id
    }

    /// Returns `false` when the listener was already removed.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut inner = self.lock();
        let before = inner.listeners.len();
        inner.listeners.retain(|(existing, _)| *existing != id);
        inner.listeners.len() != before
    }

    /// Mark a verification as outstanding and hand out its ticket.
    ///
    /// Any earlier ticket stops being current.
    pub fn begin_verification(&self, mount: MountId) -> VerificationTicket {
        let ticket = self.mutate(|inner, snapshot| {
            inner.epoch += 1;
            snapshot.loading = true;
            VerificationTicket {
                epoch: inner.epoch,
                mount,
            }
        });

        debug!(epoch = ticket.epoch, mount = %mount, "Verification started");
        ticket
    }

    pub fn is_current(&self, ticket: &VerificationTicket) -> bool {
        self.lock().epoch == ticket.epoch
    }

    /// Apply a verification result. `None` means anonymous.
    ///
    /// Returns `false`, leaving the store untouched, when the ticket has been
    /// superseded.
    pub fn complete_verification(&self, ticket: &VerificationTicket, user: Option<User>) -> bool {
        let applied = self.mutate(|inner, snapshot| {
            if inner.epoch != ticket.epoch {
                return false;
            }
            snapshot.state = match user {
                Some(user) => SessionState::Authenticated(user),
                None => SessionState::Anonymous,
            };
            snapshot.loading = false;
            true
        });

        if !applied {
            debug!(epoch = ticket.epoch, "Discarding superseded verification result");
        }
        applied
    }

    /// Give up on a verification without applying a result, e.g. because
    /// its mount went away. Clears the loading flag only if nothing newer
    /// owns it.
    pub fn abandon_verification(&self, ticket: &VerificationTicket) -> bool {
        self.mutate(|inner, snapshot| {
            if inner.epoch != ticket.epoch {
                return false;
            }
            inner.epoch += 1;
            snapshot.loading = false;
            true
        })
    }

    /// Replace the current user wholesale. Invalidates in-flight
    /// verifications.
    pub fn set_user(&self, user: User) {
        self.mutate(|inner, snapshot| {
            inner.epoch += 1;
            snapshot.state = SessionState::Authenticated(user);
            snapshot.loading = false;
        });
    }

    /// Move to `Anonymous`. Idempotent; invalidates in-flight verifications.
    pub fn clear_user(&self) {
        self.mutate(|inner, snapshot| {
            inner.epoch += 1;
            snapshot.state = SessionState::Anonymous;
            snapshot.loading = false;
        });
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Listeners never run under the lock, so a poisoned guard still holds
        // consistent data.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `apply` under the lock, publish the snapshot if it changed and
    /// notify listeners.
    fn mutate<F, R>(&self, apply: F) -> R
    where
        F: FnOnce(&mut Inner, &mut SessionSnapshot) -> R,
    {
        let (snapshot, listeners, output) = {
            let mut inner = self.lock();
            let mut next = self.sender.borrow().clone();
            let output = apply(&mut inner, &mut next);

            if *self.sender.borrow() == next {
                return output;
            }
            self.sender.send_replace(next.clone());

            let listeners: Vec<SessionListener> = inner
                .listeners
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect();
            (next, listeners, output)
        };

        trace!(
            state = snapshot.state.as_str(),
            loading = snapshot.loading,
            listeners = listeners.len(),
            "Session snapshot published"
        );
        for listener in listeners {
            listener(&snapshot);
        }
        output
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
