//! Completion barrier for indexing runs.
//!
//! A [`CompletionCoordinator`] counts outstanding runs. Each run holds a
//! [`CompletionToken`] for its whole chain of queue jobs and releases it
//! when the chain ends, whether by success, failure, or being dropped.
//! When the last token is released the coordinator fires its callbacks
//! exactly once.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tracing::{debug, warn};

type Callback = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct State {
    pending: usize,
    finished: bool,
    callbacks: Vec<Callback>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    notify: Notify,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn leave(&self) {
        let callbacks = {
            let mut state = self.lock();
            state.pending = state.pending.saturating_sub(1);
            debug!(pending = state.pending, "Left completion coordinator");
            if state.pending > 0 || state.finished {
                return;
            }
            state.finished = true;
            std::mem::take(&mut state.callbacks)
        };
        self.fire(callbacks);
    }

    fn fire(&self, callbacks: Vec<Callback>) {
        for callback in callbacks {
            callback();
        }
        self.notify.notify_waiters();
    }
}

/// Join barrier over concurrently running indexing work.
#[derive(Clone, Default)]
pub struct CompletionCoordinator {
    inner: Arc<Inner>,
}

impl CompletionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one unit of pending work.
    ///
    /// Call this before scheduling the work it covers. Entering a coordinator
    /// that has already finished is logged and yields a detached token.
    pub fn enter(&self) -> CompletionToken {
        let mut state = self.inner.lock();
        if state.finished {
            warn!("Entered a completion coordinator that already finished");
            return CompletionToken { inner: None };
        }
        state.pending += 1;
        debug!(pending = state.pending, "Entered completion coordinator");
        CompletionToken {
            inner: Some(self.inner.clone()),
        }
    }

    /// Run `callback` once all entered work has left.
    ///
    /// Fires immediately on the calling thread when nothing is pending.
    pub fn on_complete(&self, callback: impl FnOnce() + Send + 'static) {
        let callbacks = {
            let mut state = self.inner.lock();
            if state.finished {
                vec![Box::new(callback) as Callback]
            } else if state.pending == 0 {
                state.finished = true;
                let mut callbacks = std::mem::take(&mut state.callbacks);
                callbacks.push(Box::new(callback));
                callbacks
            } else {
                state.callbacks.push(Box::new(callback));
                return;
            }
        };
        self.inner.fire(callbacks);
    }

    /// Wait asynchronously until all entered work has left.
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let ready = {
                let mut state = self.inner.lock();
                if state.finished {
                    return;
                }
                if state.pending == 0 {
                    state.finished = true;
                    Some(std::mem::take(&mut state.callbacks))
                } else {
                    None
                }
            };
            if let Some(callbacks) = ready {
                self.inner.fire(callbacks);
                return;
            }

            notified.await;
        }
    }

    /// Number of tokens not yet released.
    pub fn pending(&self) -> usize {
        self.inner.lock().pending
    }

    /// Whether the completion has fired.
    pub fn is_finished(&self) -> bool {
        self.inner.lock().finished
    }
}

/// One unit of pending work on a [`CompletionCoordinator`].
///
/// Released by [`CompletionToken::leave`] or on drop.
#[must_use = "dropping a token releases it immediately"]
pub struct CompletionToken {
    inner: Option<Arc<Inner>>,
}

impl CompletionToken {
    /// Release this unit of work.
    pub fn leave(self) {
        drop(self);
    }
}

impl Drop for CompletionToken {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            inner.leave();
        }
    }
}

impl std::fmt::Debug for CompletionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionToken")
            .field("detached", &self.inner.is_none())
            .finish()
    }
}
