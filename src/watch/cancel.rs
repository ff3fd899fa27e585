//! Cooperative cancellation for a watch session.
//!
//! A [`CancelToken`] is a one-way latch: once cancelled it stays cancelled.
//! Besides the flag it exposes a channel receiver that becomes ready the
//! moment the token is cancelled, so the dispatch loop can wait on
//! cancellation in the same `select!` as the watcher channels instead of
//! polling. No message is ever sent on that channel; cancelling drops the
//! only sender, and a disconnected receiver is ready forever after.

use crossbeam_channel::{Receiver, Sender, bounded};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::WatchSetupError;

#[derive(Debug, Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    cancelled: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    receiver: Receiver<()>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (trigger, receiver) = bounded(0);
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
                receiver,
            }),
        }
    }

    /// Raise cancellation. Later calls have no further effect.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        let sender = self
            .inner
            .trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(sender);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Ready (disconnected) once the token has been cancelled.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.inner.receiver
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancel `token` on Ctrl+C or SIGTERM.
///
/// Can only be installed once per process.
pub fn install_interrupt_handler(token: &CancelToken) -> Result<(), WatchSetupError> {
    let token = token.clone();
    ctrlc::set_handler(move || {
        tracing::info!("interrupt received, stopping watch session");
        token.cancel();
    })?;
    Ok(())
}
