//! Watch mode: regenerate the page whenever its source file changes.
//!
//! Three parts cooperate, each in its own submodule:
//!
//! - [`watcher`]: the **Change Watcher**, one OS notification handle bound to
//!   one file, feeding change events and backend faults over two channels.
//! - [`dispatch`]: the **Debounce & Dispatch Loop**, a small state machine
//!   that waits on those channels plus cancellation, coalesces bursts of
//!   writes and invokes the [`Pipeline`] once per settled burst.
//! - this module's [`start`] and [`run`]: the **Lifecycle Controller**, which
//!   opens the watcher, runs the loop and always releases the watcher before
//!   returning.
//!
//! ```text
//! editor save ──► notify ──► ChangeFeed ──► DispatchLoop ──► Pipeline::produce ──► output.html
//!                             (events,        │  ▲
//!                              faults)        │  └── CancelToken (Ctrl+C / SIGTERM)
//!                                             └──► WatchStatus ──► printer thread
//! ```
//!
//! ## Debouncing
//!
//! A qualifying event (a write, or the file appearing) arms a 100 ms timer;
//! every further qualifying event inside the window pushes the deadline back
//! another 100 ms. The pipeline runs once the file has been quiet for a full
//! window, so an editor that saves in several steps triggers one regeneration.
//!
//! ## Failure Model
//!
//! Only setup problems ([`WatchSetupError`]) end a session with an error.
//! Generation failures and watcher faults are reported as [`WatchStatus`]
//! events and the loop keeps going. Cancellation is a normal way to stop: a
//! generation already running finishes first, a pending timer is dropped.

mod cancel;
mod dispatch;
mod watcher;

pub use cancel::{CancelToken, install_interrupt_handler};
pub use dispatch::{DEBOUNCE, DispatchLoop, LoopState};
pub use watcher::{
    ChangeFeed, ChangeKind, RawChangeEvent, WatchSetupError, WatcherFault, WatcherHandle,
    classify, open,
};

use crate::generate::Pipeline;
use crate::types::RenderOptions;
use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc::Sender;

/// The fixed inputs of one watch run.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchSession {
    pub input: PathBuf,
    pub output: PathBuf,
    pub options: RenderOptions,
}

/// Why a pipeline invocation happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The unconditional run when the session starts.
    Initial,
    /// A settled burst of changes to the source file.
    Change,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    /// Both watcher channels closed.
    WatcherClosed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Cancelled => f.write_str("cancelled"),
            StopReason::WatcherClosed => f.write_str("watcher closed"),
        }
    }
}

/// Progress events emitted during a session, printed by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchStatus {
    Watching {
        input: PathBuf,
    },
    Regenerating,
    Generated {
        output: PathBuf,
        trigger: Trigger,
    },
    GenerationFailed {
        trigger: Trigger,
        error: String,
    },
    Fault {
        message: String,
    },
    Stopped(StopReason),
}

/// Watch `session.input` and regenerate `session.output` until stopped.
///
/// Blocks until `cancel` fires or the watcher goes away. The watcher is
/// released before this returns, on every path.
pub fn start<P: Pipeline + ?Sized>(
    session: &WatchSession,
    pipeline: &mut P,
    cancel: &CancelToken,
    status: Option<Sender<WatchStatus>>,
) -> Result<StopReason, WatchSetupError> {
    let handle = open(&session.input)?;
    Ok(run(handle, session, pipeline, cancel, status))
}

/// Run a session on a watcher that is already open.
///
/// Takes ownership of `handle` and closes it before returning. If the
/// pipeline panics, unwinding drops the handle, which closes it too.
pub fn run<P: Pipeline + ?Sized>(
    mut handle: WatcherHandle,
    session: &WatchSession,
    pipeline: &mut P,
    cancel: &CancelToken,
    status: Option<Sender<WatchStatus>>,
) -> StopReason {
    if let Some(tx) = &status {
        let _ = tx.send(WatchStatus::Watching {
            input: session.input.clone(),
        });
    }

    let feed = handle.feed();
    let mut dispatch = DispatchLoop::new(session, pipeline);
    if let Some(tx) = status {
        dispatch = dispatch.with_status(tx);
    }
    let reason = dispatch.run(&feed, cancel);
    tracing::debug!(
        dispatches = dispatch.dispatches(),
        %reason,
        "watch session finished"
    );

    handle.close();
    reason
}
