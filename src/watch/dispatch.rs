//! The debounce & dispatch loop.
//!
//! ```text
//!          qualifying event              deadline passes
//!  Idle ─────────────────────► Pending ─────────────────► Dispatching ──► Idle
//!   ▲                           │  ▲                                      │
//!   │                           └──┘ qualifying event: deadline = now+100ms
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!  any state ── cancel / both channels closed ──► Stopped
//! ```
//!
//! One `select!` waits on cancellation, change events, watcher faults and the
//! debounce timer, and handles exactly one of them per wake-up. The timer is
//! `never()` unless a dispatch is pending. The pipeline is called on the loop
//! thread itself, so invocations can never overlap.

use crossbeam_channel::{Receiver, at, never, select};
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use super::cancel::CancelToken;
use super::watcher::{ChangeFeed, RawChangeEvent, WatcherFault};
use super::{StopReason, Trigger, WatchSession, WatchStatus};
use crate::generate::Pipeline;

/// How long the source must stay quiet before it is regenerated.
pub const DEBOUNCE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Pending { deadline: Instant },
    Dispatching,
    Stopped(StopReason),
}

pub struct DispatchLoop<'a, P: Pipeline + ?Sized> {
    session: &'a WatchSession,
    pipeline: &'a mut P,
    status: Option<Sender<WatchStatus>>,
    debounce: Duration,
    state: LoopState,
    dispatches: usize,
}

impl<'a, P: Pipeline + ?Sized> DispatchLoop<'a, P> {
    pub fn new(session: &'a WatchSession, pipeline: &'a mut P) -> Self {
        Self {
            session,
            pipeline,
            status: None,
            debounce: DEBOUNCE,
            state: LoopState::Idle,
            dispatches: 0,
        }
    }

    /// Report progress on `tx` as well as through `tracing`.
    pub fn with_status(mut self, tx: Sender<WatchStatus>) -> Self {
        self.status = Some(tx);
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Pipeline invocations so far, including the initial one.
    pub fn dispatches(&self) -> usize {
        self.dispatches
    }

    /// Generate once, then regenerate on every settled burst of changes.
    ///
    /// Returns when `cancel` fires or both channels of `feed` are closed.
    pub fn run(&mut self, feed: &ChangeFeed, cancel: &CancelToken) -> StopReason {
        self.dispatch(Trigger::Initial);
        let reason = self.wait_loop(feed, cancel);
        self.state = LoopState::Stopped(reason);
        self.emit(WatchStatus::Stopped(reason));
        reason
    }

    fn wait_loop(&mut self, feed: &ChangeFeed, cancel: &CancelToken) -> StopReason {
        let closed_events: Receiver<RawChangeEvent> = never();
        let closed_faults: Receiver<WatcherFault> = never();
        let mut events_open = true;
        let mut faults_open = true;

        loop {
            if cancel.is_cancelled() {
                return StopReason::Cancelled;
            }
            if !events_open && !faults_open {
                if let LoopState::Pending { .. } = self.state {
                    tracing::debug!("watcher closed with a regeneration pending, dropping it");
                }
                return StopReason::WatcherClosed;
            }

            let events = if events_open { &feed.events } else { &closed_events };
            let faults = if faults_open { &feed.faults } else { &closed_faults };
            let timer = match self.state {
                LoopState::Pending { deadline } => at(deadline),
                _ => never(),
            };

            select! {
                recv(cancel.receiver()) -> _ => return StopReason::Cancelled,
                recv(events) -> msg => match msg {
                    Ok(event) => self.on_event(&event, Instant::now()),
                    Err(_) => {
                        tracing::debug!("change event channel closed");
                        events_open = false;
                    }
                },
                recv(faults) -> msg => match msg {
                    Ok(fault) => self.on_fault(fault),
                    Err(_) => {
                        tracing::debug!("watcher fault channel closed");
                        faults_open = false;
                    }
                },
                recv(timer) -> _ => {
                    if cancel.is_cancelled() {
                        return StopReason::Cancelled;
                    }
                    self.dispatch(Trigger::Change);
                }
            }
        }
    }

    /// Arm or push back the debounce timer for a qualifying event.
    ///
    /// Only called between dispatches, so the loop is either `Idle` or
    /// `Pending` here. Events that arrive while the pipeline runs wait in the
    /// channel and arm a fresh window once it returns.
    fn on_event(&mut self, event: &RawChangeEvent, now: Instant) {
        if !event.kind.qualifies() {
            tracing::trace!(path = %event.path.display(), kind = ?event.kind, "ignoring change");
            return;
        }
        if let LoopState::Pending { .. } = self.state {
            tracing::debug!(kind = ?event.kind, "change during debounce window, resetting timer");
        } else {
            tracing::debug!(path = %event.path.display(), kind = ?event.kind, "change detected");
        }
        self.state = LoopState::Pending {
            deadline: now + self.debounce,
        };
    }

    fn on_fault(&mut self, fault: WatcherFault) {
        tracing::debug!(error = %fault, "watcher fault");
        self.emit(WatchStatus::Fault {
            message: fault.message,
        });
    }

    fn dispatch(&mut self, trigger: Trigger) {
        self.state = LoopState::Dispatching;
        if trigger == Trigger::Change {
            self.emit(WatchStatus::Regenerating);
        }

        let session = self.session;
        let result = self
            .pipeline
            .produce(&session.input, &session.output, &session.options);
        self.dispatches += 1;

        match result {
            Ok(()) => {
                tracing::debug!(output = %session.output.display(), ?trigger, "page generated");
                self.emit(WatchStatus::Generated {
                    output: session.output.clone(),
                    trigger,
                });
            }
            Err(err) => {
                tracing::debug!(error = %err, ?trigger, "generation failed");
                self.emit(WatchStatus::GenerationFailed {
                    trigger,
                    error: err.to_string(),
                });
            }
        }
        self.state = LoopState::Idle;
    }

    fn emit(&self, status: WatchStatus) {
        if let Some(tx) = &self.status {
            // The printer may already be gone during shutdown.
            let _ = tx.send(status);
        }
    }
}
