//! The change watcher: one OS notification handle bound to one file.
//!
//! [`open`] resolves the file, registers a [notify](https://docs.rs/notify)
//! watcher on its parent directory (non-recursive) and forwards only the
//! notifications that concern the file itself. Watching the directory rather
//! than the file keeps the session alive across editors that save by writing
//! a temporary file and renaming it over the original, which replaces the
//! inode a file-level watch would be attached to.
//!
//! Notifications and backend errors travel on two separate
//! [crossbeam](https://docs.rs/crossbeam-channel) channels bundled as a
//! [`ChangeFeed`]. Both channels disconnect once the handle is closed.

use crossbeam_channel::{Receiver, unbounded};
use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchSetupError {
    #[error("cannot watch {}: {source}", path.display())]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to initialize file watcher: {0}")]
    Init(#[source] notify::Error),
    #[error("failed to add {} to watcher: {source}", path.display())]
    Register {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
    #[error("failed to install interrupt handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

/// What happened to the watched file, as far as regeneration cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// File contents were written.
    Write,
    /// The file appeared, including by being renamed into place.
    Create,
    /// Anything else: reads, metadata, removal.
    Other,
}

impl ChangeKind {
    /// Whether this kind of change should trigger a regeneration.
    pub fn qualifies(self) -> bool {
        matches!(self, ChangeKind::Write | ChangeKind::Create)
    }
}

/// A single change notification for the watched file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// An error reported by the notification backend while watching.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct WatcherFault {
    pub message: String,
}

impl WatcherFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<notify::Error> for WatcherFault {
    fn from(err: notify::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// The receiving ends of a watcher's two channels.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    pub events: Receiver<RawChangeEvent>,
    pub faults: Receiver<WatcherFault>,
}

/// An open watch on one file. Closing (or dropping) releases the OS handle.
pub struct WatcherHandle {
    watcher: Option<RecommendedWatcher>,
    path: PathBuf,
    feed: ChangeFeed,
}

impl fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .finish()
    }
}

impl WatcherHandle {
    /// Canonical path of the watched file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn feed(&self) -> ChangeFeed {
        self.feed.clone()
    }

    pub fn is_open(&self) -> bool {
        self.watcher.is_some()
    }

    /// Release the OS watch handle.
    ///
    /// Returns `true` if this call released it and `false` if it was
    /// already closed, so calling it more than once is harmless.
    pub fn close(&mut self) -> bool {
        match self.watcher.take() {
            Some(watcher) => {
                drop(watcher);
                tracing::debug!(path = %self.path.display(), "watcher closed");
                true
            }
            None => false,
        }
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// Start watching the file at `path`.
pub fn open(path: &Path) -> Result<WatcherHandle, WatchSetupError> {
    let path_err = |source: std::io::Error| WatchSetupError::Path {
        path: path.to_path_buf(),
        source,
    };

    let target = path.canonicalize().map_err(path_err)?;
    if !target.is_file() {
        return Err(path_err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }
    let dir = target
        .parent()
        .ok_or_else(|| {
            path_err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "file has no parent directory",
            ))
        })?
        .to_path_buf();

    let (event_tx, event_rx) = unbounded();
    let (fault_tx, fault_rx) = unbounded();

    let filter_target = target.clone();
    let mut watcher =
        notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
            Ok(event) => {
                for (index, event_path) in event.paths.into_iter().enumerate() {
                    if event_path != filter_target {
                        continue;
                    }
                    let kind = classify(&event.kind, index);
                    let _ = event_tx.send(RawChangeEvent {
                        path: event_path,
                        kind,
                    });
                }
            }
            Err(err) => {
                let _ = fault_tx.send(WatcherFault::from(err));
            }
        })
        .map_err(WatchSetupError::Init)?;

    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .map_err(|source| WatchSetupError::Register {
            path: dir.clone(),
            source,
        })?;

    tracing::debug!(path = %target.display(), dir = %dir.display(), "watcher opened");

    Ok(WatcherHandle {
        watcher: Some(watcher),
        path: target,
        feed: ChangeFeed {
            events: event_rx,
            faults: fault_rx,
        },
    })
}

/// Map a backend event kind onto [`ChangeKind`].
///
/// `index` is the position of the path within the event: a paired rename
/// lists the old name first and the new name second, and only the new name
/// counts as the file appearing.
pub fn classify(kind: &EventKind, index: usize) -> ChangeKind {
    match kind {
        EventKind::Create(_) => ChangeKind::Create,
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any | ModifyKind::Other) => {
            ChangeKind::Write
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Any)) => {
            ChangeKind::Create
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if index == 1 => ChangeKind::Create,
        _ => ChangeKind::Other,
    }
}
