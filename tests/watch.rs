//! End-to-end watch sessions against the real filesystem.
//!
//! These use the platform's notification backend, so timings are generous:
//! every wait polls with a multi-second ceiling and only the final counts
//! are asserted.

mod common;

use common::{Counted, Panicking, feed_disconnected, wait_until};
use june::types::RenderOptions;
use june::watch::{self, CancelToken, StopReason, WatchSession, WatchStatus};
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn session(dir: &Path, name: &str, contents: &str) -> WatchSession {
    let input = dir.join(name);
    fs::write(&input, contents).unwrap();
    WatchSession {
        input,
        output: dir.join("public/index.html"),
        options: RenderOptions::default(),
    }
}

struct Running {
    handle: thread::JoinHandle<Result<StopReason, watch::WatchSetupError>>,
    status: mpsc::Receiver<WatchStatus>,
}

fn spawn(session: &WatchSession, pipeline: &Counted, cancel: &CancelToken) -> Running {
    let session = session.clone();
    let mut pipeline = pipeline.clone();
    let cancel = cancel.clone();
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || watch::start(&session, &mut pipeline, &cancel, Some(tx)));
    Running { handle, status: rx }
}

/// Block until the session reports it is watching and has generated once.
fn wait_ready(running: &Running, pipeline: &Counted) {
    let first = running
        .status
        .recv_timeout(Duration::from_secs(5))
        .unwrap();
    assert!(matches!(first, WatchStatus::Watching { .. }));
    assert!(wait_until(|| pipeline.calls() == 1));
}

#[test]
fn burst_of_writes_regenerates_once() {
    let tmp = TempDir::new().unwrap();
    let session = session(tmp.path(), "a.md", "# Draft\n");
    let pipeline = Counted::default();
    let cancel = CancelToken::new();
    let running = spawn(&session, &pipeline, &cancel);
    wait_ready(&running, &pipeline);

    for n in 0..3 {
        fs::write(&session.input, format!("# Version {n}\n")).unwrap();
        thread::sleep(Duration::from_millis(10));
    }
    assert!(wait_until(|| pipeline.calls() >= 2));
    thread::sleep(Duration::from_millis(600));
    cancel.cancel();

    let reason = running.handle.join().unwrap().unwrap();
    assert_eq!(reason, StopReason::Cancelled);
    assert_eq!(pipeline.calls(), 2);

    let html = fs::read_to_string(&session.output).unwrap();
    assert!(html.contains("Version 2"));
}

#[test]
fn cancel_immediately_generates_once() {
    let tmp = TempDir::new().unwrap();
    let session = session(tmp.path(), "b.md", "# Hello\n");
    let pipeline = Counted::default();
    let cancel = CancelToken::new();
    let running = spawn(&session, &pipeline, &cancel);
    cancel.cancel();

    let reason = running.handle.join().unwrap().unwrap();
    assert_eq!(reason, StopReason::Cancelled);
    assert_eq!(pipeline.calls(), 1);
    assert!(session.output.is_file());
}

#[test]
fn failed_regeneration_keeps_previous_page() {
    let tmp = TempDir::new().unwrap();
    let session = session(tmp.path(), "c.md", "---\ntitle: Good\n---\n# Good\n");
    let pipeline = Counted::default();
    let cancel = CancelToken::new();
    let running = spawn(&session, &pipeline, &cancel);
    wait_ready(&running, &pipeline);
    let before = fs::read(&session.output).unwrap();

    fs::write(&session.input, "---\ntags: [broken\n---\n# Bad\n").unwrap();
    assert!(wait_until(|| pipeline.calls() >= 2));
    assert_eq!(fs::read(&session.output).unwrap(), before);

    fs::write(&session.input, "---\ntitle: Fixed\n---\n# Fixed\n").unwrap();
    assert!(wait_until(|| {
        fs::read_to_string(&session.output)
            .map(|html| html.contains("<title>Fixed</title>"))
            .unwrap_or(false)
    }));
    cancel.cancel();

    running.handle.join().unwrap().unwrap();
    let statuses: Vec<_> = running.status.try_iter().collect();
    assert!(statuses.iter().any(|s| matches!(
        s,
        WatchStatus::GenerationFailed { error, .. } if error.starts_with("error decoding frontmatter")
    )));
    assert_eq!(
        statuses.last(),
        Some(&WatchStatus::Stopped(StopReason::Cancelled))
    );
}

#[test]
fn rename_over_source_is_picked_up() {
    let tmp = TempDir::new().unwrap();
    let session = session(tmp.path(), "d.md", "# Before\n");
    let pipeline = Counted::default();
    let cancel = CancelToken::new();
    let running = spawn(&session, &pipeline, &cancel);
    wait_ready(&running, &pipeline);

    let swap = tmp.path().join(".d.md.swp");
    fs::write(&swap, "# After\n").unwrap();
    fs::rename(&swap, &session.input).unwrap();

    assert!(wait_until(|| {
        fs::read_to_string(&session.output)
            .map(|html| html.contains("After"))
            .unwrap_or(false)
    }));
    cancel.cancel();
    running.handle.join().unwrap().unwrap();
}

#[test]
fn watcher_is_released_after_session_returns() {
    let tmp = TempDir::new().unwrap();
    let session = session(tmp.path(), "e.md", "# Hello\n");
    let handle = watch::open(&session.input).unwrap();
    let feed = handle.feed();
    let pipeline = Counted::default();
    let cancel = CancelToken::new();

    let worker = {
        let session = session.clone();
        let mut pipeline = pipeline.clone();
        let cancel = cancel.clone();
        thread::spawn(move || watch::run(handle, &session, &mut pipeline, &cancel, None))
    };
    assert!(wait_until(|| pipeline.calls() == 1));
    cancel.cancel();

    assert_eq!(worker.join().unwrap(), StopReason::Cancelled);
    assert!(feed_disconnected(&feed));
}

#[test]
fn watcher_is_released_when_pipeline_panics() {
    let tmp = TempDir::new().unwrap();
    let session = session(tmp.path(), "f.md", "# Hello\n");
    let handle = watch::open(&session.input).unwrap();
    let feed = handle.feed();
    let cancel = CancelToken::new();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        watch::run(handle, &session, &mut Panicking, &cancel, None)
    }));

    assert!(result.is_err());
    assert!(feed_disconnected(&feed));
}

#[test]
fn source_can_be_watched_again_after_start_returns() {
    let tmp = TempDir::new().unwrap();
    let session = session(tmp.path(), "g.md", "# Hello\n");
    let pipeline = Counted::default();

    for round in 1..=2 {
        let cancel = CancelToken::new();
        let running = spawn(&session, &pipeline, &cancel);
        assert!(wait_until(|| pipeline.calls() == round));
        cancel.cancel();
        running.handle.join().unwrap().unwrap();
    }

    let mut handle = watch::open(&session.input).unwrap();
    let feed = handle.feed();
    assert!(handle.close());
    assert!(feed_disconnected(&feed));
}

#[test]
fn missing_source_is_a_setup_error() {
    let tmp = TempDir::new().unwrap();
    let session = WatchSession {
        input: tmp.path().join("missing.md"),
        output: tmp.path().join("out.html"),
        options: RenderOptions::default(),
    };
    let mut pipeline = Counted::default();
    let cancel = CancelToken::new();

    let err = watch::start(&session, &mut pipeline, &cancel, None).unwrap_err();
    assert!(err.to_string().contains("missing.md"));
    assert_eq!(pipeline.calls(), 0);
    assert!(!session.output.exists());
}
