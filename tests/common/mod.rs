//! Helpers shared by the integration tests.

#![allow(dead_code)]

use crossbeam_channel::RecvTimeoutError;
use june::generate::{GenerateError, HtmlPipeline, Pipeline};
use june::types::RenderOptions;
use june::watch::ChangeFeed;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// The real pipeline, plus a shared invocation counter.
#[derive(Clone, Default)]
pub struct Counted {
    calls: Arc<AtomicUsize>,
}

impl Counted {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Pipeline for Counted {
    fn produce(
        &mut self,
        input: &Path,
        output: &Path,
        options: &RenderOptions,
    ) -> Result<(), GenerateError> {
        let result = HtmlPipeline.produce(input, output, options);
        self.calls.fetch_add(1, Ordering::SeqCst);
        result
    }
}

/// A pipeline that panics on every call.
pub struct Panicking;

impl Pipeline for Panicking {
    fn produce(
        &mut self,
        _input: &Path,
        _output: &Path,
        _options: &RenderOptions,
    ) -> Result<(), GenerateError> {
        panic!("pipeline blew up");
    }
}

/// Poll `condition` until it holds or five seconds pass.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// Drain `feed` and report whether its event channel has been disconnected.
///
/// The channel only disconnects once the OS watcher behind it is gone, so
/// this fails for a handle that was leaked instead of closed.
pub fn feed_disconnected(feed: &ChangeFeed) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        match feed.events.recv_timeout(Duration::from_millis(100)) {
            Ok(_) => continue,
            Err(RecvTimeoutError::Disconnected) => return true,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }
    false
}
