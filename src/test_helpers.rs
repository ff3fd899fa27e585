//! Shared test utilities for the june test suite.
//!
//! Provides a scriptable stand-in for the generation pipeline and small
//! helpers for the timing-sensitive watch tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let pipeline = CountingPipeline::new();
//! // hand a clone to the code under test, keep the original to observe it
//! assert!(wait_until(|| pipeline.calls() == 1));
//! ```

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::generate::{GenerateError, Pipeline};
use crate::types::RenderOptions;

// =========================================================================
// Fake pipeline
// =========================================================================

/// A [`Pipeline`] that only counts its invocations.
///
/// Clones share the counter and the failure switch, so a test can keep one
/// clone while the loop under test owns another.
#[derive(Debug, Clone, Default)]
pub struct CountingPipeline {
    calls: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
    delay: Duration,
}

impl CountingPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pipeline whose invocations take `delay` after being counted.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// A pipeline whose invocations fail until [`set_failing`](Self::set_failing)`(false)`.
    pub fn failing() -> Self {
        let pipeline = Self::new();
        pipeline.set_failing(true);
        pipeline
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Pipeline for CountingPipeline {
    fn produce(
        &mut self,
        input: &Path,
        _output: &Path,
        _options: &RenderOptions,
    ) -> Result<(), GenerateError> {
        let fail = self.failing.load(Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        if fail {
            return Err(GenerateError::ReadSource {
                path: input.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "scripted failure"),
            });
        }
        Ok(())
    }
}

// =========================================================================
// Timing
// =========================================================================

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
