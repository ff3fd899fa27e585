//! Diagnostic logging.
//!
//! Status lines the user is meant to read go through [`crate::output`].
//! This module only wires up [`tracing`] for diagnostics: watcher setup,
//! debounce decisions, template fallbacks. Output goes to stderr so it never
//! mixes with the status lines on stdout.
//!
//! # Environment Variable
//!
//! `RUST_LOG` takes precedence over the `[logging] level` config value:
//! ```bash
//! RUST_LOG=debug june generate notes.md --watch
//! RUST_LOG=june::watch=trace june generate notes.md --watch
//! ```

use std::sync::Once;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Initialize logging from configuration.
///
/// Call once at startup. Later calls have no effect.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = filter_for(config, std::env::var("RUST_LOG").ok().as_deref());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_filter(filter);

        // Something else may have installed a subscriber first (tests).
        let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
    });
}

/// Initialize logging with the default `warn` level.
pub fn init() {
    init_with_config(&LoggingConfig::default());
}

/// `RUST_LOG` directives when set and parseable, else the configured level.
fn filter_for(config: &LoggingConfig, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(&config.level))
}
