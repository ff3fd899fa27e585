//! # june
//!
//! A super simple static page generator: one Markdown file in, one
//! standalone HTML page out. Optionally keeps watching the source and
//! regenerates the page every time it is saved.
//!
//! # Architecture: One Pass, Optionally Repeated
//!
//! ```text
//! notes.md ──► markdown ──► sanitize ──► template ──► public/index.html
//!              (frontmatter  (--ugc only)  (style +
//!               + HTML)                     page)
//! ```
//!
//! A single `june generate notes.md` runs that pass once. With `--watch` the
//! same pass runs once up front and then again after every settled burst of
//! changes to the source, until Ctrl+C.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`generate`] | `produce()`: read, render, write atomically; the [`generate::Pipeline`] trait |
//! | [`markdown`] | YAML frontmatter extraction and Markdown → HTML with heading anchors |
//! | [`sanitize`] | Allow-list HTML cleaning for untrusted content |
//! | [`template`] | Stylesheet and page template loading, embedded defaults |
//! | [`watch`] | Change watcher, debounce & dispatch loop, cancellation |
//! | [`config`] | Optional `june.toml` defaults, merging and validation |
//! | [`types`] | Shared types (`PageMeta`, `RenderOptions`) |
//! | [`output`] | CLI output formatting: status lines for generate and watch |
//! | [`logging`] | `tracing` diagnostics on stderr |
//! | [`version`] | Build-injected version string |
//!
//! # Design Decisions
//!
//! ## Whole-Page Regeneration
//!
//! Watch mode never patches the output. Every trigger re-reads the source and
//! rewrites the entire page. A page is one file, so there is nothing to gain
//! from incremental rendering, and the output is always exactly what a fresh
//! `june generate` would produce.
//!
//! ## Never Half-Written
//!
//! The page is written to a temporary file in the output directory and
//! renamed over the old one. A generation that fails at any step, including
//! the write itself, leaves the previous page byte-for-byte intact. In watch
//! mode a typo in the frontmatter costs nothing but an error line.
//!
//! ## Maud for the Embedded Page
//!
//! The built-in page is written with [Maud](https://maud.lambda.xyz/), so its
//! markup is checked at compile time and every metadata value is escaped.
//! User templates use plain `{{ name }}` placeholders instead; they are read
//! at runtime and should not need a template language to write.
//!
//! ## Channels, Not Async
//!
//! The watch loop is a single thread blocked in a `crossbeam_channel::select!`
//! over change events, watcher faults, a cancel signal and the debounce
//! timer. The pipeline is synchronous and runs on that same thread, which
//! makes "never two generations at once" a structural property rather than
//! something guarded by a lock.

pub mod config;
pub mod generate;
pub mod logging;
pub mod markdown;
pub mod output;
pub mod sanitize;
pub mod template;
pub mod types;
pub mod version;
pub mod watch;

#[cfg(test)]
pub(crate) mod test_helpers;
