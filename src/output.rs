//! CLI output formatting.
//!
//! Everything `june` prints for a human to read goes through here. Each kind
//! of output has a `format_*` function that returns the text, pure and
//! testable, and a `print_*` wrapper that writes it to the right stream.
//!
//! # Output Format
//!
//! ## Generate
//!
//! ```text
//! Successfully wrote to public/index.html
//! ```
//!
//! ## Watch
//!
//! ```text
//! Watching notes.md for changes. Press Ctrl+C to stop.
//! Successfully wrote to public/index.html
//! File changed, regenerating...
//! Generation error: error decoding frontmatter: did not find expected node content at line 2 column 7
//! File changed, regenerating...
//! Successfully wrote to public/index.html
//! Stopped watching (cancelled)
//! ```
//!
//! Error lines (failed generations, watcher faults) go to stderr, the rest
//! to stdout.

use crate::watch::{Trigger, WatchStatus};
use std::path::Path;

/// Confirmation printed after every successful generation.
pub fn format_generated(output: &Path) -> String {
    format!("Successfully wrote to {}", output.display())
}

pub fn print_generated(output: &Path) {
    println!("{}", format_generated(output));
}

/// Whether a status line reports a problem.
pub fn is_error_status(status: &WatchStatus) -> bool {
    matches!(
        status,
        WatchStatus::GenerationFailed { .. } | WatchStatus::Fault { .. }
    )
}

pub fn format_watch_status(status: &WatchStatus) -> String {
    match status {
        WatchStatus::Watching { input } => format!(
            "Watching {} for changes. Press Ctrl+C to stop.",
            input.display()
        ),
        WatchStatus::Regenerating => "File changed, regenerating...".to_string(),
        WatchStatus::Generated { output, .. } => format_generated(output),
        WatchStatus::GenerationFailed {
            trigger: Trigger::Initial,
            error,
        } => format!("Initial generation error: {error}"),
        WatchStatus::GenerationFailed {
            trigger: Trigger::Change,
            error,
        } => format!("Generation error: {error}"),
        WatchStatus::Fault { message } => format!("Watcher error: {message}"),
        WatchStatus::Stopped(reason) => format!("Stopped watching ({reason})"),
    }
}

pub fn print_watch_status(status: &WatchStatus) {
    let line = format_watch_status(status);
    if is_error_status(status) {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watch::StopReason;
    use std::path::PathBuf;

    #[test]
    fn generated_line() {
        assert_eq!(
            format_generated(Path::new("public/index.html")),
            "Successfully wrote to public/index.html"
        );
    }

    #[test]
    fn watching_line() {
        let status = WatchStatus::Watching {
            input: PathBuf::from("notes.md"),
        };
        assert_eq!(
            format_watch_status(&status),
            "Watching notes.md for changes. Press Ctrl+C to stop."
        );
    }

    #[test]
    fn regenerating_line() {
        assert_eq!(
            format_watch_status(&WatchStatus::Regenerating),
            "File changed, regenerating..."
        );
    }

    #[test]
    fn generated_line_same_for_both_triggers() {
        for trigger in [Trigger::Initial, Trigger::Change] {
            let status = WatchStatus::Generated {
                output: PathBuf::from("out.html"),
                trigger,
            };
            assert_eq!(format_watch_status(&status), "Successfully wrote to out.html");
        }
    }

    #[test]
    fn failure_lines_name_the_trigger() {
        let initial = WatchStatus::GenerationFailed {
            trigger: Trigger::Initial,
            error: "boom".to_string(),
        };
        let change = WatchStatus::GenerationFailed {
            trigger: Trigger::Change,
            error: "boom".to_string(),
        };
        assert_eq!(format_watch_status(&initial), "Initial generation error: boom");
        assert_eq!(format_watch_status(&change), "Generation error: boom");
    }

    #[test]
    fn fault_line() {
        let status = WatchStatus::Fault {
            message: "queue overflow".to_string(),
        };
        assert_eq!(format_watch_status(&status), "Watcher error: queue overflow");
        assert!(is_error_status(&status));
    }

    #[test]
    fn stopped_lines() {
        assert_eq!(
            format_watch_status(&WatchStatus::Stopped(StopReason::Cancelled)),
            "Stopped watching (cancelled)"
        );
        assert_eq!(
            format_watch_status(&WatchStatus::Stopped(StopReason::WatcherClosed)),
            "Stopped watching (watcher closed)"
        );
    }

    #[test]
    fn only_failures_are_errors() {
        assert!(!is_error_status(&WatchStatus::Regenerating));
        assert!(!is_error_status(&WatchStatus::Stopped(StopReason::Cancelled)));
    }
}
