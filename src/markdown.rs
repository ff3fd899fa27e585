//! Markdown to HTML conversion.
//!
//! The first stage of the generation pipeline. A source document is split
//! into an optional YAML frontmatter block and a Markdown body; the
//! frontmatter becomes [`PageMeta`] and the body is rendered to an HTML
//! fragment with [pulldown-cmark](https://docs.rs/pulldown-cmark).
//!
//! ## Frontmatter
//!
//! ```text
//! ---
//! title: Notes
//! description: Things I wrote down
//! lang: fr
//! tags: [misc, notes]
//! ---
//! # Body starts here
//! ```
//!
//! The block must open on the very first line. It closes at the next line
//! consisting of `---` (or the YAML document end marker `...`). A document
//! whose opening fence is never closed is rendered as plain Markdown.
//!
//! ## Extensions
//!
//! Tables, strikethrough, task lists, footnotes, smart punctuation and
//! `{#id .class}` heading attributes are enabled. Raw HTML is passed through
//! untouched; the [`crate::sanitize`] stage deals with untrusted input.
//!
//! ## Heading IDs
//!
//! Headings without an explicit `{#id}` get one derived from their text
//! (`## Getting Started` → `id="getting-started"`), so every section is
//! linkable. Repeated slugs are numbered: `intro`, `intro-1`, `intro-2`.

use crate::types::{DEFAULT_LANG, PageMeta};
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarkdownError {
    #[error("error decoding frontmatter: {0}")]
    Frontmatter(#[from] serde_yaml::Error),
}

/// Parse a source document into its metadata and rendered HTML body.
pub fn parse(source: &str) -> Result<(PageMeta, String), MarkdownError> {
    let (frontmatter, body) = split_frontmatter(source);

    let mut meta = match frontmatter {
        Some(yaml) if !yaml.trim().is_empty() => serde_yaml::from_str::<PageMeta>(yaml)?,
        _ => PageMeta::default(),
    };
    if meta.lang.trim().is_empty() {
        meta.lang = DEFAULT_LANG.to_string();
    }

    Ok((meta, render_html(body)))
}

/// Split a leading `---` fenced block off the document.
///
/// Returns `(Some(yaml), body)` when a closed block is present, otherwise
/// `(None, source)`.
fn split_frontmatter(source: &str) -> (Option<&str>, &str) {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);

    let Some(first_end) = source.find('\n') else {
        return (None, source);
    };
    if source[..first_end].trim_end() != "---" {
        return (None, source);
    }

    let yaml_start = first_end + 1;
    let mut line_start = yaml_start;
    while line_start <= source.len() {
        let line_end = source[line_start..]
            .find('\n')
            .map(|i| line_start + i)
            .unwrap_or(source.len());
        let line = source[line_start..line_end].trim_end();
        if line == "---" || line == "..." {
            let body_start = (line_end + 1).min(source.len());
            return (Some(&source[yaml_start..line_start]), &source[body_start..]);
        }
        if line_end == source.len() {
            break;
        }
        line_start = line_end + 1;
    }

    (None, source)
}

fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_SMART_PUNCTUATION
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Render a Markdown body (no frontmatter) to an HTML fragment.
pub fn render_html(body: &str) -> String {
    let mut events: Vec<Event> = Parser::new_ext(body, markdown_options()).collect();
    assign_heading_ids(&mut events);

    let mut out = String::with_capacity(body.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    out
}

/// Fill in `id` for every heading that was not given one explicitly.
fn assign_heading_ids(events: &mut [Event]) {
    let mut ids = HeadingIds::default();
    for event in events.iter() {
        if let Event::Start(Tag::Heading { id: Some(id), .. }) = event {
            ids.reserve(id);
        }
    }

    // (index of the heading's Start event, text collected so far)
    let mut open: Option<(usize, String)> = None;
    for idx in 0..events.len() {
        let closes_heading = match &events[idx] {
            Event::Start(Tag::Heading { id: None, .. }) => {
                open = Some((idx, String::new()));
                false
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, heading_text)) = open.as_mut() {
                    heading_text.push_str(text);
                }
                false
            }
            Event::End(TagEnd::Heading(_)) => true,
            _ => false,
        };

        if !closes_heading {
            continue;
        }
        if let Some((start, heading_text)) = open.take() {
            let id = ids.assign(&slugify(&heading_text));
            if let Event::Start(Tag::Heading { id: slot, .. }) = &mut events[start] {
                *slot = Some(CowStr::from(id));
            }
        }
    }
}

/// Turn heading text into an anchor slug.
///
/// Alphanumerics are lower-cased, whitespace runs become a single `-`,
/// `-` and `_` are kept, everything else is dropped.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.trim().chars() {
        if c.is_whitespace() {
            pending_dash = true;
            continue;
        }
        if !(c.is_alphanumeric() || c == '-' || c == '_') {
            continue;
        }
        if pending_dash && !slug.is_empty() {
            slug.push('-');
        }
        pending_dash = false;
        slug.extend(c.to_lowercase());
    }
    slug
}

/// Tracks ids already used in the document.
#[derive(Default)]
struct HeadingIds {
    used: HashSet<String>,
}

impl HeadingIds {
    fn reserve(&mut self, id: &str) {
        self.used.insert(id.to_string());
    }

    fn assign(&mut self, slug: &str) -> String {
        let base = if slug.is_empty() { "heading" } else { slug };
        let mut candidate = base.to_string();
        let mut n = 0;
        while self.used.contains(&candidate) {
            n += 1;
            candidate = format!("{base}-{n}");
        }
        self.used.insert(candidate.clone());
        candidate
    }
}
