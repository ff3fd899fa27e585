//! Stylesheet and page template loading.
//!
//! The last stage before writing: the rendered Markdown fragment, the page
//! metadata and a stylesheet are combined into one standalone HTML document.
//!
//! ## Embedded Defaults
//!
//! Without `--style` / `--template` the page is built from assets compiled
//! into the binary:
//! - `static/simple.css`: a readable single-column stylesheet
//! - the default page, written with [maud](https://maud.lambda.xyz/) so its
//!   markup is checked at compile time and metadata is escaped automatically
//!
//! A user-supplied path that does not exist falls back to the embedded asset
//! (with a warning). A path that exists but cannot be read or parsed is an
//! error, since silently ignoring a broken template would be surprising.
//!
//! ## Custom Templates
//!
//! A custom template is any text file containing `{{ name }}` placeholders:
//!
//! ```text
//! <!DOCTYPE html>
//! <html lang="{{ lang }}">
//! <head><title>{{ title }}</title><style>{{ style }}</style></head>
//! <body>{{ content }}</body>
//! </html>
//! ```
//!
//! | Placeholder | Value | Escaped |
//! |-------------|-------|---------|
//! | `title` | frontmatter `title` | yes |
//! | `description` | frontmatter `description` | yes |
//! | `lang` | frontmatter `lang` (default `en`) | yes |
//! | `tags` | frontmatter `tags`, comma separated | yes |
//! | `style` | stylesheet contents | no |
//! | `content` | rendered Markdown | no |
//!
//! Templates are parsed once when loaded; unknown placeholders and an
//! unterminated `{{` are reported with their byte offset.

use crate::types::PageMeta;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CSS_STATIC: &str = include_str!("../static/simple.css");

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid template {}: {source}", path.display())]
    Syntax {
        path: PathBuf,
        #[source]
        source: SyntaxError,
    },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("unterminated placeholder at byte {offset}")]
    Unterminated { offset: usize },
    #[error("unknown placeholder `{name}` at byte {offset}")]
    UnknownPlaceholder { name: String, offset: usize },
}

/// Everything a template needs to produce a page.
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    pub meta: &'a PageMeta,
    /// Rendered (and, if requested, sanitized) HTML body.
    pub content: &'a str,
    pub style: &'a str,
}

/// A loaded page template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Template {
    Embedded,
    Custom(CustomTemplate),
}

impl Template {
    pub fn render(&self, page: &Page) -> String {
        match self {
            Template::Embedded => render_default_page(page).into_string(),
            Template::Custom(custom) => custom.render(page),
        }
    }
}

/// A user template split into literal text and placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomTemplate {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(Slot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Title,
    Description,
    Lang,
    Tags,
    Style,
    Content,
}

impl Slot {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Slot::Title),
            "description" => Some(Slot::Description),
            "lang" => Some(Slot::Lang),
            "tags" => Some(Slot::Tags),
            "style" => Some(Slot::Style),
            "content" => Some(Slot::Content),
            _ => None,
        }
    }
}

impl CustomTemplate {
    pub fn parse(source: &str) -> Result<Self, SyntaxError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut consumed = 0;

        while let Some(open) = rest.find("{{") {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let offset = consumed + open;
            let after_open = &rest[open + 2..];
            let close = after_open
                .find("}}")
                .ok_or(SyntaxError::Unterminated { offset })?;

            let name = after_open[..close].trim();
            let slot = Slot::from_name(name).ok_or_else(|| SyntaxError::UnknownPlaceholder {
                name: name.to_string(),
                offset,
            })?;
            segments.push(Segment::Slot(slot));

            let advance = open + 2 + close + 2;
            consumed += advance;
            rest = &rest[advance..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { segments })
    }

    pub fn render(&self, page: &Page) -> String {
        let mut out = String::with_capacity(page.content.len() + page.style.len() + 1024);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(Slot::Title) => out.push_str(&escape(&page.meta.title)),
                Segment::Slot(Slot::Description) => {
                    out.push_str(&escape(&page.meta.description))
                }
                Segment::Slot(Slot::Lang) => out.push_str(&escape(&page.meta.lang)),
                Segment::Slot(Slot::Tags) => out.push_str(&escape(&page.meta.tags.join(", "))),
                Segment::Slot(Slot::Style) => out.push_str(page.style),
                Segment::Slot(Slot::Content) => out.push_str(page.content),
            }
        }
        out
    }
}

fn escape(text: &str) -> String {
    html! { (text) }.into_string()
}

/// Load the stylesheet at `path`, or the embedded one.
pub fn load_style(path: Option<&Path>) -> Result<String, TemplateError> {
    match existing(path, "stylesheet") {
        Some(path) => fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.to_path_buf(),
            source,
        }),
        None => Ok(CSS_STATIC.to_string()),
    }
}

/// Load and parse the template at `path`, or the embedded one.
pub fn load_template(path: Option<&Path>) -> Result<Template, TemplateError> {
    let Some(path) = existing(path, "template") else {
        return Ok(Template::Embedded);
    };
    let source = fs::read_to_string(path).map_err(|source| TemplateError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let custom = CustomTemplate::parse(&source).map_err(|source| TemplateError::Syntax {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Template::Custom(custom))
}

/// `Some(path)` when a path was given and exists on disk.
fn existing<'a>(path: Option<&'a Path>, what: &str) -> Option<&'a Path> {
    let path = path?;
    if path.exists() {
        Some(path)
    } else {
        tracing::warn!(
            "{what} {} not found, using the embedded {what}",
            path.display()
        );
        None
    }
}

/// The embedded page layout.
fn render_default_page(page: &Page) -> Markup {
    let meta = page.meta;
    html! {
        (DOCTYPE)
        html lang=(meta.lang) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (meta.title) }
                @if !meta.description.is_empty() {
                    meta name="description" content=(meta.description);
                }
                @if !meta.tags.is_empty() {
                    meta name="keywords" content=(meta.tags.join(", "));
                }
                style { (PreEscaped(page.style)) }
            }
            body {
                main {
                    article {
                        (PreEscaped(page.content))
                    }
                }
            }
        }
    }
}
