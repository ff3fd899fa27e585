//! Page generation.
//!
//! Ties the stages together: one call to [`produce`] reads the Markdown
//! source and writes one standalone HTML page.
//!
//! ```text
//! notes.md ──► markdown::parse ──► sanitize (untrusted only) ──► template ──► public/index.html
//!              (meta + HTML)                                     (+ style)
//! ```
//!
//! ## Failure Behaviour
//!
//! Every failure (unreadable source, bad frontmatter, broken template,
//! unwritable output) comes back as a [`GenerateError`]; nothing here exits
//! the process. The page is first written to a temporary file next to the
//! output and then renamed over it, so a run that fails part-way leaves the
//! previous output exactly as it was.
//!
//! ## Repeated Calls
//!
//! [`produce`] keeps no state between calls. The watch loop calls it through
//! the [`Pipeline`] trait, which lets tests substitute a counting or failing
//! implementation.

use crate::markdown::{self, MarkdownError};
use crate::sanitize;
use crate::template::{self, Page, TemplateError};
use crate::types::RenderOptions;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("failed to read {}: {source}", path.display())]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Markdown(#[from] MarkdownError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Something that can turn the watched source into an output page.
///
/// Implementations must be callable any number of times and must report
/// failure through the returned error rather than panicking or exiting.
pub trait Pipeline {
    fn produce(
        &mut self,
        input: &Path,
        output: &Path,
        options: &RenderOptions,
    ) -> Result<(), GenerateError>;
}

/// The real pipeline: Markdown in, HTML page out.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlPipeline;

impl Pipeline for HtmlPipeline {
    fn produce(
        &mut self,
        input: &Path,
        output: &Path,
        options: &RenderOptions,
    ) -> Result<(), GenerateError> {
        produce(input, output, options)
    }
}

/// Generate the HTML page for `input` and write it to `output`.
pub fn produce(input: &Path, output: &Path, options: &RenderOptions) -> Result<(), GenerateError> {
    let source = fs::read_to_string(input).map_err(|source| GenerateError::ReadSource {
        path: input.to_path_buf(),
        source,
    })?;

    let html = render_page(&source, options)?;
    write_atomically(output, html.as_bytes())
}

/// Render a source document to a complete page without touching the output.
pub fn render_page(source: &str, options: &RenderOptions) -> Result<String, GenerateError> {
    let (meta, mut content) = markdown::parse(source)?;
    if options.untrusted {
        content = sanitize::clean_untrusted(&content);
    }

    let style = template::load_style(options.style.as_deref())?;
    let page_template = template::load_template(options.template.as_deref())?;

    Ok(page_template.render(&Page {
        meta: &meta,
        content: &content,
        style: &style,
    }))
}

/// Write `contents` to `path` via a temporary sibling file and a rename.
///
/// Missing parent directories are created first.
fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), GenerateError> {
    let write_err = |source: std::io::Error| GenerateError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(contents).map_err(write_err)?;
    set_page_permissions(tmp.as_file(), path).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Temp files are created owner-only; a published page must be world-readable.
///
/// An existing output keeps its mode, a new one gets `0644`.
#[cfg(unix)]
fn set_page_permissions(file: &fs::File, path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = match fs::metadata(path) {
        Ok(existing) => existing.permissions().mode() & 0o7777,
        Err(_) => PAGE_MODE,
    };
    file.set_permissions(fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_page_permissions(_file: &fs::File, _path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(unix)]
const PAGE_MODE: u32 = 0o644;
