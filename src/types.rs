//! Shared types used across the generation pipeline.
//!
//! `PageMeta` flows from the markdown stage into the template stage;
//! `RenderOptions` is fixed for the lifetime of a generate call or a whole
//! watch session.

use serde::{Deserialize, Deserializer};
use std::path::PathBuf;

/// Language used when the frontmatter does not name one.
pub const DEFAULT_LANG: &str = "en";

/// Page metadata decoded from the YAML frontmatter block.
///
/// Every field is optional in the source document. Unknown keys are ignored
/// so frontmatter written for other tools still renders.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageMeta {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    /// Value of the `<html lang>` attribute. Never empty after parsing.
    #[serde(deserialize_with = "null_as_default")]
    pub lang: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

/// A key written with no value (`title:`) decodes as YAML null.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Default for PageMeta {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            lang: DEFAULT_LANG.to_string(),
            tags: Vec::new(),
        }
    }
}

/// Options that shape how a page is rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Treat the markdown as untrusted and sanitize the rendered HTML.
    pub untrusted: bool,
    /// CSS file to inline. `None` uses the embedded stylesheet.
    pub style: Option<PathBuf>,
    /// Page template. `None` uses the embedded template.
    pub template: Option<PathBuf>,
}
