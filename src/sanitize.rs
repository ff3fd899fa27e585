//! HTML sanitizing for untrusted Markdown.
//!
//! Rendered Markdown may carry raw HTML, so content from people you do not
//! trust (comments, submissions, wiki edits) is run through an
//! [ammonia](https://docs.rs/ammonia) allow-list before it reaches the page.
//! The policy is aimed at user-generated content: formatting, links, images
//! and tables survive; scripts, event handlers, inline styles, forms and
//! frames do not.

use ammonia::Builder;

const HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Strip everything from `html` that is unsafe to publish.
///
/// Heading `id`s are kept so the generated anchors keep working, and every
/// link is marked `nofollow` to discourage link spam.
pub fn clean_untrusted(html: &str) -> String {
    let mut builder = Builder::default();
    for tag in HEADING_TAGS {
        builder.add_tag_attributes(tag, &["id"]);
    }
    builder.link_rel(Some("nofollow noopener noreferrer"));
    builder.clean(html).to_string()
}
