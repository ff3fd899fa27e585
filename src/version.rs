//! Build-time version information.
//!
//! `build.rs` injects the short commit hash, the commit date and whether
//! HEAD sits exactly on a release tag. Release builds report the crate
//! version; everything else reports `dev`.

const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
const GIT_HASH: &str = env!("GIT_HASH");
const GIT_COMMIT_DATE: &str = env!("GIT_COMMIT_DATE");
const ON_RELEASE_TAG: &str = env!("ON_RELEASE_TAG");

/// `june version 0.3.0 - commit 1a2b3c4 (built at 2024-05-01)`
pub fn version_string() -> String {
    format_version(
        ON_RELEASE_TAG == "true",
        PKG_VERSION,
        GIT_HASH,
        GIT_COMMIT_DATE,
    )
}

fn format_version(on_tag: bool, pkg_version: &str, hash: &str, date: &str) -> String {
    let version = if on_tag { pkg_version } else { "dev" };
    let hash = if hash.is_empty() { "none" } else { hash };
    let date = if date.is_empty() { "unknown" } else { date };
    format!("june version {version} - commit {hash} (built at {date})")
}
