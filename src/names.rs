//! Tag and name utilities
//!
//! Helpers for namespace-qualified tags, reserved-name patterns and format
//! version strings.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

static VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+\.[0-9]+$").unwrap());

/// Separator between a namespace prefix and a local tag name
pub const NAMESPACE_SEPARATOR: char = ':';

/// Check if a tag carries a namespace prefix (`ignition:foo`)
pub fn is_namespaced(tag: &str) -> bool {
    tag.contains(NAMESPACE_SEPARATOR)
}

/// Split a qualified tag into prefix and local name
pub fn split_qname(tag: &str) -> (Option<&str>, &str) {
    if let Some((prefix, local)) = tag.split_once(NAMESPACE_SEPARATOR) {
        (Some(prefix), local)
    } else {
        (None, tag)
    }
}

/// Check if `name` is wrapped in `delimiter` on both ends.
///
/// The delimiters may not overlap, so with `__` the shortest match is
/// `____`.
pub fn is_delimited(name: &str, delimiter: &str) -> bool {
    !delimiter.is_empty()
        && name.len() >= 2 * delimiter.len()
        && name.starts_with(delimiter)
        && name.ends_with(delimiter)
}

/// Check if a string is a format version such as `1.7`
pub fn is_valid_version(version: &str) -> bool {
    VERSION.is_match(version)
}

/// Validate a format version string
pub fn validate_version(version: &str) -> Result<()> {
    if is_valid_version(version) {
        Ok(())
    } else {
        Err(Error::UnsupportedVersion(version.to_string()))
    }
}

/// Compare two version strings numerically (`1.10` sorts after `1.9`)
pub fn compare_versions(a: &str, b: &str) -> std::cmp::Ordering {
    fn parts(v: &str) -> Vec<u32> {
        v.split('.').map(|p| p.parse().unwrap_or(0)).collect()
    }
    parts(a).cmp(&parts(b))
}
