use std::path::PathBuf;

use crate::errors::PathError;

const SEPARATORS: [char; 2] = ['\\', '/'];

pub fn remove_prefix<'a>(path: &'a str, prefix: &str) -> Result<&'a str, PathError> {
    path.strip_prefix(prefix)
        .ok_or_else(|| PathError::MissingPrefix {
            path: path.to_owned(),
            prefix: prefix.to_owned(),
        })
}

/// Path of `full` relative to `source`, e.g. `202301_a\IMG_1694.JPG`.
///
/// Only the textual prefix and a single leading separator are removed; case and
/// separators are left as the namespace reported them.
pub fn relative_path<'a>(full: &'a str, source: &str) -> Result<&'a str, PathError> {
    let rest = remove_prefix(full, source)?;
    Ok(rest.strip_prefix(SEPARATORS).unwrap_or(rest))
}

/// Display path segments, splitting on either separator and dropping empty ones.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATORS).filter(|s| !s.is_empty())
}

/// Converts a recorded relative path into a host path.
pub fn to_host_path(relative: &str) -> PathBuf {
    segments(relative).collect()
}
