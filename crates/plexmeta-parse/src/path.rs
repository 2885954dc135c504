//! Separator-agnostic path slicing.
//!
//! Catalog paths come from whatever OS the media server runs on, so they are
//! handled as plain strings rather than `std::path::Path`.

/// The separator used by `path`: `\` if it contains one, otherwise `/`.
pub fn separator(path: &str) -> char {
    if path.contains('\\') {
        '\\'
    } else {
        '/'
    }
}

/// Final segment of `path` (the whole string when it has no separator).
pub fn file_name(path: &str) -> &str {
    let sep = separator(path);
    match path.rfind(sep) {
        Some(idx) => &path[idx + sep.len_utf8()..],
        None => path,
    }
}

/// Everything before the final separator, or `None` without one.
pub fn parent_dir(path: &str) -> Option<&str> {
    let sep = separator(path);
    path.rfind(sep).map(|idx| &path[..idx])
}

/// Name of the directory directly containing the file at `path`.
pub fn containing_dir_name(path: &str) -> Option<&str> {
    let parent = parent_dir(path)?;
    let name = file_name(parent);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}
