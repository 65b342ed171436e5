//! Picks a free sibling path when a copy would land on its own source.

use std::path::{Path, PathBuf};

/// Marker inserted between the base name and the extension ("copy").
pub const COPY_MARKER: &str = "副本";

/// Returns the first of `base(副本)ext`, `base(副本1)ext`, `base(副本2)ext`, ...
/// that does not exist next to `target`.
///
/// This is a sequential existence check, so a concurrent writer can still
/// claim the returned path before the caller uses it.
pub fn allocate_copy_destination(target: &Path) -> PathBuf {
    let parent = target.parent().unwrap_or_else(|| Path::new(""));
    let (base, ext) = split_name(target);

    let mut index: u64 = 0;
    loop {
        let candidate = parent.join(copy_name(&base, &ext, index));
        if candidate.symlink_metadata().is_err() {
            tracing::debug!("Allocated copy destination {}", candidate.display());
            return candidate;
        }
        index += 1;
    }
}

/// The name of the `index`-th attempt; the zeroth attempt carries no numeral.
pub fn copy_name(base: &str, ext: &str, index: u64) -> String {
    if index == 0 {
        format!("{base}({COPY_MARKER}){ext}")
    } else {
        format!("{base}({COPY_MARKER}{index}){ext}")
    }
}

/// Splits a file name into stem and dotted extension (`("report", ".pdf")`).
/// Dotfiles such as `.profile` have no extension.
fn split_name(path: &Path) -> (String, String) {
    let base = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (base, ext)
}
