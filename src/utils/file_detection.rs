use crate::core::Entry;
use std::path::Path;

/// Extension of Windows shell shortcuts, compared case-insensitively.
const SHORTCUT_EXTENSION: &str = "lnk";

/// Determines if a name refers to a shell shortcut (`*.lnk`)
pub fn is_shortcut(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SHORTCUT_EXTENSION))
}

/// Human-readable kind column used by exports and the detail view.
pub fn kind_label(entry: &Entry) -> &'static str {
    if entry.is_directory() {
        "Folder"
    } else if is_shortcut(&entry.name) {
        "Folder shortcut"
    } else {
        "File"
    }
}

/// Icon shown in front of a name in the rendered tree.
pub fn icon_for(is_directory: bool, name: &str) -> &'static str {
    if is_directory {
        "📁"
    } else if is_shortcut(name) {
        "🔗"
    } else {
        "📄"
    }
}
