//! Shapes the current view into flat rows for a spreadsheet exporter.

use serde::Serialize;

use super::Entry;
use crate::utils::file_detection::kind_label;
use crate::utils::format::{format_file_size, format_modified};

/// One exported line. All columns are pre-rendered strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    pub name: String,
    pub kind: String,
    pub size: String,
    pub modified: String,
    pub path: String,
}

impl From<&Entry> for ExportRow {
    fn from(entry: &Entry) -> Self {
        let size = if entry.is_directory() {
            "-".to_string()
        } else {
            format_file_size(entry.size.unwrap_or(0))
        };
        Self {
            name: entry.name.clone(),
            kind: kind_label(entry).to_string(),
            size,
            modified: format_modified(entry.modified_at.as_ref()),
            path: entry.path.to_string_lossy().into_owned(),
        }
    }
}

pub fn export_rows<'a, I>(entries: I) -> Vec<ExportRow>
where
    I: IntoIterator<Item = &'a Entry>,
{
    entries.into_iter().map(ExportRow::from).collect()
}
