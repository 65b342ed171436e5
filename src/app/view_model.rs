//! Responsible for transforming the `AppState` into a `ListingView` view model.
//!
//! This module acts as a presentation layer: it derives the visible rows from
//! the cached listing and pre-renders the columns the UI shows.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::PathBuf;

use super::state::AppState;
use crate::core::{ClipboardAction, CoreError, Entry, EntryKind, SortSpec};
use crate::utils::file_detection::{is_shortcut, kind_label};
use crate::utils::format::{format_file_size, format_modified};

/// A serializable representation of the displayed folder for the UI.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ListingView {
    pub current_path: PathBuf,
    pub parent_path: PathBuf,
    pub can_go_up: bool,
    pub items: Vec<EntryView>,
    /// Items in the folder before the search keyword is applied.
    pub total_count: usize,
    pub selected_count: usize,
    pub sort: Option<SortSpec>,
    pub keyword: String,
    pub clipboard: Option<ClipboardView>,
}

/// One row of the listing.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EntryView {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
    pub kind_label: &'static str,
    pub size: Option<u64>,
    pub size_label: String,
    pub modified_at: Option<DateTime<Local>>,
    pub modified_label: String,
    pub is_shortcut: bool,
    pub is_selected: bool,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardView {
    pub action: ClipboardAction,
    pub count: usize,
}

/// Creates the complete `ListingView` from the current `AppState`.
pub fn generate_listing_view(state: &AppState) -> Result<ListingView, CoreError> {
    let listing = state.current_listing()?;
    let items = state
        .visible_entries()?
        .iter()
        .map(|entry| entry_view(entry, state.selection.is_selected(&entry.path)))
        .collect();

    Ok(ListingView {
        current_path: listing.current_path.clone(),
        parent_path: listing.parent_path.clone(),
        can_go_up: !listing.is_root(),
        items,
        total_count: listing.len(),
        selected_count: state.selection.selected_paths().len(),
        sort: state.sort,
        keyword: state.search.keyword().to_string(),
        clipboard: state.selection.clipboard().map(|c| ClipboardView {
            action: c.action,
            count: c.items.len(),
        }),
    })
}

fn entry_view(entry: &Entry, is_selected: bool) -> EntryView {
    EntryView {
        name: entry.name.clone(),
        path: entry.path.clone(),
        kind: entry.kind,
        kind_label: kind_label(entry),
        size: entry.size,
        size_label: entry.size.map(format_file_size).unwrap_or_default(),
        modified_at: entry.modified_at,
        modified_label: format_modified(entry.modified_at.as_ref()),
        is_shortcut: entry.kind == EntryKind::File && is_shortcut(&entry.name),
        is_selected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::core::{SearchFilter, SortDirection, SortField};
    use crate::utils::test_helpers::create_tree;
    use tempfile::tempdir;

    #[test]
    fn test_view_reflects_search_sort_and_selection() {
        let dir = tempdir().unwrap();
        create_tree(dir.path(), &["docs/", "notes.txt", "Work.lnk", "zeta.txt"]);
        let config = AppConfig {
            start_directory: Some(dir.path().to_path_buf()),
            restore_last_directory: false,
            ..AppConfig::default()
        };
        let mut state = AppState::new(config, None);

        let view = generate_listing_view(&state).unwrap();
        assert_eq!(view.total_count, 4);
        assert!(view.can_go_up);
        let work = view.items.iter().find(|i| i.name == "Work.lnk").unwrap();
        assert!(work.is_shortcut);
        assert_eq!(work.kind_label, "Folder shortcut");
        assert_eq!(view.items[0].size_label, "");

        state.search = SearchFilter::new("txt");
        state.sort = Some(SortSpec::new(SortField::Name, SortDirection::Desc));
        let zeta = state.catalog.lookup(&dir.path().join("zeta.txt")).unwrap();
        state.selection.select(&zeta);

        let view = generate_listing_view(&state).unwrap();
        let names: Vec<&str> = view.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["zeta.txt", "notes.txt"]);
        assert!(view.items[0].is_selected);
        assert_eq!(view.selected_count, 1);
        assert_eq!(view.total_count, 4);
        assert_eq!(view.keyword, "txt");
    }
}
