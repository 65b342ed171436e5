//! Contains all the command handlers that are callable from the frontend via IPC.
//!
//! Each function in this module corresponds to a specific `IpcMessage::command`.
//! Handlers run with the session locked, call into `core`, and describe the
//! outcome as a `Response`. Every failure is returned as a `CommandError`.

use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

use super::events::{CommandError, CommandResult, Response};
use super::helpers::{parse_payload, parse_payload_or_default};
use super::opener::Opener;
use super::state::AppState;
use super::view_model::generate_listing_view;
use crate::core::catalog::normalize_key;
use crate::core::export::export_rows as build_export_rows;
use crate::core::{CoreError, Entry, SearchFilter, SortField, SortSpec, TreeGenerator};
use crate::utils::file_detection::is_shortcut;

#[derive(Deserialize)]
struct PathPayload {
    path: PathBuf,
}

#[derive(Deserialize, Default)]
struct OptionalPathPayload {
    #[serde(default)]
    path: Option<PathBuf>,
}

#[derive(Deserialize)]
struct PathsPayload {
    paths: Vec<PathBuf>,
}

#[derive(Deserialize, Default)]
struct OptionalPathsPayload {
    #[serde(default)]
    paths: Option<Vec<PathBuf>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenamePayload {
    old_path: PathBuf,
    new_path: PathBuf,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferPayload {
    source_path: PathBuf,
    destination_path: PathBuf,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchTransferPayload {
    source_paths: Vec<PathBuf>,
    destination_dir: PathBuf,
}

#[derive(Deserialize, Default)]
struct SortPayload {
    #[serde(default)]
    sort: Option<SortSpec>,
}

#[derive(Deserialize)]
struct ToggleSortPayload {
    field: SortField,
}

#[derive(Deserialize, Default)]
struct SearchPayload {
    #[serde(default)]
    keyword: String,
}

/// Responds with the current `ListingView`.
fn view_response(state: &AppState, message: impl Into<String>) -> CommandResult {
    let view = generate_listing_view(state)?;
    Ok(Response::with_data(message, &view))
}

/// Forgets selected paths and tree expansions that a mutation removed.
fn after_mutation(state: &mut AppState) {
    state.selection.retain(|path| path.symlink_metadata().is_ok());
    state.prune_expansions();
}

/// Finds `path` among the entries of the displayed folder.
fn displayed_entry(state: &AppState, path: &Path) -> Result<Entry, CommandError> {
    let key = normalize_key(path)?;
    let listing = state.current_listing()?;
    let found = listing.items().find(|entry| entry.path == key).cloned();
    found.ok_or_else(|| CoreError::NotFound(key).into())
}

/// The entries named by the payload, or the current selection when it names none.
fn clipboard_entries(state: &AppState, payload: Value) -> Result<Vec<Entry>, CommandError> {
    let OptionalPathsPayload { paths } = parse_payload_or_default(payload)?;
    let paths = paths
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| state.selection.selected_paths());
    if paths.is_empty() {
        return Err(CommandError::InvalidRequest("Nothing selected".to_string()));
    }
    paths
        .iter()
        .map(|path| state.catalog.lookup(path).map_err(CommandError::from))
        .collect()
}

// -----------------------------------------------------------------------------
// Navigation
// -----------------------------------------------------------------------------

/// Lists a folder (the displayed one by default) without navigating to it.
pub fn list_directory(state: &mut AppState, payload: Value) -> CommandResult {
    let OptionalPathPayload { path } = parse_payload_or_default(payload)?;
    let path = path.unwrap_or_else(|| state.current_path.clone());
    let listing = state.catalog.list(&path)?;
    Ok(Response::with_data(
        format!("Listed {}", listing.current_path.display()),
        listing.as_ref(),
    ))
}

pub fn navigate(state: &mut AppState, payload: Value) -> CommandResult {
    let PathPayload { path } = parse_payload(payload)?;
    state.navigate(&path)?;
    view_response(state, format!("Navigated to {}", state.current_path.display()))
}

pub fn go_up(state: &mut AppState) -> CommandResult {
    state.go_up()?;
    view_response(state, format!("Navigated to {}", state.current_path.display()))
}

/// Drops the cached listing of a folder (the displayed one by default) so
/// external changes, such as uploads, become visible.
pub fn refresh(state: &mut AppState, payload: Value) -> CommandResult {
    let OptionalPathPayload { path } = parse_payload_or_default(payload)?;
    let path = path.unwrap_or_else(|| state.current_path.clone());
    state.catalog.invalidate_tree(&path);
    state.catalog.list(&path)?;
    after_mutation(state);
    view_response(state, format!("Refreshed {}", path.display()))
}

pub fn view(state: &mut AppState) -> CommandResult {
    view_response(state, "Current view")
}

// -----------------------------------------------------------------------------
// Shortcuts and opening
// -----------------------------------------------------------------------------

pub fn resolve_shortcut(state: &mut AppState, payload: Value) -> CommandResult {
    let PathPayload { path } = parse_payload(payload)?;
    let target = state.resolver.resolve(&path).map_err(CoreError::from)?;
    Ok(Response::success(
        format!("Shortcut points to {}", target.display()),
        json!({ "targetPath": target }),
    ))
}

/// Opens an entry the way a double click does.
///
/// Folders are navigated into. A folder shortcut navigates to its target;
/// any other shortcut, and every other file, goes to the `Opener`.
pub fn open_entry(state: &mut AppState, payload: Value, opener: &dyn Opener) -> CommandResult {
    let PathPayload { path } = parse_payload(payload)?;
    let entry = state.catalog.lookup(&path)?;

    if entry.is_directory() {
        state.navigate(&entry.path)?;
        return view_response(state, format!("Opened folder {}", entry.name));
    }

    if is_shortcut(&entry.name) {
        match state.resolver.resolve(&entry.path) {
            Ok(target) => {
                state.navigate(&target)?;
                return view_response(state, format!("Opened shortcut target {}", target.display()));
            }
            Err(e) => tracing::info!(
                "{} is not a usable folder shortcut ({}); opening the file itself",
                entry.path.display(),
                e
            ),
        }
    }

    opener
        .open(&entry.path)
        .map_err(|e| CoreError::from_io(e, &entry.path))?;
    Ok(Response::success(
        format!("Opened {}", entry.name),
        json!({ "opened": entry.path }),
    ))
}

// -----------------------------------------------------------------------------
// Mutations
// -----------------------------------------------------------------------------

pub fn rename(state: &mut AppState, payload: Value) -> CommandResult {
    let RenamePayload { old_path, new_path } = parse_payload(payload)?;
    state.orchestrator.rename(&old_path, &new_path)?;
    after_mutation(state);
    Ok(Response::success("Renamed", Value::Null))
}

pub fn remove(state: &mut AppState, payload: Value) -> CommandResult {
    let PathPayload { path } = parse_payload(payload)?;
    state.orchestrator.delete(&path)?;
    after_mutation(state);
    Ok(Response::success("Deleted", Value::Null))
}

pub fn remove_batch(state: &mut AppState, payload: Value) -> CommandResult {
    let PathsPayload { paths } = parse_payload(payload)?;
    let removed = state.orchestrator.batch_delete(&paths)?;
    after_mutation(state);
    Ok(Response::success(
        format!("Deleted {} item(s)", removed),
        json!({ "removed": removed }),
    ))
}

pub fn create_folder(state: &mut AppState, payload: Value) -> CommandResult {
    let PathPayload { path } = parse_payload(payload)?;
    state.orchestrator.create_folder(&path)?;
    Ok(Response::success("Folder created", Value::Null))
}

pub fn create_file(state: &mut AppState, payload: Value) -> CommandResult {
    let PathPayload { path } = parse_payload(payload)?;
    state.orchestrator.create_file(&path)?;
    Ok(Response::success("File created", Value::Null))
}

pub fn copy(state: &mut AppState, payload: Value) -> CommandResult {
    let TransferPayload {
        source_path,
        destination_path,
    } = parse_payload(payload)?;
    let actual = state.orchestrator.copy(&source_path, &destination_path)?;
    Ok(Response::success(
        "Copied",
        json!({ "actualDestination": actual }),
    ))
}

pub fn copy_batch(state: &mut AppState, payload: Value) -> CommandResult {
    let BatchTransferPayload {
        source_paths,
        destination_dir,
    } = parse_payload(payload)?;
    let destinations = state
        .orchestrator
        .batch_copy(&source_paths, &destination_dir)?;
    Ok(Response::success(
        format!("Copied {} item(s)", destinations.len()),
        json!({ "destinations": destinations }),
    ))
}

pub fn move_entry(state: &mut AppState, payload: Value) -> CommandResult {
    let TransferPayload {
        source_path,
        destination_path,
    } = parse_payload(payload)?;
    state
        .orchestrator
        .move_entry(&source_path, &destination_path)?;
    after_mutation(state);
    Ok(Response::success("Moved", Value::Null))
}

pub fn move_batch(state: &mut AppState, payload: Value) -> CommandResult {
    let BatchTransferPayload {
        source_paths,
        destination_dir,
    } = parse_payload(payload)?;
    let result = state
        .orchestrator
        .batch_move(&source_paths, &destination_dir);
    after_mutation(state);
    result?;
    Ok(Response::success(
        format!("Moved {} item(s)", source_paths.len()),
        Value::Null,
    ))
}

// -----------------------------------------------------------------------------
// Selection and clipboard
// -----------------------------------------------------------------------------

pub fn select(state: &mut AppState, payload: Value) -> CommandResult {
    let PathPayload { path } = parse_payload(payload)?;
    let entry = displayed_entry(state, &path)?;
    state.selection.select(&entry);
    view_response(state, format!("Selected {}", entry.name))
}

pub fn toggle_selection(state: &mut AppState, payload: Value) -> CommandResult {
    let PathPayload { path } = parse_payload(payload)?;
    let entry = displayed_entry(state, &path)?;
    let selected = state.selection.toggle(&entry);
    let verb = if selected { "Selected" } else { "Deselected" };
    view_response(state, format!("{} {}", verb, entry.name))
}

pub fn clear_selection(state: &mut AppState) -> CommandResult {
    state.selection.clear();
    view_response(state, "Selection cleared")
}

/// Selects every item currently visible, search keyword applied.
pub fn select_all(state: &mut AppState) -> CommandResult {
    let visible = state.visible_entries()?;
    state.selection.select_all(&visible);
    view_response(state, format!("Selected {} item(s)", visible.len()))
}

pub fn copy_to_clipboard(state: &mut AppState, payload: Value) -> CommandResult {
    let entries = clipboard_entries(state, payload)?;
    let count = entries.len();
    state.selection.copy_to_clipboard(entries);
    view_response(state, format!("Copied {} item(s) to the clipboard", count))
}

pub fn cut_to_clipboard(state: &mut AppState, payload: Value) -> CommandResult {
    let entries = clipboard_entries(state, payload)?;
    let count = entries.len();
    state.selection.cut_to_clipboard(entries);
    view_response(state, format!("Cut {} item(s) to the clipboard", count))
}

/// Pastes into the given folder, or into the displayed one.
pub fn paste(state: &mut AppState, payload: Value) -> CommandResult {
    let OptionalPathPayload { path } = parse_payload_or_default(payload)?;
    let target = path.unwrap_or_else(|| state.current_path.clone());
    if state.selection.clipboard().is_none() {
        return Err(CommandError::InvalidRequest("Clipboard is empty".to_string()));
    }

    let result = state.selection.paste_into(&target, &state.orchestrator);
    after_mutation(state);
    let written = result?;
    Ok(Response::success(
        format!("Pasted {} item(s)", written.len()),
        json!({ "written": written }),
    ))
}

// -----------------------------------------------------------------------------
// Sorting, search, tree, export
// -----------------------------------------------------------------------------

/// Replaces the session sort; `{"sort": null}` restores the baseline order.
pub fn set_sort(state: &mut AppState, payload: Value) -> CommandResult {
    let SortPayload { sort } = parse_payload_or_default(payload)?;
    state.sort = sort;
    view_response(state, "Sort updated")
}

pub fn toggle_sort(state: &mut AppState, payload: Value) -> CommandResult {
    let ToggleSortPayload { field } = parse_payload(payload)?;
    state.sort = SortSpec::toggle(state.sort, field);
    view_response(state, "Sort updated")
}

pub fn search(state: &mut AppState, payload: Value) -> CommandResult {
    let SearchPayload { keyword } = parse_payload_or_default(payload)?;
    state.search = SearchFilter::new(&keyword);
    view_response(state, format!("Search for '{}'", state.search.keyword()))
}

pub fn toggle_expansion(state: &mut AppState, payload: Value) -> CommandResult {
    let PathPayload { path } = parse_payload(payload)?;
    let expanded = state.toggle_expansion(&path)?;
    let verb = if expanded { "Expanded" } else { "Collapsed" };
    let root = state.current_path.clone();
    tree_response(state, &root, format!("{} {}", verb, path.display()))
}

/// The navigation tree rooted at the given folder, or at the displayed one.
pub fn tree(state: &mut AppState, payload: Value) -> CommandResult {
    let OptionalPathPayload { path } = parse_payload_or_default(payload)?;
    let root = path.unwrap_or_else(|| state.current_path.clone());
    tree_response(state, &root, "Tree")
}

fn tree_response(state: &AppState, root: &Path, message: impl Into<String>) -> CommandResult {
    let tree = state.catalog.expand_tree(root, &state.expanded_dirs)?;
    let rendered = TreeGenerator::render(&tree);
    Ok(Response::success(
        message,
        json!({ "tree": tree, "rendered": rendered }),
    ))
}

/// Rows of the current view for a spreadsheet exporter.
pub fn export_rows(state: &mut AppState) -> CommandResult {
    let visible = state.visible_entries()?;
    let rows = build_export_rows(&visible);
    Ok(Response::with_data(
        format!("Exported {} row(s)", rows.len()),
        &rows,
    ))
}
