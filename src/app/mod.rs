//! The boundary between a transport and the core: request parsing, command
//! dispatch, and the per-request timeout.

pub mod commands;
pub mod events;
pub mod helpers;
pub mod opener;
pub mod state;
pub mod view_model;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::core::ErrorKind;
use events::{CommandError, IpcMessage, Response};
use helpers::with_state;
use opener::Opener;
use state::AppState;

/// Parses one raw request. A malformed message becomes an `invalidRequest` response.
pub fn parse_message(message: &str) -> Result<IpcMessage, Response> {
    serde_json::from_str(message).map_err(|e| {
        tracing::warn!("Rejecting malformed IPC message: {}", e);
        Response::failure(ErrorKind::InvalidRequest, format!("Malformed request: {e}"))
    })
}

/// Parses and executes one raw request against the locked session.
pub fn handle_ipc_message(
    message: &str,
    state: &Arc<Mutex<AppState>>,
    opener: &dyn Opener,
) -> Response {
    match parse_message(message) {
        Ok(msg) => handle_message(msg, state, opener),
        Err(response) => response,
    }
}

pub fn handle_message(
    msg: IpcMessage,
    state: &Arc<Mutex<AppState>>,
    opener: &dyn Opener,
) -> Response {
    let id = msg.id.clone();
    with_state(state, |s| execute_command(s, &msg.command, msg.payload, opener)).with_id(id)
}

/// Routes `command` to its handler and folds any failure into the response.
pub fn execute_command(
    state: &mut AppState,
    command: &str,
    payload: serde_json::Value,
    opener: &dyn Opener,
) -> Response {
    tracing::debug!("Executing command '{}'", command);
    let result = match command {
        "listDirectory" => commands::list_directory(state, payload),
        "navigate" => commands::navigate(state, payload),
        "goUp" => commands::go_up(state),
        "refresh" => commands::refresh(state, payload),
        "view" => commands::view(state),
        "resolveShortcut" => commands::resolve_shortcut(state, payload),
        "openEntry" => commands::open_entry(state, payload, opener),
        "rename" => commands::rename(state, payload),
        "remove" => commands::remove(state, payload),
        "removeBatch" => commands::remove_batch(state, payload),
        "createFolder" => commands::create_folder(state, payload),
        "createFile" => commands::create_file(state, payload),
        "copy" => commands::copy(state, payload),
        "copyBatch" => commands::copy_batch(state, payload),
        "move" => commands::move_entry(state, payload),
        "moveBatch" => commands::move_batch(state, payload),
        "select" => commands::select(state, payload),
        "toggleSelection" => commands::toggle_selection(state, payload),
        "clearSelection" => commands::clear_selection(state),
        "selectAll" => commands::select_all(state),
        "copyToClipboard" => commands::copy_to_clipboard(state, payload),
        "cutToClipboard" => commands::cut_to_clipboard(state, payload),
        "paste" => commands::paste(state, payload),
        "setSort" => commands::set_sort(state, payload),
        "toggleSort" => commands::toggle_sort(state, payload),
        "search" => commands::search(state, payload),
        "toggleExpansion" => commands::toggle_expansion(state, payload),
        "tree" => commands::tree(state, payload),
        "exportRows" => commands::export_rows(state),
        other => Err(CommandError::InvalidRequest(format!("Unknown command: {other}"))),
    };

    match result {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Command '{}' failed: {}", command, e);
            e.into()
        }
    }
}

/// Runs one raw request on the blocking pool and waits at most `timeout`.
///
/// On timeout the caller gets a `timeout` response; the filesystem work is
/// not cancelled and may still complete afterwards.
pub async fn dispatch(
    message: String,
    state: Arc<Mutex<AppState>>,
    opener: Arc<dyn Opener>,
    timeout: Duration,
) -> Response {
    let msg = match parse_message(&message) {
        Ok(msg) => msg,
        Err(response) => return response,
    };
    let id = msg.id.clone();
    let command = msg.command.clone();

    let task = tokio::task::spawn_blocking(move || handle_message(msg, &state, opener.as_ref()));
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(response)) => response,
        Ok(Err(join_error)) => {
            tracing::error!("Command '{}' panicked: {}", command, join_error);
            Response::failure(ErrorKind::IoFailure, format!("Command '{command}' aborted"))
                .with_id(id)
        }
        Err(_) => {
            tracing::warn!("Command '{}' timed out after {:?}", command, timeout);
            Response::failure(
                ErrorKind::Timeout,
                format!("Command '{command}' timed out after {}s", timeout.as_secs()),
            )
            .with_id(id)
        }
    }
}
