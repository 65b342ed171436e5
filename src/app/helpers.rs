//! Contains helper functions to reduce boilerplate code in other `app` modules.

use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex};

use super::events::CommandError;
use super::state::AppState;

/// Locks the `AppState` and runs `f` on it.
///
/// A poisoned lock is recovered and logged.
pub fn with_state<T, F>(state: &Arc<Mutex<AppState>>, f: F) -> T
where
    F: FnOnce(&mut AppState) -> T,
{
    let mut state_guard = state.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("AppState mutex was poisoned; recovering");
        poisoned.into_inner()
    });
    f(&mut state_guard)
}

/// Deserializes a command payload, turning shape errors into `InvalidRequest`.
pub fn parse_payload<T: DeserializeOwned>(payload: serde_json::Value) -> Result<T, CommandError> {
    serde_json::from_value(payload).map_err(|e| CommandError::InvalidRequest(e.to_string()))
}

/// Like [`parse_payload`], but a `null` or absent payload yields `T::default()`.
pub fn parse_payload_or_default<T>(payload: serde_json::Value) -> Result<T, CommandError>
where
    T: DeserializeOwned + Default,
{
    if payload.is_null() {
        return Ok(T::default());
    }
    parse_payload(payload)
}
