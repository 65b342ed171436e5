//! Defines the request and response envelopes exchanged with the frontend.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{CoreError, ErrorKind};

/// A message received from the frontend over the IPC channel.
#[derive(Deserialize, Debug)]
pub struct IpcMessage {
    /// Optional correlation id, echoed back in the response.
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    /// The name of the command to execute.
    pub command: String,
    /// The payload associated with the command, as a JSON value.
    #[serde(default)]
    pub payload: serde_json::Value,
}

pub const STATUS_SUCCESS: &str = "success";

/// The answer to every request. Failures are values, never panics.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    /// `"success"` or the kind of the failure (`"notFound"`, `"timeout"`, ...).
    pub status: String,
    pub message: String,
    pub data: serde_json::Value,
}

impl Response {
    pub fn success(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            id: None,
            status: STATUS_SUCCESS.to_string(),
            message: message.into(),
            data,
        }
    }

    /// A success whose data is serialized from `data`.
    pub fn with_data<T: Serialize>(message: impl Into<String>, data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => Self::success(message, value),
            Err(e) => Self::failure(ErrorKind::IoFailure, format!("Failed to encode response: {e}")),
        }
    }

    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            id: None,
            status: kind.as_str().to_string(),
            message: message.into(),
            data: serde_json::Value::Null,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    pub fn with_id(mut self, id: Option<serde_json::Value>) -> Self {
        self.id = id;
        self
    }
}

/// Why a command handler could not complete.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl CommandError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::Core(e) => e.kind(),
        }
    }
}

impl From<CommandError> for Response {
    fn from(err: CommandError) -> Self {
        Response::failure(err.kind(), err.to_string())
    }
}

pub type CommandResult = Result<Response, CommandError>;
