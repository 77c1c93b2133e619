use std::error::Error;

use nexus_api_client::ApiClientError;
use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error(transparent)]
    Api(#[from] ApiClientError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Backlog lane unavailable")]
    BacklogLaneUnavailable,
    #[error("Task title is required")]
    MissingTitle,
}

/// Text shown to the operator for a failed action.
///
/// Errors raised by this workspace surface their own message; anything else,
/// or an error with an empty message, shows `fallback`.
#[must_use]
pub fn user_facing_message(error: &(dyn Error + 'static), fallback: &str) -> String {
    let recognized = error.is::<PanelError>()
        || error.is::<ApiClientError>()
        || error.is::<StorageError>();
    if !recognized {
        return fallback.to_string();
    }
    let message = error.to_string();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
