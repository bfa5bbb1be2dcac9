//! HTTP handlers — the Depot storage service API surface.

pub mod download;
pub mod register;
pub mod storage;
pub mod upload;

use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use depot_core::protocol::{ErrorBody, API_KEY_HEADER};

use crate::media::MediaStore;
use crate::session::SessionTable;
use crate::store::{MetaStore, UserRow};

/// Shared state behind every handler.
#[derive(Clone)]
pub struct ApiState {
    pub sessions: SessionTable,
    pub store: MetaStore,
    pub media: MediaStore,
}

/// Every rejection carries a tagged JSON body.
pub type ApiError = (StatusCode, Json<ErrorBody>);

pub(crate) fn reject(status: StatusCode, error_type: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error_type: error_type.to_string(),
            error_message: message.into(),
        }),
    )
}

pub(crate) fn internal(err: impl std::fmt::Display) -> ApiError {
    tracing::error!(error = %err, "internal error");
    reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal", "internal error")
}

/// Resolves the caller from the `api-key` header.
pub(crate) fn require_user(state: &ApiState, headers: &HeaderMap) -> Result<UserRow, ApiError> {
    let key = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            reject(StatusCode::UNAUTHORIZED, "Unauthorized", "missing api-key header")
        })?;
    match state.store.user_by_api_key(key) {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(reject(StatusCode::UNAUTHORIZED, "Unauthorized", "unknown api key")),
        Err(err) => Err(internal(err)),
    }
}

// Re-export handler functions for use in router setup.
pub use download::{handle_download_cell, handle_download_init};
pub use register::handle_register;
pub use storage::handle_storage_list;
pub use upload::{handle_init_upload, handle_upload_cell};
