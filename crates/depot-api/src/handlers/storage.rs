//! /storage handler — per-user storage listing.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use depot_core::protocol::{StorageEntry, StorageListResponse};

use super::{internal, require_user, ApiError, ApiState};

pub async fn handle_storage_list(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<StorageListResponse>, ApiError> {
    let user = require_user(&state, &headers)?;
    let storage_list = state
        .store
        .list_storage(user.id)
        .map_err(internal)?
        .into_iter()
        .map(|s| StorageEntry {
            id: s.id,
            name: s.name,
            size: s.cell_count,
        })
        .collect();
    Ok(Json(StorageListResponse { storage_list }))
}
