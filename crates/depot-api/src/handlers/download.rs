//! /download_init and /download handlers.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use depot_core::protocol::{CellDescriptor, DownloadInitResponse};

use super::{internal, reject, require_user, ApiError, ApiState};
use crate::media::MediaError;

#[derive(Debug, Deserialize)]
pub struct DownloadInitQuery {
    pub id: i64,
}

pub async fn handle_download_init(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Query(query): Query<DownloadInitQuery>,
) -> Result<Json<DownloadInitResponse>, ApiError> {
    let user = require_user(&state, &headers)?;

    let storage = state
        .store
        .storage_by_id(query.id)
        .map_err(internal)?
        .ok_or_else(|| {
            reject(
                StatusCode::NOT_FOUND,
                "NotFound",
                format!("no storage with id {}", query.id),
            )
        })?;
    if storage.user_id != user.id {
        return Err(reject(
            StatusCode::FORBIDDEN,
            "Forbidden",
            "storage belongs to another user",
        ));
    }

    let cells: Vec<CellDescriptor> = state
        .store
        .cells_for(storage.id)
        .map_err(internal)?
        .into_iter()
        .map(|c| CellDescriptor {
            address: c.address,
            path: c.path,
        })
        .collect();

    tracing::debug!(storage_id = storage.id, cells = cells.len(), expected = storage.cell_count, "download init");
    Ok(Json(DownloadInitResponse {
        name: storage.name,
        size: storage.cell_count,
        cells,
    }))
}

pub async fn handle_download_cell(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&state, &headers)?;

    let (cell, owner) = state
        .store
        .cell_owner(&path)
        .map_err(internal)?
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "NotFound", "unknown cell"))?;
    if owner != user.id {
        return Err(reject(
            StatusCode::FORBIDDEN,
            "Forbidden",
            "cell belongs to another user",
        ));
    }

    let data = state.media.read_cell(&cell.path).await.map_err(|err| match err {
        MediaError::InvalidPath(_) => reject(StatusCode::NOT_FOUND, "NotFound", "unknown cell"),
        MediaError::Io(ref io) if io.kind() == std::io::ErrorKind::NotFound => {
            reject(StatusCode::NOT_FOUND, "NotFound", "cell payload missing")
        }
        other => internal(other),
    })?;

    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], data))
}
