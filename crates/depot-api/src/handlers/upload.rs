//! /upload_init and /upload handlers — the receiving half of the cell
//! transfer protocol.

use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use bytes::Bytes;

use depot_core::cell_count;
use depot_core::protocol::{InitUploadRequest, InitUploadResponse, SESSION_HEADER};

use super::{internal, reject, require_user, ApiError, ApiState};
use crate::session::{SessionError, UploadSession};

pub async fn handle_init_upload(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(req): Json<InitUploadRequest>,
) -> Result<(StatusCode, Json<InitUploadResponse>), ApiError> {
    let user = require_user(&state, &headers)?;

    let cells = cell_count(req.size);
    let storage_id = state
        .store
        .create_storage(user.id, &req.name, req.size, cells)
        .map_err(internal)?;

    let token = new_token();
    state
        .sessions
        .create(token.clone(), UploadSession::new(storage_id, user.id, cells));

    tracing::info!(storage_id, user = user.id, cells, size = req.size, "upload session created");
    Ok((
        StatusCode::CREATED,
        Json(InitUploadResponse {
            storage_id,
            session: token,
        }),
    ))
}

/// Fresh unguessable session token: 32 random bytes, hex-encoded.
fn new_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

pub async fn handle_upload_cell(
    State(state): State<ApiState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<StatusCode, ApiError> {
    let _user = require_user(&state, &headers)?;
    let token = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| reject(StatusCode::BAD_REQUEST, "BadRequest", "missing session header"))?
        .to_string();

    // Multipart fields: `file` (payload + declared filename), `number`.
    let mut payload: Option<(String, Bytes)> = None;
    let mut address: Option<u64> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| reject(StatusCode::BAD_REQUEST, "BadRequest", e.to_string()))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "number" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| reject(StatusCode::BAD_REQUEST, "BadRequest", e.to_string()))?;
                let parsed = text.trim().parse().map_err(|_| {
                    reject(
                        StatusCode::BAD_REQUEST,
                        "BadRequest",
                        format!("invalid cell number: {text}"),
                    )
                })?;
                address = Some(parsed);
            }
            "file" => {
                let filename = field.file_name().unwrap_or("UPLOAD").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| reject(StatusCode::BAD_REQUEST, "BadRequest", e.to_string()))?;
                payload = Some((filename, data));
            }
            _ => {}
        }
    }

    let (filename, data) =
        payload.ok_or_else(|| reject(StatusCode::BAD_REQUEST, "BadRequest", "missing file field"))?;
    let address =
        address.ok_or_else(|| reject(StatusCode::BAD_REQUEST, "BadRequest", "missing number field"))?;

    // Claim the address before any payload I/O; the claim is the
    // single winner of a duplicate-submission race.
    let claim = state.sessions.claim(&token, address).map_err(|err| {
        tracing::warn!(address, error = %err, "cell submission rejected");
        let status = match err {
            SessionError::SessionNotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::FORBIDDEN,
        };
        reject(status, error_name(&err), err.to_string())
    })?;

    // Persist payload, then the metadata row; roll the claim back on
    // either failure so the client can resubmit the address.
    let relative = match state
        .media
        .write_cell(claim.user_id, claim.storage_id, address, &filename, &data)
        .await
    {
        Ok(path) => path,
        Err(err) => {
            state.sessions.release(&token, address);
            return Err(internal(err));
        }
    };
    if let Err(err) = state.store.add_cell(claim.storage_id, address, &relative) {
        state.sessions.release(&token, address);
        return Err(internal(err));
    }

    if let Some((received, expected)) = state.sessions.received(&token) {
        tracing::debug!(storage_id = claim.storage_id, address, received, expected, "cell accepted");
        if received == expected {
            // Completion is inferred client-side; log only.
            tracing::info!(storage_id = claim.storage_id, cells = expected, "storage fully received");
        }
    }

    Ok(StatusCode::CREATED)
}

fn error_name(err: &SessionError) -> &'static str {
    match err {
        SessionError::SessionNotFound => "SessionNotFound",
        SessionError::AddressOutOfRange { .. } => "AddressOutOfRange",
        SessionError::DuplicateAddress { .. } => "DuplicateAddress",
    }
}
