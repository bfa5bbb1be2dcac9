//! /register handler — static API-key user creation.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use depot_core::protocol::RegisterRequest;

use super::{internal, reject, ApiError, ApiState};
use crate::store::StoreError;

pub async fn handle_register(
    State(state): State<ApiState>,
    Json(req): Json<RegisterRequest>,
) -> Result<StatusCode, ApiError> {
    match state.store.create_user(&req.name, &req.api_key) {
        Ok(id) => {
            tracing::info!(user = id, name = %req.name, "user registered");
            Ok(StatusCode::CREATED)
        }
        Err(StoreError::ApiKeyTaken) => Err(reject(
            StatusCode::FORBIDDEN,
            "UserExists",
            "api key already registered",
        )),
        Err(err) => Err(internal(err)),
    }
}
