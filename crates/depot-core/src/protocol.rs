//! Wire shapes shared by the client and the server.
//!
//! Every request and response body is an explicit serde struct. A
//! response that does not decode into its struct is a protocol error at
//! the call site, never a missing-field panic further in.

use serde::{Deserialize, Serialize};

/// Header carrying the caller's API key on every authenticated route.
pub const API_KEY_HEADER: &str = "api-key";

/// Header carrying the upload session token on cell submissions.
pub const SESSION_HEADER: &str = "session";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitUploadRequest {
    /// Declared file name.
    pub name: String,
    /// Total file size in bytes.
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitUploadResponse {
    pub storage_id: i64,
    pub session: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageEntry {
    pub id: i64,
    pub name: String,
    /// Cell count, not bytes.
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageListResponse {
    pub storage_list: Vec<StorageEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellDescriptor {
    pub address: u64,
    /// Opaque server-side locator, echoed back verbatim on fetch.
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadInitResponse {
    pub name: String,
    /// Expected cell count; must equal `cells.len()` or the client
    /// aborts before fetching anything.
    pub size: u64,
    pub cells: Vec<CellDescriptor>,
}

/// Tagged error body returned on every rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error_type: String,
    pub error_message: String,
}
