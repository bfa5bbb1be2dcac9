//! Upload session table — binds opaque tokens to storage objects and
//! tracks which cell addresses have been received.
//!
//! A submission claims its address under the map's exclusive entry lock
//! before any payload I/O happens, so two concurrent submissions for
//! the same address resolve to exactly one winner. Sessions have no
//! timeout here; reaping abandoned ones is an external concern.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;

/// Server-side state of one in-progress upload.
pub struct UploadSession {
    storage_id: i64,
    user_id: i64,
    expected_cells: u64,
    received: HashSet<u64>,
}

impl UploadSession {
    pub fn new(storage_id: i64, user_id: i64, expected_cells: u64) -> Self {
        Self {
            storage_id,
            user_id,
            expected_cells,
            received: HashSet::new(),
        }
    }
}

/// Rejection reasons for a cell submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("unknown upload session")]
    SessionNotFound,

    #[error("cell address {address} outside 0..{expected}")]
    AddressOutOfRange { address: u64, expected: u64 },

    #[error("cell address {address} already received")]
    DuplicateAddress { address: u64 },
}

/// What a handler needs to persist an accepted cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellClaim {
    pub storage_id: i64,
    pub user_id: i64,
}

#[derive(Clone, Default)]
pub struct SessionTable {
    inner: Arc<DashMap<String, UploadSession>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a session under a fresh token.
    pub fn create(&self, token: String, session: UploadSession) {
        self.inner.insert(token, session);
    }

    /// Claims `address` for `token`, reserving it before payload I/O.
    pub fn claim(&self, token: &str, address: u64) -> Result<CellClaim, SessionError> {
        let mut entry = self
            .inner
            .get_mut(token)
            .ok_or(SessionError::SessionNotFound)?;
        let session = entry.value_mut();
        if address >= session.expected_cells {
            return Err(SessionError::AddressOutOfRange {
                address,
                expected: session.expected_cells,
            });
        }
        if !session.received.insert(address) {
            return Err(SessionError::DuplicateAddress { address });
        }
        Ok(CellClaim {
            storage_id: session.storage_id,
            user_id: session.user_id,
        })
    }

    /// Releases a claim whose payload could not be persisted, so the
    /// client may resubmit the address.
    pub fn release(&self, token: &str, address: u64) {
        if let Some(mut entry) = self.inner.get_mut(token) {
            entry.value_mut().received.remove(&address);
        }
    }

    /// `(received, expected)` counts for `token`, if the session exists.
    pub fn received(&self, token: &str) -> Option<(u64, u64)> {
        self.inner
            .get(token)
            .map(|s| (s.received.len() as u64, s.expected_cells))
    }
}
