//! depot-client — client side of the Depot cell-transfer protocol:
//! the HTTP API client, the concurrent transfer engine, deterministic
//! reassembly, and advisory progress tracking.

mod client;
mod engine;
mod progress;
mod reassemble;

pub use client::{ApiClient, UploadReport};
pub use engine::{transfer_all, TransferOutcome};
pub use progress::TransferStatus;
pub use reassemble::{reassemble, ReassembleError};

/// Errors produced by the client crate.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never completed: connect failure, timeout, or a
    /// broken transport mid-body.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("server rejected {what} with status {status}: {detail}")]
    Rejected {
        what: &'static str,
        status: u16,
        detail: String,
    },

    /// The response arrived but did not decode into its wire shape.
    #[error("malformed response from {url}: {source}")]
    Protocol {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// One or more cells failed to transfer; names every failed
    /// address so a caller can re-submit exactly those.
    #[error("transfer incomplete, failed cell addresses: {0:?}")]
    IncompleteTransfer(Vec<u64>),

    /// Download metadata is internally inconsistent.
    #[error("download metadata declares {declared} cells but lists {listed}")]
    SizeMismatch { declared: u64, listed: usize },

    #[error(transparent)]
    Cell(#[from] depot_core::CellError),

    #[error(transparent)]
    Reassemble(#[from] ReassembleError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
