//! HTTP client for the Depot storage service.
//!
//! One [`ApiClient`] carries its own connection pool and credentials —
//! explicit configuration, never process-global state. Cell transfers
//! within one upload or download share that pool.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use reqwest::{multipart, Body, StatusCode};

use depot_core::config::ClientConfig;
use depot_core::protocol::{
    CellDescriptor, DownloadInitResponse, ErrorBody, InitUploadRequest, InitUploadResponse,
    RegisterRequest, StorageEntry, StorageListResponse, API_KEY_HEADER, SESSION_HEADER,
};
use depot_core::{Cell, CellReader};

use crate::engine::transfer_all;
use crate::progress::TransferStatus;
use crate::reassemble::reassemble;
use crate::ClientError;

/// Summary of a completed upload.
#[derive(Debug, Clone)]
pub struct UploadReport {
    pub storage_id: i64,
    pub cells: u64,
    pub bytes: u64,
}

/// Client for one Depot server.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    server_url: String,
    api_key: String,
    max_in_flight: usize,
}

impl ApiClient {
    /// Builds a client from explicit configuration.
    ///
    /// The request timeout bounds every call including cell transfers;
    /// a cell exceeding it is recorded as a failed outcome.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|source| ClientError::Transport {
                url: config.server_url.clone(),
                source,
            })?;
        Ok(Self {
            http,
            server_url: config.server_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            max_in_flight: config.max_in_flight,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.server_url, path)
    }

    /// Folds a non-success response into a rejection error, preferring
    /// the server's tagged error body when it decodes.
    async fn rejection(&self, what: &'static str, resp: reqwest::Response) -> ClientError {
        let status = resp.status().as_u16();
        let detail = match resp.json::<ErrorBody>().await {
            Ok(body) => format!("{}: {}", body.error_type, body.error_message),
            Err(_) => "no detail".to_string(),
        };
        tracing::debug!(what, status, %detail, "server rejection");
        ClientError::Rejected { what, status, detail }
    }

    // ── Account and listing ───────────────────────────────────────────────────

    /// Registers a new user under the configured API key.
    pub async fn register(&self, name: &str) -> Result<(), ClientError> {
        let url = self.url("/register");
        let body = RegisterRequest {
            name: name.to_string(),
            api_key: self.api_key.clone(),
        };
        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|source| ClientError::Transport { url: url.clone(), source })?;
        if resp.status() != StatusCode::CREATED {
            return Err(self.rejection("registration", resp).await);
        }
        Ok(())
    }

    /// Lists the caller's storage objects.
    pub async fn storage_list(&self) -> Result<Vec<StorageEntry>, ClientError> {
        let url = self.url("/storage");
        let resp = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|source| ClientError::Transport { url: url.clone(), source })?;
        if resp.status() != StatusCode::OK {
            return Err(self.rejection("storage list", resp).await);
        }
        let body: StorageListResponse = resp
            .json()
            .await
            .map_err(|source| ClientError::Protocol { url, source })?;
        Ok(body.storage_list)
    }

    // ── Upload ────────────────────────────────────────────────────────────────

    /// Uploads `path` as a new storage object: splits it into cells,
    /// opens an upload session, and submits every cell concurrently.
    ///
    /// `status` ticks once per accepted cell and is purely advisory.
    /// On partial failure returns [`ClientError::IncompleteTransfer`]
    /// naming every address the server did not accept; accepted cells
    /// are not rolled back.
    pub async fn upload_file(
        &self,
        path: &Path,
        status: &TransferStatus,
    ) -> Result<UploadReport, ClientError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let mut reader = CellReader::open(path)?;
        let bytes = reader.file_size();
        let expected = reader.cell_count();

        let init = self.init_upload(&name, bytes).await?;
        tracing::info!(
            storage_id = init.storage_id,
            cells = expected,
            bytes,
            "upload session opened"
        );

        let mut cells: Vec<(u64, Cell)> = Vec::with_capacity(expected as usize);
        while let Some(cell) = reader.next_cell()? {
            cells.push((cell.address, cell));
        }

        let outcomes = {
            let client = self.clone();
            let session = init.session.clone();
            let name = name.clone();
            let status = status.clone();
            transfer_all(cells, self.max_in_flight, move |cell: Cell| {
                let client = client.clone();
                let session = session.clone();
                let name = name.clone();
                let status = status.clone();
                async move {
                    client.upload_cell(&session, &name, cell).await?;
                    status.increment();
                    Ok::<(), ClientError>(())
                }
            })
            .await
        };

        let accepted: HashSet<u64> =
            outcomes.iter().filter(|o| o.succeeded).map(|o| o.address).collect();
        let failed: Vec<u64> = (0..expected).filter(|a| !accepted.contains(a)).collect();
        if !failed.is_empty() {
            tracing::warn!(storage_id = init.storage_id, ?failed, "upload incomplete");
            return Err(ClientError::IncompleteTransfer(failed));
        }

        tracing::info!(storage_id = init.storage_id, cells = expected, "upload complete");
        Ok(UploadReport {
            storage_id: init.storage_id,
            cells: expected,
            bytes,
        })
    }

    async fn init_upload(&self, name: &str, size: u64) -> Result<InitUploadResponse, ClientError> {
        let url = self.url("/upload_init");
        let resp = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&InitUploadRequest { name: name.to_string(), size })
            .send()
            .await
            .map_err(|source| ClientError::Transport { url: url.clone(), source })?;
        if resp.status() != StatusCode::CREATED {
            return Err(self.rejection("upload session", resp).await);
        }
        resp.json()
            .await
            .map_err(|source| ClientError::Protocol { url, source })
    }

    async fn upload_cell(
        &self,
        session: &str,
        name: &str,
        cell: Cell,
    ) -> Result<(), ClientError> {
        let url = self.url("/upload");
        let part = multipart::Part::stream(Body::from(cell.payload)).file_name(name.to_string());
        let form = multipart::Form::new()
            .part("file", part)
            .text("number", cell.address.to_string());
        let resp = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(SESSION_HEADER, session)
            .multipart(form)
            .send()
            .await
            .map_err(|source| ClientError::Transport { url: url.clone(), source })?;
        if resp.status() != StatusCode::CREATED {
            return Err(self.rejection("cell submission", resp).await);
        }
        Ok(())
    }

    // ── Download ──────────────────────────────────────────────────────────────

    /// Downloads storage object `storage_id` into `dest_dir`, returning
    /// the path of the reassembled file.
    ///
    /// Cells are fetched concurrently into per-address temporaries in
    /// `dest_dir` and folded into the final file only after every fetch
    /// has settled; the file appears under its stored name complete or
    /// not at all. `status` ticks once per fetched cell.
    pub async fn download(
        &self,
        storage_id: i64,
        dest_dir: &Path,
        status: &TransferStatus,
    ) -> Result<PathBuf, ClientError> {
        let init = self.download_init(storage_id).await?;
        if init.size != init.cells.len() as u64 {
            return Err(ClientError::SizeMismatch {
                declared: init.size,
                listed: init.cells.len(),
            });
        }
        std::fs::create_dir_all(dest_dir)?;
        tracing::info!(storage_id, cells = init.size, name = %init.name, "download starting");

        let items: Vec<(u64, CellDescriptor)> =
            init.cells.iter().map(|c| (c.address, c.clone())).collect();

        let outcomes = {
            let client = self.clone();
            let dir = dest_dir.to_path_buf();
            let status = status.clone();
            transfer_all(items, self.max_in_flight, move |descriptor: CellDescriptor| {
                let client = client.clone();
                let dir = dir.clone();
                let status = status.clone();
                async move {
                    client.fetch_cell(&descriptor, &dir).await?;
                    status.increment();
                    Ok::<(), ClientError>(())
                }
            })
            .await
        };

        let expected: Vec<u64> = init.cells.iter().map(|c| c.address).collect();
        let fetched: HashSet<u64> =
            outcomes.iter().filter(|o| o.succeeded).map(|o| o.address).collect();
        let mut failed: Vec<u64> =
            expected.iter().copied().filter(|a| !fetched.contains(a)).collect();
        failed.sort_unstable();

        if !failed.is_empty() {
            // Nothing will fold these in; drop what was fetched.
            for address in &fetched {
                let _ = std::fs::remove_file(cell_temp_path(dest_dir, *address));
            }
            tracing::warn!(storage_id, ?failed, "download incomplete");
            return Err(ClientError::IncompleteTransfer(failed));
        }

        let final_name = Path::new(&init.name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("download");
        let dest = dest_dir.join(final_name);
        let dir = dest_dir.to_path_buf();
        let written = reassemble(&expected, move |address| cell_temp_path(&dir, address), &dest)?;

        tracing::info!(
            storage_id,
            cells = init.size,
            bytes = written,
            path = %dest.display(),
            "download complete"
        );
        Ok(dest)
    }

    async fn download_init(&self, storage_id: i64) -> Result<DownloadInitResponse, ClientError> {
        let url = self.url("/download_init");
        let resp = self
            .http
            .get(&url)
            .query(&[("id", storage_id)])
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|source| ClientError::Transport { url: url.clone(), source })?;
        if resp.status() != StatusCode::OK {
            return Err(self.rejection("download metadata", resp).await);
        }
        resp.json()
            .await
            .map_err(|source| ClientError::Protocol { url, source })
    }

    async fn fetch_cell(
        &self,
        descriptor: &CellDescriptor,
        dest_dir: &Path,
    ) -> Result<(), ClientError> {
        let url = format!("{}/download/{}", self.server_url, descriptor.path);
        let resp = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|source| ClientError::Transport { url: url.clone(), source })?;
        if resp.status() != StatusCode::OK {
            return Err(self.rejection("cell fetch", resp).await);
        }
        let body: Bytes = resp
            .bytes()
            .await
            .map_err(|source| ClientError::Transport { url, source })?;
        tokio::fs::write(cell_temp_path(dest_dir, descriptor.address), &body).await?;
        Ok(())
    }
}

/// Per-address temporary location a fetched cell is parked at until
/// reassembly folds it into the final file.
fn cell_temp_path(dir: &Path, address: u64) -> PathBuf {
    dir.join(address.to_string())
}
