//! Depot integration test harness.
//!
//! Each test boots a real server on an ephemeral localhost port with
//! its own temporary metadata store and media root, then drives it with
//! the real client. No external environment is required.

mod download;
mod failures;
mod upload;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use depot_api::handlers::ApiState;
use depot_api::media::MediaStore;
use depot_api::session::SessionTable;
use depot_api::store::MetaStore;
use depot_core::config::ClientConfig;

pub const API_KEY: &str = "integration-test-key";

/// A running server plus handles into its state for inspection and
/// fault injection.
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: ApiState,
    pub media_root: PathBuf,
    _media_dir: TempDir,
    server: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> anyhow::Result<TestServer> {
        let media_dir = TempDir::new()?;
        let state = ApiState {
            sessions: SessionTable::new(),
            store: MetaStore::open_in_memory()?,
            media: MediaStore::new(media_dir.path())?,
        };

        let app = depot_api::router(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(TestServer {
            addr,
            state,
            media_root: media_dir.path().to_path_buf(),
            _media_dir: media_dir,
            server,
        })
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            server_url: self.url(),
            api_key: API_KEY.to_string(),
            max_in_flight: 4,
            request_timeout_secs: 5,
        }
    }

    /// Registers the default test user directly in the store.
    pub fn register_user(&self) -> anyhow::Result<i64> {
        Ok(self.state.store.create_user("tester", API_KEY)?)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Deterministic test payload of `len` bytes.
pub fn test_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Writes `data` under `dir/name` and returns the path.
pub fn write_test_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).expect("write test file");
    path
}
