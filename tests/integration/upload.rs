//! Upload-path integration tests.

use crate::*;

use depot_client::{ApiClient, TransferStatus};
use depot_core::protocol::{ErrorBody, InitUploadRequest, InitUploadResponse};
use depot_core::CELL_SIZE;
use tempfile::TempDir;

#[tokio::test]
async fn upload_splits_into_expected_cells() {
    let server = TestServer::start().await.unwrap();
    server.register_user().unwrap();
    let client = ApiClient::new(&server.client_config()).unwrap();

    let dir = TempDir::new().unwrap();
    let data = test_bytes(2 * CELL_SIZE + CELL_SIZE / 2); // 2.5 MiB
    let file = write_test_file(dir.path(), "movie.bin", &data);

    let status = TransferStatus::new();
    let report = client.upload_file(&file, &status).await.unwrap();

    assert_eq!(report.cells, 3);
    assert_eq!(report.bytes, data.len() as u64);
    assert_eq!(status.get(), 3);

    // Server recorded one cell row per address, in range.
    let cells = server.state.store.cells_for(report.storage_id).unwrap();
    let addresses: Vec<u64> = cells.iter().map(|c| c.address).collect();
    assert_eq!(addresses, vec![0, 1, 2]);

    // Payloads actually landed in the media root.
    for cell in &cells {
        assert!(server.media_root.join(&cell.path).exists());
    }
}

#[tokio::test]
async fn upload_empty_file_transfers_no_cells() {
    let server = TestServer::start().await.unwrap();
    server.register_user().unwrap();
    let client = ApiClient::new(&server.client_config()).unwrap();

    let dir = TempDir::new().unwrap();
    let file = write_test_file(dir.path(), "empty.bin", b"");

    let status = TransferStatus::new();
    let report = client.upload_file(&file, &status).await.unwrap();

    assert_eq!(report.cells, 0);
    assert_eq!(status.get(), 0);
    assert!(server.state.store.cells_for(report.storage_id).unwrap().is_empty());
}

#[tokio::test]
async fn storage_list_reflects_uploads() {
    let server = TestServer::start().await.unwrap();
    server.register_user().unwrap();
    let client = ApiClient::new(&server.client_config()).unwrap();

    let dir = TempDir::new().unwrap();
    let file = write_test_file(dir.path(), "listed.bin", &test_bytes(CELL_SIZE + 1));
    let report = client.upload_file(&file, &TransferStatus::new()).await.unwrap();

    let listed = client.storage_list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, report.storage_id);
    assert_eq!(listed[0].name, "listed.bin");
    assert_eq!(listed[0].size, 2); // cell count, not bytes
}

// ── Protocol-level submissions ────────────────────────────────────────────────

async fn raw_init_upload(server: &TestServer, name: &str, size: u64) -> InitUploadResponse {
    reqwest::Client::new()
        .post(format!("{}/upload_init", server.url()))
        .header("api-key", API_KEY)
        .json(&InitUploadRequest { name: name.to_string(), size })
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn raw_upload_cell(
    server: &TestServer,
    session: &str,
    number: &str,
    data: &[u8],
) -> reqwest::Response {
    let part = reqwest::multipart::Part::bytes(data.to_vec()).file_name("cell.bin");
    let form = reqwest::multipart::Form::new()
        .part("file", part)
        .text("number", number.to_string());
    reqwest::Client::new()
        .post(format!("{}/upload", server.url()))
        .header("api-key", API_KEY)
        .header("session", session)
        .multipart(form)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn duplicate_cell_submission_is_rejected() {
    let server = TestServer::start().await.unwrap();
    server.register_user().unwrap();

    let init = raw_init_upload(&server, "dup.bin", 10).await;

    let first = raw_upload_cell(&server, &init.session, "0", b"payload-0").await;
    assert_eq!(first.status(), 201);

    let second = raw_upload_cell(&server, &init.session, "0", b"payload-0").await;
    assert_eq!(second.status(), 403);
    let body: ErrorBody = second.json().await.unwrap();
    assert_eq!(body.error_type, "DuplicateAddress");

    // The received set grew by exactly one.
    assert_eq!(server.state.sessions.received(&init.session), Some((1, 1)));
}

#[tokio::test]
async fn out_of_range_address_is_rejected() {
    let server = TestServer::start().await.unwrap();
    server.register_user().unwrap();

    let init = raw_init_upload(&server, "range.bin", 10).await; // one cell

    let resp = raw_upload_cell(&server, &init.session, "5", b"payload").await;
    assert_eq!(resp.status(), 403);
    let body: ErrorBody = resp.json().await.unwrap();
    assert_eq!(body.error_type, "AddressOutOfRange");
}

#[tokio::test]
async fn unknown_session_is_rejected() {
    let server = TestServer::start().await.unwrap();
    server.register_user().unwrap();

    let resp = raw_upload_cell(&server, "no-such-token", "0", b"payload").await;
    assert_eq!(resp.status(), 404);
    let body: ErrorBody = resp.json().await.unwrap();
    assert_eq!(body.error_type, "SessionNotFound");
}
