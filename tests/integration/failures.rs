//! Partial-failure and precondition tests.

use crate::*;

use depot_client::{ApiClient, ClientError, TransferStatus};
use depot_core::CELL_SIZE;
use tempfile::TempDir;

#[tokio::test]
async fn failed_cell_fetch_names_the_address_and_leaves_no_file() {
    let server = TestServer::start().await.unwrap();
    server.register_user().unwrap();
    let client = ApiClient::new(&server.client_config()).unwrap();

    let src_dir = TempDir::new().unwrap();
    let data = test_bytes(2 * CELL_SIZE + CELL_SIZE / 2);
    let file = write_test_file(src_dir.path(), "broken.bin", &data);
    let report = client.upload_file(&file, &TransferStatus::new()).await.unwrap();

    // Break cell 1: its payload disappears from the media root, so its
    // fetch fails while the others succeed.
    let cells = server.state.store.cells_for(report.storage_id).unwrap();
    let victim = cells.iter().find(|c| c.address == 1).unwrap();
    std::fs::remove_file(server.media_root.join(&victim.path)).unwrap();

    let dest_dir = TempDir::new().unwrap();
    let err = client
        .download(report.storage_id, dest_dir.path(), &TransferStatus::new())
        .await
        .unwrap_err();

    match err {
        ClientError::IncompleteTransfer(failed) => assert_eq!(failed, vec![1]),
        other => panic!("unexpected error: {other}"),
    }

    // No final file and no leftover per-address temporaries.
    assert_eq!(std::fs::read_dir(dest_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn size_mismatch_fails_before_any_fetch() {
    let server = TestServer::start().await.unwrap();
    let user = server.register_user().unwrap();
    let client = ApiClient::new(&server.client_config()).unwrap();

    // Storage claims 3 cells but only 2 descriptors exist.
    let storage_id = server.state.store.create_storage(user, "short.bin", 3, 3).unwrap();
    for address in [0u64, 1] {
        let path = server
            .state
            .media
            .write_cell(user, storage_id, address, "short.bin", b"x")
            .await
            .unwrap();
        server.state.store.add_cell(storage_id, address, &path).unwrap();
    }

    let dest_dir = TempDir::new().unwrap();
    let err = client
        .download(storage_id, dest_dir.path(), &TransferStatus::new())
        .await
        .unwrap_err();

    match err {
        ClientError::SizeMismatch { declared, listed } => {
            assert_eq!(declared, 3);
            assert_eq!(listed, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    // Aborted before transfers: nothing was written.
    assert_eq!(std::fs::read_dir(dest_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn unknown_api_key_is_rejected() {
    let server = TestServer::start().await.unwrap();
    server.register_user().unwrap();

    let mut config = server.client_config();
    config.api_key = "wrong-key".to_string();
    let client = ApiClient::new(&config).unwrap();

    let err = client.storage_list().await.unwrap_err();
    match err {
        ClientError::Rejected { status, .. } => assert_eq!(status, 401),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn storage_of_another_user_is_forbidden() {
    let server = TestServer::start().await.unwrap();
    server.register_user().unwrap();
    server.state.store.create_user("other", "other-key").unwrap();

    let client = ApiClient::new(&server.client_config()).unwrap();
    let src_dir = TempDir::new().unwrap();
    let file = write_test_file(src_dir.path(), "mine.bin", b"private");
    let report = client.upload_file(&file, &TransferStatus::new()).await.unwrap();

    let mut other_config = server.client_config();
    other_config.api_key = "other-key".to_string();
    let other = ApiClient::new(&other_config).unwrap();

    let dest_dir = TempDir::new().unwrap();
    let err = other
        .download(report.storage_id, dest_dir.path(), &TransferStatus::new())
        .await
        .unwrap_err();
    match err {
        ClientError::Rejected { status, .. } => assert_eq!(status, 403),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let server = TestServer::start().await.unwrap();
    let client = ApiClient::new(&server.client_config()).unwrap();

    client.register("first").await.unwrap();
    let err = client.register("second").await.unwrap_err();
    match err {
        ClientError::Rejected { status, detail, .. } => {
            assert_eq!(status, 403);
            assert!(detail.contains("UserExists"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
