//! Download-path integration tests.

use crate::*;

use depot_client::{ApiClient, TransferStatus};
use depot_core::CELL_SIZE;
use tempfile::TempDir;

#[tokio::test]
async fn upload_then_download_is_byte_identical() {
    let server = TestServer::start().await.unwrap();
    server.register_user().unwrap();
    let client = ApiClient::new(&server.client_config()).unwrap();

    let src_dir = TempDir::new().unwrap();
    let data = test_bytes(2 * CELL_SIZE + CELL_SIZE / 2); // 2.5 MiB → 3 cells
    let file = write_test_file(src_dir.path(), "roundtrip.bin", &data);
    let report = client.upload_file(&file, &TransferStatus::new()).await.unwrap();

    let dest_dir = TempDir::new().unwrap();
    let status = TransferStatus::new();
    let dest = client
        .download(report.storage_id, dest_dir.path(), &status)
        .await
        .unwrap();

    assert_eq!(dest.file_name().unwrap(), "roundtrip.bin");
    assert_eq!(std::fs::read(&dest).unwrap(), data);
    assert_eq!(status.get(), 3);

    // Per-address temporaries were folded in and removed; only the
    // final file remains.
    let entries: Vec<_> = std::fs::read_dir(dest_dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("roundtrip.bin")]);
}

#[tokio::test]
async fn download_of_empty_storage_creates_empty_file() {
    let server = TestServer::start().await.unwrap();
    server.register_user().unwrap();
    let client = ApiClient::new(&server.client_config()).unwrap();

    let src_dir = TempDir::new().unwrap();
    let file = write_test_file(src_dir.path(), "nothing.bin", b"");
    let report = client.upload_file(&file, &TransferStatus::new()).await.unwrap();

    let dest_dir = TempDir::new().unwrap();
    let dest = client
        .download(report.storage_id, dest_dir.path(), &TransferStatus::new())
        .await
        .unwrap();

    assert_eq!(std::fs::read(&dest).unwrap().len(), 0);
}

#[tokio::test]
async fn download_survives_out_of_order_cell_rows() {
    let server = TestServer::start().await.unwrap();
    let user = server.register_user().unwrap();
    let client = ApiClient::new(&server.client_config()).unwrap();

    // Build a storage object by hand with descriptors stored out of
    // address order; reassembly must still produce address order.
    let storage_id = server.state.store.create_storage(user, "shuffled.bin", 6, 3).unwrap();
    for (address, payload) in [(2u64, b"cc"), (0, b"aa"), (1, b"bb")] {
        let path = server
            .state
            .media
            .write_cell(user, storage_id, address, "shuffled.bin", payload)
            .await
            .unwrap();
        server.state.store.add_cell(storage_id, address, &path).unwrap();
    }

    let dest_dir = TempDir::new().unwrap();
    let dest = client
        .download(storage_id, dest_dir.path(), &TransferStatus::new())
        .await
        .unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), b"aabbcc");
}
