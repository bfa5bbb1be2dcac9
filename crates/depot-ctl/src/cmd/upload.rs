//! File upload.

use std::path::Path;

use anyhow::Result;

use depot_client::{ApiClient, TransferStatus};
use depot_core::config::ClientConfig;

pub async fn run(config: &ClientConfig, file: &str) -> Result<()> {
    let client = ApiClient::new(config)?;
    let status = TransferStatus::new();

    println!("Uploading {} to {}", file, config.server_url);
    let report = client.upload_file(Path::new(file), &status).await?;

    println!("Upload complete:");
    println!("  Storage ID : {}", report.storage_id);
    println!("  Cells      : {}", report.cells);
    println!("  Bytes      : {}", report.bytes);

    Ok(())
}
