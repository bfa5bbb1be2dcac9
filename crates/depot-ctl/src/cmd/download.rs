//! Storage download with a periodic progress line.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use depot_client::{ApiClient, TransferStatus};
use depot_core::config::ClientConfig;

pub async fn run(config: &ClientConfig, id: &str, save_path: &str) -> Result<()> {
    let storage_id: i64 = id.parse().context("storage id must be a number")?;
    let client = ApiClient::new(config)?;
    let status = TransferStatus::new();

    // Advisory progress line; the download result is what decides
    // success.
    let ticker = {
        let status = status.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(500));
            interval.tick().await;
            loop {
                interval.tick().await;
                println!("  cells completed: {}", status.get());
            }
        })
    };

    println!("Downloading storage {} from {}", storage_id, config.server_url);
    let result = client.download(storage_id, Path::new(save_path), &status).await;
    ticker.abort();

    let dest = result?;
    println!("Download complete:");
    println!("  File  : {}", dest.display());
    println!("  Cells : {}", status.get());

    Ok(())
}
