//! Storage listing.

use anyhow::Result;

use depot_client::ApiClient;
use depot_core::config::ClientConfig;

pub async fn run(config: &ClientConfig) -> Result<()> {
    let client = ApiClient::new(config)?;
    let storage_list = client.storage_list().await?;

    if storage_list.is_empty() {
        println!("No storage objects yet.");
        return Ok(());
    }

    println!("═══════════════════════════════════════");
    println!("  Storage on {}", config.server_url);
    println!("═══════════════════════════════════════");
    for (number, entry) in storage_list.iter().enumerate() {
        println!(
            "  {}) ID={}  cells={}  {}",
            number + 1,
            entry.id,
            entry.size,
            entry.name
        );
    }

    Ok(())
}
