//! User registration.

use anyhow::Result;

use depot_client::ApiClient;
use depot_core::config::ClientConfig;

pub async fn run(config: &ClientConfig, name: &str) -> Result<()> {
    let client = ApiClient::new(config)?;
    client.register(name).await?;
    println!("Registered {} on {}", name, config.server_url);
    Ok(())
}
