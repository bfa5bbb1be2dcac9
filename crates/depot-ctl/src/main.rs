//! depot-ctl — command-line client for the Depot storage service.

use std::path::Path;

use anyhow::{Context, Result};

use depot_core::config::DepotConfig;

mod cmd;

fn print_usage() {
    println!("Usage: depot-ctl [options] <command>");
    println!();
    println!("Commands:");
    println!("  register <name>               Register this API key under <name>");
    println!("  ls                            List your storage objects");
    println!("  upload <file>                 Upload a file as cells");
    println!("  download <id> [--path <dir>]  Download storage <id> into <dir> (default .)");
    println!();
    println!("Options:");
    println!("  --server <url>    Server URL (overrides config)");
    println!("  --api-key <key>   API key (overrides config)");
    println!("  --config <path>   Config file to load");
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut server: Option<String> = None;
    let mut api_key: Option<String> = None;
    let mut config_path: Option<String> = None;
    let mut save_path: Option<String> = None;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--server" => {
                i += 1;
                server = Some(args.get(i).context("--server requires a value")?.clone());
            }
            "--api-key" => {
                i += 1;
                api_key = Some(args.get(i).context("--api-key requires a value")?.clone());
            }
            "--config" => {
                i += 1;
                config_path = Some(args.get(i).context("--config requires a value")?.clone());
            }
            "--path" => {
                i += 1;
                save_path = Some(args.get(i).context("--path requires a value")?.clone());
            }
            other => remaining.push(other),
        }
        i += 1;
    }

    let config = match &config_path {
        Some(path) => DepotConfig::load_from(Path::new(path))
            .with_context(|| format!("failed to load config from {path}"))?,
        None => DepotConfig::load().unwrap_or_else(|e| {
            eprintln!("warning: {e}, using defaults");
            DepotConfig::default()
        }),
    };
    let mut client_config = config.client;
    if let Some(server) = server {
        client_config.server_url = server;
    }
    if let Some(key) = api_key {
        client_config.api_key = key;
    }

    let needs_key = !matches!(remaining.as_slice(), ["help"] | ["--help"] | ["-h"] | []);
    if needs_key && client_config.api_key.is_empty() {
        eprintln!("No API key configured. Set one in the config file or pass --api-key.");
        std::process::exit(1);
    }

    match remaining.as_slice() {
        ["register", name]             => cmd::register::run(&client_config, name).await,
        ["ls"]                         => cmd::storage::run(&client_config).await,
        ["upload", file]               => cmd::upload::run(&client_config, file).await,
        ["download", id]               => {
            cmd::download::run(&client_config, id, save_path.as_deref().unwrap_or(".")).await
        }
        ["help"] | ["--help"] | ["-h"] | [] => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
