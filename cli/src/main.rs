// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Skytrust CLI
//!
//! Entry point for the `skytrust` binary. Parses CLI arguments, initializes
//! logging, and runs one command against the configured portals.
//!
//! - `download`    - fetch and verify a file
//! - `inspect`     - decode a link offline
//! - `derive-keys` - show registry keys derived from the root seed
//! - `read-entry`  - read and verify a registry entry
//! - `write-entry` - sign and store a registry entry
//! - `upload`      - upload a small file
//! - `gen-seed`    - generate a root seed
//! - `version`     - print build version information

mod cli;
mod logging;

use std::io::Write;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;

use skytrust_protocol::crypto::SkyPublicKey;
use skytrust_protocol::encoding::{bytes_to_hex, hex_to_array, hex_to_bytes};
use skytrust_protocol::registry::{derive_entry_keys, entry_id, resolver_link, EntryKeys, RootSeed};
use skytrust_protocol::skyfile::SkyfileMetadata;
use skytrust_protocol::{ClientConfig, PortalError, RegistryLookup, Skylink, SkynetClient};

use cli::{Commands, GlobalArgs, SkytrustCli};
use logging::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = SkytrustCli::parse();
    logging::init_logging(
        "skytrust=info,skytrust_protocol=info",
        LogFormat::from_str_lossy(&cli.global.log_format),
    );

    let result = match cli.command {
        Commands::Download(args) => download(&cli.global, args).await,
        Commands::Inspect(args) => inspect(&args.link),
        Commands::DeriveKeys(args) => derive_keys(&cli.global, &args),
        Commands::ReadEntry(args) => read_entry(&cli.global, args).await,
        Commands::WriteEntry(args) => write_entry(&cli.global, args).await,
        Commands::Upload(args) => upload(&cli.global, args).await,
        Commands::GenSeed => {
            println!("{}", bytes_to_hex(RootSeed::generate().as_bytes()));
            Ok(())
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    };

    if let Err(err) = &result {
        report_failures(err);
    }
    result
}

fn client(global: &GlobalArgs) -> Result<SkynetClient> {
    let config = ClientConfig {
        portals: global.portal_list(),
        not_found_quorum: global.not_found_quorum,
        request_timeout: Duration::from_secs(global.timeout_secs),
        ..ClientConfig::default()
    };
    SkynetClient::new(config).context("failed to build http client")
}

fn entry_keys(global: &GlobalArgs, tags: &cli::TagArgs) -> Result<EntryKeys> {
    let seed_hex = global
        .seed
        .as_deref()
        .ok_or_else(|| anyhow!("a root seed is required (--seed or SKYTRUST_SEED)"))?;
    let seed_bytes = hex_to_bytes(seed_hex.trim()).context("seed is not valid hex")?;
    let seed = RootSeed::try_from_slice(&seed_bytes)?;
    Ok(derive_entry_keys(seed.as_bytes(), &tags.keypair_tag, &tags.data_key_tag)?)
}

/// Print the per-portal failure list when every portal failed.
fn report_failures(err: &anyhow::Error) {
    if let Some(PortalError::Exhausted(exhausted)) = err.downcast_ref::<PortalError>() {
        for failure in &exhausted.failures {
            match failure.status {
                Some(status) => eprintln!("  {} (HTTP {}): {}", failure.portal, status, failure.message),
                None => eprintln!("  {}: {}", failure.portal, failure.message),
            }
        }
    }
}

async fn download(global: &GlobalArgs, args: cli::DownloadArgs) -> Result<()> {
    let served = client(global)?.download(&args.link).await?;
    let file = served.value;
    tracing::info!(
        portal = %served.portal,
        resolved = %file.resolved_link,
        bytes = file.file_data.len(),
        filename = file.filename().as_deref().unwrap_or("-"),
        "file verified"
    );

    match args.output {
        Some(path) => std::fs::write(&path, &file.file_data)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => std::io::stdout()
            .write_all(&file.file_data)
            .context("failed to write to stdout")?,
    }
    Ok(())
}

fn inspect(link: &Skylink) -> Result<()> {
    let bitfield = link.bitfield()?;
    let summary = serde_json::json!({
        "link": link.to_text(),
        "version": bitfield.version.as_u8(),
        "offset": bitfield.offset,
        "fetch_size": bitfield.fetch_size,
        "root": bytes_to_hex(&link.root()),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn derive_keys(global: &GlobalArgs, tags: &cli::TagArgs) -> Result<()> {
    let keys = entry_keys(global, tags)?;
    let public_key = keys.public_key();
    let summary = serde_json::json!({
        "public_key": public_key.to_hex(),
        "data_key": bytes_to_hex(&keys.data_key),
        "entry_id": bytes_to_hex(&entry_id(&public_key, &keys.data_key)),
        "resolver_link": resolver_link(&public_key, &keys.data_key).to_text(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn read_entry(global: &GlobalArgs, args: cli::ReadEntryArgs) -> Result<()> {
    let public_key = SkyPublicKey::try_from_slice(
        &hex_to_bytes(&args.public_key).context("public key is not valid hex")?,
    )?;
    let data_key = hex_to_array::<32>(&args.data_key).context("data key must be 32 bytes of hex")?;

    match client(global)?.read_entry(&public_key, &data_key).await? {
        RegistryLookup::Found(entry) => {
            let link = Skylink::try_from_slice(&entry.data)
                .ok()
                .filter(Skylink::is_valid)
                .map(|link| link.to_text());
            let summary = serde_json::json!({
                "data": bytes_to_hex(&entry.data),
                "revision": entry.revision,
                "signature": entry.signature.to_hex(),
                "link": link,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        RegistryLookup::NotFound => println!("entry not found"),
    }
    Ok(())
}

async fn write_entry(global: &GlobalArgs, args: cli::WriteEntryArgs) -> Result<()> {
    let keys = entry_keys(global, &args.tags)?;
    let data = match (&args.link, &args.data_hex) {
        (Some(link), _) => link.as_bytes().to_vec(),
        (None, Some(data_hex)) => hex_to_bytes(data_hex).context("data is not valid hex")?,
        (None, None) => bail!("either --link or --data-hex is required"),
    };

    let client = client(global)?;
    let written = match args.revision {
        Some(revision) => client.write_entry(&keys.keypair, &keys.data_key, &data, revision).await?,
        None => client.update_entry(&keys.keypair, &keys.data_key, &data).await?,
    };

    println!(
        "wrote revision {} via {} ({})",
        written.value.revision,
        written.portal,
        resolver_link(&keys.public_key(), &keys.data_key)
    );
    Ok(())
}

async fn upload(global: &GlobalArgs, args: cli::UploadArgs) -> Result<()> {
    let file = std::fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let filename = match args.filename {
        Some(name) => name,
        None => args
            .file
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("cannot derive a filename from {}", args.file.display()))?,
    };

    let metadata = SkyfileMetadata::new(filename, file.len() as u64);
    let served = client(global)?.upload(&file, &metadata).await?;
    tracing::info!(portal = %served.portal, "upload confirmed");
    println!("{}", served.value);
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("skytrust {}", env!("CARGO_PKG_VERSION"));
    println!("rustc    {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
