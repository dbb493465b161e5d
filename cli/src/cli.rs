//! # CLI Interface
//!
//! Defines the command-line argument structure for `skytrust` using
//! `clap` derive. Portal list, timeout and seed can also come from
//! `SKYTRUST_*` environment variables.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use skytrust_protocol::config::{DEFAULT_NOT_FOUND_QUORUM, DEFAULT_PORTALS};
use skytrust_protocol::Skylink;

/// Trust-minimized Skynet client.
///
/// Downloads, uploads and registry access through untrusted portals.
/// Every response is verified locally before it is used.
#[derive(Parser, Debug)]
#[command(
    name = "skytrust",
    about = "Trust-minimized Skynet client",
    version,
    propagate_version = true
)]
pub struct SkytrustCli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Portals to try, in order. Comma separated.
    #[arg(long, global = true, env = "SKYTRUST_PORTALS", value_delimiter = ',')]
    pub portals: Vec<String>,

    /// How many portals must answer 404 before an entry is reported missing.
    #[arg(long, global = true, env = "SKYTRUST_NOT_FOUND_QUORUM", default_value_t = DEFAULT_NOT_FOUND_QUORUM)]
    pub not_found_quorum: usize,

    /// Per-request timeout in seconds.
    #[arg(long, global = true, env = "SKYTRUST_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Log output format: pretty or json.
    #[arg(long, global = true, env = "SKYTRUST_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Hex-encoded 16-byte root seed used for key derivation.
    #[arg(long, global = true, env = "SKYTRUST_SEED", hide_env_values = true)]
    pub seed: Option<String>,
}

impl GlobalArgs {
    /// The configured portals, or the built-in list if none were given.
    pub fn portal_list(&self) -> Vec<String> {
        let portals: Vec<String> = self
            .portals
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if portals.is_empty() {
            DEFAULT_PORTALS.iter().map(|p| p.to_string()).collect()
        } else {
            portals
        }
    }
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download and verify a file.
    Download(DownloadArgs),
    /// Decode a link locally without touching the network.
    Inspect(InspectArgs),
    /// Derive the registry keys for a pair of tags from the root seed.
    DeriveKeys(TagArgs),
    /// Read and verify a registry entry.
    ReadEntry(ReadEntryArgs),
    /// Sign and write a registry entry with keys derived from the root seed.
    WriteEntry(WriteEntryArgs),
    /// Upload a small file and check the portal's answer against the local link.
    Upload(UploadArgs),
    /// Print a fresh random root seed.
    GenSeed,
    /// Print version information and exit.
    Version,
}

#[derive(Parser, Debug)]
pub struct DownloadArgs {
    /// The link to download, V1 or V2.
    pub link: Skylink,

    /// Write the file here instead of stdout.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    pub link: Skylink,
}

#[derive(Args, Debug)]
pub struct TagArgs {
    /// Tag selecting the keypair.
    #[arg(long)]
    pub keypair_tag: String,

    /// Tag selecting the data key under that keypair.
    #[arg(long)]
    pub data_key_tag: String,
}

#[derive(Parser, Debug)]
pub struct ReadEntryArgs {
    /// Hex-encoded Ed25519 public key of the entry owner.
    #[arg(long)]
    pub public_key: String,

    /// Hex-encoded 32-byte data key.
    #[arg(long)]
    pub data_key: String,
}

#[derive(Parser, Debug)]
pub struct WriteEntryArgs {
    #[command(flatten)]
    pub tags: TagArgs,

    /// Store this link in the entry.
    #[arg(long, conflicts_with = "data_hex", required_unless_present = "data_hex")]
    pub link: Option<Skylink>,

    /// Store these raw bytes (hex) in the entry.
    #[arg(long)]
    pub data_hex: Option<String>,

    /// Revision to write. Defaults to one past the current revision.
    #[arg(long)]
    pub revision: Option<u64>,
}

#[derive(Parser, Debug)]
pub struct UploadArgs {
    /// File to upload. Must fit in a single 4 MiB sector with its metadata.
    pub file: PathBuf,

    /// Name stored in the metadata. Defaults to the file's name.
    #[arg(long)]
    pub filename: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        SkytrustCli::command().debug_assert();
    }

    #[test]
    fn portals_are_comma_separated() {
        let cli = SkytrustCli::parse_from(["skytrust", "--portals", "a.net, b.net", "gen-seed"]);
        assert_eq!(cli.global.portal_list(), vec!["a.net".to_string(), "b.net".to_string()]);
    }

    #[test]
    fn write_entry_needs_data() {
        assert!(SkytrustCli::try_parse_from([
            "skytrust",
            "write-entry",
            "--keypair-tag",
            "k",
            "--data-key-tag",
            "d",
        ])
        .is_err());
    }
}
