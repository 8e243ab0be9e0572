//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use imagine_pipeline::CANDIDATE_COUNT;

/// Destination directory used when `--dest` is not given.
pub const DEFAULT_DEST: &str = "pics";

#[derive(Parser, Debug)]
#[command(name = "imagine")]
#[command(about = "Generate an image from a prompt, upscale it, and save it")]
#[command(version)]
pub struct Args {
    /// Text prompt to generate from
    #[arg(short, long)]
    pub prompt: String,

    /// Filename prefix, joined to the sequence number with '-'
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Sequence number, zero-padded to three digits in the filename
    #[arg(short, long, default_value = "0")]
    pub sequence: u64,

    /// Directory the image is saved to (created if missing)
    #[arg(short, long, default_value = DEFAULT_DEST)]
    pub dest: PathBuf,

    /// Candidate of the generated grid to upscale (1-based)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=i64::from(CANDIDATE_COUNT)))]
    pub candidate: Option<u8>,

    /// Cap on attempts per phase; retries forever when unset
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Exit with an error when the final download fails
    #[arg(long)]
    pub strict_download: bool,

    /// Path to a TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Gateway WebSocket URL
    #[arg(long, env = "IMAGINE_GATEWAY_URL")]
    pub gateway_url: Option<String>,

    /// Server (guild) id on the remote service
    #[arg(long, env = "SERVER_ID")]
    pub server_id: Option<String>,

    /// Channel id on the remote service
    #[arg(long, env = "CHANNEL_ID")]
    pub channel_id: Option<String>,

    /// Session token for the remote service
    #[arg(long, env = "SALAI_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}
