// src/cli.rs

use crate::config::{DEFAULT_MAX_UPLOAD_MB, DEFAULT_PLAYER_TIMEOUT_SECS, DEFAULT_SETTLE_MS};
use clap::{Parser, ValueEnum};

/// How a server-side path with an unrecognized extension is handled.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownExtensionPolicy {
    /// Refuse the path, same as uploads.
    #[default]
    Strict,
    /// Hand the path to the player as a video.
    Lenient,
}

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Web remote that plays uploaded or server-side media through an external player.",
    long_about = None
)]
pub struct Cli {
    #[clap(long, default_value = "0.0.0.0")]
    pub host: String,

    #[clap(short, long, default_value_t = 5000)]
    pub port: u16,

    /// Player executable (falls back to MEDIA_REMOTE_PLAYER, then `evlc`).
    #[clap(long)]
    pub player: Option<String>,

    /// Extra argument placed before the player command. Repeatable.
    #[clap(long = "player-arg", allow_hyphen_values = true)]
    pub player_args: Vec<String>,

    /// Where uploads are stored (falls back to MEDIA_REMOTE_UPLOAD_DIR).
    #[clap(long)]
    pub upload_dir: Option<String>,

    #[clap(long, value_enum, default_value_t = UnknownExtensionPolicy::Strict)]
    pub unknown_extensions: UnknownExtensionPolicy,

    /// Pause between `stop` and the next play command, in milliseconds.
    #[clap(long, default_value_t = DEFAULT_SETTLE_MS)]
    pub settle_ms: u64,

    #[clap(long, default_value_t = DEFAULT_PLAYER_TIMEOUT_SECS)]
    pub player_timeout_secs: u64,

    #[clap(long, default_value_t = DEFAULT_MAX_UPLOAD_MB)]
    pub max_upload_mb: usize,

    /// Keep uploaded files after they stop playing.
    #[clap(long, action = clap::ArgAction::SetTrue)]
    pub keep_uploads: bool,

    /// Do not print the QR code for the remote URL.
    #[clap(long, name = "no-qr", action = clap::ArgAction::SetTrue)]
    pub no_qr: bool,
}
