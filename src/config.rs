// src/config.rs

use crate::cli::{Cli, UnknownExtensionPolicy};
use crate::file_utils::{expand_path, get_app_data_dir};
use std::{env, path::PathBuf, time::Duration};

/// Every extension accepted for upload or playlist scanning (all lowercase).
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "mp4", "avi", "mkv", "gif", "jpg", "jpeg", "png", "webp", "mov",
];
/// Extensions classified as still images.
pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];
/// Extensions classified as animated gifs.
pub const GIF_EXTENSIONS: &[&str] = &["gif"];
/// Extensions classified as videos.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mkv", "mov"];

/// The application name, used for creating the application-specific data directory.
pub const APP_NAME: &str = "media_remote";
/// Subdirectory of the app data directory that receives uploads by default.
pub const UPLOAD_DIR_NAME: &str = "uploads";

/// Default name of the external player executable.
#[cfg(windows)]
pub const DEFAULT_PLAYER_NAME: &str = "evlc.exe";
#[cfg(not(windows))]
pub const DEFAULT_PLAYER_NAME: &str = "evlc";

pub const DEFAULT_SETTLE_MS: u64 = 1000;
pub const DEFAULT_PLAYER_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_UPLOAD_MB: usize = 2048;

/// Environment fallbacks, read after `.env` has been loaded.
pub const ENV_PLAYER: &str = "MEDIA_REMOTE_PLAYER";
pub const ENV_UPLOAD_DIR: &str = "MEDIA_REMOTE_UPLOAD_DIR";

/// Runtime settings resolved from the command line, the environment and defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub player: String,
    pub player_args: Vec<String>,
    pub upload_dir: PathBuf,
    pub unknown_extensions: UnknownExtensionPolicy,
    pub settle_delay: Duration,
    pub player_timeout: Duration,
    pub max_upload_bytes: usize,
    pub keep_uploads: bool,
    pub show_qr: bool,
}

impl Settings {
    /// Resolves settings from parsed arguments. CLI values win over environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if no upload directory was given and the platform data
    /// directory cannot be determined or created.
    pub fn resolve(cli: Cli) -> Result<Self, Box<dyn std::error::Error>> {
        let player = cli
            .player
            .or_else(|| env::var(ENV_PLAYER).ok().filter(|s| !s.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_PLAYER_NAME.to_string());

        let upload_dir = match cli
            .upload_dir
            .or_else(|| env::var(ENV_UPLOAD_DIR).ok().filter(|s| !s.trim().is_empty()))
        {
            Some(dir) => expand_path(&dir),
            None => get_app_data_dir()?.join(UPLOAD_DIR_NAME),
        };

        Ok(Settings {
            host: cli.host,
            port: cli.port,
            player,
            player_args: cli.player_args,
            upload_dir,
            unknown_extensions: cli.unknown_extensions,
            settle_delay: Duration::from_millis(cli.settle_ms),
            player_timeout: Duration::from_secs(cli.player_timeout_secs.max(1)),
            max_upload_bytes: cli.max_upload_mb.saturating_mul(1024 * 1024),
            keep_uploads: cli.keep_uploads,
            show_qr: !cli.no_qr,
        })
    }
}
