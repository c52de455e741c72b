// src/media.rs

use crate::cli::UnknownExtensionPolicy;
use crate::config::{ALLOWED_EXTENSIONS, GIF_EXTENSIONS, PHOTO_EXTENSIONS, VIDEO_EXTENSIONS};
use crate::error::PlayerError;
use serde::Serialize;
use std::{fmt, path::PathBuf};

/// Kind of media, passed verbatim to the external player as its first argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Video,
    Photo,
    Gif,
}

impl MediaType {
    /// The lowercase tag the player understands.
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Video => "video",
            MediaType::Photo => "photo",
            MediaType::Gif => "gif",
        }
    }

    fn from_extension(ext: &str) -> Option<Self> {
        if PHOTO_EXTENSIONS.contains(&ext) {
            Some(MediaType::Photo)
        } else if GIF_EXTENSIONS.contains(&ext) {
            Some(MediaType::Gif)
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            Some(MediaType::Video)
        } else {
            None
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One playlist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub path: PathBuf,
    pub media_type: MediaType,
}

/// Returns the lowercase text after the last '.', or `None` when there is no '.'.
pub fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Returns true if `filename` ends in one of the allowed extensions.
pub fn is_allowed(filename: &str) -> bool {
    extension_of(filename).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// Classifies a filename against the allow-list. Anything not on it is rejected.
///
/// # Errors
///
/// Returns [`PlayerError::RejectedUpload`] if the name has no '.' or its
/// extension is not recognized.
pub fn classify(filename: &str) -> Result<MediaType, PlayerError> {
    let ext = extension_of(filename).ok_or_else(|| {
        PlayerError::RejectedUpload(format!("File has no extension: {}", filename))
    })?;

    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(PlayerError::RejectedUpload(format!(
            "File type not allowed: .{}",
            ext
        )));
    }

    MediaType::from_extension(&ext).ok_or_else(|| {
        PlayerError::RejectedUpload(format!("File type not allowed: .{}", ext))
    })
}

/// Classifies a server-side path according to the configured policy.
///
/// Under [`UnknownExtensionPolicy::Lenient`] anything the strict check rejects,
/// including a name without a '.', is treated as a video.
pub fn classify_with_policy(
    filename: &str,
    policy: UnknownExtensionPolicy,
) -> Result<MediaType, PlayerError> {
    match (classify(filename), policy) {
        (Ok(media_type), _) => Ok(media_type),
        (Err(_), UnknownExtensionPolicy::Lenient) => Ok(MediaType::Video),
        (Err(e), UnknownExtensionPolicy::Strict) => Err(e),
    }
}
