// src/error.rs

use actix_web::http::StatusCode;
use thiserror::Error;

/// Failure kinds reported by the player controller and upload intake.
///
/// None of these are fatal: every one is turned into a message for the UI.
#[derive(Error, Debug)]
pub enum PlayerError {
    /// Bad or missing extension, empty filename, or nothing selected at all.
    #[error("{0}")]
    RejectedUpload(String),

    #[error("Folder not found or is not a directory: {0}")]
    FolderNotFound(String),

    #[error("No supported media files found in folder: {0}")]
    NoMediaInFolder(String),

    #[error("File not found at {0}")]
    MediaNotFound(String),

    /// The player binary is missing, exited non-zero, or timed out.
    #[error("{0}")]
    PlayerUnavailable(String),

    #[error("No active playlist to advance.")]
    NoActivePlaylist,

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlayerError {
    /// HTTP status the web layer answers with for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            PlayerError::RejectedUpload(_) => StatusCode::BAD_REQUEST,
            PlayerError::FolderNotFound(_)
            | PlayerError::NoMediaInFolder(_)
            | PlayerError::MediaNotFound(_) => StatusCode::NOT_FOUND,
            PlayerError::NoActivePlaylist => StatusCode::CONFLICT,
            PlayerError::PlayerUnavailable(_) => StatusCode::BAD_GATEWAY,
            PlayerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let err = PlayerError::FolderNotFound("/nope".into());
        assert_eq!(
            err.to_string(),
            "Folder not found or is not a directory: /nope"
        );
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = PlayerError::PlayerUnavailable("Error: boom".into());
        assert_eq!(err.to_string(), "Error: boom");
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}
