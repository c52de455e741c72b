// src/controller.rs

use crate::cli::UnknownExtensionPolicy;
use crate::error::PlayerError;
use crate::file_utils::{expand_path, find_media_files, remove_file_best_effort, save_upload};
use crate::media::{classify_with_policy, MediaItem, MediaType};
use crate::player_backend::PlayerBackend;
use log::{info, warn};
use serde::Serialize;
use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, RwLock},
    thread,
    time::Duration,
};

/// What is on screen right now.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub current_media: Option<PathBuf>,
    pub media_type: Option<MediaType>,
}

/// Folder playlist plus its cursor. `cursor` is `None` exactly when `items` is empty.
#[derive(Debug, Clone, Default)]
struct Playlist {
    items: Vec<MediaItem>,
    cursor: Option<usize>,
}

impl Playlist {
    fn clear(&mut self) {
        self.items.clear();
        self.cursor = None;
    }

    fn is_active(&self) -> bool {
        !self.items.is_empty() && self.cursor.is_some()
    }
}

#[derive(Debug, Default)]
struct ControllerState {
    playback: PlaybackState,
    playlist: Playlist,
    /// Upload currently on screen, deleted once something else replaces it.
    current_upload: Option<PathBuf>,
}

/// Read-only view of the controller for the UI.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub is_playing: bool,
    pub current_media: Option<String>,
    pub media_type: Option<MediaType>,
    pub playlist_active: bool,
    pub playlist_position: Option<usize>,
    pub playlist_len: usize,
}

impl StatusSnapshot {
    fn of(state: &ControllerState) -> Self {
        StatusSnapshot {
            is_playing: state.playback.is_playing,
            current_media: state
                .playback
                .current_media
                .as_ref()
                .map(|p| p.display().to_string()),
            media_type: state.playback.media_type,
            playlist_active: state.playlist.is_active(),
            playlist_position: state.playlist.cursor,
            playlist_len: state.playlist.items.len(),
        }
    }
}

/// Result of a command, ready for display.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CommandOutcome {
    pub success: bool,
    pub message: String,
}

impl From<Result<String, PlayerError>> for CommandOutcome {
    fn from(result: Result<String, PlayerError>) -> Self {
        match result {
            Ok(message) => CommandOutcome {
                success: true,
                message,
            },
            Err(e) => CommandOutcome {
                success: false,
                message: e.to_string(),
            },
        }
    }
}

/// Where a single play request gets its media from.
#[derive(Debug, Clone)]
pub enum MediaSource {
    /// An uploaded file still sitting at `temp_path` under the client's `original_name`.
    Upload {
        original_name: String,
        temp_path: PathBuf,
    },
    /// A path on this machine, typed into the UI.
    ServerPath(String),
}

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub upload_dir: PathBuf,
    pub unknown_extensions: UnknownExtensionPolicy,
    pub settle_delay: Duration,
    pub keep_uploads: bool,
}

/// Owns playback and playlist state and drives the external player.
///
/// Every operation takes the one state lock for its whole duration, including the
/// settle delay and the player call, so commands never interleave. Readers go
/// through a separately published [`StatusSnapshot`] and never wait on a command.
pub struct PlayerController {
    backend: Arc<dyn PlayerBackend>,
    options: ControllerOptions,
    state: Mutex<ControllerState>,
    snapshot: RwLock<StatusSnapshot>,
}

impl PlayerController {
    pub fn new(backend: Arc<dyn PlayerBackend>, options: ControllerOptions) -> Self {
        let state = ControllerState::default();
        PlayerController {
            backend,
            options,
            snapshot: RwLock::new(StatusSnapshot::of(&state)),
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Runs `op` under the state lock, then publishes the resulting status.
    fn with_state<T>(&self, op: impl FnOnce(&mut ControllerState) -> T) -> T {
        let mut state = self.lock();
        let result = op(&mut state);
        *self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = StatusSnapshot::of(&state);
        result
    }

    /// Status as of the last finished command. Never blocks on a running one.
    pub fn status(&self) -> StatusSnapshot {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Handles a play request from the UI: saves and classifies an upload, or
    /// classifies a server path under the configured policy, then plays it.
    pub fn play_media(&self, source: MediaSource) -> Result<String, PlayerError> {
        match source {
            MediaSource::Upload {
                original_name,
                temp_path,
            } => self.with_state(|state| {
                let (path, media_type) =
                    save_upload(&self.options.upload_dir, &original_name, &temp_path)?;
                let result = self.play_single_locked(state, &path, media_type);
                if result.is_ok() {
                    state.current_upload = Some(path);
                } else if !self.options.keep_uploads {
                    remove_file_best_effort(&path);
                }
                result
            }),
            MediaSource::ServerPath(raw) => {
                let raw = raw.trim();
                if raw.is_empty() {
                    return Err(PlayerError::RejectedUpload("No media selected.".into()));
                }
                let media_type = classify_with_policy(raw, self.options.unknown_extensions)?;
                let path = expand_path(raw);
                self.play_single(&path, media_type)
            }
        }
    }

    /// Plays one file outside of any playlist. Any active playlist is dropped.
    pub fn play_single(&self, path: &Path, media_type: MediaType) -> Result<String, PlayerError> {
        self.with_state(|state| self.play_single_locked(state, path, media_type))
    }

    fn play_single_locked(
        &self,
        state: &mut ControllerState,
        path: &Path,
        media_type: MediaType,
    ) -> Result<String, PlayerError> {
        state.playlist.clear();
        self.discard_previous_upload(state, |upload| upload == path);
        self.play_item(state, path, media_type)
    }

    /// Builds a sorted playlist from the top level of `directory` and plays its first entry.
    pub fn start_folder_playlist(&self, directory: &str) -> Result<String, PlayerError> {
        if directory.trim().is_empty() {
            return Err(PlayerError::RejectedUpload("No folder path provided.".into()));
        }
        let folder = expand_path(directory);
        let items = find_media_files(&folder)?;

        self.with_state(|state| {
            if items.is_empty() {
                state.playlist.clear();
                return Err(PlayerError::NoMediaInFolder(folder.display().to_string()));
            }

            info!(
                "Starting playlist of {} item(s) from '{}'",
                items.len(),
                folder.display()
            );
            // An upload that is itself part of the new playlist must survive.
            self.discard_previous_upload(state, |upload| {
                items.iter().any(|item| item.path == upload)
            });
            state.playlist.items = items;
            state.playlist.cursor = Some(0);

            let first = state.playlist.items[0].clone();
            self.play_item(state, &first.path, first.media_type)
                .map(|_| format!("Playlist started. Now playing: {}", display_name(&first.path)))
                .map_err(|e| match e {
                    PlayerError::PlayerUnavailable(msg) => {
                        PlayerError::PlayerUnavailable(format!("Error starting playlist: {}", msg))
                    }
                    other => other,
                })
        })
    }

    /// Moves the cursor forward, wrapping past the last item, and plays that item.
    pub fn advance_playlist(&self) -> Result<String, PlayerError> {
        self.with_state(|state| {
            let cursor = match state.playlist.cursor {
                Some(cursor) if !state.playlist.items.is_empty() => cursor,
                _ => return Err(PlayerError::NoActivePlaylist),
            };

            let next = (cursor + 1) % state.playlist.items.len();
            state.playlist.cursor = Some(next);
            let item = state.playlist.items[next].clone();

            self.play_item(state, &item.path, item.media_type)
                .map(|_| format!("Next item: {}", display_name(&item.path)))
        })
    }

    /// Stops the player. Local state always returns to idle, even if the command fails.
    pub fn stop(&self) -> Result<String, PlayerError> {
        self.with_state(|state| {
            let result = self.backend.stop();

            state.playback = PlaybackState::default();
            state.playlist.clear();
            self.discard_previous_upload(state, |_| false);
            info!("Playback stopped; state reset to idle");

            result
                .map(|_| "Media playback stopped.".to_string())
                .map_err(|e| PlayerError::PlayerUnavailable(format!("Failed to stop media: {}", e)))
        })
    }

    /// Stop, settle, play. Leaves the playlist alone.
    fn play_item(
        &self,
        state: &mut ControllerState,
        path: &Path,
        media_type: MediaType,
    ) -> Result<String, PlayerError> {
        if !path.exists() {
            state.playback = PlaybackState::default();
            return Err(PlayerError::MediaNotFound(path.display().to_string()));
        }

        if let Err(e) = self.backend.stop() {
            warn!("Stop before play failed: {}", e);
        }
        if !self.options.settle_delay.is_zero() {
            thread::sleep(self.options.settle_delay);
        }

        match self.backend.play(media_type, path) {
            Ok(_) => {
                state.playback = PlaybackState {
                    is_playing: true,
                    current_media: Some(path.to_path_buf()),
                    media_type: Some(media_type),
                };
                info!("Now playing {}: {}", media_type, path.display());
                Ok(format!("Playing {}: {}", media_type, display_name(path)))
            }
            Err(e) => {
                state.playback = PlaybackState::default();
                Err(e)
            }
        }
    }

    /// Forgets the current upload and deletes it unless `keep` says it is still needed.
    fn discard_previous_upload(&self, state: &mut ControllerState, keep: impl Fn(&Path) -> bool) {
        let Some(previous) = state.current_upload.take() else {
            return;
        };
        if self.options.keep_uploads || keep(&previous) {
            return;
        }
        remove_file_best_effort(&previous);
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
