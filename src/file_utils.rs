// src/file_utils.rs

use crate::config::APP_NAME;
use crate::error::PlayerError;
use crate::media::{classify, is_allowed, MediaItem, MediaType};
use log::{info, warn};
use std::{
    fs,
    io::{Error as IoError, ErrorKind as IoErrorKind},
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Returns the full path to the application's data directory.
/// This function creates the directory if it does not already exist.
///
/// # Errors
///
/// Returns an error if the system's data directory cannot be determined
/// or if creating the application data directory fails.
pub fn get_app_data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let data_dir_base = dirs::data_dir().ok_or_else(|| {
        IoError::new(
            IoErrorKind::NotFound,
            "Failed to determine the system's data directory.",
        )
    })?;

    let app_data_dir = data_dir_base.join(APP_NAME);
    fs::create_dir_all(&app_data_dir)?;

    Ok(app_data_dir)
}

/// Expands a leading `~` in a user-supplied path.
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw.trim()).into_owned())
}

/// Scans the top level of `folder_path` for files with an allowed extension.
/// The result is sorted by path so playlists always play in the same order.
///
/// # Errors
///
/// Returns [`PlayerError::FolderNotFound`] if `folder_path` is not a directory,
/// or [`PlayerError::Io`] if the directory cannot be read.
pub fn find_media_files(folder_path: &Path) -> Result<Vec<MediaItem>, PlayerError> {
    if !folder_path.is_dir() {
        return Err(PlayerError::FolderNotFound(
            folder_path.display().to_string(),
        ));
    }

    let mut items = Vec::new();

    for entry_result in WalkDir::new(folder_path).min_depth(1).max_depth(1) {
        let entry = entry_result.map_err(IoError::from)?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !is_allowed(name) {
            continue;
        }
        if let Ok(media_type) = classify(name) {
            items.push(MediaItem {
                path: path.to_path_buf(),
                media_type,
            });
        }
    }

    items.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(items)
}

/// Reduces an uploaded filename to a safe basename.
///
/// Directory components are discarded, whitespace becomes `_`, anything other
/// than ASCII letters, digits, `.`, `_` and `-` is dropped, and leading dots
/// and underscores are stripped. Returns `None` if nothing usable is left.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);

    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    let cleaned = cleaned.trim_start_matches(['.', '_']);
    if cleaned.is_empty() || cleaned.contains("..") {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Copies an uploaded temp file into `upload_dir` under its sanitized name.
///
/// # Errors
///
/// Returns [`PlayerError::RejectedUpload`] if the name is empty, unsafe, or not
/// on the allow-list, and [`PlayerError::Io`] if the copy fails.
pub fn save_upload(
    upload_dir: &Path,
    original_name: &str,
    temp_path: &Path,
) -> Result<(PathBuf, MediaType), PlayerError> {
    if original_name.trim().is_empty() {
        return Err(PlayerError::RejectedUpload("No selected file.".into()));
    }
    let filename = sanitize_filename(original_name).ok_or_else(|| {
        PlayerError::RejectedUpload(format!("Invalid file name: {}", original_name))
    })?;
    let media_type = classify(&filename)?;

    fs::create_dir_all(upload_dir)?;
    let destination = upload_dir.join(&filename);
    fs::copy(temp_path, &destination)?;
    info!("File uploaded successfully to: {}", destination.display());

    Ok((destination, media_type))
}

/// Deletes a file, logging instead of failing.
pub fn remove_file_best_effort(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => info!("Deleted uploaded file: {}", path.display()),
        Err(e) if e.kind() == IoErrorKind::NotFound => {}
        Err(e) => warn!("Could not delete uploaded file '{}': {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_find_media_files_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        for name in ["b.mp4", "a.gif", "c.png", "notes.txt", "noext"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("0.mp4"), b"x").unwrap();

        let items = find_media_files(dir.path()).unwrap();
        let names: Vec<_> = items
            .iter()
            .map(|i| i.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.gif", "b.mp4", "c.png"]);
        assert_eq!(items[0].media_type, MediaType::Gif);
        assert_eq!(items[1].media_type, MediaType::Video);
        assert_eq!(items[2].media_type, MediaType::Photo);
    }

    #[test]
    fn test_find_media_files_accepts_uppercase_extensions() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("SHOT.JPG"), b"x").unwrap();

        let items = find_media_files(dir.path()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].media_type, MediaType::Photo);
    }

    #[test]
    fn test_find_media_files_missing_dir() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("gone");
        assert!(matches!(
            find_media_files(&missing),
            Err(PlayerError::FolderNotFound(_))
        ));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("my movie.mp4").as_deref(), Some("my_movie.mp4"));
        assert_eq!(sanitize_filename("../../etc/passwd.png").as_deref(), Some("passwd.png"));
        assert_eq!(sanitize_filename("C:\\Users\\me\\pic.jpg").as_deref(), Some("pic.jpg"));
        assert_eq!(sanitize_filename(".hidden.gif").as_deref(), Some("hidden.gif"));
        assert_eq!(sanitize_filename("..").as_deref(), None);
        assert_eq!(sanitize_filename("日本.").as_deref(), None);
        assert_eq!(sanitize_filename("a..mp4").as_deref(), None);
    }

    #[test]
    fn test_save_upload_copies_into_upload_dir() {
        let scratch = tempdir().unwrap();
        let upload_dir = scratch.path().join("uploads");
        let temp_path = scratch.path().join("incoming.tmp");
        fs::write(&temp_path, b"frames").unwrap();

        let (saved, media_type) = save_upload(&upload_dir, "../Clip One.MKV", &temp_path).unwrap();

        assert_eq!(saved, upload_dir.join("Clip_One.MKV"));
        assert_eq!(media_type, MediaType::Video);
        assert_eq!(fs::read(&saved).unwrap(), b"frames");
    }

    #[test]
    fn test_save_upload_rejects_disallowed_types() {
        let scratch = tempdir().unwrap();
        let temp_path = scratch.path().join("incoming.tmp");
        fs::write(&temp_path, b"#!/bin/sh").unwrap();

        assert!(matches!(
            save_upload(scratch.path(), "run.sh", &temp_path),
            Err(PlayerError::RejectedUpload(_))
        ));
        assert!(matches!(
            save_upload(scratch.path(), "", &temp_path),
            Err(PlayerError::RejectedUpload(_))
        ));
        assert!(!scratch.path().join("run.sh").exists());
    }

    #[test]
    fn test_remove_file_best_effort_ignores_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("old.mp4");
        fs::write(&path, b"x").unwrap();

        remove_file_best_effort(&path);
        assert!(!path.exists());
        remove_file_best_effort(&path);
    }
}
