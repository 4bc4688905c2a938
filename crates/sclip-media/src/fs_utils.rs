//! Filesystem utilities for the working and output directories.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::fs;

use crate::error::MediaResult;

/// Video containers picked up from the input directory.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "flv"];

/// Image formats accepted in reference sets.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

fn illegal_chars() -> &'static Regex {
    static ILLEGAL: OnceLock<Regex> = OnceLock::new();
    ILLEGAL.get_or_init(|| Regex::new(r#"[/\\:*?"<>|]"#).expect("literal pattern"))
}

/// Replace characters that are not allowed in file names with `_`.
pub fn sanitize_file_stem(stem: &str) -> String {
    let cleaned = illegal_chars().replace_all(stem.trim(), "_");
    if cleaned.is_empty() {
        "video".to_string()
    } else {
        cleaned.into_owned()
    }
}

/// Sanitized file stem of a video path, used to name every derived artifact.
pub fn video_stem(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    sanitize_file_stem(&stem)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Regular files in `dir` whose extension (case-insensitive) is in `extensions`,
/// sorted by path.
pub async fn list_files_with_extensions(
    dir: impl AsRef<Path>,
    extensions: &[&str],
) -> MediaResult<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir.as_ref()).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && has_extension(&path, extensions) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Immediate subdirectories of `dir`, sorted by path.
pub async fn list_subdirs(dir: impl AsRef<Path>) -> MediaResult<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir.as_ref()).await?;
    let mut dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Remove `dir` and everything in it, then recreate it empty.
pub async fn clear_dir(dir: impl AsRef<Path>) -> MediaResult<()> {
    let dir = dir.as_ref();
    remove_dir_if_exists(dir).await?;
    fs::create_dir_all(dir).await?;
    Ok(())
}

/// Remove `dir` recursively; a missing directory is not an error.
pub async fn remove_dir_if_exists(dir: impl AsRef<Path>) -> MediaResult<()> {
    match fs::remove_dir_all(dir.as_ref()).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
