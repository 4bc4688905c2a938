//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

use sclip_models::{SceneError, SceneListError, TimecodeError};

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Invalid video file: {0}")]
    InvalidVideo(String),

    #[error("Invalid time window: {0}")]
    InvalidTimeWindow(String),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Detected scenes are malformed: {0}")]
    InvalidSceneList(#[from] SceneListError),

    #[error("Detected scene is malformed: {0}")]
    InvalidScene(#[from] SceneError),

    #[error("Invalid timecode: {0}")]
    Timecode(#[from] TimecodeError),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an invalid time window error.
    pub fn invalid_time_window(message: impl Into<String>) -> Self {
        Self::InvalidTimeWindow(message.into())
    }

    /// Whether the failure makes the whole video unusable, as opposed to one
    /// frame or one output file.
    pub fn is_structural(&self) -> bool {
        !matches!(self, MediaError::FfmpegFailed { .. } | MediaError::Timeout(_))
    }
}
