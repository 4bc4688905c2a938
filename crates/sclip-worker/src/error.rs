//! Worker error types.

use std::path::PathBuf;
use thiserror::Error;

use sclip_models::SceneListError;

use crate::consolidate::ConsolidationError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Reference set directory not found: {0}")]
    MissingReferenceSet(PathBuf),

    #[error("Range consolidation failed: {0}")]
    Consolidation(#[from] ConsolidationError),

    #[error("Invalid scene list: {0}")]
    SceneList(#[from] SceneListError),

    #[error("Media error: {0}")]
    Media(#[from] sclip_media::MediaError),

    #[error("Face service error: {0}")]
    Face(#[from] sclip_face_client::FaceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the error concerns the whole video (or the environment) rather
    /// than one image or one output clip.
    pub fn is_structural(&self) -> bool {
        match self {
            WorkerError::Face(e) => !e.is_image_failure(),
            WorkerError::Media(e) => e.is_structural(),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sclip_face_client::FaceError;
    use sclip_media::MediaError;

    #[test]
    fn test_structural_classification() {
        assert!(WorkerError::MissingReferenceSet("input/alice".into()).is_structural());
        assert!(WorkerError::from(MediaError::FfmpegNotFound).is_structural());
        assert!(!WorkerError::from(MediaError::Timeout(30)).is_structural());
        assert!(!WorkerError::from(FaceError::NoFaceDetected("x.jpg".into())).is_structural());
        assert!(WorkerError::from(FaceError::ServiceUnavailable("down".into())).is_structural());
    }
}
