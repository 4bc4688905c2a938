//! Face client error types.

use thiserror::Error;

pub type FaceResult<T> = Result<T, FaceError>;

#[derive(Debug, Error)]
pub enum FaceError {
    #[error("Face service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Request failed with status {status}: {message}")]
    RequestFailed { status: u16, message: String },

    #[error("No face detected in {0}")]
    NoFaceDetected(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FaceError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FaceError::ServiceUnavailable(_) | FaceError::Timeout(_) | FaceError::Network(_)
        )
    }

    /// The service rejected one image (no face, unreadable file). Other images
    /// can still be processed.
    pub fn is_image_failure(&self) -> bool {
        match self {
            FaceError::NoFaceDetected(_) => true,
            FaceError::RequestFailed { status, .. } => (400..500).contains(status),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(FaceError::NoFaceDetected("a.jpg".into()).is_image_failure());
        assert!(!FaceError::NoFaceDetected("a.jpg".into()).is_retryable());

        let bad_image = FaceError::RequestFailed {
            status: 400,
            message: "cannot read image".into(),
        };
        assert!(bad_image.is_image_failure());

        let server = FaceError::RequestFailed {
            status: 500,
            message: "boom".into(),
        };
        assert!(!server.is_image_failure());
        assert!(!server.is_retryable());

        let down = FaceError::ServiceUnavailable("503".into());
        assert!(down.is_retryable());
        assert!(!down.is_image_failure());
    }
}
