//! Face service request/response types.

use serde::{Deserialize, Serialize};

/// Search a directory of images for the person shown in a reference image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindRequest {
    /// Reference image
    pub img_path: String,
    /// Directory of candidate images
    pub db_path: String,
    /// Embedding model (e.g. `Facenet512`)
    pub model_name: String,
    /// Face detector (e.g. `retinaface`)
    pub detector_backend: String,
    /// Fail instead of embedding the whole image when no face is found
    #[serde(default)]
    pub enforce_detection: bool,
}

/// Paths of candidate images that matched. A path can appear more than once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindResponse {
    #[serde(default)]
    pub identities: Vec<String>,
}

/// Detect faces in one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectRequest {
    pub img_path: String,
    pub detector_backend: String,
}

/// A detected face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceRegion {
    /// Detector confidence (0.0 to 1.0)
    pub confidence: f64,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectResponse {
    #[serde(default)]
    pub faces: Vec<FaceRegion>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
}
