//! Face service HTTP client.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{FaceError, FaceResult};
use crate::types::{
    DetectRequest, DetectResponse, FaceRegion, FindRequest, FindResponse, HealthResponse,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8001";
pub const DEFAULT_MODEL_NAME: &str = "Facenet512";
pub const DEFAULT_DETECTOR_BACKEND: &str = "retinaface";

/// Configuration for the face client.
#[derive(Debug, Clone)]
pub struct FaceClientConfig {
    /// Base URL of the face service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries
    pub max_retries: u32,
    /// Embedding model used for identity search
    pub model_name: String,
    /// Face detector used by both endpoints
    pub detector_backend: String,
    /// Whether the service should reject images without a detectable face
    pub enforce_detection: bool,
}

impl Default for FaceClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(300), // searching a large directory is slow
            max_retries: 2,
            model_name: DEFAULT_MODEL_NAME.to_string(),
            detector_backend: DEFAULT_DETECTOR_BACKEND.to_string(),
            enforce_detection: false,
        }
    }
}

impl FaceClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("FACE_SERVICE_URL").unwrap_or(defaults.base_url),
            timeout: std::env::var("FACE_SERVICE_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_retries: std::env::var("FACE_SERVICE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            model_name: std::env::var("FACE_MODEL_NAME").unwrap_or(defaults.model_name),
            detector_backend: std::env::var("FACE_DETECTOR_BACKEND")
                .unwrap_or(defaults.detector_backend),
            enforce_detection: defaults.enforce_detection,
        }
    }
}

/// Client for the face recognition service.
pub struct FaceClient {
    http: Client,
    config: FaceClientConfig,
}

impl FaceClient {
    /// Create a new face client.
    pub fn new(config: FaceClientConfig) -> FaceResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(FaceError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> FaceResult<Self> {
        Self::new(FaceClientConfig::from_env())
    }

    pub fn config(&self) -> &FaceClientConfig {
        &self.config
    }

    /// Check if the face service is healthy.
    pub async fn health_check(&self) -> FaceResult<bool> {
        let url = format!("{}/health", self.config.base_url);

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let health: HealthResponse = response.json().await?;
                Ok(health.status == "healthy" || health.status == "ok")
            }
            Ok(response) => {
                warn!("Face service health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Face service health check error: {}", e);
                Ok(false)
            }
        }
    }

    /// Every image under `db_dir` that shows the person in `reference`.
    ///
    /// The same candidate may be returned more than once.
    pub async fn find(&self, reference: &Path, db_dir: &Path) -> FaceResult<Vec<PathBuf>> {
        let request = FindRequest {
            img_path: path_string(reference),
            db_path: path_string(db_dir),
            model_name: self.config.model_name.clone(),
            detector_backend: self.config.detector_backend.clone(),
            enforce_detection: self.config.enforce_detection,
        };

        let response = self.post("find", &request, reference).await?;
        let body: FindResponse = response
            .json()
            .await
            .map_err(|e| FaceError::InvalidResponse(format!("find: {}", e)))?;

        debug!(
            reference = %reference.display(),
            matches = body.identities.len(),
            "Face search finished"
        );
        Ok(body.identities.into_iter().map(PathBuf::from).collect())
    }

    /// Faces detected in `image`.
    pub async fn detect(&self, image: &Path) -> FaceResult<Vec<FaceRegion>> {
        let request = DetectRequest {
            img_path: path_string(image),
            detector_backend: self.config.detector_backend.clone(),
        };

        let response = self.post("detect", &request, image).await?;
        let body: DetectResponse = response
            .json()
            .await
            .map_err(|e| FaceError::InvalidResponse(format!("detect: {}", e)))?;
        Ok(body.faces)
    }

    /// Whether `image` contains at least one detectable face.
    ///
    /// A detector crash on one image (HTTP 500) reads as "no face", like a
    /// 422. Gateway and transport failures are still returned.
    pub async fn has_face(&self, image: &Path) -> FaceResult<bool> {
        match self.detect(image).await {
            Ok(faces) => Ok(!faces.is_empty()),
            Err(FaceError::NoFaceDetected(_)) => Ok(false),
            Err(FaceError::RequestFailed { status: 500, message }) => {
                warn!(image = %image.display(), "Face detection failed, treating as no face: {}", message);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// POST `body` to `endpoint`, retrying transient failures.
    async fn post<B: Serialize>(&self, endpoint: &str, body: &B, image: &Path) -> FaceResult<Response> {
        let url = format!("{}/{}", self.config.base_url, endpoint);
        let timeout_secs = self.config.timeout.as_secs();

        debug!("Sending face {} request to {}", endpoint, url);

        let url = url.as_str();
        self.with_retry(|| async move {
            let response = self
                .http
                .post(url)
                .json(body)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        FaceError::Timeout(timeout_secs)
                    } else {
                        FaceError::Network(e)
                    }
                })?;
            check_status(response, image).await
        })
        .await
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> FaceResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = FaceResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "Face request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(FaceError::ServiceUnavailable("Unknown error".to_string())))
    }
}

/// Map a non-success status to the matching error.
async fn check_status(response: Response, image: &Path) -> FaceResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::UNPROCESSABLE_ENTITY => FaceError::NoFaceDetected(path_string(image)),
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY | StatusCode::GATEWAY_TIMEOUT => {
            FaceError::ServiceUnavailable(format!("{}: {}", status, body))
        }
        _ => FaceError::RequestFailed {
            status: status.as_u16(),
            message: body,
        },
    })
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
