//! Client for the face recognition service.
//!
//! The service wraps a face embedding model and exposes two operations used
//! for scene classification:
//! - `find`: every image in a directory that shows the person in a reference image
//! - `detect`: the faces present in a single image

pub mod client;
pub mod error;
pub mod types;

pub use client::{FaceClient, FaceClientConfig};
pub use error::{FaceError, FaceResult};
pub use types::{DetectRequest, DetectResponse, FaceRegion, FindRequest, FindResponse};
