//! Scene classification worker.
//!
//! This crate provides:
//! - Face-match evidence aggregation with vote thresholds
//! - Range consolidation (adjacent merge and gap-fill)
//! - The per-video orchestrator and the directory run loop
//! - Collaborator traits with FFmpeg and face-service adapters
//! - Configuration, structured logging and metrics

pub mod config;
pub mod consolidate;
pub mod error;
pub mod evidence;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod providers;

pub use config::WorkerConfig;
pub use consolidate::{
    consolidate, gap_fill, merge_adjacent, CategoryEvidence, ConfirmedIndices, ConsolidationError,
};
pub use error::{WorkerError, WorkerResult};
pub use evidence::{
    aggregate_matches, detect_broll, qualifies, MatchCountTable, MembershipMask, ReferenceSet,
};
pub use logging::VideoLogger;
pub use orchestrator::{CategoryOutput, RunSummary, SceneClassifier, VideoReport};
pub use providers::{
    FaceRecognizer, FaceServiceRecognizer, FfmpegSceneSink, FfmpegSegmenter, SceneSegmenter,
    SceneSink, SegmentedVideo,
};
