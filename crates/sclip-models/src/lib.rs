//! Shared data models for SceneClip.
//!
//! This crate provides:
//! - Frame-accurate timecodes and timestamp parsing
//! - The scene model (scenes, validated scene lists, thumbnail maps)
//! - Output categories, clip modes and vote/gap constants
//! - Encoding configuration for split clips

pub mod category;
pub mod encoding;
pub mod scene;
pub mod timecode;
pub mod timestamp;

// Re-export common types
pub use category::{
    Category, CategoryKind, ClipMode, RoleStrategy, BROLL_TIME_STEP_SECS, MIN_VOTES,
    ROLE_TIME_STEP_SECS,
};
pub use encoding::EncodingConfig;
pub use scene::{Scene, SceneError, SceneIndex, SceneList, SceneListError, ThumbnailId, ThumbnailMap};
pub use timecode::{Timecode, TimecodeError};
pub use timestamp::TimestampError;
