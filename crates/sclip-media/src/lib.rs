//! FFmpeg CLI wrapper for scene-based video processing.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with optional timeouts
//! - Video probing via FFprobe
//! - Content-based scene detection over a time window
//! - Per-scene thumbnail extraction and clip splitting
//! - Scene list CSV export and working-directory helpers

pub mod command;
pub mod error;
pub mod fs_utils;
pub mod probe;
pub mod scene_csv;
pub mod scene_detect;
pub mod split;
pub mod thumbnail;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use fs_utils::{
    clear_dir, list_files_with_extensions, list_subdirs, remove_dir_if_exists, sanitize_file_stem,
    video_stem, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS,
};
pub use probe::{probe_video, VideoInfo};
pub use scene_csv::{save_scene_list, write_scene_list, SCENE_LIST_FILE_NAME};
pub use scene_detect::{DetectedScenes, SceneDetectConfig, SceneDetector, TimeWindow};
pub use split::{clip_file_name, split_video};
pub use thumbnail::{extract_scene_thumbnails, thumbnail_file_name};
