//! Processing metrics.
//!
//! Recorded through the `metrics` facade; without an installed recorder the
//! calls are no-ops.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const VIDEOS_PROCESSED_TOTAL: &str = "sclip_videos_processed_total";
    pub const VIDEOS_FAILED_TOTAL: &str = "sclip_videos_failed_total";
    pub const VIDEO_PROCESSING_SECONDS: &str = "sclip_video_processing_seconds";
    pub const SCENES_DETECTED_TOTAL: &str = "sclip_scenes_detected_total";
    pub const SCENES_KEPT_TOTAL: &str = "sclip_scenes_kept_total";
    pub const CATEGORIES_EMPTY_TOTAL: &str = "sclip_categories_empty_total";
}

/// Record a video that finished successfully.
pub fn record_video_processed(duration_secs: f64) {
    counter!(names::VIDEOS_PROCESSED_TOTAL).increment(1);
    histogram!(names::VIDEO_PROCESSING_SECONDS).record(duration_secs);
}

/// Record a video that was abandoned.
pub fn record_video_failed(structural: bool) {
    let labels = [("structural", structural.to_string())];
    counter!(names::VIDEOS_FAILED_TOTAL, &labels).increment(1);
}

pub fn record_scenes_detected(count: usize) {
    counter!(names::SCENES_DETECTED_TOTAL).increment(count as u64);
}

/// Record the ranges kept for one category.
pub fn record_scenes_kept(mode: &str, count: usize) {
    let labels = [("mode", mode.to_string())];
    if count == 0 {
        counter!(names::CATEGORIES_EMPTY_TOTAL, &labels).increment(1);
    } else {
        counter!(names::SCENES_KEPT_TOTAL, &labels).increment(count as u64);
    }
}
