//! Worker configuration.

use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

use sclip_media::scene_detect::{DEFAULT_MIN_SCENE_LEN, DEFAULT_SCENE_THRESHOLD};
use sclip_media::{SceneDetectConfig, TimeWindow};
use sclip_models::timestamp::END_OF_VIDEO;
use sclip_models::{
    ClipMode, EncodingConfig, RoleStrategy, BROLL_TIME_STEP_SECS, MIN_VOTES, ROLE_TIME_STEP_SECS,
};

use crate::error::{WorkerError, WorkerResult};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Directory scanned for input videos
    pub video_dir: PathBuf,
    /// Reference root: one sub-directory of images per role
    pub input_dir: PathBuf,
    /// Output root for the plain scene split
    pub clip_dir: PathBuf,
    /// Output root for role clips (`<role_dir>/<role>/<video>`)
    pub role_dir: PathBuf,
    /// Output root for B-roll clips
    pub broll_dir: PathBuf,
    /// Scratch directory for the thumbnails of the video being processed
    pub scratch_dir: PathBuf,
    /// Segmentation start (`HH:MM:SS`)
    pub start_time: String,
    /// Segmentation end (`HH:MM:SS` or `END`)
    pub end_time: String,
    /// Categories to produce, in order
    pub modes: Vec<ClipMode>,
    /// A thumbnail needs strictly more matches than this to count
    pub min_votes: u32,
    /// Gap bridged between confirmed role scenes (seconds)
    pub role_time_step_secs: f64,
    /// Gap bridged between faceless scenes (seconds)
    pub broll_time_step_secs: f64,
    pub role_strategy: RoleStrategy,
    /// Scene detection content threshold
    pub scene_threshold: f64,
    /// Minimum scene length in frames
    pub min_scene_len_frames: u64,
    /// Encoding used for split clips
    pub encoding: EncodingConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            video_dir: PathBuf::from("video"),
            input_dir: PathBuf::from("input"),
            clip_dir: PathBuf::from("clip"),
            role_dir: PathBuf::from("role"),
            broll_dir: PathBuf::from("B-roll"),
            scratch_dir: PathBuf::from("scene"),
            start_time: "00:00:00".to_string(),
            end_time: END_OF_VIDEO.to_string(),
            modes: vec![ClipMode::Clip],
            min_votes: MIN_VOTES,
            role_time_step_secs: ROLE_TIME_STEP_SECS,
            broll_time_step_secs: BROLL_TIME_STEP_SECS,
            role_strategy: RoleStrategy::default(),
            scene_threshold: DEFAULT_SCENE_THRESHOLD,
            min_scene_len_frames: DEFAULT_MIN_SCENE_LEN,
            encoding: EncodingConfig::default(),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}, using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

fn env_path(key: &str, default: PathBuf) -> PathBuf {
    std::env::var(key).map(PathBuf::from).unwrap_or(default)
}

impl WorkerConfig {
    /// Create config from `SCLIP_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let modes = match std::env::var("SCLIP_MODES") {
            Ok(raw) => ClipMode::parse_list(&raw).unwrap_or_else(|e| {
                warn!("Ignoring invalid SCLIP_MODES: {}", e);
                defaults.modes.clone()
            }),
            Err(_) => defaults.modes.clone(),
        };

        Self {
            video_dir: env_path("SCLIP_VIDEO_DIR", defaults.video_dir),
            input_dir: env_path("SCLIP_INPUT_DIR", defaults.input_dir),
            clip_dir: env_path("SCLIP_CLIP_DIR", defaults.clip_dir),
            role_dir: env_path("SCLIP_ROLE_DIR", defaults.role_dir),
            broll_dir: env_path("SCLIP_BROLL_DIR", defaults.broll_dir),
            scratch_dir: env_path("SCLIP_SCRATCH_DIR", defaults.scratch_dir),
            start_time: std::env::var("SCLIP_START_TIME").unwrap_or(defaults.start_time),
            end_time: std::env::var("SCLIP_END_TIME").unwrap_or(defaults.end_time),
            modes,
            min_votes: env_or("SCLIP_MIN_VOTES", defaults.min_votes),
            role_time_step_secs: env_or("SCLIP_ROLE_TIME_STEP", defaults.role_time_step_secs),
            broll_time_step_secs: env_or("SCLIP_BROLL_TIME_STEP", defaults.broll_time_step_secs),
            role_strategy: env_or("SCLIP_ROLE_STRATEGY", defaults.role_strategy),
            scene_threshold: env_or("SCLIP_SCENE_THRESHOLD", defaults.scene_threshold),
            min_scene_len_frames: env_or("SCLIP_MIN_SCENE_LEN", defaults.min_scene_len_frames),
            encoding: defaults.encoding,
        }
    }

    /// The segmentation window described by `start_time` and `end_time`.
    pub fn time_window(&self) -> WorkerResult<TimeWindow> {
        TimeWindow::from_strings(&self.start_time, &self.end_time)
            .map_err(|e| WorkerError::config(e.to_string()))
    }

    pub fn scene_detect_config(&self) -> SceneDetectConfig {
        SceneDetectConfig {
            threshold: self.scene_threshold,
            min_scene_len_frames: self.min_scene_len_frames,
            ..SceneDetectConfig::default()
        }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> WorkerResult<()> {
        if self.modes.is_empty() {
            return Err(WorkerError::config("at least one clip mode is required"));
        }
        for (name, value) in [
            ("role time step", self.role_time_step_secs),
            ("B-roll time step", self.broll_time_step_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(WorkerError::config(format!("{} must be >= 0, got {}", name, value)));
            }
        }
        if !(0.0..=1.0).contains(&self.scene_threshold) {
            return Err(WorkerError::config(format!(
                "scene threshold must be within 0..=1, got {}",
                self.scene_threshold
            )));
        }
        self.time_window()?;
        Ok(())
    }
}
