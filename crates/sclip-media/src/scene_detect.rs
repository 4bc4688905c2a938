//! Content-based shot detection.
//!
//! FFmpeg scores every frame against its predecessor with the `scene` filter
//! expression; frames above the threshold are printed by `showinfo` and become
//! cut points. Cuts closer together than the minimum scene length are dropped,
//! and the remaining cuts partition the requested time window into scenes.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use sclip_models::timestamp::{parse_end_bound, parse_timestamp};
use sclip_models::{Scene, SceneList, Timecode};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::{probe_video, VideoInfo};

/// Default content-change threshold for the `scene` score (0.0 to 1.0).
pub const DEFAULT_SCENE_THRESHOLD: f64 = 0.3;

/// Default minimum scene length in frames.
pub const DEFAULT_MIN_SCENE_LEN: u64 = 15;

/// Scene detection tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDetectConfig {
    /// Scene score above which a frame starts a new scene
    pub threshold: f64,
    /// Cuts closer than this many frames to the previous boundary are ignored
    pub min_scene_len_frames: u64,
    /// Optional timeout for the analysis pass
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for SceneDetectConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SCENE_THRESHOLD,
            min_scene_len_frames: DEFAULT_MIN_SCENE_LEN,
            timeout_secs: None,
        }
    }
}

/// The part of a video to analyze.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimeWindow {
    pub start_secs: f64,
    /// `None` means the end of the video.
    pub end_secs: Option<f64>,
}

impl TimeWindow {
    /// The whole video.
    pub fn full() -> Self {
        Self::default()
    }

    /// Parse a start timestamp and an end timestamp (or `END`).
    pub fn from_strings(start: &str, end: &str) -> MediaResult<Self> {
        let start_secs = parse_timestamp(start)
            .map_err(|e| MediaError::invalid_time_window(format!("start {:?}: {}", start, e)))?;
        let end_secs = parse_end_bound(end)
            .map_err(|e| MediaError::invalid_time_window(format!("end {:?}: {}", end, e)))?;
        Ok(Self {
            start_secs,
            end_secs,
        })
    }

    /// Clamp the window into a video of `duration` seconds, returning `(start, end)`.
    pub fn resolve(&self, duration: f64) -> (f64, f64) {
        let end = self.end_secs.unwrap_or(duration).min(duration);
        (self.start_secs.min(duration), end)
    }
}

/// Scene list of one video together with what was learned while probing it.
#[derive(Debug, Clone)]
pub struct DetectedScenes {
    pub scenes: SceneList,
    pub info: VideoInfo,
}

/// Shot boundary detector backed by the FFmpeg CLI.
#[derive(Debug, Clone, Default)]
pub struct SceneDetector {
    config: SceneDetectConfig,
}

impl SceneDetector {
    pub fn new(config: SceneDetectConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SceneDetectConfig {
        &self.config
    }

    fn scene_filter(&self) -> String {
        format!("select='gt(scene,{})',showinfo", self.config.threshold)
    }

    /// Detect scenes of `video` inside `window`.
    ///
    /// An empty window (start at or after end) yields an empty scene list.
    /// A window without any cut yields a single scene covering it.
    pub async fn detect(&self, video: &Path, window: TimeWindow) -> MediaResult<DetectedScenes> {
        let info = probe_video(video).await?;
        let (start_secs, end_secs) = window.resolve(info.duration);
        let start = info.timecode_at(start_secs)?;
        let end = info.timecode_at(end_secs)?;

        if start.frame() >= end.frame() {
            warn!(
                video = %video.display(),
                start = %start,
                end = %end,
                "Time window is empty, no scenes detected"
            );
            return Ok(DetectedScenes {
                scenes: SceneList::empty(),
                info,
            });
        }

        let cmd = FfmpegCommand::analysis(video)
            .seek(start.seconds())
            .duration(start.seconds_until(&end))
            .video_filter(self.scene_filter());

        let mut runner = FfmpegRunner::new();
        if let Some(secs) = self.config.timeout_secs {
            runner = runner.with_timeout(secs);
        }
        debug!(video = %video.display(), threshold = self.config.threshold, "Running scene analysis");
        let stderr = runner.run_capture_stderr(&cmd).await?;

        // showinfo timestamps restart at zero after an input seek
        let cuts: Vec<f64> = parse_showinfo_times(&stderr)
            .into_iter()
            .map(|t| t + start.seconds())
            .collect();

        let scenes = scenes_from_cuts(&cuts, start, end, self.config.min_scene_len_frames)?;
        info!(
            video = %video.display(),
            cuts = cuts.len(),
            scenes = scenes.len(),
            "Detected scenes"
        );

        Ok(DetectedScenes { scenes, info })
    }
}

fn pts_time_pattern() -> &'static Regex {
    static PTS_TIME: OnceLock<Regex> = OnceLock::new();
    PTS_TIME.get_or_init(|| Regex::new(r"pts_time:\s*(-?[0-9]+(?:\.[0-9]+)?)").expect("literal pattern"))
}

/// Extract frame times (seconds) reported by the `showinfo` filter.
pub fn parse_showinfo_times(stderr: &str) -> Vec<f64> {
    stderr
        .lines()
        .filter(|line| line.contains("showinfo"))
        .filter_map(|line| pts_time_pattern().captures(line))
        .filter_map(|caps| caps.get(1)?.as_str().parse::<f64>().ok())
        .filter(|t| t.is_finite() && *t >= 0.0)
        .collect()
}

/// Partition `[start, end)` at the given cut times.
///
/// Cuts outside the window, duplicates, and cuts less than `min_len_frames`
/// after the previous accepted boundary are ignored.
pub fn scenes_from_cuts(
    cut_secs: &[f64],
    start: Timecode,
    end: Timecode,
    min_len_frames: u64,
) -> MediaResult<SceneList> {
    if start.frame() >= end.frame() {
        return Ok(SceneList::empty());
    }

    let fps = start.fps();
    let mut cut_frames = cut_secs
        .iter()
        .filter(|t| t.is_finite() && **t >= 0.0)
        .map(|t| Timecode::from_seconds(*t, fps).map(|tc| tc.frame()))
        .collect::<Result<Vec<u64>, _>>()?;
    cut_frames.sort_unstable();
    cut_frames.dedup();

    let mut boundaries = vec![start.frame()];
    for cut in cut_frames {
        let last = boundaries[boundaries.len() - 1];
        if cut <= last || cut >= end.frame() {
            continue;
        }
        if cut - last < min_len_frames {
            continue;
        }
        boundaries.push(cut);
    }
    boundaries.push(end.frame());

    let scenes = boundaries
        .windows(2)
        .map(|pair| {
            let scene_start = Timecode::from_frames(pair[0], fps)?;
            let scene_end = Timecode::from_frames(pair[1], fps)?;
            Ok(Scene::new(scene_start, scene_end)?)
        })
        .collect::<MediaResult<Vec<Scene>>>()?;

    Ok(SceneList::new(scenes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tc(frame: u64) -> Timecode {
        Timecode::from_frames(frame, 25.0).unwrap()
    }

    #[test]
    fn test_parse_showinfo_times() {
        let stderr = "\
[Parsed_showinfo_1 @ 0x55d] config in time_base: 1/12800, frame_rate: 25/1
[Parsed_showinfo_1 @ 0x55d] n:   0 pts:  51200 pts_time:4       duration:    512 fmt:yuv420p
[Parsed_showinfo_1 @ 0x55d] n:   1 pts: 128000 pts_time:10.04   duration:    512 fmt:yuv420p
frame=  250 fps=0.0 q=-0.0 Lsize=N/A time=00:00:10.00
";
        assert_eq!(parse_showinfo_times(stderr), vec![4.0, 10.04]);
    }

    #[test]
    fn test_scenes_from_cuts_partitions_window() {
        let scenes = scenes_from_cuts(&[2.0, 6.0], tc(0), tc(250), 15).unwrap();
        let bounds: Vec<(u64, u64)> = scenes
            .iter()
            .map(|s| (s.start().frame(), s.end().frame()))
            .collect();
        assert_eq!(bounds, vec![(0, 50), (50, 150), (150, 250)]);
    }

    #[test]
    fn test_scenes_from_cuts_enforces_min_length() {
        // 2.2s is 5 frames after the cut at 2.0s
        let scenes = scenes_from_cuts(&[0.2, 2.0, 2.2, 6.0], tc(0), tc(250), 15).unwrap();
        let starts: Vec<u64> = scenes.iter().map(|s| s.start().frame()).collect();
        assert_eq!(starts, vec![0, 50, 150]);
    }

    #[test]
    fn test_scenes_from_cuts_without_cuts_is_one_scene() {
        let scenes = scenes_from_cuts(&[], tc(100), tc(200), 15).unwrap();
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes.as_slice()[0].start(), tc(100));
    }

    #[test]
    fn test_scenes_from_cuts_ignores_out_of_window_cuts() {
        let scenes = scenes_from_cuts(&[1.0, 5.0, 20.0], tc(100), tc(200), 15).unwrap();
        let bounds: Vec<(u64, u64)> = scenes
            .iter()
            .map(|s| (s.start().frame(), s.end().frame()))
            .collect();
        assert_eq!(bounds, vec![(100, 125), (125, 200)]);
    }

    #[test]
    fn test_empty_window_yields_no_scenes() {
        assert!(scenes_from_cuts(&[1.0], tc(200), tc(200), 15)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_time_window_from_strings() {
        let window = TimeWindow::from_strings("00:01:00", "END").unwrap();
        assert_eq!(window.start_secs, 60.0);
        assert_eq!(window.end_secs, None);
        assert_eq!(window.resolve(90.0), (60.0, 90.0));

        let window = TimeWindow::from_strings("10", "00:00:20").unwrap();
        assert_eq!(window.resolve(15.0), (10.0, 15.0));

        assert!(matches!(
            TimeWindow::from_strings("abc", "END"),
            Err(MediaError::InvalidTimeWindow(_))
        ));
    }
}
