//! Per-scene thumbnail extraction.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use sclip_models::encoding::THUMBNAIL_JPEG_QUALITY;
use sclip_models::{Scene, SceneIndex, SceneList, ThumbnailMap};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// File name of a scene thumbnail: `{stem}-Scene-{NNN}-{SS}.jpg`, both numbers 1-based.
pub fn thumbnail_file_name(stem: &str, scene: SceneIndex, slot: usize) -> String {
    format!("{}-Scene-{:03}-{:02}.jpg", stem, scene.number(), slot + 1)
}

/// Position of the frame in the middle of a scene, in seconds.
fn middle_frame_secs(scene: &Scene) -> f64 {
    scene
        .start()
        .plus_frames(scene.duration_frames() / 2)
        .seconds()
}

/// Extract one JPEG per scene, taken from the middle frame, into `out_dir`.
///
/// A frame that fails to extract is logged and skipped, leaving that scene
/// without a thumbnail. Failures that affect every frame (missing FFmpeg,
/// unwritable directory) are returned.
pub async fn extract_scene_thumbnails(
    video: &Path,
    scenes: &SceneList,
    out_dir: &Path,
    stem: &str,
) -> MediaResult<ThumbnailMap> {
    fs::create_dir_all(out_dir).await?;

    let runner = FfmpegRunner::new();
    let mut thumbnails = ThumbnailMap::new();

    for index in scenes.indices() {
        let output: PathBuf = out_dir.join(thumbnail_file_name(stem, index, 0));
        let cmd = FfmpegCommand::new(video, &output)
            .seek(middle_frame_secs(&scenes[index]))
            .single_frame()
            .output_args(["-q:v".to_string(), THUMBNAIL_JPEG_QUALITY.to_string()]);

        match runner.run(&cmd).await {
            Ok(()) => {
                thumbnails.insert(index, output);
            }
            Err(e) if !e.is_structural() => {
                warn!(scene = index.number(), error = %e, "Failed to extract thumbnail, skipping scene");
            }
            Err(e) => return Err(e),
        }
    }

    debug!(
        video = %video.display(),
        extracted = thumbnails.scene_count(),
        scenes = scenes.len(),
        "Extracted scene thumbnails"
    );
    Ok(thumbnails)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sclip_models::Timecode;

    #[test]
    fn test_thumbnail_file_name() {
        assert_eq!(
            thumbnail_file_name("ep01", SceneIndex(0), 0),
            "ep01-Scene-001-01.jpg"
        );
        assert_eq!(
            thumbnail_file_name("ep01", SceneIndex(1233), 2),
            "ep01-Scene-1234-03.jpg"
        );
    }

    #[test]
    fn test_middle_frame() {
        let scene = Scene::new(
            Timecode::from_frames(100, 25.0).unwrap(),
            Timecode::from_frames(151, 25.0).unwrap(),
        )
        .unwrap();
        assert_eq!(middle_frame_secs(&scene), 5.0);
    }
}
