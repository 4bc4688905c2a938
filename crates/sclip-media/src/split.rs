//! Cutting a video into one file per time range.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use sclip_models::{EncodingConfig, Scene};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// File name of the `n`-th (0-based) clip of a video: `{stem}-Scene-{NNN}.mp4`.
pub fn clip_file_name(stem: &str, n: usize) -> String {
    format!("{}-Scene-{:03}.mp4", stem, n + 1)
}

/// Build the FFmpeg command that re-encodes one range of `input` into `output`.
pub fn split_command(
    input: &Path,
    output: &Path,
    range: &Scene,
    encoding: &EncodingConfig,
) -> FfmpegCommand {
    FfmpegCommand::new(input, output)
        .seek(range.start().seconds())
        .duration(range.duration_secs())
        .output_args(encoding.to_ffmpeg_args())
}

/// Write each range of `video` to its own file in `out_dir`.
///
/// Returns the files that were written. A range that fails to encode is
/// logged and skipped; failures that affect every range are returned.
pub async fn split_video(
    video: &Path,
    ranges: &[Scene],
    out_dir: &Path,
    stem: &str,
    encoding: &EncodingConfig,
) -> MediaResult<Vec<PathBuf>> {
    if ranges.is_empty() {
        return Ok(Vec::new());
    }
    fs::create_dir_all(out_dir).await?;

    let runner = FfmpegRunner::new();
    let mut written = Vec::with_capacity(ranges.len());

    for (n, range) in ranges.iter().enumerate() {
        let output = out_dir.join(clip_file_name(stem, n));
        let cmd = split_command(video, &output, range, encoding);

        match runner.run(&cmd).await {
            Ok(()) => written.push(output),
            Err(e) if !e.is_structural() => {
                warn!(clip = n + 1, range = %range, error = %e, "Failed to write clip, skipping");
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        video = %video.display(),
        out_dir = %out_dir.display(),
        clips = written.len(),
        "Split video"
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sclip_models::Timecode;

    #[test]
    fn test_clip_file_name() {
        assert_eq!(clip_file_name("show", 0), "show-Scene-001.mp4");
        assert_eq!(clip_file_name("show", 41), "show-Scene-042.mp4");
    }

    #[test]
    fn test_split_command() {
        let range = Scene::new(
            Timecode::from_frames(250, 25.0).unwrap(),
            Timecode::from_frames(500, 25.0).unwrap(),
        )
        .unwrap();
        let cmd = split_command(
            Path::new("in.mp4"),
            Path::new("out/in-Scene-001.mp4"),
            &range,
            &EncodingConfig::default(),
        );
        let args = cmd.build_args();
        let joined = args.join(" ");
        assert!(joined.contains("-ss 10.000 -t 10.000 -i in.mp4"));
        assert!(joined.contains("-c:v libx264"));
        assert_eq!(args.last().unwrap(), "out/in-Scene-001.mp4");
    }

    #[tokio::test]
    async fn test_split_nothing_writes_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("clips");
        let written = split_video(
            Path::new("missing.mp4"),
            &[],
            &out,
            "missing",
            &EncodingConfig::default(),
        )
        .await
        .unwrap();
        assert!(written.is_empty());
        assert!(!out.exists());
    }
}
