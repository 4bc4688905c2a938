//! Collaborator traits and their production adapters.
//!
//! The classification core only talks to these traits, so tests can swap in
//! in-memory fakes for FFmpeg and the face service.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use sclip_face_client::{FaceClient, FaceResult};
use sclip_media::{
    clear_dir, extract_scene_thumbnails, save_scene_list, split_video, video_stem, SceneDetector,
    TimeWindow, SCENE_LIST_FILE_NAME,
};
use sclip_models::{EncodingConfig, Scene, SceneList, ThumbnailMap};

use crate::error::WorkerResult;

/// Sub-directory of an output directory that holds thumbnails of the kept ranges.
pub const OUTPUT_THUMBNAILS_DIR: &str = "scene";

/// Result of segmenting one video.
#[derive(Debug, Clone)]
pub struct SegmentedVideo {
    pub scenes: SceneList,
    pub thumbnails: ThumbnailMap,
    /// Directory holding every thumbnail (the recognizer's candidate directory)
    pub thumbnails_dir: PathBuf,
}

/// Splits a video into scenes and writes one thumbnail per scene.
#[async_trait]
pub trait SceneSegmenter: Send + Sync {
    async fn segment(
        &self,
        video: &Path,
        window: TimeWindow,
        thumbnails_dir: &Path,
    ) -> WorkerResult<SegmentedVideo>;
}

/// Face identity search and face presence checks.
#[async_trait]
pub trait FaceRecognizer: Send + Sync {
    /// Images under `candidates_dir` showing the person in `reference`; may contain duplicates.
    async fn find_matches(&self, reference: &Path, candidates_dir: &Path) -> FaceResult<Vec<PathBuf>>;

    async fn has_face(&self, image: &Path) -> FaceResult<bool>;
}

/// Persists the ranges chosen for one category.
#[async_trait]
pub trait SceneSink: Send + Sync {
    async fn save(&self, video: &Path, output_dir: &Path, scenes: &[Scene]) -> WorkerResult<()>;
}

/// Segmenter backed by FFmpeg scene detection.
#[derive(Debug, Clone, Default)]
pub struct FfmpegSegmenter {
    detector: SceneDetector,
}

impl FfmpegSegmenter {
    pub fn new(detector: SceneDetector) -> Self {
        Self { detector }
    }
}

#[async_trait]
impl SceneSegmenter for FfmpegSegmenter {
    async fn segment(
        &self,
        video: &Path,
        window: TimeWindow,
        thumbnails_dir: &Path,
    ) -> WorkerResult<SegmentedVideo> {
        let detected = self.detector.detect(video, window).await?;
        let thumbnails =
            extract_scene_thumbnails(video, &detected.scenes, thumbnails_dir, &video_stem(video)).await?;

        debug!(
            video = %video.display(),
            fps = detected.info.fps,
            duration = detected.info.duration,
            "Segmented video"
        );

        Ok(SegmentedVideo {
            scenes: detected.scenes,
            thumbnails,
            thumbnails_dir: thumbnails_dir.to_path_buf(),
        })
    }
}

/// Recognizer backed by the face service.
pub struct FaceServiceRecognizer {
    client: FaceClient,
}

impl FaceServiceRecognizer {
    pub fn new(client: FaceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FaceRecognizer for FaceServiceRecognizer {
    async fn find_matches(&self, reference: &Path, candidates_dir: &Path) -> FaceResult<Vec<PathBuf>> {
        self.client.find(reference, candidates_dir).await
    }

    async fn has_face(&self, image: &Path) -> FaceResult<bool> {
        self.client.has_face(image).await
    }
}

/// Writes thumbnails, the scene list CSV and one clip per range.
#[derive(Debug, Clone, Default)]
pub struct FfmpegSceneSink {
    encoding: EncodingConfig,
}

impl FfmpegSceneSink {
    pub fn new(encoding: EncodingConfig) -> Self {
        Self { encoding }
    }
}

#[async_trait]
impl SceneSink for FfmpegSceneSink {
    async fn save(&self, video: &Path, output_dir: &Path, scenes: &[Scene]) -> WorkerResult<()> {
        if scenes.is_empty() {
            return Ok(());
        }

        let ranges = SceneList::new(scenes.to_vec())?;
        let stem = video_stem(video);

        clear_dir(output_dir).await?;
        extract_scene_thumbnails(video, &ranges, &output_dir.join(OUTPUT_THUMBNAILS_DIR), &stem)
            .await?;
        save_scene_list(&output_dir.join(SCENE_LIST_FILE_NAME), &ranges).await?;
        split_video(video, scenes, output_dir, &stem, &self.encoding).await?;
        Ok(())
    }
}
