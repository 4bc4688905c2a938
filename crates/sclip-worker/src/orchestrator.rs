//! Per-video classification pipeline.
//!
//! Each video is segmented once; the resulting scene list and thumbnails are
//! shared read-only by every category. Categories are processed one after
//! another and each non-empty result is handed to the scene sink.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn, Instrument};

use sclip_media::{
    clear_dir, list_files_with_extensions, list_subdirs, remove_dir_if_exists, video_stem,
    TimeWindow, VIDEO_EXTENSIONS,
};
use sclip_models::timestamp::format_elapsed;
use sclip_models::{Category, CategoryKind, ClipMode, RoleStrategy, Scene};

use crate::config::WorkerConfig;
use crate::consolidate::{consolidate, CategoryEvidence, ConfirmedIndices};
use crate::error::{WorkerError, WorkerResult};
use crate::evidence::{aggregate_matches, detect_broll, ReferenceSet};
use crate::logging::VideoLogger;
use crate::metrics;
use crate::providers::{FaceRecognizer, SceneSegmenter, SceneSink, SegmentedVideo};

/// What was produced for one category of one video.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryOutput {
    pub category: String,
    pub mode: ClipMode,
    pub ranges: usize,
    /// `None` when nothing qualified and nothing was written
    pub output_dir: Option<PathBuf>,
}

/// Outcome of processing one video.
#[derive(Debug, Clone)]
pub struct VideoReport {
    pub video: PathBuf,
    pub scenes: usize,
    pub outputs: Vec<CategoryOutput>,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub failed: usize,
}

/// Runs segmentation, classification and output for every video.
pub struct SceneClassifier {
    config: WorkerConfig,
    segmenter: Arc<dyn SceneSegmenter>,
    recognizer: Arc<dyn FaceRecognizer>,
    sink: Arc<dyn SceneSink>,
}

impl SceneClassifier {
    pub fn new(
        config: WorkerConfig,
        segmenter: Arc<dyn SceneSegmenter>,
        recognizer: Arc<dyn FaceRecognizer>,
        sink: Arc<dyn SceneSink>,
    ) -> Self {
        Self {
            config,
            segmenter,
            recognizer,
            sink,
        }
    }

    /// Categories for the configured modes, in mode order.
    ///
    /// Role mode yields one category per sub-directory of the reference root.
    pub async fn categories(&self) -> WorkerResult<Vec<Category>> {
        let mut categories = Vec::new();

        for mode in &self.config.modes {
            match mode {
                ClipMode::Clip => categories.push(Category::clip()),
                ClipMode::Role => {
                    let root = &self.config.input_dir;
                    if !root.is_dir() {
                        return Err(WorkerError::MissingReferenceSet(root.clone()));
                    }
                    let dirs = list_subdirs(root).await?;
                    if dirs.is_empty() {
                        warn!(input_dir = %root.display(), "Role mode enabled but no reference sets found");
                    }
                    for dir in dirs {
                        let name = dir
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default();
                        let references = ReferenceSet::load(&dir).await?;
                        if references.is_empty() {
                            warn!(
                                role = %name,
                                reference_dir = %references.dir().display(),
                                "Reference set has no images, role will produce no clips"
                            );
                        } else {
                            debug!(role = %name, images = references.len(), "Loaded reference set");
                        }
                        categories.push(Category::role(
                            name,
                            dir,
                            self.config.role_strategy,
                            self.config.role_time_step_secs,
                        ));
                    }
                }
                ClipMode::Broll => {
                    categories.push(Category::broll(self.config.broll_time_step_secs))
                }
            }
        }

        Ok(categories)
    }

    /// Where the ranges of `category` for the video named `stem` are written.
    pub fn output_dir(&self, category: &Category, stem: &str) -> PathBuf {
        match &category.kind {
            CategoryKind::Clip => self.config.clip_dir.join(stem),
            CategoryKind::Role { .. } => self.config.role_dir.join(&category.name).join(stem),
            CategoryKind::Broll => self.config.broll_dir.join(stem),
        }
    }

    async fn gather_evidence(
        &self,
        segmented: &SegmentedVideo,
        category: &Category,
    ) -> WorkerResult<CategoryEvidence> {
        let scene_count = segmented.scenes.len();

        let evidence = match &category.kind {
            CategoryKind::Clip => CategoryEvidence::All,
            CategoryKind::Role {
                reference_dir,
                strategy,
            } => {
                let references = ReferenceSet::load(reference_dir).await?;
                let mask = aggregate_matches(
                    self.recognizer.as_ref(),
                    &references,
                    &segmented.thumbnails_dir,
                    &segmented.thumbnails,
                    scene_count,
                    self.config.min_votes,
                )
                .await?;
                match strategy {
                    RoleStrategy::GapFill => CategoryEvidence::Sparse(ConfirmedIndices::from(&mask)),
                    RoleStrategy::MergeAdjacent => CategoryEvidence::Dense(mask),
                }
            }
            CategoryKind::Broll => {
                let mask =
                    detect_broll(self.recognizer.as_ref(), &segmented.thumbnails, scene_count).await?;
                CategoryEvidence::Sparse(ConfirmedIndices::from(&mask))
            }
        };

        Ok(evidence)
    }

    /// Final ranges of one category.
    pub async fn classify(
        &self,
        segmented: &SegmentedVideo,
        category: &Category,
    ) -> WorkerResult<Vec<Scene>> {
        let evidence = self.gather_evidence(segmented, category).await?;
        let ranges = consolidate(&segmented.scenes, &evidence, category.gap_threshold_secs)?;
        debug!(
            category = %category.name,
            strategy = evidence.strategy_name(),
            ranges = ranges.len(),
            "Consolidated category"
        );
        Ok(ranges)
    }

    /// Segment `video` once and produce every category.
    ///
    /// The scratch thumbnail directory is recreated before segmentation and
    /// removed afterwards, whether or not processing succeeded.
    pub async fn process_video(
        &self,
        video: &Path,
        categories: &[Category],
        window: TimeWindow,
    ) -> WorkerResult<VideoReport> {
        let stem = video_stem(video);
        let logger = VideoLogger::new(&stem);
        let span = logger.create_span();

        self.process_video_in_scratch(video, &stem, categories, window, &logger)
            .instrument(span)
            .await
    }

    async fn process_video_in_scratch(
        &self,
        video: &Path,
        stem: &str,
        categories: &[Category],
        window: TimeWindow,
        logger: &VideoLogger,
    ) -> WorkerResult<VideoReport> {
        let started = Instant::now();
        logger.log_start(&video.display().to_string());

        let scratch = &self.config.scratch_dir;
        clear_dir(scratch).await?;
        let result = self
            .produce_categories(video, stem, categories, window, logger)
            .await;
        if let Err(e) = remove_dir_if_exists(scratch).await {
            logger.log_warning(&format!("failed to remove {}: {}", scratch.display(), e));
        }

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                logger.log_error(&e.to_string());
                return Err(e);
            }
        };
        let elapsed = started.elapsed();
        metrics::record_video_processed(elapsed.as_secs_f64());
        logger.log_completion(&format!(
            "{} uses {}",
            video.display(),
            format_elapsed(elapsed.as_secs())
        ));
        Ok(report)
    }

    async fn produce_categories(
        &self,
        video: &Path,
        stem: &str,
        categories: &[Category],
        window: TimeWindow,
        logger: &VideoLogger,
    ) -> WorkerResult<VideoReport> {
        let segmented = self
            .segmenter
            .segment(video, window, &self.config.scratch_dir)
            .await?;
        metrics::record_scenes_detected(segmented.scenes.len());
        logger.log_progress(&format!(
            "{} scenes, {} thumbnails",
            segmented.scenes.len(),
            segmented.thumbnails.scene_count()
        ));

        let mut outputs = Vec::with_capacity(categories.len());
        for category in categories {
            let category_logger = logger.for_category(&category.name);
            let output = self
                .produce_category(video, stem, &segmented, category, &category_logger)
                .instrument(category_logger.create_span())
                .await?;
            outputs.push(output);
        }

        Ok(VideoReport {
            video: video.to_path_buf(),
            scenes: segmented.scenes.len(),
            outputs,
        })
    }

    async fn produce_category(
        &self,
        video: &Path,
        stem: &str,
        segmented: &SegmentedVideo,
        category: &Category,
        logger: &VideoLogger,
    ) -> WorkerResult<CategoryOutput> {
        let ranges = self.classify(segmented, category).await?;
        metrics::record_scenes_kept(category.mode().as_str(), ranges.len());

        if ranges.is_empty() {
            logger.log_completion("no qualifying scenes, nothing written");
            return Ok(CategoryOutput {
                category: category.name.clone(),
                mode: category.mode(),
                ranges: 0,
                output_dir: None,
            });
        }

        let output_dir = self.output_dir(category, stem);
        self.sink.save(video, &output_dir, &ranges).await?;
        logger.log_completion(&format!(
            "wrote {} ranges to {}",
            ranges.len(),
            output_dir.display()
        ));
        Ok(CategoryOutput {
            category: category.name.clone(),
            mode: category.mode(),
            ranges: ranges.len(),
            output_dir: Some(output_dir),
        })
    }

    /// Process every video in the video directory, one at a time.
    ///
    /// A video that fails is logged and counted; the remaining videos are
    /// still processed.
    pub async fn run(&self) -> WorkerResult<RunSummary> {
        self.config.validate()?;
        let window = self.config.time_window()?;
        let categories = self.categories().await?;

        let video_dir = &self.config.video_dir;
        if !video_dir.is_dir() {
            return Err(WorkerError::config(format!(
                "video directory {} does not exist",
                video_dir.display()
            )));
        }
        let videos = list_files_with_extensions(video_dir, VIDEO_EXTENSIONS).await?;
        info!(
            videos = videos.len(),
            categories = categories.len(),
            "Starting run"
        );

        let mut summary = RunSummary::default();
        for video in &videos {
            match self.process_video(video, &categories, window).await {
                Ok(_) => summary.processed += 1,
                Err(e) => {
                    error!(video = %video.display(), error = %e, "Video failed");
                    metrics::record_video_failed(e.is_structural());
                    summary.failed += 1;
                }
            }
        }

        info!(
            processed = summary.processed,
            failed = summary.failed,
            "Run finished"
        );
        Ok(summary)
    }
}
