//! Scene classification worker binary.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sclip_face_client::FaceClient;
use sclip_media::SceneDetector;
use sclip_models::{ClipMode, RoleStrategy};
use sclip_worker::{
    FaceServiceRecognizer, FfmpegSceneSink, FfmpegSegmenter, SceneClassifier, WorkerConfig,
};

/// Command-line overrides. Anything not given falls back to `SCLIP_*`
/// environment variables, then to the built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "sclip-worker")]
#[command(about = "Split videos into scenes and cut role, B-roll and scene clips")]
#[command(version)]
struct Args {
    /// Modes to run: comma list of clip, role, broll (or 0, 1, 2), or "all"
    #[arg(short, long)]
    modes: Option<String>,

    /// Segmentation start (HH:MM:SS)
    #[arg(long)]
    start: Option<String>,

    /// Segmentation end (HH:MM:SS or END)
    #[arg(long)]
    end: Option<String>,

    /// Directory of input videos
    #[arg(long)]
    video_dir: Option<PathBuf>,

    /// Reference root with one image directory per role
    #[arg(long)]
    input_dir: Option<PathBuf>,

    #[arg(long)]
    clip_dir: Option<PathBuf>,

    #[arg(long)]
    role_dir: Option<PathBuf>,

    #[arg(long)]
    broll_dir: Option<PathBuf>,

    /// Scratch directory for thumbnails (wiped for every video)
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Matches needed by a thumbnail, exclusive
    #[arg(long)]
    min_votes: Option<u32>,

    /// Largest gap bridged between role scenes, in seconds
    #[arg(long)]
    role_time_step: Option<f64>,

    /// Largest gap bridged between B-roll scenes, in seconds
    #[arg(long)]
    broll_time_step: Option<f64>,

    /// How role scenes become ranges: gap-fill or merge-adjacent
    #[arg(long)]
    role_strategy: Option<RoleStrategy>,

    /// Scene detection threshold (0.0 to 1.0)
    #[arg(long)]
    scene_threshold: Option<f64>,

    /// Minimum scene length in frames
    #[arg(long)]
    min_scene_len: Option<u64>,

    /// Log output format: text or json
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    log_format: String,
}

impl Args {
    fn apply(self, config: &mut WorkerConfig) -> anyhow::Result<()> {
        if let Some(modes) = self.modes {
            config.modes = ClipMode::parse_list(&modes)?;
        }
        if let Some(start) = self.start {
            config.start_time = start;
        }
        if let Some(end) = self.end {
            config.end_time = end;
        }
        if let Some(dir) = self.video_dir {
            config.video_dir = dir;
        }
        if let Some(dir) = self.input_dir {
            config.input_dir = dir;
        }
        if let Some(dir) = self.clip_dir {
            config.clip_dir = dir;
        }
        if let Some(dir) = self.role_dir {
            config.role_dir = dir;
        }
        if let Some(dir) = self.broll_dir {
            config.broll_dir = dir;
        }
        if let Some(dir) = self.scratch_dir {
            config.scratch_dir = dir;
        }
        if let Some(votes) = self.min_votes {
            config.min_votes = votes;
        }
        if let Some(step) = self.role_time_step {
            config.role_time_step_secs = step;
        }
        if let Some(step) = self.broll_time_step {
            config.broll_time_step_secs = step;
        }
        if let Some(strategy) = self.role_strategy {
            config.role_strategy = strategy;
        }
        if let Some(threshold) = self.scene_threshold {
            config.scene_threshold = threshold;
        }
        if let Some(frames) = self.min_scene_len {
            config.min_scene_len_frames = frames;
        }
        Ok(())
    }
}

fn init_tracing(log_format: &str) -> anyhow::Result<()> {
    let env_filter = EnvFilter::from_default_env().add_directive("sclip=info".parse()?);

    if log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before clap reads LOG_FORMAT
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_format)?;

    info!("Starting sclip-worker");

    let mut config = WorkerConfig::from_env();
    args.apply(&mut config)?;
    config.validate()?;
    info!("Worker config: {:?}", config);

    let face_client = FaceClient::from_env().context("failed to create face service client")?;
    let classifier = SceneClassifier::new(
        config.clone(),
        Arc::new(FfmpegSegmenter::new(SceneDetector::new(
            config.scene_detect_config(),
        ))),
        Arc::new(FaceServiceRecognizer::new(face_client)),
        Arc::new(FfmpegSceneSink::new(config.encoding.clone())),
    );

    let summary = match classifier.run().await {
        Ok(summary) => summary,
        Err(e) => {
            error!("Run failed: {}", e);
            return Err(e.into());
        }
    };

    info!(
        processed = summary.processed,
        failed = summary.failed,
        "Worker finished"
    );
    if summary.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
