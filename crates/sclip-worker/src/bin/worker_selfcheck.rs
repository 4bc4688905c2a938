use anyhow::Context;

use sclip_face_client::FaceClient;
use sclip_media::{check_ffmpeg, check_ffprobe};
use sclip_models::ClipMode;
use sclip_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = WorkerConfig::from_env();

    println!(
        "sclip-selfcheck: starting with video_dir={} modes={:?}",
        config.video_dir.display(),
        config.modes
    );
    config.validate()?;
    ensure_dir(&config.video_dir)?;

    let ffmpeg = check_ffmpeg()?;
    let ffprobe = check_ffprobe()?;
    println!(
        "sclip-selfcheck: ffmpeg={} ffprobe={}",
        ffmpeg.display(),
        ffprobe.display()
    );

    let needs_faces = config
        .modes
        .iter()
        .any(|m| matches!(m, ClipMode::Role | ClipMode::Broll));
    if needs_faces {
        if config.modes.contains(&ClipMode::Role) {
            ensure_dir(&config.input_dir)?;
        }
        let client = FaceClient::from_env()?;
        let healthy = client.health_check().await?;
        if !healthy {
            anyhow::bail!(
                "face service at {} is not healthy",
                client.config().base_url
            );
        }
    }

    println!("sclip-selfcheck: ok");
    Ok(())
}

fn ensure_dir(path: &std::path::Path) -> anyhow::Result<()> {
    let meta = std::fs::metadata(path).with_context(|| format!("{} not found", path.display()))?;
    if !meta.is_dir() {
        anyhow::bail!("{} is not a directory", path.display());
    }
    Ok(())
}
