//! Scene list CSV export.
//!
//! Layout matches the `list-scenes` report of common scene detection tools:
//! a `Timecode List:` row holding every cut, then one row per scene with
//! 1-based start frames.

use std::io::{self, Write};
use std::path::Path;
use tokio::fs;

use sclip_models::timestamp::format_seconds;
use sclip_models::SceneList;

use crate::error::MediaResult;

const HEADER: &[&str] = &[
    "Scene Number",
    "Start Frame",
    "Start Timecode",
    "Start Time (seconds)",
    "End Frame",
    "End Timecode",
    "End Time (seconds)",
    "Length (frames)",
    "Length (timecode)",
    "Length (seconds)",
];

/// File name of the scene list written next to the split clips.
pub const SCENE_LIST_FILE_NAME: &str = "scene_list.csv";

/// Write `scenes` as CSV into `out`.
pub fn write_scene_list<W: Write>(out: &mut W, scenes: &SceneList) -> io::Result<()> {
    let cuts: Vec<String> = scenes
        .iter()
        .skip(1)
        .map(|s| s.start().to_timecode_string())
        .collect();
    write!(out, "Timecode List:")?;
    for cut in &cuts {
        write!(out, ",{}", cut)?;
    }
    writeln!(out)?;

    writeln!(out, "{}", HEADER.join(","))?;

    for (index, scene) in scenes.indices().zip(scenes.iter()) {
        let (start, end) = (scene.start(), scene.end());
        let length = scene.duration_secs();
        writeln!(
            out,
            "{},{},{},{:.3},{},{},{:.3},{},{},{:.3}",
            index.number(),
            start.frame() + 1,
            start.to_timecode_string(),
            start.seconds(),
            end.frame(),
            end.to_timecode_string(),
            end.seconds(),
            scene.duration_frames(),
            format_seconds(length),
            length,
        )?;
    }
    Ok(())
}

/// Save the scene list CSV to `path`.
pub async fn save_scene_list(path: &Path, scenes: &SceneList) -> MediaResult<()> {
    let mut buf = Vec::new();
    write_scene_list(&mut buf, scenes)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, buf).await?;
    Ok(())
}
