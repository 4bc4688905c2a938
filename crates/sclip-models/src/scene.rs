//! Scene model: shots, scene lists and per-scene thumbnails.
//!
//! A [`SceneList`] is validated once when it is built and is read-only
//! afterwards. Every category processed for a video borrows the same list;
//! filtering and merging always produce new vectors of [`Scene`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::fmt;
use std::ops::Index;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::timecode::Timecode;

/// Position of a scene within its video's [`SceneList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneIndex(pub usize);

impl SceneIndex {
    pub fn get(self) -> usize {
        self.0
    }

    /// 1-based scene number used in file names and CSV output.
    pub fn number(self) -> usize {
        self.0 + 1
    }
}

impl fmt::Display for SceneIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for SceneIndex {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

/// A contiguous shot bounded by two timecodes, `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScene")]
pub struct Scene {
    start: Timecode,
    end: Timecode,
}

#[derive(Deserialize)]
struct RawScene {
    start: Timecode,
    end: Timecode,
}

impl TryFrom<RawScene> for Scene {
    type Error = SceneError;

    fn try_from(raw: RawScene) -> Result<Self, Self::Error> {
        Scene::new(raw.start, raw.end)
    }
}

impl Scene {
    pub fn new(start: Timecode, end: Timecode) -> Result<Self, SceneError> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(SceneError::EmptyRange {
                start: start.to_string(),
                end: end.to_string(),
            })
        }
    }

    pub fn start(&self) -> Timecode {
        self.start
    }

    pub fn end(&self) -> Timecode {
        self.end
    }

    pub fn duration_secs(&self) -> f64 {
        self.start.seconds_until(&self.end)
    }

    pub fn duration_frames(&self) -> u64 {
        self.end.frame().saturating_sub(self.start.frame())
    }

    /// Seconds between the end of this scene and the start of `next`.
    pub fn gap_to(&self, next: &Scene) -> f64 {
        self.end.seconds_until(&next.start)
    }

    /// This scene with its end moved out to cover `other`.
    ///
    /// The start is kept; the end never moves backwards.
    pub fn extended_to(&self, other: &Scene) -> Scene {
        let end = if other.end > self.end { other.end } else { self.end };
        Scene {
            start: self.start,
            end,
        }
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    #[error("Scene start {start} is not before its end {end}")]
    EmptyRange { start: String, end: String },
}

/// Chronologically ordered, non-overlapping scenes of one video.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SceneList {
    scenes: Vec<Scene>,
}

impl SceneList {
    /// Build a scene list, rejecting input that is not in strictly increasing,
    /// non-overlapping order. Touching boundaries (`end == next.start`) are allowed.
    pub fn new(scenes: Vec<Scene>) -> Result<Self, SceneListError> {
        for (i, pair) in scenes.windows(2).enumerate() {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.start <= prev.start {
                return Err(SceneListError::NotIncreasing { index: i + 1 });
            }
            if next.start < prev.end {
                return Err(SceneListError::Overlapping { index: i + 1 });
            }
        }
        Ok(Self { scenes })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn get(&self, index: SceneIndex) -> Option<&Scene> {
        self.scenes.get(index.0)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Scene> {
        self.scenes.iter()
    }

    pub fn as_slice(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn indices(&self) -> impl Iterator<Item = SceneIndex> {
        (0..self.scenes.len()).map(SceneIndex)
    }

    /// Copy of the whole list as plain scenes.
    pub fn to_vec(&self) -> Vec<Scene> {
        self.scenes.clone()
    }
}

impl Index<SceneIndex> for SceneList {
    type Output = Scene;

    fn index(&self, index: SceneIndex) -> &Scene {
        &self.scenes[index.0]
    }
}

impl<'a> IntoIterator for &'a SceneList {
    type Item = &'a Scene;
    type IntoIter = std::slice::Iter<'a, Scene>;

    fn into_iter(self) -> Self::IntoIter {
        self.scenes.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneListError {
    #[error("Scene {index} does not start after scene {}", .index - 1)]
    NotIncreasing { index: usize },

    #[error("Scene {index} overlaps scene {}", .index - 1)]
    Overlapping { index: usize },
}

/// Identifies one thumbnail: the scene it was taken from and its slot within that scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThumbnailId {
    pub scene: SceneIndex,
    pub slot: usize,
}

/// Representative images per scene, in slot order.
#[derive(Debug, Clone, Default)]
pub struct ThumbnailMap {
    by_scene: BTreeMap<SceneIndex, Vec<PathBuf>>,
}

impl ThumbnailMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a thumbnail to a scene, returning its id.
    pub fn insert(&mut self, scene: SceneIndex, path: impl Into<PathBuf>) -> ThumbnailId {
        let images = self.by_scene.entry(scene).or_default();
        images.push(path.into());
        ThumbnailId {
            scene,
            slot: images.len() - 1,
        }
    }

    /// All thumbnails of a scene (empty if extraction produced none).
    pub fn get(&self, scene: SceneIndex) -> &[PathBuf] {
        self.by_scene.get(&scene).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The first thumbnail of a scene.
    pub fn primary(&self, scene: SceneIndex) -> Option<&Path> {
        self.get(scene).first().map(PathBuf::as_path)
    }

    /// Number of scenes that have at least one thumbnail.
    pub fn scene_count(&self) -> usize {
        self.by_scene.values().filter(|v| !v.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.scene_count() == 0
    }

    /// Every thumbnail with its id, in scene then slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ThumbnailId, &Path)> {
        self.by_scene.iter().flat_map(|(scene, images)| {
            images.iter().enumerate().map(move |(slot, path)| {
                (
                    ThumbnailId {
                        scene: *scene,
                        slot,
                    },
                    path.as_path(),
                )
            })
        })
    }

    /// Lookup from thumbnail file name to its id.
    ///
    /// Recognizer results name candidates by path; only the file name is
    /// compared so that differing directory prefixes cannot break the mapping.
    pub fn file_name_index(&self) -> HashMap<OsString, ThumbnailId> {
        self.iter()
            .filter_map(|(id, path)| path.file_name().map(|name| (name.to_os_string(), id)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tc(frame: u64) -> Timecode {
        Timecode::from_frames(frame, 10.0).unwrap()
    }

    fn scene(start: u64, end: u64) -> Scene {
        Scene::new(tc(start), tc(end)).unwrap()
    }

    #[test]
    fn test_scene_rejects_empty_range() {
        assert!(Scene::new(tc(5), tc(5)).is_err());
        assert!(Scene::new(tc(6), tc(5)).is_err());
    }

    #[test]
    fn test_scene_deserialize_checks_range() {
        let json = serde_json::to_string(&scene(0, 10)).unwrap();
        assert_eq!(serde_json::from_str::<Scene>(&json).unwrap(), scene(0, 10));

        let inverted = r#"{"start":{"frame":10,"fps":10.0},"end":{"frame":0,"fps":10.0}}"#;
        assert!(serde_json::from_str::<Scene>(inverted).is_err());
    }

    #[test]
    fn test_scene_gap_and_extend() {
        let a = scene(0, 10);
        let b = scene(30, 40);
        assert_eq!(a.gap_to(&b), 2.0);
        let merged = a.extended_to(&b);
        assert_eq!(merged.start(), tc(0));
        assert_eq!(merged.end(), tc(40));
        assert_eq!(b.extended_to(&a), b);
    }

    #[test]
    fn test_scene_list_accepts_touching_scenes() {
        let list = SceneList::new(vec![scene(0, 10), scene(10, 20), scene(25, 30)]).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[SceneIndex(1)], scene(10, 20));
    }

    #[test]
    fn test_scene_list_rejects_unsorted() {
        let err = SceneList::new(vec![scene(10, 20), scene(0, 5)]).unwrap_err();
        assert_eq!(err, SceneListError::NotIncreasing { index: 1 });
    }

    #[test]
    fn test_scene_list_rejects_overlap() {
        let err = SceneList::new(vec![scene(0, 20), scene(10, 30)]).unwrap_err();
        assert_eq!(err, SceneListError::Overlapping { index: 1 });
    }

    #[test]
    fn test_thumbnail_map_lookup_by_file_name() {
        let mut map = ThumbnailMap::new();
        map.insert(SceneIndex(0), "/tmp/scene/ep-Scene-001-01.jpg");
        map.insert(SceneIndex(2), "scene/ep-Scene-003-01.jpg");
        map.insert(SceneIndex(2), "scene/ep-Scene-003-02.jpg");

        let lookup = map.file_name_index();
        assert_eq!(
            lookup.get(&OsString::from("ep-Scene-003-02.jpg")),
            Some(&ThumbnailId {
                scene: SceneIndex(2),
                slot: 1
            })
        );
        assert_eq!(map.scene_count(), 2);
        assert!(map.get(SceneIndex(1)).is_empty());
        assert_eq!(
            map.primary(SceneIndex(0)),
            Some(Path::new("/tmp/scene/ep-Scene-001-01.jpg"))
        );
    }
}
