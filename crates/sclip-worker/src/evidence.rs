//! Face-match evidence: reference sets, vote counting and membership masks.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use sclip_media::{list_files_with_extensions, IMAGE_EXTENSIONS};
use sclip_models::{SceneIndex, ThumbnailId, ThumbnailMap};

use crate::error::{WorkerError, WorkerResult};
use crate::providers::FaceRecognizer;

/// Reference images of one category.
#[derive(Debug, Clone)]
pub struct ReferenceSet {
    dir: PathBuf,
    images: Vec<PathBuf>,
}

impl ReferenceSet {
    /// Load every image file in `dir`, sorted by path.
    ///
    /// A directory without images loads as an empty set; it produces no
    /// matches rather than an error.
    pub async fn load(dir: impl AsRef<Path>) -> WorkerResult<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(WorkerError::MissingReferenceSet(dir.to_path_buf()));
        }

        let images = list_files_with_extensions(dir, IMAGE_EXTENSIONS).await?;

        Ok(Self {
            dir: dir.to_path_buf(),
            images,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn images(&self) -> &[PathBuf] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// A thumbnail qualifies when it was matched strictly more than `min_votes` times.
pub fn qualifies(count: u32, min_votes: u32) -> bool {
    count > min_votes
}

/// How often each thumbnail was returned across all reference queries.
#[derive(Debug, Clone, Default)]
pub struct MatchCountTable {
    counts: HashMap<ThumbnailId, u32>,
}

impl MatchCountTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, id: ThumbnailId) {
        *self.counts.entry(id).or_insert(0) += 1;
    }

    /// Record recognizer hits, mapping each path back to its thumbnail by file name.
    ///
    /// Paths that do not name a known thumbnail are ignored. Returns how many
    /// hits were recorded.
    pub fn record_hits<I>(&mut self, hits: I, lookup: &HashMap<OsString, ThumbnailId>) -> usize
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut recorded = 0;
        for hit in hits {
            match hit.file_name().and_then(|name| lookup.get(name)) {
                Some(id) => {
                    self.record(*id);
                    recorded += 1;
                }
                None => debug!(path = %hit.display(), "Ignoring match outside the thumbnail set"),
            }
        }
        recorded
    }

    pub fn count(&self, id: ThumbnailId) -> u32 {
        self.counts.get(&id).copied().unwrap_or(0)
    }
}

/// Per-scene category membership, one flag for every scene of the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipMask {
    flags: Vec<bool>,
}

impl MembershipMask {
    pub fn from_flags(flags: Vec<bool>) -> Self {
        Self { flags }
    }

    /// A scene is a member if any of its thumbnails qualifies.
    pub fn from_counts(
        table: &MatchCountTable,
        thumbnails: &ThumbnailMap,
        scene_count: usize,
        min_votes: u32,
    ) -> Self {
        let mut flags = vec![false; scene_count];
        for (id, _) in thumbnails.iter() {
            if id.scene.get() < scene_count && qualifies(table.count(id), min_votes) {
                flags[id.scene.get()] = true;
            }
        }
        Self { flags }
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Member scene indices in increasing order.
    pub fn members(&self) -> impl Iterator<Item = SceneIndex> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter(|(_, member)| **member)
            .map(|(i, _)| SceneIndex(i))
    }

    pub fn member_count(&self) -> usize {
        self.flags.iter().filter(|m| **m).count()
    }
}

/// Query the recognizer with every reference image and vote on the thumbnails.
///
/// A reference image the service cannot use contributes no votes; any other
/// recognizer failure is returned.
pub async fn aggregate_matches(
    recognizer: &dyn FaceRecognizer,
    references: &ReferenceSet,
    candidates_dir: &Path,
    thumbnails: &ThumbnailMap,
    scene_count: usize,
    min_votes: u32,
) -> WorkerResult<MembershipMask> {
    if references.is_empty() {
        warn!(reference_dir = %references.dir().display(), "Reference set has no images, no scene can match");
        return Ok(MembershipMask::from_flags(vec![false; scene_count]));
    }

    let lookup = thumbnails.file_name_index();
    let mut table = MatchCountTable::new();

    for reference in references.images() {
        match recognizer.find_matches(reference, candidates_dir).await {
            Ok(hits) => {
                let recorded = table.record_hits(hits, &lookup);
                debug!(reference = %reference.display(), hits = recorded, "Reference query finished");
            }
            Err(e) if e.is_image_failure() => {
                warn!(reference = %reference.display(), error = %e, "Reference image unusable, skipping");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(MembershipMask::from_counts(&table, thumbnails, scene_count, min_votes))
}

/// Mark scenes in which no thumbnail shows a detectable face.
///
/// Scenes without any thumbnail carry no evidence and are not members. An
/// image the recognizer cannot process counts as showing no face.
pub async fn detect_broll(
    recognizer: &dyn FaceRecognizer,
    thumbnails: &ThumbnailMap,
    scene_count: usize,
) -> WorkerResult<MembershipMask> {
    let mut flags = vec![false; scene_count];

    for index in (0..scene_count).map(SceneIndex) {
        let images = thumbnails.get(index);
        if images.is_empty() {
            continue;
        }

        let mut any_face = false;
        for image in images {
            match recognizer.has_face(image).await {
                Ok(true) => {
                    any_face = true;
                    break;
                }
                Ok(false) => {}
                Err(e) if e.is_image_failure() => {
                    debug!(image = %image.display(), error = %e, "Treating unreadable thumbnail as faceless");
                }
                Err(e) => return Err(e.into()),
            }
        }
        flags[index.get()] = !any_face;
    }

    Ok(MembershipMask::from_flags(flags))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sclip_face_client::{FaceError, FaceResult};
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn thumbnails(count: usize) -> ThumbnailMap {
        let mut map = ThumbnailMap::new();
        for i in 0..count {
            map.insert(SceneIndex(i), format!("scene/ep-Scene-{:03}-01.jpg", i + 1));
        }
        map
    }

    fn thumb(i: usize) -> PathBuf {
        PathBuf::from(format!("/abs/scene/ep-Scene-{:03}-01.jpg", i + 1))
    }

    /// Returns fixed hits per reference file name; faces exist only in listed thumbnails.
    struct ScriptedRecognizer {
        hits: HashMap<String, FaceResult<Vec<PathBuf>>>,
        faces: HashSet<PathBuf>,
        broken: HashSet<PathBuf>,
    }

    impl ScriptedRecognizer {
        fn new() -> Self {
            Self {
                hits: HashMap::new(),
                faces: HashSet::new(),
                broken: HashSet::new(),
            }
        }
    }

    fn clone_result(r: &FaceResult<Vec<PathBuf>>) -> FaceResult<Vec<PathBuf>> {
        match r {
            Ok(v) => Ok(v.clone()),
            Err(FaceError::NoFaceDetected(p)) => Err(FaceError::NoFaceDetected(p.clone())),
            Err(e) => Err(FaceError::ServiceUnavailable(e.to_string())),
        }
    }

    #[async_trait]
    impl FaceRecognizer for ScriptedRecognizer {
        async fn find_matches(&self, reference: &Path, _candidates_dir: &Path) -> FaceResult<Vec<PathBuf>> {
            let name = reference.file_name().unwrap().to_string_lossy().into_owned();
            self.hits
                .get(&name)
                .map(clone_result)
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn has_face(&self, image: &Path) -> FaceResult<bool> {
            if self.broken.contains(image) {
                return Err(FaceError::RequestFailed {
                    status: 400,
                    message: "cannot read".into(),
                });
            }
            Ok(self.faces.contains(image))
        }
    }

    async fn reference_set(names: &[&str]) -> (TempDir, ReferenceSet) {
        let dir = TempDir::new().unwrap();
        for name in names {
            std::fs::write(dir.path().join(name), b"img").unwrap();
        }
        let set = ReferenceSet::load(dir.path()).await.unwrap();
        (dir, set)
    }

    #[test]
    fn test_qualifies_is_strict() {
        assert!(!qualifies(0, 2));
        assert!(!qualifies(2, 2));
        assert!(qualifies(3, 2));
    }

    #[test]
    fn test_qualification_monotonic_in_min_votes() {
        let map = thumbnails(5);
        let mut table = MatchCountTable::new();
        for (i, votes) in [0u32, 1, 3, 5, 2].iter().enumerate() {
            for _ in 0..*votes {
                table.record(ThumbnailId {
                    scene: SceneIndex(i),
                    slot: 0,
                });
            }
        }

        let mut previous = usize::MAX;
        for min_votes in 0..7 {
            let members = MembershipMask::from_counts(&table, &map, 5, min_votes).member_count();
            assert!(members <= previous);
            previous = members;
        }
        assert_eq!(previous, 0);
    }

    #[test]
    fn test_any_qualifying_thumbnail_makes_scene_member() {
        let mut map = ThumbnailMap::new();
        let a = map.insert(SceneIndex(0), "s/a-01.jpg");
        let b = map.insert(SceneIndex(0), "s/a-02.jpg");
        map.insert(SceneIndex(1), "s/b-01.jpg");

        let mut table = MatchCountTable::new();
        table.record(a);
        for _ in 0..3 {
            table.record(b);
        }

        let mask = MembershipMask::from_counts(&table, &map, 2, 2);
        assert_eq!(mask.members().collect::<Vec<_>>(), vec![SceneIndex(0)]);
    }

    #[test]
    fn test_record_hits_maps_by_file_name_and_ignores_strays() {
        let map = thumbnails(3);
        let lookup = map.file_name_index();
        let mut table = MatchCountTable::new();

        let recorded = table.record_hits(
            vec![thumb(1), thumb(1), PathBuf::from("/elsewhere/stray.jpg")],
            &lookup,
        );
        assert_eq!(recorded, 2);
        assert_eq!(
            table.count(ThumbnailId {
                scene: SceneIndex(1),
                slot: 0
            }),
            2
        );
    }

    #[tokio::test]
    async fn test_reference_set_load() {
        let (_dir, set) = reference_set(&["b.PNG", "a.jpg", "notes.txt"]).await;
        let names: Vec<_> = set
            .images()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.PNG"]);
    }

    #[tokio::test]
    async fn test_reference_set_missing_or_empty() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            ReferenceSet::load(dir.path().join("nobody")).await,
            Err(WorkerError::MissingReferenceSet(_))
        ));

        std::fs::write(dir.path().join("notes.txt"), b"not an image").unwrap();
        let set = ReferenceSet::load(dir.path()).await.unwrap();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert_eq!(set.dir(), dir.path());
    }

    #[tokio::test]
    async fn test_aggregate_with_empty_reference_set_matches_nothing() {
        let dir = TempDir::new().unwrap();
        let refs = ReferenceSet::load(dir.path()).await.unwrap();
        let recognizer = ScriptedRecognizer::new();

        let mask = aggregate_matches(&recognizer, &refs, Path::new("s"), &thumbnails(4), 4, 2)
            .await
            .unwrap();
        assert_eq!(mask.len(), 4);
        assert_eq!(mask.member_count(), 0);
    }

    #[tokio::test]
    async fn test_aggregate_counts_duplicates_across_references() {
        let (_dir, refs) = reference_set(&["r1.jpg", "r2.jpg", "r3.jpg"]).await;
        let mut recognizer = ScriptedRecognizer::new();
        recognizer.hits.insert("r1.jpg".into(), Ok(vec![thumb(0), thumb(2), thumb(2)]));
        recognizer.hits.insert("r2.jpg".into(), Ok(vec![thumb(0), thumb(2)]));
        recognizer.hits.insert("r3.jpg".into(), Ok(vec![thumb(0)]));

        let mask = aggregate_matches(&recognizer, &refs, Path::new("scene"), &thumbnails(4), 4, 2)
            .await
            .unwrap();
        // scene 0 has exactly 3 votes, scene 2 has 3
        assert_eq!(
            mask.members().collect::<Vec<_>>(),
            vec![SceneIndex(0), SceneIndex(2)]
        );
    }

    #[tokio::test]
    async fn test_aggregate_skips_unusable_reference() {
        let (_dir, refs) = reference_set(&["good.jpg", "noface.jpg"]).await;
        let mut recognizer = ScriptedRecognizer::new();
        recognizer
            .hits
            .insert("good.jpg".into(), Ok(vec![thumb(1), thumb(1), thumb(1)]));
        recognizer.hits.insert(
            "noface.jpg".into(),
            Err(FaceError::NoFaceDetected("noface.jpg".into())),
        );

        let mask = aggregate_matches(&recognizer, &refs, Path::new("scene"), &thumbnails(3), 3, 2)
            .await
            .unwrap();
        assert_eq!(mask.members().collect::<Vec<_>>(), vec![SceneIndex(1)]);
    }

    #[tokio::test]
    async fn test_aggregate_propagates_service_failure() {
        let (_dir, refs) = reference_set(&["r1.jpg"]).await;
        let mut recognizer = ScriptedRecognizer::new();
        recognizer
            .hits
            .insert("r1.jpg".into(), Err(FaceError::ServiceUnavailable("down".into())));

        let err = aggregate_matches(&recognizer, &refs, Path::new("scene"), &thumbnails(3), 3, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Face(_)));
    }

    #[tokio::test]
    async fn test_detect_broll() {
        let mut map = ThumbnailMap::new();
        map.insert(SceneIndex(0), "s/0.jpg");
        map.insert(SceneIndex(1), "s/1.jpg");
        map.insert(SceneIndex(3), "s/3.jpg");

        let mut recognizer = ScriptedRecognizer::new();
        recognizer.faces.insert(PathBuf::from("s/1.jpg"));
        recognizer.broken.insert(PathBuf::from("s/3.jpg"));

        let mask = detect_broll(&recognizer, &map, 4).await.unwrap();
        // scene 2 has no thumbnail, scene 3's thumbnail is unreadable
        assert_eq!(
            mask.members().collect::<Vec<_>>(),
            vec![SceneIndex(0), SceneIndex(3)]
        );
    }
}
