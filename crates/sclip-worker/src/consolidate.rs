//! Range consolidation: turning per-scene evidence into output ranges.
//!
//! Two strategies exist. Dense evidence (a membership flag for every scene)
//! is filtered and then merged across short gaps. Sparse evidence (a list of
//! confirmed scene indices) is expanded against the full scene list, filling
//! the scenes between two confirmations when they are close enough.
//!
//! The two strategies compare gaps differently: merging starts a new range
//! when the gap is strictly greater than the threshold, gap-filling bridges
//! when the gap is less than or equal to it.

use thiserror::Error;

use sclip_models::{Scene, SceneIndex, SceneList};

use crate::evidence::MembershipMask;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConsolidationError {
    #[error("Confirmed scene {index} does not come after the previous one")]
    NotIncreasing { index: usize },

    #[error("Confirmed scene {index} is outside a list of {len} scenes")]
    OutOfRange { index: usize, len: usize },

    #[error("Membership mask covers {mask} scenes but the list has {scenes}")]
    MaskLength { mask: usize, scenes: usize },
}

/// Merge start-sorted scenes whose gap to the running range is within `threshold_secs`.
///
/// Each output range runs from the start of its first scene to the end of its last.
pub fn merge_adjacent(scenes: &[Scene], threshold_secs: f64) -> Vec<Scene> {
    let Some((first, rest)) = scenes.split_first() else {
        return Vec::new();
    };

    let mut merged = Vec::new();
    let mut current = *first;
    for scene in rest {
        if current.gap_to(scene) > threshold_secs {
            merged.push(current);
            current = *scene;
        } else {
            current = current.extended_to(scene);
        }
    }
    merged.push(current);
    merged
}

/// Strictly increasing scene indices, all valid for one scene list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmedIndices(Vec<SceneIndex>);

impl ConfirmedIndices {
    pub fn new(indices: Vec<SceneIndex>, scene_count: usize) -> Result<Self, ConsolidationError> {
        for (i, index) in indices.iter().enumerate() {
            if index.get() >= scene_count {
                return Err(ConsolidationError::OutOfRange {
                    index: index.get(),
                    len: scene_count,
                });
            }
            if i > 0 && *index <= indices[i - 1] {
                return Err(ConsolidationError::NotIncreasing { index: index.get() });
            }
        }
        Ok(Self(indices))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[SceneIndex] {
        &self.0
    }
}

impl From<&MembershipMask> for ConfirmedIndices {
    fn from(mask: &MembershipMask) -> Self {
        Self(mask.members().collect())
    }
}

/// Select confirmed scenes plus, between two consecutive confirmations whose
/// gap is at most `threshold_secs`, every scene in between.
pub fn gap_fill(
    scenes: &SceneList,
    confirmed: &ConfirmedIndices,
    threshold_secs: f64,
) -> Result<Vec<Scene>, ConsolidationError> {
    let indices = confirmed.as_slice();
    if let Some(last) = indices.last() {
        if last.get() >= scenes.len() {
            return Err(ConsolidationError::OutOfRange {
                index: last.get(),
                len: scenes.len(),
            });
        }
    }

    match indices {
        [] => return Ok(Vec::new()),
        [only] => return Ok(vec![scenes[*only]]),
        _ => {}
    }

    let all = scenes.as_slice();
    let mut selected: Vec<Option<Scene>> = vec![None; all.len()];
    for pair in indices.windows(2) {
        let (a, b) = (pair[0].get(), pair[1].get());
        selected[a] = Some(all[a]);
        selected[b] = Some(all[b]);

        if all[a].gap_to(&all[b]) <= threshold_secs {
            for i in a + 1..b {
                selected[i] = Some(all[i]);
            }
        }
    }

    Ok(selected.into_iter().flatten().collect())
}

/// Evidence gathered for one category of one video.
#[derive(Debug, Clone)]
pub enum CategoryEvidence {
    /// Every scene belongs to the category
    All,
    /// A membership flag per scene
    Dense(MembershipMask),
    /// Confirmed scene positions
    Sparse(ConfirmedIndices),
}

impl CategoryEvidence {
    pub fn strategy_name(&self) -> &'static str {
        match self {
            CategoryEvidence::All => "passthrough",
            CategoryEvidence::Dense(_) => "merge-adjacent",
            CategoryEvidence::Sparse(_) => "gap-fill",
        }
    }
}

/// Produce the final, ordered and disjoint ranges of a category.
pub fn consolidate(
    scenes: &SceneList,
    evidence: &CategoryEvidence,
    threshold_secs: f64,
) -> Result<Vec<Scene>, ConsolidationError> {
    match evidence {
        CategoryEvidence::All => Ok(scenes.to_vec()),
        CategoryEvidence::Dense(mask) => {
            if mask.len() != scenes.len() {
                return Err(ConsolidationError::MaskLength {
                    mask: mask.len(),
                    scenes: scenes.len(),
                });
            }
            let kept: Vec<Scene> = mask.members().map(|i| scenes[i]).collect();
            Ok(merge_adjacent(&kept, threshold_secs))
        }
        CategoryEvidence::Sparse(confirmed) => gap_fill(scenes, confirmed, threshold_secs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sclip_models::Timecode;

    /// Ten 8-second scenes at 1 fps, each followed by a 2-second gap:
    /// scene `i` covers `[10i, 10i + 8)`.
    fn spaced_scenes(count: usize) -> SceneList {
        let scenes = (0..count as u64)
            .map(|i| {
                Scene::new(
                    Timecode::from_frames(10 * i, 1.0).unwrap(),
                    Timecode::from_frames(10 * i + 8, 1.0).unwrap(),
                )
                .unwrap()
            })
            .collect();
        SceneList::new(scenes).unwrap()
    }

    fn confirmed(indices: &[usize], count: usize) -> ConfirmedIndices {
        ConfirmedIndices::new(indices.iter().copied().map(SceneIndex).collect(), count).unwrap()
    }

    fn bounds(scenes: &[Scene]) -> Vec<(u64, u64)> {
        scenes
            .iter()
            .map(|s| (s.start().frame(), s.end().frame()))
            .collect()
    }

    fn assert_disjoint_and_increasing(scenes: &[Scene]) {
        for pair in scenes.windows(2) {
            assert!(pair[0].start() < pair[1].start());
            assert!(pair[0].end() <= pair[1].start());
        }
    }

    #[test]
    fn test_merge_empty() {
        assert!(merge_adjacent(&[], 10.0).is_empty());
    }

    #[test]
    fn test_merge_bridges_gaps_within_threshold() {
        let list = spaced_scenes(4);
        let picked = [list[SceneIndex(0)], list[SceneIndex(1)], list[SceneIndex(3)]];

        // 0 -> 1 is a 2 s gap, 1 -> 3 is 12 s
        assert_eq!(bounds(&merge_adjacent(&picked, 2.0)), vec![(0, 18), (30, 38)]);
        assert_eq!(bounds(&merge_adjacent(&picked, 12.0)), vec![(0, 38)]);
        assert_eq!(
            bounds(&merge_adjacent(&picked, 1.9)),
            vec![(0, 8), (10, 18), (30, 38)]
        );
    }

    #[test]
    fn test_merge_is_idempotent() {
        let list = spaced_scenes(10);
        let picked: Vec<Scene> = [0, 1, 4, 5, 9].iter().map(|&i| list[SceneIndex(i)]).collect();
        for threshold in [0.0, 2.0, 5.0, 100.0] {
            let once = merge_adjacent(&picked, threshold);
            assert_eq!(merge_adjacent(&once, threshold), once);
            assert_disjoint_and_increasing(&once);
        }
    }

    #[test]
    fn test_merge_threshold_monotonic() {
        let list = spaced_scenes(10);
        let picked: Vec<Scene> = [0, 2, 3, 7, 9].iter().map(|&i| list[SceneIndex(i)]).collect();
        let mut previous = usize::MAX;
        for threshold in [0.0, 1.0, 2.0, 12.0, 22.0, 32.0, 100.0] {
            let ranges = merge_adjacent(&picked, threshold).len();
            assert!(ranges <= previous, "threshold {} produced more ranges", threshold);
            previous = ranges;
        }
        assert_eq!(previous, 1);
    }

    #[test]
    fn test_confirmed_indices_validation() {
        assert_eq!(
            ConfirmedIndices::new(vec![SceneIndex(3), SceneIndex(3)], 10),
            Err(ConsolidationError::NotIncreasing { index: 3 })
        );
        assert_eq!(
            ConfirmedIndices::new(vec![SceneIndex(5), SceneIndex(2)], 10),
            Err(ConsolidationError::NotIncreasing { index: 2 })
        );
        assert_eq!(
            ConfirmedIndices::new(vec![SceneIndex(10)], 10),
            Err(ConsolidationError::OutOfRange { index: 10, len: 10 })
        );
    }

    #[test]
    fn test_gap_fill_empty_and_single() {
        let list = spaced_scenes(10);
        assert!(gap_fill(&list, &confirmed(&[], 10), 60.0).unwrap().is_empty());
        assert_eq!(
            gap_fill(&list, &confirmed(&[5], 10), 60.0).unwrap(),
            vec![list[SceneIndex(5)]]
        );
    }

    #[test]
    fn test_gap_fill_at_exact_threshold_includes_between() {
        let list = spaced_scenes(10);
        // scene 7 starts at 70, scene 2 ends at 28
        let threshold = list[SceneIndex(2)].gap_to(&list[SceneIndex(7)]);
        assert_eq!(threshold, 42.0);

        let filled = gap_fill(&list, &confirmed(&[2, 7], 10), threshold).unwrap();
        let expected: Vec<Scene> = (2..=7).map(|i| list[SceneIndex(i)]).collect();
        assert_eq!(filled, expected);
    }

    #[test]
    fn test_gap_fill_just_over_threshold_keeps_endpoints() {
        let list = spaced_scenes(10);
        let filled = gap_fill(&list, &confirmed(&[2, 7], 10), 41.5).unwrap();
        assert_eq!(filled, vec![list[SceneIndex(2)], list[SceneIndex(7)]]);
    }

    #[test]
    fn test_gap_fill_always_keeps_endpoints() {
        let list = spaced_scenes(10);
        let indices = [0, 3, 4, 8];
        for threshold in [0.0, 5.0, 30.0] {
            let filled = gap_fill(&list, &confirmed(&indices, 10), threshold).unwrap();
            for &i in &indices {
                assert!(filled.contains(&list[SceneIndex(i)]));
            }
            assert_disjoint_and_increasing(&filled);
        }
    }

    #[test]
    fn test_gap_fill_rejects_indices_from_longer_list() {
        let list = spaced_scenes(3);
        let err = gap_fill(&list, &confirmed(&[1, 6], 10), 10.0).unwrap_err();
        assert_eq!(err, ConsolidationError::OutOfRange { index: 6, len: 3 });
    }

    #[test]
    fn test_consolidate_passthrough() {
        let list = spaced_scenes(4);
        let out = consolidate(&list, &CategoryEvidence::All, 0.0).unwrap();
        assert_eq!(out, list.to_vec());
    }

    #[test]
    fn test_consolidate_dense_filters_then_merges() {
        let list = spaced_scenes(6);
        let mask = MembershipMask::from_flags(vec![true, true, false, false, true, true]);
        let out = consolidate(&list, &CategoryEvidence::Dense(mask), 2.0).unwrap();
        assert_eq!(bounds(&out), vec![(0, 18), (40, 58)]);
    }

    #[test]
    fn test_consolidate_dense_rejects_wrong_mask_length() {
        let list = spaced_scenes(6);
        let mask = MembershipMask::from_flags(vec![true; 4]);
        assert_eq!(
            consolidate(&list, &CategoryEvidence::Dense(mask), 2.0),
            Err(ConsolidationError::MaskLength { mask: 4, scenes: 6 })
        );
    }

    #[test]
    fn test_consolidate_sparse_from_mask() {
        let list = spaced_scenes(6);
        let mask = MembershipMask::from_flags(vec![true, false, false, true, false, false]);
        let evidence = CategoryEvidence::Sparse(ConfirmedIndices::from(&mask));
        let out = consolidate(&list, &evidence, 22.0).unwrap();
        assert_eq!(bounds(&out), vec![(0, 8), (10, 18), (20, 28), (30, 38)]);
    }
}
