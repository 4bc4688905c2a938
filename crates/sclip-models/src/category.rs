//! Output categories and clip modes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// A thumbnail qualifies for a role only when its vote count is strictly greater than this.
pub const MIN_VOTES: u32 = 2;

/// Gap (seconds) bridged between confirmed sightings of a role.
pub const ROLE_TIME_STEP_SECS: f64 = 60.0;

/// Gap (seconds) bridged between faceless scenes. Kept small so long faceless
/// stretches are not stitched together.
pub const BROLL_TIME_STEP_SECS: f64 = 2.0;

/// Which outputs to produce for each video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipMode {
    /// Every detected scene, unfiltered
    Clip,
    /// Scenes showing each named role
    Role,
    /// Scenes without any detectable face
    Broll,
}

impl ClipMode {
    pub const ALL: &'static [ClipMode] = &[ClipMode::Clip, ClipMode::Role, ClipMode::Broll];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClipMode::Clip => "clip",
            ClipMode::Role => "role",
            ClipMode::Broll => "broll",
        }
    }

    /// Parse a comma separated list such as `clip,role` or `0,1,2`.
    ///
    /// Duplicates are dropped; the first occurrence keeps its position.
    pub fn parse_list(s: &str) -> Result<Vec<ClipMode>, ClipModeParseError> {
        let mut modes = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if part.eq_ignore_ascii_case("all") {
                for mode in Self::ALL {
                    if !modes.contains(mode) {
                        modes.push(*mode);
                    }
                }
                continue;
            }
            let mode: ClipMode = part.parse()?;
            if !modes.contains(&mode) {
                modes.push(mode);
            }
        }
        Ok(modes)
    }
}

impl fmt::Display for ClipMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ClipMode {
    type Err = ClipModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clip" | "0" => Ok(ClipMode::Clip),
            "role" | "1" => Ok(ClipMode::Role),
            "broll" | "b-roll" | "b_roll" | "2" => Ok(ClipMode::Broll),
            _ => Err(ClipModeParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Unknown clip mode: {0}")]
pub struct ClipModeParseError(String);

/// How the scenes confirmed for a role are turned into output ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoleStrategy {
    /// Keep confirmed scenes and fill short gaps between them from the full scene list
    #[default]
    GapFill,
    /// Keep only qualifying scenes and merge neighbours separated by short gaps
    MergeAdjacent,
}

impl RoleStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleStrategy::GapFill => "gap-fill",
            RoleStrategy::MergeAdjacent => "merge-adjacent",
        }
    }
}

impl fmt::Display for RoleStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RoleStrategy {
    type Err = RoleStrategyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "gap-fill" | "gapfill" => Ok(RoleStrategy::GapFill),
            "merge-adjacent" | "merge" => Ok(RoleStrategy::MergeAdjacent),
            _ => Err(RoleStrategyParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Unknown role strategy: {0}")]
pub struct RoleStrategyParseError(String);

/// What decides membership in a category.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryKind {
    /// All scenes pass through
    Clip,
    /// Face-matched against the reference images in `reference_dir`
    Role {
        reference_dir: PathBuf,
        strategy: RoleStrategy,
    },
    /// Scenes whose thumbnail has no detectable face
    Broll,
}

/// One output category for a video.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub kind: CategoryKind,
    /// Largest gap (seconds) bridged into one continuous range
    pub gap_threshold_secs: f64,
}

impl Category {
    pub fn clip() -> Self {
        Self {
            name: ClipMode::Clip.as_str().to_string(),
            kind: CategoryKind::Clip,
            gap_threshold_secs: 0.0,
        }
    }

    pub fn role(
        name: impl Into<String>,
        reference_dir: impl Into<PathBuf>,
        strategy: RoleStrategy,
        gap_threshold_secs: f64,
    ) -> Self {
        Self {
            name: name.into(),
            kind: CategoryKind::Role {
                reference_dir: reference_dir.into(),
                strategy,
            },
            gap_threshold_secs,
        }
    }

    pub fn broll(gap_threshold_secs: f64) -> Self {
        Self {
            name: ClipMode::Broll.as_str().to_string(),
            kind: CategoryKind::Broll,
            gap_threshold_secs,
        }
    }

    pub fn mode(&self) -> ClipMode {
        match self.kind {
            CategoryKind::Clip => ClipMode::Clip,
            CategoryKind::Role { .. } => ClipMode::Role,
            CategoryKind::Broll => ClipMode::Broll,
        }
    }
}
