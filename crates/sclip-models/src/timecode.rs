//! Frame-accurate time positions.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

use crate::timestamp::{format_seconds, parse_timestamp, TimestampError};

/// A frame position in a video with a known frame rate.
///
/// Two timecodes are equal when they denote the same instant, even if
/// their frame rates differ.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "RawTimecode")]
pub struct Timecode {
    frame: u64,
    fps: f64,
}

#[derive(Deserialize)]
struct RawTimecode {
    frame: u64,
    fps: f64,
}

impl TryFrom<RawTimecode> for Timecode {
    type Error = TimecodeError;

    fn try_from(raw: RawTimecode) -> Result<Self, Self::Error> {
        Self::from_frames(raw.frame, raw.fps)
    }
}

impl Timecode {
    /// Create a timecode from a frame number.
    pub fn from_frames(frame: u64, fps: f64) -> Result<Self, TimecodeError> {
        validate_fps(fps)?;
        Ok(Self { frame, fps })
    }

    /// Create a timecode from a position in seconds, rounded to the nearest frame.
    pub fn from_seconds(seconds: f64, fps: f64) -> Result<Self, TimecodeError> {
        validate_fps(fps)?;
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(TimecodeError::InvalidSeconds(seconds));
        }
        Ok(Self {
            frame: (seconds * fps).round() as u64,
            fps,
        })
    }

    /// Parse `HH:MM:SS[.mmm]`, `MM:SS` or `SS` at the given frame rate.
    pub fn parse(ts: &str, fps: f64) -> Result<Self, TimecodeError> {
        Self::from_seconds(parse_timestamp(ts)?, fps)
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Position in seconds.
    pub fn seconds(&self) -> f64 {
        self.frame as f64 / self.fps
    }

    /// Seconds elapsed from `self` to `later` (negative if `later` is earlier).
    pub fn seconds_until(&self, later: &Timecode) -> f64 {
        later.seconds() - self.seconds()
    }

    /// Timecode `frames` frames after this one.
    pub fn plus_frames(&self, frames: u64) -> Self {
        Self {
            frame: self.frame + frames,
            fps: self.fps,
        }
    }

    /// `HH:MM:SS.mmm` representation.
    pub fn to_timecode_string(&self) -> String {
        format_seconds(self.seconds())
    }
}

impl PartialEq for Timecode {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Timecode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.fps == other.fps {
            return Some(self.frame.cmp(&other.frame));
        }
        self.seconds().partial_cmp(&other.seconds())
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_timecode_string())
    }
}

fn validate_fps(fps: f64) -> Result<(), TimecodeError> {
    if fps.is_finite() && fps > 0.0 {
        Ok(())
    } else {
        Err(TimecodeError::InvalidFrameRate(fps))
    }
}

/// Timecode construction error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimecodeError {
    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(f64),

    #[error("Invalid position in seconds: {0}")]
    InvalidSeconds(f64),

    #[error(transparent)]
    Timestamp(#[from] TimestampError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_from_frames() {
        let tc = Timecode::from_frames(50, 25.0).unwrap();
        assert_eq!(tc.seconds(), 2.0);
        assert_eq!(tc.to_timecode_string(), "00:00:02.000");
    }

    #[test]
    fn test_from_seconds_rounds_to_frame() {
        let tc = Timecode::from_seconds(1.03, 25.0).unwrap();
        assert_eq!(tc.frame(), 26);
    }

    #[test]
    fn test_parse() {
        let tc = Timecode::parse("00:10:00", 30.0).unwrap();
        assert_eq!(tc.frame(), 18000);
        assert!(matches!(
            Timecode::parse("bogus", 30.0),
            Err(TimecodeError::Timestamp(_))
        ));
    }

    #[test]
    fn test_invalid_frame_rate() {
        assert!(Timecode::from_frames(0, 0.0).is_err());
        assert!(Timecode::from_frames(0, f64::NAN).is_err());
        assert!(Timecode::from_seconds(-1.0, 24.0).is_err());
    }

    #[test]
    fn test_ordering() {
        let a = Timecode::from_frames(10, 24.0).unwrap();
        let b = Timecode::from_frames(11, 24.0).unwrap();
        assert!(a < b);
        assert!((a.seconds_until(&b) - 1.0 / 24.0).abs() < 1e-9);
        assert!(a.plus_frames(1) == b);
    }

    #[test]
    fn test_equality_agrees_with_ordering_across_frame_rates() {
        let a = Timecode::from_frames(25, 25.0).unwrap();
        let b = Timecode::from_frames(50, 50.0).unwrap();
        assert_eq!(a.partial_cmp(&b), Some(Ordering::Equal));
        assert_eq!(a, b);

        let c = Timecode::from_frames(51, 50.0).unwrap();
        assert_ne!(a, c);
        assert!(a < c);
    }

    #[test]
    fn test_deserialize_validates_frame_rate() {
        let tc: Timecode = serde_json::from_str(r#"{"frame": 48, "fps": 24.0}"#).unwrap();
        assert_eq!(tc.seconds(), 2.0);
        assert!(serde_json::from_str::<Timecode>(r#"{"frame": 48, "fps": 0.0}"#).is_err());
    }
}
