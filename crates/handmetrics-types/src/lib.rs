//! `handmetrics-types` – shared data model for the hand-metrics workspace.
//!
//! Raw detector output ([`RawFrame`], [`RawHand`], [`RawLandmark`]) flows in;
//! per-hand [`HandFrameRecord`]s packaged in a [`HandFrame`] flow out.  Every
//! crate in the workspace speaks these types.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Number of landmarks in a complete hand detection.
pub const LANDMARK_COUNT: usize = 21;

// ────────────────────────────────────────────────────────────────────────────
// Landmarks
// ────────────────────────────────────────────────────────────────────────────

/// A single tracked hand point in normalised camera space.
///
/// `x` and `y` are roughly in `[0, 1]` relative to frame width and height;
/// `z` is relative depth on the detector's own scale.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// `true` when every coordinate is a finite number.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// A landmark as the detector reports it.  Depth may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawLandmark {
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
}

impl From<RawLandmark> for Landmark {
    fn from(raw: RawLandmark) -> Self {
        Landmark::new(raw.x, raw.y, raw.z.unwrap_or(0.0))
    }
}

/// Fixed-size landmark slots for one hand, indexed by the 21-point topology.
///
/// A `None` slot is a missing landmark: metrics depending on it default to 0.
pub type HandLandmarks = [Option<Landmark>; LANDMARK_COUNT];

// ────────────────────────────────────────────────────────────────────────────
// Detector input
// ────────────────────────────────────────────────────────────────────────────

/// One hand as reported by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawHand {
    /// Ordered landmark list.  Detectors promise 21 entries; the assembler
    /// checks anyway.  An entry that is not a readable point decodes as a
    /// missing landmark so the slot count is preserved.
    #[serde(deserialize_with = "landmark_slots")]
    pub landmarks: Vec<Option<RawLandmark>>,
    /// Detector label, e.g. `"Left"` or `"Right"`.
    pub handedness: String,
}

fn landmark_slots<'de, D>(deserializer: D) -> Result<Vec<Option<RawLandmark>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Slot {
        Point(RawLandmark),
        Unreadable(IgnoredAny),
    }

    let slots = Vec::<Slot>::deserialize(deserializer)?;
    Ok(slots
        .into_iter()
        .map(|slot| match slot {
            Slot::Point(point) => Some(point),
            Slot::Unreadable(_) => None,
        })
        .collect())
}

/// One detector callback's worth of input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RawFrame {
    /// Capture time of the source image.
    pub captured_at: DateTime<Utc>,
    #[serde(default)]
    pub hands: Vec<RawHand>,
}

impl RawFrame {
    pub fn new(captured_at: DateTime<Utc>, hands: Vec<RawHand>) -> Self {
        Self { captured_at, hands }
    }

    /// A frame in which the detector saw nothing.
    pub fn empty(captured_at: DateTime<Utc>) -> Self {
        Self::new(captured_at, Vec::new())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handedness, fingers, fingertip pairs
// ────────────────────────────────────────────────────────────────────────────

/// Detector-assigned hand label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    /// Parse a detector label, ignoring case and surrounding whitespace.
    ///
    /// Returns `None` for anything other than `left` / `right`.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("left") {
            Some(Handedness::Left)
        } else if label.eq_ignore_ascii_case("right") {
            Some(Handedness::Right)
        } else {
            None
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handedness::Left => write!(f, "Left"),
            Handedness::Right => write!(f, "Right"),
        }
    }
}

/// The five named fingers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    /// All fingers, thumb first.
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];
}

impl fmt::Display for Finger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Finger::Thumb => "Thumb",
            Finger::Index => "Index",
            Finger::Middle => "Middle",
            Finger::Ring => "Ring",
            Finger::Pinky => "Pinky",
        };
        f.write_str(name)
    }
}

/// Per-finger angle in degrees.  Always holds all five fingers; a finger
/// whose joints could not be measured reads 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct FingerAngles {
    pub thumb: f32,
    pub index: f32,
    pub middle: f32,
    pub ring: f32,
    pub pinky: f32,
}

impl FingerAngles {
    pub fn get(&self, finger: Finger) -> f32 {
        match finger {
            Finger::Thumb => self.thumb,
            Finger::Index => self.index,
            Finger::Middle => self.middle,
            Finger::Ring => self.ring,
            Finger::Pinky => self.pinky,
        }
    }

    pub fn set(&mut self, finger: Finger, degrees: f32) {
        let slot = match finger {
            Finger::Thumb => &mut self.thumb,
            Finger::Index => &mut self.index,
            Finger::Middle => &mut self.middle,
            Finger::Ring => &mut self.ring,
            Finger::Pinky => &mut self.pinky,
        };
        *slot = degrees;
    }

    /// Iterate `(finger, angle)` in anatomical order.
    pub fn iter(&self) -> impl Iterator<Item = (Finger, f32)> + '_ {
        Finger::ALL.into_iter().map(move |f| (f, self.get(f)))
    }
}

/// One of the four consecutive fingertip pairs.
///
/// Serialises as `"<tipA>_<tipB>"`, e.g. `"4_8"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum FingertipPair {
    #[serde(rename = "4_8")]
    ThumbIndex,
    #[serde(rename = "8_12")]
    IndexMiddle,
    #[serde(rename = "12_16")]
    MiddleRing,
    #[serde(rename = "16_20")]
    RingPinky,
}

impl FingertipPair {
    pub const ALL: [FingertipPair; 4] = [
        FingertipPair::ThumbIndex,
        FingertipPair::IndexMiddle,
        FingertipPair::MiddleRing,
        FingertipPair::RingPinky,
    ];

    /// Landmark indices of the two tips, in key order.
    pub fn tips(self) -> (usize, usize) {
        match self {
            FingertipPair::ThumbIndex => (4, 8),
            FingertipPair::IndexMiddle => (8, 12),
            FingertipPair::MiddleRing => (12, 16),
            FingertipPair::RingPinky => (16, 20),
        }
    }

    /// String key used at the serialisation boundary.
    pub fn key(self) -> String {
        let (a, b) = self.tips();
        format!("{a}_{b}")
    }
}

impl fmt::Display for FingertipPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, b) = self.tips();
        write!(f, "{a}_{b}")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Output records
// ────────────────────────────────────────────────────────────────────────────

/// Metrics for one hand, as produced by the angle extractor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HandMetrics {
    pub finger_angles: FingerAngles,
    pub finger_pair_angles: BTreeMap<FingertipPair, f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side_bend_angles: Option<FingerAngles>,
    /// Thumb-tip to index-tip distance in the image plane.
    pub gap: f32,
}

/// Immutable snapshot of one detected hand in one processed frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HandFrameRecord {
    pub landmarks: HandLandmarks,
    pub finger_angles: FingerAngles,
    pub finger_pair_angles: BTreeMap<FingertipPair, f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side_bend_angles: Option<FingerAngles>,
    pub handedness: Handedness,
    pub gap: f32,
    pub timestamp: DateTime<Utc>,
}

impl HandFrameRecord {
    /// Combine extracted metrics with the hand's identity and capture time.
    pub fn new(
        landmarks: HandLandmarks,
        metrics: HandMetrics,
        handedness: Handedness,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            landmarks,
            finger_angles: metrics.finger_angles,
            finger_pair_angles: metrics.finger_pair_angles,
            side_bend_angles: metrics.side_bend_angles,
            handedness,
            gap: metrics.gap,
            timestamp,
        }
    }
}

/// A hand that was dropped from a frame because its geometry was corrupt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HandFault {
    /// Position of the hand in the detector's list for this frame.
    pub hand_index: usize,
    pub error: HandError,
}

/// Envelope for one processed frame, as published to consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HandFrame {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Detector order is preserved.
    pub hands: Vec<HandFrameRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faults: Vec<HandFault>,
}

impl HandFrame {
    pub fn new(timestamp: DateTime<Utc>, hands: Vec<HandFrameRecord>, faults: Vec<HandFault>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            hands,
            faults,
        }
    }

    /// A frame with no hands and no faults.
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self::new(timestamp, Vec::new(), Vec::new())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Global error type for geometry faults, detector failures and plumbing.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub enum HandError {
    #[error("Non-finite coordinate at landmark {index}")]
    NonFiniteLandmark { index: usize },

    #[error("Detector Error: {0}")]
    Detector(String),

    #[error("Channel Error: {0}")]
    Channel(String),

    #[error("Config Error: {0}")]
    Config(String),

    #[error("I/O Error: {0}")]
    Io(String),

    #[error("Decode Error on line {line}: {message}")]
    Decode { line: usize, message: String },
}
