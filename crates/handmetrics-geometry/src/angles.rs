//! Angle extractor.
//!
//! Pure functions mapping one hand's [`HandLandmarks`] to its metric set:
//!
//! - **Bend angle** per finger – the angle at the finger's middle joint
//!   between the joint→base and joint→tip vectors, measured from their polar
//!   angles in the frontal `(x, y)` plane.
//! - **Side-bend angle** per finger – the same joints and formula in the
//!   lateral `(z, x)` plane.
//! - **Fingertip-pair angle** – direction of the vector between two adjacent
//!   fingertips, folded to `[0, 180]` by taking its magnitude.
//! - **Gap** – thumb-tip to index-tip distance in the `(x, y)` plane.
//!
//! Missing landmarks never fail the hand: any metric that needs a missing
//! point reads 0 (bend angles, gap) or is left out (pair angles).  Non-finite
//! coordinates are different – they mean the detector broke its contract,
//! and [`extract`] reports them as [`HandError::NonFiniteLandmark`].
//!
//! # Example
//!
//! ```rust
//! use handmetrics_geometry::angles::{extract, ExtractOptions};
//! use handmetrics_types::{Landmark, LANDMARK_COUNT};
//!
//! let mut hand = [None; LANDMARK_COUNT];
//! hand[4] = Some(Landmark::new(0.0, 0.0, 0.0));
//! hand[8] = Some(Landmark::new(3.0, 4.0, 0.0));
//!
//! let metrics = extract(&hand, ExtractOptions::default()).unwrap();
//! assert!((metrics.gap - 5.0).abs() < 1e-6);
//! assert_eq!(metrics.finger_angles.index, 0.0); // joints 5 and 6 missing
//! ```

use std::collections::BTreeMap;

use handmetrics_types::{
    Finger, FingerAngles, FingertipPair, HandError, HandLandmarks, HandMetrics, Landmark,
};

use crate::topology::{INDEX_TIP, THUMB_TIP, joint_triple};

// ────────────────────────────────────────────────────────────────────────────
// Planes
// ────────────────────────────────────────────────────────────────────────────

/// Coordinate plane a bend angle is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plane {
    /// Frontal camera view: polar angle `atan2(y, x)`.
    Frontal,
    /// Lateral view: polar angle `atan2(x, z)`.
    Lateral,
}

impl Plane {
    /// Polar angle in degrees of the vector `from → to`.
    ///
    /// A zero-length vector has polar angle 0.
    fn polar_degrees(self, from: Landmark, to: Landmark) -> f32 {
        let (u, v) = match self {
            Plane::Frontal => (to.x - from.x, to.y - from.y),
            Plane::Lateral => (to.z - from.z, to.x - from.x),
        };
        if u == 0.0 && v == 0.0 {
            return 0.0;
        }
        v.atan2(u).to_degrees()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Options
// ────────────────────────────────────────────────────────────────────────────

/// Knobs for [`extract`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Also compute the lateral-plane side-bend angles.
    pub side_bend: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self { side_bend: true }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Primitive measurements
// ────────────────────────────────────────────────────────────────────────────

/// Angle at `b` between `b → a` and `b → c` in `plane`, in degrees `[0, 180]`.
///
/// Symmetric in `a` and `c`.  Three coincident points give 0.
pub fn joint_angle(plane: Plane, a: Landmark, b: Landmark, c: Landmark) -> f32 {
    let diff = (plane.polar_degrees(b, c) - plane.polar_degrees(b, a)).abs();
    if diff > 180.0 { 360.0 - diff } else { diff }
}

/// Frontal-plane bend angle at `b`.
pub fn bend_angle(a: Landmark, b: Landmark, c: Landmark) -> f32 {
    joint_angle(Plane::Frontal, a, b, c)
}

/// Lateral-plane bend angle at `b`.
pub fn side_bend_angle(a: Landmark, b: Landmark, c: Landmark) -> f32 {
    joint_angle(Plane::Lateral, a, b, c)
}

/// Unsigned direction of `from → to` in the frontal plane, degrees `[0, 180]`.
///
/// The sign of `atan2` is discarded, so mirror-image directions above and
/// below the x axis read the same.
pub fn tip_direction_angle(from: Landmark, to: Landmark) -> f32 {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    dy.atan2(dx).to_degrees().abs()
}

/// Euclidean distance between two points in the `(x, y)` plane.
pub fn planar_distance(a: Landmark, b: Landmark) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

// ────────────────────────────────────────────────────────────────────────────
// Per-hand metric families
// ────────────────────────────────────────────────────────────────────────────

fn joints(landmarks: &HandLandmarks, finger: Finger) -> Option<(Landmark, Landmark, Landmark)> {
    let (a, b, c) = joint_triple(finger);
    Some((landmarks[a]?, landmarks[b]?, landmarks[c]?))
}

/// Bend angle for every finger in `plane`.  A finger with any missing joint
/// reads 0.
pub fn finger_angles(landmarks: &HandLandmarks, plane: Plane) -> FingerAngles {
    let mut angles = FingerAngles::default();
    for finger in Finger::ALL {
        if let Some((a, b, c)) = joints(landmarks, finger) {
            angles.set(finger, joint_angle(plane, a, b, c));
        }
    }
    angles
}

/// Direction angle for each consecutive fingertip pair whose tips are both
/// present.
pub fn finger_pair_angles(landmarks: &HandLandmarks) -> BTreeMap<FingertipPair, f32> {
    FingertipPair::ALL
        .into_iter()
        .filter_map(|pair| {
            let (i, j) = pair.tips();
            let (from, to) = (landmarks[i]?, landmarks[j]?);
            Some((pair, tip_direction_angle(from, to)))
        })
        .collect()
}

/// Thumb-tip to index-tip distance, or 0 when either tip is missing.
pub fn thumb_index_gap(landmarks: &HandLandmarks) -> f32 {
    match (landmarks[THUMB_TIP], landmarks[INDEX_TIP]) {
        (Some(thumb), Some(index)) => planar_distance(thumb, index),
        _ => 0.0,
    }
}

/// Compute the full metric set for one hand.
///
/// # Errors
///
/// Returns [`HandError::NonFiniteLandmark`] naming the first present
/// landmark with a NaN or infinite coordinate.
pub fn extract(landmarks: &HandLandmarks, options: ExtractOptions) -> Result<HandMetrics, HandError> {
    if let Some(index) = landmarks
        .iter()
        .position(|slot| slot.is_some_and(|lm| !lm.is_finite()))
    {
        return Err(HandError::NonFiniteLandmark { index });
    }

    Ok(HandMetrics {
        finger_angles: finger_angles(landmarks, Plane::Frontal),
        finger_pair_angles: finger_pair_angles(landmarks),
        side_bend_angles: options
            .side_bend
            .then(|| finger_angles(landmarks, Plane::Lateral)),
        gap: thumb_index_gap(landmarks),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
