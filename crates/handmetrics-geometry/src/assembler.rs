//! Frame assembler.
//!
//! Turns one detector callback's [`RawFrame`] into the ordered list of
//! [`HandFrameRecord`]s for that frame.  The assembler keeps no state
//! between calls; hand `0` in one frame has no relation to hand `0` in the
//! next.
//!
//! Per reported hand:
//!
//! 1. Reject the hand unless it carries exactly [`LANDMARK_COUNT`] slots.
//! 2. Reject the hand unless its handedness label is `Left` or `Right`.
//! 3. Normalise each slot to a [`Landmark`] (missing depth becomes 0).
//! 4. Run the angle extractor.  Corrupt geometry becomes a [`HandFault`].
//! 5. Stamp the record with the frame's capture time.
//!
//! Rejected and faulted hands are dropped without affecting their
//! neighbours, and detector order is preserved for the rest.
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use handmetrics_geometry::FrameAssembler;
//! use handmetrics_types::RawFrame;
//!
//! let assembler = FrameAssembler::default();
//! let records = assembler.process_frame(&RawFrame::empty(Utc::now()));
//! assert!(records.is_empty());
//! ```

use chrono::{DateTime, Utc};
use handmetrics_types::{
    HandFault, HandFrame, HandFrameRecord, HandLandmarks, Handedness, LANDMARK_COUNT, Landmark,
    RawFrame, RawLandmark,
};
use tracing::{debug, warn};

use crate::angles::{self, ExtractOptions};

/// Output of [`FrameAssembler::assemble`].
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledFrame {
    /// Capture time shared by every record in the frame.
    pub timestamp: DateTime<Utc>,
    /// Valid hands, in detector order.
    pub hands: Vec<HandFrameRecord>,
    /// Hands dropped because their coordinates were not finite.
    pub faults: Vec<HandFault>,
}

impl AssembledFrame {
    /// Wrap into a publishable [`HandFrame`] with a fresh id.
    pub fn into_hand_frame(self) -> HandFrame {
        HandFrame::new(self.timestamp, self.hands, self.faults)
    }
}

/// Stateless per-frame transform from raw detections to hand records.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameAssembler {
    options: ExtractOptions,
}

impl FrameAssembler {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ExtractOptions {
        self.options
    }

    /// Assemble every valid hand in `frame`, collecting geometry faults
    /// alongside the records.
    pub fn assemble(&self, frame: &RawFrame) -> AssembledFrame {
        let mut hands = Vec::with_capacity(frame.hands.len());
        let mut faults = Vec::new();

        for (hand_index, raw) in frame.hands.iter().enumerate() {
            let Some(landmarks) = normalize_landmarks(&raw.landmarks) else {
                debug!(
                    hand_index,
                    count = raw.landmarks.len(),
                    "skipping hand with wrong landmark count"
                );
                continue;
            };
            let Some(handedness) = Handedness::from_label(&raw.handedness) else {
                debug!(hand_index, label = %raw.handedness, "skipping hand with unknown handedness");
                continue;
            };

            match angles::extract(&landmarks, self.options) {
                Ok(metrics) => hands.push(HandFrameRecord::new(
                    landmarks,
                    metrics,
                    handedness,
                    frame.captured_at,
                )),
                Err(error) => {
                    warn!(hand_index, %error, "dropping hand with corrupt geometry");
                    faults.push(HandFault { hand_index, error });
                }
            }
        }

        AssembledFrame {
            timestamp: frame.captured_at,
            hands,
            faults,
        }
    }

    /// The frame's hand records only.  Always returns a list, possibly empty.
    pub fn process_frame(&self, frame: &RawFrame) -> Vec<HandFrameRecord> {
        self.assemble(frame).hands
    }
}

/// Convert a detector landmark list into fixed slots.
///
/// Returns `None` unless the list has exactly [`LANDMARK_COUNT`] entries.
pub fn normalize_landmarks(raw: &[Option<RawLandmark>]) -> Option<HandLandmarks> {
    let raw: [Option<RawLandmark>; LANDMARK_COUNT] = raw.try_into().ok()?;
    Some(raw.map(|slot| slot.map(Landmark::from)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use handmetrics_types::{Finger, HandError, RawHand};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    /// A hand with an extended index finger along -y and the thumb tip at
    /// the origin.
    fn raw_hand(label: &str) -> RawHand {
        let mut landmarks: Vec<Option<RawLandmark>> = (0..LANDMARK_COUNT)
            .map(|i| {
                Some(RawLandmark {
                    x: 0.1 + 0.03 * i as f32,
                    y: 0.9 - 0.02 * i as f32,
                    z: Some(0.0),
                })
            })
            .collect();
        landmarks[4] = Some(RawLandmark { x: 0.0, y: 0.0, z: None });
        landmarks[5] = Some(RawLandmark { x: 0.5, y: 0.9, z: None });
        landmarks[6] = Some(RawLandmark { x: 0.5, y: 0.7, z: None });
        landmarks[8] = Some(RawLandmark { x: 0.5, y: 0.5, z: None });
        RawHand {
            landmarks,
            handedness: label.to_string(),
        }
    }

    #[test]
    fn empty_frame_yields_empty_list() {
        let assembled = FrameAssembler::default().assemble(&RawFrame::empty(at(10)));
        assert!(assembled.hands.is_empty());
        assert!(assembled.faults.is_empty());
        assert_eq!(assembled.timestamp, at(10));
    }

    #[test]
    fn preserves_detector_order_and_handedness() {
        let frame = RawFrame::new(at(5), vec![raw_hand("Right"), raw_hand("Left")]);
        let records = FrameAssembler::default().process_frame(&frame);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].handedness, Handedness::Right);
        assert_eq!(records[1].handedness, Handedness::Left);
        assert!(records.iter().all(|r| r.timestamp == at(5)));
    }

    #[test]
    fn record_carries_extracted_metrics() {
        let frame = RawFrame::new(at(0), vec![raw_hand("Left")]);
        let record = &FrameAssembler::default().process_frame(&frame)[0];

        assert!((record.finger_angles.get(Finger::Index) - 180.0).abs() < 1e-4);
        assert_eq!(record.finger_pair_angles.len(), 4);
        assert!(record.side_bend_angles.is_some());
        let expected_gap = (0.5f32 * 0.5 + 0.5 * 0.5).sqrt();
        assert!((record.gap - expected_gap).abs() < 1e-6);
        assert_eq!(record.landmarks[4], Some(Landmark::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn short_hand_is_excluded() {
        let mut short = raw_hand("Left");
        short.landmarks.truncate(20);
        let frame = RawFrame::new(at(0), vec![short, raw_hand("Right")]);
        let assembled = FrameAssembler::default().assemble(&frame);

        assert_eq!(assembled.hands.len(), 1);
        assert_eq!(assembled.hands[0].handedness, Handedness::Right);
        assert!(assembled.faults.is_empty());
    }

    #[test]
    fn long_hand_is_excluded() {
        let mut long = raw_hand("Left");
        long.landmarks.push(None);
        let frame = RawFrame::new(at(0), vec![long]);
        assert!(FrameAssembler::default().process_frame(&frame).is_empty());
    }

    #[test]
    fn unknown_handedness_is_excluded() {
        let frame = RawFrame::new(at(0), vec![raw_hand("Unknown"), raw_hand("left")]);
        let records = FrameAssembler::default().process_frame(&frame);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].handedness, Handedness::Left);
    }

    #[test]
    fn missing_landmark_zero_fills_inside_valid_hand() {
        let mut hand = raw_hand("Right");
        hand.landmarks[8] = None;
        let frame = RawFrame::new(at(0), vec![hand]);
        let record = &FrameAssembler::default().process_frame(&frame)[0];

        assert_eq!(record.finger_angles.index, 0.0);
        assert_eq!(record.gap, 0.0);
        assert_eq!(record.finger_pair_angles.len(), 2);
        assert_eq!(record.landmarks[8], None);
    }

    #[test]
    fn corrupt_hand_faults_without_blocking_others() {
        let mut corrupt = raw_hand("Left");
        corrupt.landmarks[12] = Some(RawLandmark {
            x: f32::NAN,
            y: 0.5,
            z: None,
        });
        let frame = RawFrame::new(at(0), vec![raw_hand("Right"), corrupt, raw_hand("Left")]);
        let assembled = FrameAssembler::default().assemble(&frame);

        assert_eq!(assembled.hands.len(), 2);
        assert_eq!(
            assembled.faults,
            vec![HandFault {
                hand_index: 1,
                error: HandError::NonFiniteLandmark { index: 12 },
            }]
        );
    }

    #[test]
    fn side_bend_can_be_disabled() {
        let assembler = FrameAssembler::new(ExtractOptions { side_bend: false });
        let frame = RawFrame::new(at(0), vec![raw_hand("Left")]);
        assert!(assembler.process_frame(&frame)[0].side_bend_angles.is_none());
    }

    #[test]
    fn into_hand_frame_keeps_contents() {
        let frame = RawFrame::new(at(42), vec![raw_hand("Left")]);
        let hand_frame = FrameAssembler::default().assemble(&frame).into_hand_frame();
        assert_eq!(hand_frame.timestamp, at(42));
        assert_eq!(hand_frame.hands.len(), 1);
        assert!(hand_frame.faults.is_empty());
    }

    #[test]
    fn normalize_rejects_wrong_lengths() {
        assert!(normalize_landmarks(&[]).is_none());
        assert!(normalize_landmarks(&[None; LANDMARK_COUNT]).is_some());
    }
}
