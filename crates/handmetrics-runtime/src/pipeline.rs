//! [`FramePipeline`] – per-frame driver.
//!
//! Each [`FramePipeline::tick`]:
//!
//! 1. **Poll** – ask the [`HandDetector`] for the next [`RawFrame`].  A
//!    detector failure skips the frame: it is logged, counted, and reported
//!    on the bus's fault lane, and the geometry engine is not invoked.
//! 2. **Assemble** – run the [`FrameAssembler`] over every reported hand.
//! 3. **Annotate** – hand the finished [`HandFrame`] to each registered
//!    [`FrameAnnotator`].
//! 4. **Publish** – send the frame on the [`FrameBus`] when anyone is
//!    subscribed.
//!
//! Frames are processed strictly in the order the detector yields them.
//!
//! # Example
//!
//! ```rust
//! use std::io::Cursor;
//! use handmetrics_runtime::{FramePipeline, JsonLinesDetector, PipelineConfig};
//!
//! let input = "{\"capturedAt\":\"2024-05-01T12:00:00Z\",\"hands\":[]}\n";
//! let detector = JsonLinesDetector::new("replay", Cursor::new(input));
//! let mut pipeline = FramePipeline::new(detector, PipelineConfig::default());
//!
//! let stats = pipeline.run();
//! assert_eq!(stats.frames, 1);
//! assert_eq!(stats.hands, 0);
//! ```

use chrono::Utc;
use handmetrics_geometry::{ExtractOptions, FrameAssembler};
use handmetrics_middleware::{BusEvent, FrameBus, Topic};
use handmetrics_types::{HandError, HandFrame, RawFrame};
use tracing::{debug, info, warn};

use crate::detector::{FrameAnnotator, HandDetector};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration bundle for [`FramePipeline`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Extractor options passed to the assembler.
    pub extract: ExtractOptions,
    /// Per-topic bus capacity.
    pub bus_capacity: usize,
    /// [`FramePipeline::run`] gives up after this many detector failures in
    /// a row.
    pub max_consecutive_detector_errors: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extract: ExtractOptions::default(),
            bus_capacity: 64,
            max_consecutive_detector_errors: 10,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Stats
// ─────────────────────────────────────────────────────────────────────────────

/// Running totals kept by a [`FramePipeline`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Frames assembled, empty ones included.
    pub frames: u64,
    /// Hand records produced.
    pub hands: u64,
    /// Hands dropped for corrupt geometry.
    pub faults: u64,
    /// Frames the detector failed to produce.
    pub detector_errors: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// FramePipeline
// ─────────────────────────────────────────────────────────────────────────────

/// Detector → assembler → annotators → bus.
pub struct FramePipeline<D> {
    detector: D,
    assembler: FrameAssembler,
    annotators: Vec<Box<dyn FrameAnnotator>>,
    bus: FrameBus,
    config: PipelineConfig,
    stats: PipelineStats,
}

impl<D: HandDetector> FramePipeline<D> {
    pub fn new(detector: D, config: PipelineConfig) -> Self {
        Self {
            detector,
            assembler: FrameAssembler::new(config.extract),
            annotators: Vec::new(),
            bus: FrameBus::new(config.bus_capacity),
            config,
            stats: PipelineStats::default(),
        }
    }

    /// Register an annotator.  Annotators run in registration order.
    pub fn add_annotator(&mut self, annotator: Box<dyn FrameAnnotator>) {
        self.annotators.push(annotator);
    }

    /// Handle to the pipeline's bus for subscribing consumers.
    pub fn bus(&self) -> &FrameBus {
        &self.bus
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Process one frame.
    ///
    /// Returns `Ok(Some(frame))` for a processed frame (possibly with no
    /// hands) and `Ok(None)` once the detector is exhausted.
    ///
    /// # Errors
    ///
    /// Passes through the detector's error for a frame it could not
    /// produce.  The pipeline stays usable.
    pub fn tick(&mut self) -> Result<Option<HandFrame>, HandError> {
        let raw = match self.detector.next_frame() {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(None),
            Err(error) => {
                self.stats.detector_errors += 1;
                warn!(detector = self.detector.id(), %error, "detector failed to produce a frame");
                let _ = self.bus.publish(BusEvent::DetectorFailure {
                    timestamp: Utc::now(),
                    error: error.clone(),
                });
                return Err(error);
            }
        };

        Ok(Some(self.process(&raw)))
    }

    /// Assemble, annotate and publish an already-captured frame.
    pub fn process(&mut self, raw: &RawFrame) -> HandFrame {
        let frame = self.assembler.assemble(raw).into_hand_frame();

        self.stats.frames += 1;
        self.stats.hands += frame.hands.len() as u64;
        self.stats.faults += frame.faults.len() as u64;
        debug!(
            frame_id = %frame.id,
            hands = frame.hands.len(),
            faults = frame.faults.len(),
            "frame assembled"
        );

        for annotator in &mut self.annotators {
            annotator.annotate(&frame);
        }

        if self.has_listeners()
            && let Err(error) = self.bus.publish_frame(frame.clone())
        {
            debug!(%error, "frame not delivered");
        }
        frame
    }

    fn has_listeners(&self) -> bool {
        self.bus.receiver_count(Topic::Frames) > 0 || self.bus.receiver_count(Topic::Faults) > 0
    }

    /// Drive [`tick`][Self::tick] until the detector is exhausted or fails
    /// `max_consecutive_detector_errors` times in a row.
    pub fn run(&mut self) -> PipelineStats {
        info!(detector = self.detector.id(), "frame pipeline started");
        let mut consecutive_errors = 0;
        loop {
            match self.tick() {
                Ok(Some(_)) => consecutive_errors = 0,
                Ok(None) => break,
                Err(_) => {
                    consecutive_errors += 1;
                    if consecutive_errors >= self.config.max_consecutive_detector_errors {
                        warn!(
                            consecutive_errors,
                            "detector keeps failing; stopping frame pipeline"
                        );
                        break;
                    }
                }
            }
        }
        info!(
            frames = self.stats.frames,
            hands = self.stats.hands,
            faults = self.stats.faults,
            detector_errors = self.stats.detector_errors,
            "frame pipeline finished"
        );
        self.stats
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use handmetrics_types::{Handedness, LANDMARK_COUNT, RawHand, RawLandmark};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    struct ScriptedDetector {
        frames: VecDeque<Result<RawFrame, HandError>>,
    }

    impl ScriptedDetector {
        fn new(frames: Vec<Result<RawFrame, HandError>>) -> Self {
            Self {
                frames: frames.into(),
            }
        }
    }

    impl HandDetector for ScriptedDetector {
        fn id(&self) -> &str {
            "scripted"
        }

        fn next_frame(&mut self) -> Result<Option<RawFrame>, HandError> {
            self.frames.pop_front().transpose()
        }
    }

    /// Always fails.
    struct BrokenDetector;

    impl HandDetector for BrokenDetector {
        fn id(&self) -> &str {
            "broken"
        }

        fn next_frame(&mut self) -> Result<Option<RawFrame>, HandError> {
            Err(HandError::Detector("no image".to_string()))
        }
    }

    #[derive(Clone, Default)]
    struct RecordingAnnotator {
        seen: Arc<Mutex<Vec<usize>>>,
    }

    impl FrameAnnotator for RecordingAnnotator {
        fn annotate(&mut self, frame: &HandFrame) {
            self.seen.lock().unwrap().push(frame.hands.len());
        }
    }

    fn hand(label: &str, count: usize) -> RawHand {
        RawHand {
            landmarks: (0..count)
                .map(|i| {
                    Some(RawLandmark {
                        x: 0.2 + 0.01 * i as f32,
                        y: 0.7 - 0.02 * i as f32,
                        z: None,
                    })
                })
                .collect(),
            handedness: label.to_string(),
        }
    }

    fn frame(hands: Vec<RawHand>) -> RawFrame {
        RawFrame::new(Utc::now(), hands)
    }

    #[test]
    fn tick_processes_one_frame_at_a_time() {
        let detector = ScriptedDetector::new(vec![
            Ok(frame(vec![hand("Left", LANDMARK_COUNT), hand("Right", LANDMARK_COUNT)])),
            Ok(frame(vec![])),
        ]);
        let mut pipeline = FramePipeline::new(detector, PipelineConfig::default());

        let first = pipeline.tick().unwrap().unwrap();
        assert_eq!(first.hands.len(), 2);
        assert_eq!(first.hands[0].handedness, Handedness::Left);

        let second = pipeline.tick().unwrap().unwrap();
        assert!(second.hands.is_empty());

        assert!(pipeline.tick().unwrap().is_none());
        assert_eq!(pipeline.stats().frames, 2);
        assert_eq!(pipeline.stats().hands, 2);
    }

    #[test]
    fn detector_failure_skips_frame_and_recovers() {
        let detector = ScriptedDetector::new(vec![
            Err(HandError::Detector("dropped frame".to_string())),
            Ok(frame(vec![hand("Right", LANDMARK_COUNT)])),
        ]);
        let mut pipeline = FramePipeline::new(detector, PipelineConfig::default());

        assert!(matches!(pipeline.tick(), Err(HandError::Detector(_))));
        let next = pipeline.tick().unwrap().unwrap();
        assert_eq!(next.hands.len(), 1);
        assert_eq!(pipeline.stats().detector_errors, 1);
        assert_eq!(pipeline.stats().frames, 1);
    }

    #[test]
    fn run_counts_hands_faults_and_errors() {
        let mut corrupt = hand("Left", LANDMARK_COUNT);
        corrupt.landmarks[0] = Some(RawLandmark {
            x: f32::INFINITY,
            y: 0.0,
            z: None,
        });
        let detector = ScriptedDetector::new(vec![
            Ok(frame(vec![hand("Left", 20), hand("Right", LANDMARK_COUNT)])),
            Err(HandError::Detector("glitch".to_string())),
            Ok(frame(vec![corrupt, hand("Left", LANDMARK_COUNT)])),
        ]);
        let mut pipeline = FramePipeline::new(detector, PipelineConfig::default());

        let stats = pipeline.run();
        assert_eq!(
            stats,
            PipelineStats {
                frames: 2,
                hands: 2,
                faults: 1,
                detector_errors: 1,
            }
        );
    }

    #[test]
    fn run_stops_on_persistent_detector_failure() {
        let config = PipelineConfig {
            max_consecutive_detector_errors: 3,
            ..PipelineConfig::default()
        };
        let mut pipeline = FramePipeline::new(BrokenDetector, config);
        let stats = pipeline.run();
        assert_eq!(stats.detector_errors, 3);
        assert_eq!(stats.frames, 0);
    }

    #[test]
    fn annotators_see_every_frame_in_order() {
        let detector = ScriptedDetector::new(vec![
            Ok(frame(vec![hand("Left", LANDMARK_COUNT)])),
            Ok(frame(vec![])),
            Ok(frame(vec![hand("Left", LANDMARK_COUNT), hand("Right", LANDMARK_COUNT)])),
        ]);
        let annotator = RecordingAnnotator::default();
        let seen = annotator.seen.clone();

        let mut pipeline = FramePipeline::new(detector, PipelineConfig::default());
        pipeline.add_annotator(Box::new(annotator));
        pipeline.run();

        assert_eq!(*seen.lock().unwrap(), vec![1, 0, 2]);
    }

    #[test]
    fn frames_and_failures_reach_bus_subscribers() {
        let detector = ScriptedDetector::new(vec![
            Err(HandError::Detector("no image".to_string())),
            Ok(frame(vec![hand("Right", LANDMARK_COUNT)])),
        ]);
        let mut pipeline = FramePipeline::new(detector, PipelineConfig::default());
        let mut frames = pipeline.bus().subscribe_to(Topic::Frames);
        let mut faults = pipeline.bus().subscribe_to(Topic::Faults);

        pipeline.run();

        assert!(matches!(frames.try_recv(), Some(BusEvent::Frame(f)) if f.hands.len() == 1));
        assert!(frames.try_recv().is_none());
        assert!(matches!(
            faults.try_recv(),
            Some(BusEvent::DetectorFailure { error: HandError::Detector(_), .. })
        ));
    }

    #[test]
    fn frames_published_only_while_subscribed() {
        let detector = ScriptedDetector::new(vec![
            Ok(frame(vec![hand("Left", LANDMARK_COUNT)])),
            Ok(frame(vec![hand("Right", LANDMARK_COUNT)])),
        ]);
        let mut pipeline = FramePipeline::new(detector, PipelineConfig::default());
        assert!(!pipeline.has_listeners());
        pipeline.tick().unwrap().unwrap();

        let mut frames = pipeline.bus().subscribe_to(Topic::Frames);
        assert!(pipeline.has_listeners());
        pipeline.tick().unwrap().unwrap();

        match frames.try_recv() {
            Some(BusEvent::Frame(f)) => assert_eq!(f.hands[0].handedness, Handedness::Right),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(frames.try_recv().is_none());
        assert_eq!(pipeline.stats().frames, 2);
    }

    #[test]
    fn side_bend_option_flows_to_records() {
        let config = PipelineConfig {
            extract: ExtractOptions { side_bend: false },
            ..PipelineConfig::default()
        };
        let detector = ScriptedDetector::new(vec![Ok(frame(vec![hand("Left", LANDMARK_COUNT)]))]);
        let mut pipeline = FramePipeline::new(detector, config);
        let out = pipeline.tick().unwrap().unwrap();
        assert!(out.hands[0].side_bend_angles.is_none());
    }
}
