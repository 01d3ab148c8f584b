//! Collaborator traits at the edges of the frame pipeline.

use handmetrics_types::{HandError, HandFrame, RawFrame};

/// A source of per-frame hand detections.
///
/// Implementations wrap whatever actually runs the landmark model (a camera
/// plus inference runtime, a recorded session, a test fixture).
pub trait HandDetector: Send {
    /// Stable identifier for this detector, e.g. `"front_camera"`.
    fn id(&self) -> &str;

    /// Produce the next frame's detections.
    ///
    /// Returns `Ok(None)` once the source is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`HandError::Detector`] (or a decode/I/O error for recorded
    /// sources) when this frame could not be produced.  The pipeline skips
    /// the frame and keeps polling.
    fn next_frame(&mut self) -> Result<Option<RawFrame>, HandError>;
}

/// Receives every processed frame for overlay drawing or similar side
/// effects.  Annotators run synchronously, in registration order, before
/// the frame is published on the bus.
pub trait FrameAnnotator: Send {
    fn annotate(&mut self, frame: &HandFrame);
}
