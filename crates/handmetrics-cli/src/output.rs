//! Frame printers used as pipeline annotators.

use std::io::Write;

use colored::Colorize;
use handmetrics_runtime::FrameAnnotator;
use handmetrics_types::{HandFrame, HandFrameRecord};
use tracing::error;

use crate::config::OutputFormat;

/// Writes every processed frame to `out` in the configured format.
pub struct FramePrinter<W> {
    out: W,
    format: OutputFormat,
}

impl<W: Write + Send> FramePrinter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format }
    }

    fn write_frame(&mut self, frame: &HandFrame) -> std::io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.out, frame)?;
                writeln!(self.out)
            }
            OutputFormat::Summary => {
                writeln!(
                    self.out,
                    "{} {}",
                    frame.timestamp.format("%H:%M:%S%.3f").to_string().dimmed(),
                    format!("{} hand(s)", frame.hands.len()).bold()
                )?;
                for (i, hand) in frame.hands.iter().enumerate() {
                    writeln!(self.out, "  #{i} {}", summarize(hand))?;
                }
                for fault in &frame.faults {
                    writeln!(
                        self.out,
                        "  {} hand {}: {}",
                        "fault".red(),
                        fault.hand_index,
                        fault.error
                    )?;
                }
                Ok(())
            }
        }
    }
}

impl<W: Write + Send> FrameAnnotator for FramePrinter<W> {
    fn annotate(&mut self, frame: &HandFrame) {
        if let Err(e) = self.write_frame(frame).and_then(|_| self.out.flush()) {
            error!(error = %e, "failed to write frame");
        }
    }
}

/// One-line, uncoloured description of a hand record.
pub fn summarize(hand: &HandFrameRecord) -> String {
    let bends: Vec<String> = hand
        .finger_angles
        .iter()
        .map(|(finger, angle)| format!("{finger}={angle:.0}"))
        .collect();
    let spreads: Vec<String> = hand
        .finger_pair_angles
        .iter()
        .map(|(pair, angle)| format!("{pair}={angle:.0}"))
        .collect();
    format!(
        "{:<5} bend[{}] spread[{}] gap={:.3}",
        hand.handedness.to_string(),
        bends.join(" "),
        spreads.join(" "),
        hand.gap
    )
}
