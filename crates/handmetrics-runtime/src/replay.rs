//! [`JsonLinesDetector`] – replays recorded detector output.
//!
//! Each non-blank line of the input is one JSON-encoded [`RawFrame`]:
//!
//! ```text
//! {"capturedAt":"2024-05-01T12:00:00Z","hands":[{"landmarks":[{"x":0.5,"y":0.5}, ...],"handedness":"Left"}]}
//! ```
//!
//! A line that fails to parse is reported as [`HandError::Decode`] for that
//! frame only; the next call moves on to the following line.  Inside a
//! readable line, a hand entry that is not a valid [`RawHand`] is dropped on
//! its own and the other hands of the frame are kept.  A line without
//! `capturedAt` is stamped with the replay time.

use std::io::BufRead;

use chrono::{DateTime, Utc};
use handmetrics_types::{HandError, RawFrame, RawHand};
use serde::Deserialize;
use tracing::debug;

use crate::detector::HandDetector;

/// Wire shape of one recorded line, decoded before the hands are validated.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordedFrame {
    captured_at: Option<DateTime<Utc>>,
    #[serde(default)]
    hands: Vec<serde_json::Value>,
}

/// A [`HandDetector`] reading newline-delimited JSON frames.
pub struct JsonLinesDetector<R> {
    id: String,
    reader: R,
    line_no: usize,
    buf: String,
}

impl<R: BufRead + Send> JsonLinesDetector<R> {
    pub fn new(id: impl Into<String>, reader: R) -> Self {
        Self {
            id: id.into(),
            reader,
            line_no: 0,
            buf: String::new(),
        }
    }

    /// 1-based number of the last line read.
    pub fn line_no(&self) -> usize {
        self.line_no
    }
}

impl<R: BufRead + Send> HandDetector for JsonLinesDetector<R> {
    fn id(&self) -> &str {
        &self.id
    }

    fn next_frame(&mut self) -> Result<Option<RawFrame>, HandError> {
        loop {
            self.buf.clear();
            let read = self
                .reader
                .read_line(&mut self.buf)
                .map_err(|e| HandError::Io(format!("{}: {e}", self.id)))?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }
            let recorded: RecordedFrame =
                serde_json::from_str(line).map_err(|e| HandError::Decode {
                    line: self.line_no,
                    message: e.to_string(),
                })?;
            return Ok(Some(self.raw_frame_from(recorded)));
        }
    }
}

impl<R> JsonLinesDetector<R> {
    fn raw_frame_from(&self, recorded: RecordedFrame) -> RawFrame {
        let captured_at = recorded.captured_at.unwrap_or_else(|| {
            debug!(line = self.line_no, "frame has no capturedAt; using replay time");
            Utc::now()
        });
        let hands = recorded
            .hands
            .into_iter()
            .enumerate()
            .filter_map(|(hand_index, value)| match serde_json::from_value::<RawHand>(value) {
                Ok(hand) => Some(hand),
                Err(error) => {
                    debug!(line = self.line_no, hand_index, %error, "dropping unreadable hand");
                    None
                }
            })
            .collect();
        RawFrame::new(captured_at, hands)
    }
}
