//! Typed, topic-based publish/subscribe bus for processed frames.
//!
//! Uses [`tokio::sync::broadcast`] channels so every subscriber sees every
//! message and a slow consumer never blocks the frame loop.
//!
//! # Topics
//!
//! | Topic | Traffic |
//! |---|---|
//! | [`Topic::Frames`] | One [`BusEvent::Frame`] per processed detector callback, empty frames included |
//! | [`Topic::Faults`] | [`BusEvent::Fault`] for hands dropped over corrupt geometry, [`BusEvent::DetectorFailure`] for frames the detector could not produce |

use chrono::{DateTime, Utc};
use handmetrics_types::{HandError, HandFault, HandFrame};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::warn;
use uuid::Uuid;

/// Default channel capacity (number of buffered events before old ones are
/// dropped for slow subscribers).
const DEFAULT_CAPACITY: usize = 64;

/// Routing lanes on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Processed frames for metrics consumers.
    Frames,
    /// Geometry faults and detector failures.
    Faults,
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topic::Frames => write!(f, "frames"),
            Topic::Faults => write!(f, "faults"),
        }
    }
}

/// Messages carried on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum BusEvent {
    Frame(HandFrame),
    Fault {
        frame_id: Uuid,
        timestamp: DateTime<Utc>,
        fault: HandFault,
    },
    DetectorFailure {
        timestamp: DateTime<Utc>,
        error: HandError,
    },
}

impl BusEvent {
    /// The lane this event belongs on.
    pub fn topic(&self) -> Topic {
        match self {
            BusEvent::Frame(_) => Topic::Frames,
            BusEvent::Fault { .. } | BusEvent::DetectorFailure { .. } => Topic::Faults,
        }
    }
}

/// Shared frame bus.  Clones share the same underlying channels.
#[derive(Clone, Debug)]
pub struct FrameBus {
    frames: broadcast::Sender<BusEvent>,
    faults: broadcast::Sender<BusEvent>,
}

impl FrameBus {
    /// Create a new bus; `capacity` applies to each topic independently and
    /// must be non-zero.
    pub fn new(capacity: usize) -> Self {
        let (frames, _) = broadcast::channel(capacity.max(1));
        let (faults, _) = broadcast::channel(capacity.max(1));
        Self { frames, faults }
    }

    /// Publish `event` on its own topic.
    ///
    /// Returns the number of receivers handed the event.
    ///
    /// # Errors
    ///
    /// [`HandError::Channel`] when nobody is subscribed to the topic.
    pub fn publish(&self, event: BusEvent) -> Result<usize, HandError> {
        let topic = event.topic();
        self.topic_sender(topic)
            .send(event)
            .map_err(|_| HandError::Channel(format!("No subscribers for topic {topic}")))
    }

    /// Publish a processed frame on [`Topic::Frames`] and each of its faults
    /// on [`Topic::Faults`].
    ///
    /// Returns the number of receivers handed the frame.
    pub fn publish_frame(&self, frame: HandFrame) -> Result<usize, HandError> {
        for fault in &frame.faults {
            let event = BusEvent::Fault {
                frame_id: frame.id,
                timestamp: frame.timestamp,
                fault: fault.clone(),
            };
            // A fault lane without listeners is normal.
            let _ = self.publish(event);
        }
        self.publish(BusEvent::Frame(frame))
    }

    /// Subscribe to one topic.
    pub fn subscribe_to(&self, topic: Topic) -> TopicReceiver {
        TopicReceiver {
            topic,
            receiver: self.topic_sender(topic).subscribe(),
        }
    }

    /// Number of live subscribers on `topic`.
    pub fn receiver_count(&self, topic: Topic) -> usize {
        self.topic_sender(topic).receiver_count()
    }

    fn topic_sender(&self, topic: Topic) -> &broadcast::Sender<BusEvent> {
        match topic {
            Topic::Frames => &self.frames,
            Topic::Faults => &self.faults,
        }
    }
}

impl Default for FrameBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Receiver
// ---------------------------------------------------------------------------

/// A receiver bound to a single [`Topic`].
pub struct TopicReceiver {
    topic: Topic,
    receiver: broadcast::Receiver<BusEvent>,
}

impl TopicReceiver {
    /// Wait for the next event, skipping over any dropped because this
    /// receiver lagged.
    ///
    /// Returns `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<BusEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(topic = %self.topic, lagged_by = n, "frame subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`][Self::recv] for synchronous
    /// consumers.  Returns `None` when nothing is queued.
    pub fn try_recv(&mut self) -> Option<BusEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!(topic = %self.topic, lagged_by = n, "frame subscriber lagged");
                    continue;
                }
                Err(_) => return None,
            }
        }
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }
}
