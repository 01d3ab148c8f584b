//! `handmetrics-middleware` – delivery of processed frames to consumers.
//!
//! # Modules
//!
//! - [`bus`] – [`FrameBus`][bus::FrameBus]: typed publish/subscribe channel
//!   that fans each processed [`HandFrame`][handmetrics_types::HandFrame] out
//!   to overlay, visualisation and charting consumers, with a separate lane
//!   for geometry faults and detector failures.

pub mod bus;

pub use bus::{BusEvent, FrameBus, Topic, TopicReceiver};
