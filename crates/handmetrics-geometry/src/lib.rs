//! `handmetrics-geometry` – landmark-to-metrics geometry engine.
//!
//! Turns one frame of raw hand detections into the per-hand bend, spread and
//! pinch metrics that visualisation and analytics consumers read.
//!
//! # Modules
//!
//! - [`topology`] – fixed 21-point hand indices, the per-finger joint triples
//!   and the fingertip list.
//! - [`angles`] – the angle extractor: pure functions from one hand's
//!   landmarks to [`HandMetrics`][handmetrics_types::HandMetrics].
//! - [`assembler`] – [`FrameAssembler`][assembler::FrameAssembler]: validates
//!   each reported hand, runs the extractor and packages ordered
//!   [`HandFrameRecord`][handmetrics_types::HandFrameRecord]s.
//! - [`schema`] – JSON Schema of the published output contract.

pub mod angles;
pub mod assembler;
pub mod schema;
pub mod topology;

pub use angles::{ExtractOptions, extract};
pub use assembler::{AssembledFrame, FrameAssembler};
