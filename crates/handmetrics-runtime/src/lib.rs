//! `handmetrics-runtime` – drives frames from a detector through the
//! geometry engine to consumers.
//!
//! # Modules
//!
//! - [`detector`] – [`HandDetector`][detector::HandDetector] and
//!   [`FrameAnnotator`][detector::FrameAnnotator]: the narrow interfaces to
//!   the external detector and overlay-drawing collaborators.
//! - [`replay`] – [`JsonLinesDetector`][replay::JsonLinesDetector]: a
//!   detector that replays newline-delimited JSON [`RawFrame`]s captured
//!   from a live detector.
//! - [`pipeline`] – [`FramePipeline`][pipeline::FramePipeline]: one
//!   synchronous detector → assembler → annotators → bus step per frame.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: global
//!   `tracing` subscriber with an optional OTLP span exporter.
//!
//! [`RawFrame`]: handmetrics_types::RawFrame

pub mod detector;
pub mod pipeline;
pub mod replay;
pub mod telemetry;

pub use detector::{FrameAnnotator, HandDetector};
pub use pipeline::{FramePipeline, PipelineConfig, PipelineStats};
pub use replay::JsonLinesDetector;
pub use telemetry::{TracerProviderGuard, init_tracing};
