//! Threshold/gap segmentation of signal tracks into enriched intervals.
//!
//! See [`call_intervals`] for the exact region rule.

pub mod engine;

pub use engine::{call_intervals, segment_tracks, SegmentationParams};
