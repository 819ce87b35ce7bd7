//! Diagnostics attached to every frame analysis.
//!
//! `FrameTrace` records the input size, the binarisation level, the region
//! cues and a per-stage `TimingBreakdown`; the pipeline reports embed it next
//! to their results.

pub mod report;
pub mod timing;

pub use report::{FrameTrace, InputDescriptor};
pub use timing::{elapsed_ms, StageTiming, TimingBreakdown};
