//! Frame sequences.
//!
//! Frames are independent; each failure is recorded with its index and the
//! batch continues. With `reuse_threshold` the first frame that yields a
//! level fixes it for the rest, which keeps the silhouettes comparable
//! across the sequence. With the `parallel` feature the remaining frames are
//! analysed on the rayon pool.

use super::{AnalysisMode, ContactAngleAnalysis, DropAnalyzer, PendantAnalysis};
use crate::error::{DropError, FrameError};
use image::GrayImage;
use log::debug;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;

/// Outcome of one frame of a sequence.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum FrameAnalysis {
    ContactAngle(ContactAngleAnalysis),
    Pendant(PendantAnalysis),
}

impl FrameAnalysis {
    pub fn threshold(&self) -> Option<u8> {
        match self {
            FrameAnalysis::ContactAngle(a) => a.trace.threshold,
            FrameAnalysis::Pendant(a) => a.trace.threshold,
        }
    }
}

impl DropAnalyzer {
    /// Analyse one gray frame in `mode`.
    pub fn analyze_gray(
        &self,
        gray: &GrayImage,
        mode: AnalysisMode,
        threshold: Option<u8>,
    ) -> Result<FrameAnalysis, DropError> {
        match mode {
            AnalysisMode::ContactAngle => self
                .contact_angle_gray(gray, threshold)
                .map(FrameAnalysis::ContactAngle),
            AnalysisMode::Pendant => self
                .pendant_gray(gray, threshold, None)
                .map(FrameAnalysis::Pendant),
        }
    }
}

/// Analyse every frame, returning one result per frame in input order.
pub fn analyze_sequence(
    analyzer: &DropAnalyzer,
    frames: &[GrayImage],
    mode: AnalysisMode,
) -> Vec<Result<FrameAnalysis, FrameError>> {
    let params = analyzer.params();
    let run = |index: usize, threshold: Option<u8>| {
        analyzer
            .analyze_gray(&frames[index], mode, threshold)
            .map_err(|source| FrameError::new(index, source))
    };
    if !params.reuse_threshold || params.threshold.is_some() {
        return run_all(frames.len(), |i| run(i, params.threshold));
    }

    // Frames run in order until one fixes the level.
    let mut results = Vec::with_capacity(frames.len());
    let mut pinned = None;
    while results.len() < frames.len() && pinned.is_none() {
        let result = run(results.len(), None);
        pinned = result.as_ref().ok().and_then(FrameAnalysis::threshold);
        results.push(result);
    }
    if let Some(level) = pinned {
        debug!("analyze_sequence: reusing threshold {level}");
    }
    let offset = results.len();
    results.extend(run_all(frames.len() - offset, |i| run(offset + i, pinned)));
    results
}

#[cfg(feature = "parallel")]
fn run_all<T, F>(n: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    (0..n).into_par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
fn run_all<T, F>(n: usize, f: F) -> Vec<T>
where
    F: Fn(usize) -> T,
{
    (0..n).map(f).collect()
}
