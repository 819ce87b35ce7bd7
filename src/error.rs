//! Typed failures raised by the analysis stages.
use thiserror::Error;

/// Failure taxonomy of the drop-shape pipeline.
///
/// Recoverable conditions (missing baseline or circle, degenerate clustering)
/// are normally absorbed by the stages and only logged; the blocking ones
/// propagate to the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DropError {
    #[error("no contour found in image")]
    NoContourFound,
    #[error("region isolation failed: {0}")]
    RegionIsolationFailed(String),
    #[error("clustering degenerate on {points} point(s)")]
    ClusteringDegenerate { points: usize },
    #[error("contact points ambiguous: {0}")]
    ContactPointAmbiguous(String),
    #[error("fit did not converge after {iterations} iteration(s)")]
    FitDidNotConverge { iterations: usize },
    #[error("insufficient points: needed {needed}, found {found}")]
    InsufficientPoints { needed: usize, found: usize },
    #[error("analysis cancelled")]
    Cancelled,
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// A stage failure tagged with the frame it occurred on.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("frame {frame}: {source}")]
pub struct FrameError {
    pub frame: usize,
    #[source]
    pub source: DropError,
}

impl FrameError {
    pub fn new(frame: usize, source: DropError) -> Self {
        Self { frame, source }
    }
}

pub type Result<T, E = DropError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_error_mentions_frame_and_cause() {
        let err = FrameError::new(7, DropError::FitDidNotConverge { iterations: 40 });
        let msg = err.to_string();
        assert!(msg.contains("frame 7"), "{msg}");
        assert!(msg.contains("40"), "{msg}");
        assert!(std::error::Error::source(&err).is_some());
    }
}
