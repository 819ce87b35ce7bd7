#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod image;
pub mod pipeline;
pub mod types;

// Stage modules – public for tools and tests, tuned more freely.
pub mod angle;
pub mod cluster;
pub mod contour;
pub mod cpid;
pub mod edges;
pub mod fit;
pub mod ml;
pub mod needle;
pub mod physics;
pub mod region;
pub mod signal;
pub mod younglaplace;

// --- High-level re-exports -------------------------------------------------

// Main entry points: analyzer + results.
pub use crate::pipeline::{
    analyze_sequence, AnalysisMode, AnalysisParams, ContactAngleAnalysis, DropAnalyzer,
    FrameAnalysis, PendantAnalysis,
};

// Failure taxonomy.
pub use crate::error::{DropError, FrameError};

// Per-frame diagnostics returned with every analysis.
pub use crate::diagnostics::{FrameTrace, TimingBreakdown};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use drop_shape::prelude::*;
///
/// # fn main() {
/// let (w, h) = (640usize, 480usize);
/// let gray = vec![200u8; w * h];
/// let img = ImageU8 { w, h, stride: w, data: &gray };
///
/// let analyzer = DropAnalyzer::new(AnalysisParams::default());
/// match analyzer.analyze_contact_angle(FrameImage::Gray(img)) {
///     Ok(analysis) => println!("{} fits", analysis.fits.len()),
///     Err(err) => println!("no usable droplet: {err}"),
/// }
/// # }
/// ```
pub mod prelude {
    pub use crate::fit::{FitKind, FitResult};
    pub use crate::image::{FrameImage, ImageBgr8, ImageU8};
    pub use crate::physics::{Calibration, PhysicalProperties};
    pub use crate::types::{Contour, Point2D};
    pub use crate::{AnalysisParams, DropAnalyzer, DropError};
}

// --- Stage-level API (for tools & advanced users) --------------------------

pub mod stages {
    // Stage runners.
    pub use crate::cluster::{ClusterMethod, ContourClusterer};
    pub use crate::contour::{order_drop_contour, ContourExtractor, Extraction};
    pub use crate::cpid::{ContactPointLocator, ContactPoints, Regime};
    pub use crate::fit::{DropProfile, GeometricFitEngine};
    pub use crate::ml::{prepare_model_input, ContactAnglePredictor, ModelInput};
    pub use crate::needle::{measure_needle_width, strip_needle, NeedleMeasurement};
    pub use crate::region::{IsolatedRegion, RegionIsolator};
    pub use crate::younglaplace::{CancelToken, YoungLaplaceFit, YoungLaplaceFitEngine};

    // Structured diagnostics types.
    pub use crate::diagnostics::{FrameTrace, InputDescriptor, StageTiming, TimingBreakdown};
}
