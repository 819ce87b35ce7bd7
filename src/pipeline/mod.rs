//! Per-frame analysis orchestrating the stages end to end.
//!
//! [`DropAnalyzer`] holds only parameters (and an optional contact-angle
//! predictor), so one analyzer can serve many frames from many threads.
//!
//! Contact-angle mode
//! - Region isolation: crop to the drop, keep the binarisation level.
//! - Ordering: bottom-left end, over the apex, down to the bottom right.
//! - Contact points: widest points, rough guesses, regime table, local fits.
//! - Fits: every configured geometric fit on the profile between the contact
//!   points; optionally the external predictor.
//!
//! Pendant mode
//! - Extraction and clustering on the full frame.
//! - Needle width from the top band; the needle walls are cut off.
//! - Young–Laplace fit with Bond-number retries.
//! - Physical properties from the calibration, completed with the measured
//!   needle width when no pixel scale is given.
//!
//! Typical usage:
//! ```no_run
//! use drop_shape::image::{FrameImage, ImageU8};
//! use drop_shape::pipeline::{AnalysisParams, DropAnalyzer};
//!
//! # fn example(gray: ImageU8) {
//! let analyzer = DropAnalyzer::new(AnalysisParams::default());
//! match analyzer.analyze_contact_angle(FrameImage::Gray(gray)) {
//!     Ok(analysis) => {
//!         for fit in &analysis.fits {
//!             println!("{:?}: {:.1} / {:.1}", fit.kind(), fit.left_angle, fit.right_angle);
//!         }
//!     }
//!     Err(err) => eprintln!("no usable droplet: {err}"),
//! }
//! # }
//! ```

pub mod params;
pub mod sequence;

pub use params::{AnalysisMode, AnalysisParams, PendantParams};
pub use sequence::{analyze_sequence, FrameAnalysis};

use crate::cluster::{ClusterMethod, ContourClusterer};
use crate::contour::{order_drop_contour, ContourExtractor};
use crate::cpid::{ContactPointLocator, ContactPoints};
use crate::diagnostics::{elapsed_ms, FrameTrace, TimingBreakdown};
use crate::error::DropError;
use crate::fit::{DropProfile, FitKind, FitResult, GeometricFitEngine};
use crate::image::FrameImage;
use crate::ml::{prepare_model_input, ContactAnglePredictor};
use crate::needle::{measure_needle_width, strip_needle, NeedleMeasurement};
use crate::physics::PhysicalProperties;
use crate::region::RegionIsolator;
use crate::types::{Baseline, Contour};
use crate::younglaplace::{CancelToken, YoungLaplaceFit, YoungLaplaceFitEngine};
use image::GrayImage;
use log::{debug, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Angles returned by a contact-angle predictor, degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictedAngles {
    pub left_angle: f64,
    pub right_angle: f64,
}

/// Contact points and fits of a drop contour.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactAngleFits {
    /// The ordered contour the contact point indices refer to.
    pub contour: Contour,
    pub contact_points: ContactPoints,
    pub fits: Vec<FitResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted: Option<PredictedAngles>,
}

/// Result of [`DropAnalyzer::analyze_contact_angle`]. Coordinates refer to
/// the cropped (and levelled) image described by `trace.region`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactAngleAnalysis {
    #[serde(flatten)]
    pub result: ContactAngleFits,
    pub trace: FrameTrace,
}

impl std::ops::Deref for ContactAngleAnalysis {
    type Target = ContactAngleFits;

    fn deref(&self) -> &ContactAngleFits {
        &self.result
    }
}

/// Result of [`DropAnalyzer::analyze_pendant`], in frame coordinates.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendantAnalysis {
    /// Drop outline with the needle removed, as fitted.
    pub contour: Contour,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needle: Option<NeedleMeasurement>,
    pub fit: YoungLaplaceFit,
    pub properties: PhysicalProperties,
    pub trace: FrameTrace,
}

type SharedPredictor = Arc<dyn ContactAnglePredictor + Send + Sync>;

/// Runs the contact-angle and pendant-drop pipelines on single frames.
#[derive(Clone)]
pub struct DropAnalyzer {
    params: AnalysisParams,
    predictor: Option<SharedPredictor>,
}

impl DropAnalyzer {
    pub fn new(params: AnalysisParams) -> Self {
        Self {
            params,
            predictor: None,
        }
    }

    /// Attach a learned contact-angle model; its angles are reported next to
    /// the geometric fits.
    pub fn with_predictor(
        mut self,
        predictor: impl ContactAnglePredictor + Send + Sync + 'static,
    ) -> Self {
        self.predictor = Some(Arc::new(predictor));
        self
    }

    pub fn params(&self) -> &AnalysisParams {
        &self.params
    }

    pub fn set_params(&mut self, params: AnalysisParams) {
        self.params = params;
    }

    /// Contact angles of a sessile drop.
    pub fn analyze_contact_angle(
        &self,
        frame: FrameImage<'_>,
    ) -> Result<ContactAngleAnalysis, DropError> {
        let gray = frame.to_gray()?;
        self.contact_angle_gray(&gray, self.params.threshold)
    }

    /// As [`Self::analyze_contact_angle`] on an owned gray image, with an
    /// explicit binarisation level (`None` runs Otsu).
    pub fn contact_angle_gray(
        &self,
        gray: &GrayImage,
        threshold: Option<u8>,
    ) -> Result<ContactAngleAnalysis, DropError> {
        let start = Instant::now();
        let mut trace = FrameTrace::new(gray.width(), gray.height());

        let isolator = RegionIsolator::new(self.params.region.clone());
        let region = trace
            .timings
            .time("isolate", || isolator.isolate(gray, threshold))?;
        trace.threshold = Some(region.info.threshold);
        let baseline = region.info.baseline;
        trace.region = Some(region.info);

        let result = self.fit_contour(&region.contour, baseline.as_ref(), &mut trace.timings)?;
        trace.timings.total_ms = elapsed_ms(start);
        debug!(
            "DropAnalyzer: contact-angle frame done in {:.2} ms",
            trace.timings.total_ms
        );
        Ok(ContactAngleAnalysis { result, trace })
    }

    /// Contact points and fits of an already isolated drop contour. The
    /// contour need not be ordered; `baseline`, when known, defines the
    /// substrate direction.
    pub fn analyze_contact_contour(
        &self,
        contour: &Contour,
        baseline: Option<&Baseline>,
    ) -> Result<ContactAngleFits, DropError> {
        self.fit_contour(contour, baseline, &mut TimingBreakdown::default())
    }

    fn fit_contour(
        &self,
        contour: &Contour,
        baseline: Option<&Baseline>,
        timings: &mut TimingBreakdown,
    ) -> Result<ContactAngleFits, DropError> {
        if contour.is_empty() {
            return Err(DropError::NoContourFound);
        }
        let ordered = timings.time("order", || order_drop_contour(contour));

        let locator = ContactPointLocator::new(self.params.cpid.clone());
        let contact_points = timings.time("cpid", || locator.locate(&ordered))?;
        if contact_points.low_confidence {
            warn!(
                "DropAnalyzer: contact points are a best-effort guess (regime {:?})",
                contact_points.regime
            );
        }
        let (l, r) = (contact_points.left_index, contact_points.right_index);

        let profile = DropProfile::between(&ordered, l, r, baseline)?;
        let engine = GeometricFitEngine::new(self.params.fit.clone());
        let fits: Vec<FitResult> = timings.time("fit", || {
            self.params
                .fit_kinds
                .iter()
                .filter(|k| FitKind::GEOMETRIC.contains(*k))
                .map(|&k| engine.fit(k, &profile))
                .collect()
        });
        for fit in fits.iter().filter(|f| !f.is_valid()) {
            warn!(
                "DropAnalyzer: {:?} fit gave no usable angle ({:.2}, {:.2})",
                fit.kind(),
                fit.left_angle,
                fit.right_angle
            );
        }

        let predicted = match &self.predictor {
            Some(model) => {
                let input_len = self.params.model_input_len;
                let input = timings.time("prepare_model_input", || {
                    prepare_model_input(&ordered, l, r, baseline, input_len)
                });
                match input {
                    Ok(input) => {
                        let (left_angle, right_angle) = model.predict_clamped(&input);
                        Some(PredictedAngles {
                            left_angle,
                            right_angle,
                        })
                    }
                    Err(err) => {
                        warn!("DropAnalyzer: no model input: {err}");
                        None
                    }
                }
            }
            None => None,
        };

        Ok(ContactAngleFits {
            contour: ordered,
            contact_points,
            fits,
            predicted,
        })
    }

    /// Young–Laplace fit and physical properties of a hanging drop.
    pub fn analyze_pendant(&self, frame: FrameImage<'_>) -> Result<PendantAnalysis, DropError> {
        let gray = frame.to_gray()?;
        self.pendant_gray(&gray, self.params.threshold, None)
    }

    /// As [`Self::analyze_pendant`] on an owned gray image. A set `cancel`
    /// token aborts the fit between optimizer iterations.
    pub fn pendant_gray(
        &self,
        gray: &GrayImage,
        threshold: Option<u8>,
        cancel: Option<&CancelToken>,
    ) -> Result<PendantAnalysis, DropError> {
        let start = Instant::now();
        let opts = &self.params.pendant;
        let mut trace = FrameTrace::new(gray.width(), gray.height());
        let timings = &mut trace.timings;

        let extractor = ContourExtractor::new(opts.extractor.clone());
        let extraction = timings.time("extract", || extractor.extract(gray, threshold))?;
        trace.threshold = Some(extraction.threshold);
        let clusterer = ContourClusterer::new(opts.cluster.clone());
        let method = ClusterMethod::Eps(opts.cluster_eps);
        let outline = timings.time("cluster", || {
            clusterer.dominant(extraction.contour.as_slice(), method)
        });
        if outline.is_empty() {
            return Err(DropError::NoContourFound);
        }

        let needle = timings.time("needle", || measure_needle_width(gray, &opts.needle));
        if needle.is_none() {
            warn!("DropAnalyzer: no needle found; cutting the top of the outline");
        }
        let contour = strip_needle(&outline, needle.as_ref(), &opts.strip);

        let engine = YoungLaplaceFitEngine::new(opts.young_laplace.clone());
        let fit = timings.time("young_laplace", || match cancel {
            Some(token) => engine.fit_with_cancel(&contour, token),
            None => engine.fit(&contour),
        })?;

        let mut calibration = self.params.calibration.clone();
        if calibration.needle_width_px.is_none() {
            calibration.needle_width_px = needle.as_ref().map(|m| m.width_px);
        }
        let properties = PhysicalProperties::from_fit(&fit, &calibration);
        trace.timings.total_ms = elapsed_ms(start);
        debug!(
            "DropAnalyzer: pendant frame Bo={:.4} R0={:.2} px in {:.2} ms",
            fit.bond, fit.radius, trace.timings.total_ms
        );
        Ok(PendantAnalysis {
            contour,
            needle,
            fit,
            properties,
            trace,
        })
    }
}
