//! Parameter types configuring the analysis stages.
//!
//! Every stage keeps its own options struct; `AnalysisParams` only groups
//! them so a whole run can be loaded from one JSON document. Unspecified
//! fields take the defaults of the stage.

use crate::cluster::ClusterOptions;
use crate::contour::ExtractorOptions;
use crate::cpid::CpidOptions;
use crate::fit::{FitKind, FitOptions};
use crate::ml::DEFAULT_INPUT_LEN;
use crate::needle::{NeedleOptions, NeedleStripOptions};
use crate::physics::Calibration;
use crate::region::RegionOptions;
use crate::younglaplace::YoungLaplaceOptions;
use serde::{Deserialize, Serialize};

/// Which analysis a frame goes through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisMode {
    /// Sessile drop on a substrate: contact points and geometric fits.
    #[default]
    ContactAngle,
    /// Drop hanging from a needle: Young–Laplace fit and physical properties.
    Pendant,
}

/// Stages specific to pendant drops.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PendantParams {
    pub extractor: ExtractorOptions,
    pub cluster: ClusterOptions,
    /// Neighbour distance separating the drop outline from clutter.
    pub cluster_eps: f64,
    pub needle: NeedleOptions,
    pub strip: NeedleStripOptions,
    pub young_laplace: YoungLaplaceOptions,
}

impl Default for PendantParams {
    fn default() -> Self {
        Self {
            extractor: ExtractorOptions::default(),
            cluster: ClusterOptions::default(),
            cluster_eps: 2.0,
            needle: NeedleOptions::default(),
            strip: NeedleStripOptions::default(),
            young_laplace: YoungLaplaceOptions::default(),
        }
    }
}

/// Parameters of a [`DropAnalyzer`](super::DropAnalyzer).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    /// Fixed binarisation level; `None` runs Otsu on each frame.
    pub threshold: Option<u8>,
    /// In a sequence, pin the level found on the first frame for the rest.
    pub reuse_threshold: bool,
    pub region: RegionOptions,
    pub cpid: CpidOptions,
    pub fit: FitOptions,
    /// Geometric fits run on every contact-angle frame.
    pub fit_kinds: Vec<FitKind>,
    /// Points per half profile handed to a contact-angle predictor.
    pub model_input_len: usize,
    pub pendant: PendantParams,
    pub calibration: Calibration,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            threshold: None,
            reuse_threshold: true,
            region: RegionOptions::default(),
            cpid: CpidOptions::default(),
            fit: FitOptions::default(),
            fit_kinds: FitKind::GEOMETRIC.to_vec(),
            model_input_len: DEFAULT_INPUT_LEN,
            pendant: PendantParams::default(),
            calibration: Calibration::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let params: AnalysisParams = serde_json::from_str(
            r#"{ "threshold": 90, "fit_kinds": ["circle"], "calibration": { "drop_density": 998.0 } }"#,
        )
        .unwrap();
        assert_eq!(params.threshold, Some(90));
        assert_eq!(params.fit_kinds, vec![FitKind::Circle]);
        assert_eq!(params.calibration.drop_density, Some(998.0));
        assert!(params.reuse_threshold);
        assert_eq!(params.model_input_len, DEFAULT_INPUT_LEN);
        assert_eq!(params.fit.tangent_window, 40);
    }
}
