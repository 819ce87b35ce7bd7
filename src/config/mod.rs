//! JSON run configuration shared by the demo binaries.
//!
//! ```json
//! {
//!   "inputs": ["frames/drop_000.png", "frames/drop_001.png"],
//!   "mode": "contactAngle",
//!   "params": { "fit_kinds": ["tangent", "circle"] },
//!   "calibration": { "drop_density": 998.0, "pixel_scale_px_per_mm": 100.0 },
//!   "output": { "json_out": "out/report.json" }
//! }
//! ```
use crate::physics::Calibration;
use crate::pipeline::{AnalysisMode, AnalysisParams};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub json_out: Option<PathBuf>,
    /// Directory receiving one contour overlay per frame.
    pub debug_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RuntimeConfig {
    pub inputs: Vec<PathBuf>,
    #[serde(default)]
    pub mode: AnalysisMode,
    #[serde(default)]
    pub params: AnalysisParams,
    /// Overrides `params.calibration` when present.
    #[serde(default)]
    pub calibration: Option<Calibration>,
    #[serde(default)]
    pub output: OutputConfig,
}

impl RuntimeConfig {
    /// Stage parameters with the top-level calibration applied.
    pub fn analysis_params(&self) -> AnalysisParams {
        let mut params = self.params.clone();
        if let Some(cal) = &self.calibration {
            params.calibration = cal.clone();
        }
        params
    }
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    parse_config(&contents).map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

pub fn parse_config(json: &str) -> Result<RuntimeConfig, serde_json::Error> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_calibration_wins() {
        let cfg = parse_config(
            r#"{
                "inputs": ["a.png"],
                "mode": "pendant",
                "params": { "calibration": { "drop_density": 1.0 } },
                "calibration": { "drop_density": 998.0, "continuous_density": 1.2 }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.mode, AnalysisMode::Pendant);
        let params = cfg.analysis_params();
        assert_eq!(params.calibration.drop_density, Some(998.0));
        assert_eq!(params.calibration.continuous_density, Some(1.2));
        assert!(cfg.output.json_out.is_none());
    }

    #[test]
    fn inputs_are_required() {
        assert!(parse_config(r#"{ "mode": "pendant" }"#).is_err());
    }

    #[test]
    fn shipped_configs_parse() {
        let sessile = parse_config(include_str!("../../config/contact_angle.json")).unwrap();
        assert_eq!(sessile.mode, AnalysisMode::ContactAngle);
        assert_eq!(sessile.params.fit_kinds.len(), 4);
        let pendant = parse_config(include_str!("../../config/pendant.json")).unwrap();
        assert_eq!(pendant.mode, AnalysisMode::Pendant);
        assert_eq!(pendant.analysis_params().calibration.needle_diameter_mm, Some(0.72));
    }
}
