//! Physical properties of a fitted pendant drop.
//!
//! Pixel quantities from [`YoungLaplaceFit`] are converted with a pixel
//! scale, either given directly or derived from the needle width in pixels
//! and the known needle diameter. Missing calibration yields `NaN`.
use crate::younglaplace::YoungLaplaceFit;
use serde::{Deserialize, Serialize};

/// Standard gravity, m/s².
pub const STANDARD_GRAVITY: f64 = 9.80665;

/// Caller-supplied calibration. Densities are kg/m³.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub drop_density: Option<f64>,
    pub continuous_density: Option<f64>,
    /// m/s².
    pub gravity: f64,
    pub needle_diameter_mm: Option<f64>,
    /// Measured needle width in pixels, paired with `needle_diameter_mm`.
    pub needle_width_px: Option<f64>,
    /// Pixels per millimetre; takes precedence over the needle.
    pub pixel_scale_px_per_mm: Option<f64>,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            drop_density: None,
            continuous_density: None,
            gravity: STANDARD_GRAVITY,
            needle_diameter_mm: None,
            needle_width_px: None,
            pixel_scale_px_per_mm: None,
        }
    }
}

impl Calibration {
    /// Metres per pixel, when the calibration allows it.
    pub fn metres_per_pixel(&self) -> Option<f64> {
        let px_per_mm = match (
            self.pixel_scale_px_per_mm,
            self.needle_width_px,
            self.needle_diameter_mm,
        ) {
            (Some(scale), _, _) => scale,
            (None, Some(px), Some(mm)) if mm > 0.0 => px / mm,
            _ => return None,
        };
        (px_per_mm > 0.0 && px_per_mm.is_finite()).then(|| 1e-3 / px_per_mm)
    }

    /// |ρ_drop − ρ_continuous|.
    pub fn density_difference(&self) -> Option<f64> {
        Some((self.drop_density? - self.continuous_density?).abs())
    }
}

/// SI quantities derived from one fit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalProperties {
    /// N/m.
    pub interfacial_tension: f64,
    /// m.
    pub apex_radius: f64,
    /// m².
    pub surface_area: f64,
    /// m³.
    pub volume: f64,
    pub worthington_number: f64,
}

impl PhysicalProperties {
    /// `γ = Δρ·g·R₀² / Bo`, and `Wo = Δρ·g·V / (π·γ·D)` with `D` the needle
    /// diameter. A fit with `Bo ≤ 0` is not a pendant drop and yields no
    /// tension.
    pub fn from_fit(fit: &YoungLaplaceFit, calibration: &Calibration) -> Self {
        let Some(m_per_px) = calibration.metres_per_pixel() else {
            return Self::unknown();
        };
        let apex_radius = fit.radius * m_per_px;
        let surface_area = fit.surface_area * m_per_px * m_per_px;
        let volume = fit.volume * m_per_px.powi(3);
        let interfacial_tension = match calibration.density_difference() {
            Some(drho) if fit.bond > 0.0 => {
                drho * calibration.gravity * apex_radius.powi(2) / fit.bond
            }
            _ => f64::NAN,
        };
        let needle = calibration.needle_diameter_mm;
        let worthington_number = match (calibration.density_difference(), needle) {
            (Some(drho), Some(d_mm)) if d_mm > 0.0 && interfacial_tension > 0.0 => {
                let d = d_mm * 1e-3;
                drho * calibration.gravity * volume
                    / (std::f64::consts::PI * interfacial_tension * d)
            }
            _ => f64::NAN,
        };
        Self {
            interfacial_tension,
            apex_radius,
            surface_area,
            volume,
            worthington_number,
        }
    }

    fn unknown() -> Self {
        Self {
            interfacial_tension: f64::NAN,
            apex_radius: f64::NAN,
            surface_area: f64::NAN,
            volume: f64::NAN,
            worthington_number: f64::NAN,
        }
    }
}
