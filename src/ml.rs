//! Input preparation for a learned contact-angle predictor.
//!
//! The predictor itself is external; this module only shapes the drop into
//! the two fixed-length half profiles it consumes and clamps its output.
use crate::error::DropError;
use crate::fit::DropProfile;
use crate::types::{Baseline, Contour};
use serde::{Deserialize, Serialize};

/// Points per half profile expected by the model.
pub const DEFAULT_INPUT_LEN: usize = 1100;

/// Two half profiles `[x, z]`, apex first, left side mirrored onto `x ≥ 0`.
///
/// Heights are measured up from the baseline and scaled so the apex sits at
/// `z = 1`; widths share the same scale and start at the apex column. Short
/// halves are zero padded, long ones truncated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelInput {
    pub sides: [Vec<[f64; 2]>; 2],
}

impl ModelInput {
    pub fn len(&self) -> usize {
        self.sides[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.sides[0].is_empty()
    }
}

/// Shape the drop between the contact points at `left` and `right`.
pub fn prepare_model_input(
    contour: &Contour,
    left: usize,
    right: usize,
    baseline: Option<&Baseline>,
    input_len: usize,
) -> Result<ModelInput, DropError> {
    let profile = DropProfile::between(contour, left, right, baseline)?;
    if profile.len() < 3 {
        return Err(DropError::InsufficientPoints {
            needed: 3,
            found: profile.len(),
        });
    }
    // Image y points down; flip to heights above the baseline.
    let cartesian: Vec<[f64; 2]> = profile.points.iter().map(|p| [p.x, -p.y]).collect();
    let (apex, top) = cartesian
        .iter()
        .enumerate()
        .max_by(|a, b| a.1[1].total_cmp(&b.1[1]))
        .map(|(i, p)| (i, *p))
        .ok_or(DropError::InsufficientPoints { needed: 3, found: 0 })?;
    let height = top[1];
    if !(height > 0.0) {
        return Err(DropError::InvalidInput(
            "drop profile does not rise above the baseline".into(),
        ));
    }
    let scale = |p: &[f64; 2], mirror: bool| {
        let x = (p[0] - top[0]) / height;
        [if mirror { -x } else { x }, p[1] / height]
    };
    let fit_len = |mut v: Vec<[f64; 2]>| {
        v.resize(input_len, [0.0, 0.0]);
        v
    };
    let left_half: Vec<[f64; 2]> = cartesian[..=apex]
        .iter()
        .rev()
        .map(|p| scale(p, true))
        .collect();
    let right_half: Vec<[f64; 2]> = cartesian[apex..].iter().map(|p| scale(p, false)).collect();
    Ok(ModelInput {
        sides: [fit_len(left_half), fit_len(right_half)],
    })
}

/// External model mapping prepared half profiles to `(left, right)` angles.
pub trait ContactAnglePredictor {
    fn predict(&self, input: &ModelInput) -> (f64, f64);

    /// Prediction clamped to `[0°, 180°]`.
    fn predict_clamped(&self, input: &ModelInput) -> (f64, f64) {
        let (l, r) = self.predict(input);
        (l.clamp(0.0, 180.0), r.clamp(0.0, 180.0))
    }
}

impl<F> ContactAnglePredictor for F
where
    F: Fn(&ModelInput) -> (f64, f64),
{
    fn predict(&self, input: &ModelInput) -> (f64, f64) {
        self(input)
    }
}
