//! Angle utilities: slope ↔ contact angle mapping and rotation folding.
use crate::types::Side;

/// Maps an image-space slope `dy/dx` to the internal contact angle in degrees.
///
/// The image y axis points down, so the slope is negated before taking the
/// arctangent. The right side is mirrored so that 0° means the liquid lies
/// flat and 180° means it balls up, for either side. `NaN` is treated as a
/// vertical tangent.
pub fn calculate_contact_angle(gradient: f64, side: Side) -> f64 {
    let gradient = if gradient.is_nan() {
        f64::INFINITY
    } else {
        gradient
    };
    let mut angle = (-gradient).atan().to_degrees();
    match side {
        Side::Left => {
            if angle < 0.0 {
                angle += 180.0;
            }
        }
        Side::Right => {
            angle = -angle;
            if angle < 0.0 {
                angle += 180.0;
            }
        }
    }
    angle
}

/// Inverse of [`calculate_contact_angle`]: recovers the image-space slope.
///
/// A 90° contact angle maps back to `+inf`.
pub fn slope_from_contact_angle(angle_deg: f64, side: Side) -> f64 {
    if (angle_deg - 90.0).abs() < 1e-9 {
        return f64::INFINITY;
    }
    let folded = if angle_deg > 90.0 {
        angle_deg - 180.0
    } else {
        angle_deg
    };
    let t = folded.to_radians().tan();
    match side {
        Side::Left => -t,
        Side::Right => t,
    }
}

/// Contact angle of a tangent direction `(dx, dy)` on the given side.
pub fn contact_angle_from_direction(dx: f64, dy: f64, side: Side) -> f64 {
    let slope = if dx.abs() < 1e-12 {
        f64::INFINITY
    } else {
        dy / dx
    };
    calculate_contact_angle(slope, side)
}

/// Folds a rotation in radians into `(-π/2, π/2]`.
#[inline]
pub fn normalize_rotation(rotation: f64) -> f64 {
    use std::f64::consts::{FRAC_PI_2, PI};
    let folded = FRAC_PI_2 - (FRAC_PI_2 - rotation).rem_euclid(PI);
    // rem_euclid may round up to π itself for inputs just past π/2.
    if folded <= -FRAC_PI_2 {
        folded + PI
    } else {
        folded
    }
}

/// Folds an angle in radians into `[-π/4, π/4)`; used when levelling a
/// nearly horizontal baseline.
#[inline]
pub fn fold_quarter_pi(angle: f64) -> f64 {
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
    (angle + FRAC_PI_4).rem_euclid(FRAC_PI_2) - FRAC_PI_4
}
