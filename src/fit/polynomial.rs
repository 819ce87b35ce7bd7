//! Quadratic fits near the contact points.
//!
//! Each side is fitted about its contact point, so the linear coefficient is
//! the derivative there. Steep flanks are fitted as `x(y)` instead of `y(x)`.
use crate::angle::calculate_contact_angle;
use crate::types::{Line, Point2D, Side};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// Independent variable of a side polynomial.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PolyAxis {
    /// `y = c0 + c1·(x − x_cp) + c2·(x − x_cp)²`
    YOfX,
    /// `x = c0 + c1·(y − y_cp) + c2·(y − y_cp)²`
    XOfY,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolynomialFit {
    /// `[c0, c1, c2]` per side, in the baseline frame about the contact point.
    pub coeffs: [[f64; 3]; 2],
    pub axes: [PolyAxis; 2],
    pub tangent_lines: [Line; 2],
}

/// Least-squares `v = c0 + c1·u + c2·u²`.
pub fn quadratic_least_squares(u: &[f64], v: &[f64]) -> Option<[f64; 3]> {
    if u.len() < 3 || u.len() != v.len() {
        return None;
    }
    let mut ata = Matrix3::<f64>::zeros();
    let mut atb = Vector3::<f64>::zeros();
    for (&ui, &vi) in u.iter().zip(v) {
        let row = Vector3::new(1.0, ui, ui * ui);
        ata += row * row.transpose();
        atb += row * vi;
    }
    let sol = ata.lu().solve(&atb)?;
    if sol.iter().all(|c| c.is_finite()) {
        Some([sol[0], sol[1], sol[2]])
    } else {
        None
    }
}

fn side_polynomial(window: &[Point2D], side: Side) -> Option<(f64, [f64; 3], PolyAxis, Line)> {
    let cp = *window.first()?;
    let (x_lo, x_hi, y_lo, y_hi) = window.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
        |(a, b, c, d), p| (a.min(p.x), b.max(p.x), c.min(p.y), d.max(p.y)),
    );
    let axis = if y_hi - y_lo > x_hi - x_lo {
        PolyAxis::XOfY
    } else {
        PolyAxis::YOfX
    };
    let (u, v): (Vec<f64>, Vec<f64>) = match axis {
        PolyAxis::YOfX => window.iter().map(|p| (p.x - cp.x, p.y)).unzip(),
        PolyAxis::XOfY => window.iter().map(|p| (p.y - cp.y, p.x)).unzip(),
    };
    let c = quadratic_least_squares(&u, &v)?;
    // Tangent direction at the contact point, pointed up.
    let (mut dx, mut dy) = match axis {
        PolyAxis::YOfX => (1.0, c[1]),
        PolyAxis::XOfY => (c[1], 1.0),
    };
    let slope = match axis {
        PolyAxis::YOfX => c[1],
        PolyAxis::XOfY if c[1] == 0.0 => f64::INFINITY,
        PolyAxis::XOfY => 1.0 / c[1],
    };
    if dy > 0.0 {
        dx = -dx;
        dy = -dy;
    }
    let norm = (dx * dx + dy * dy).sqrt();
    let len = super::window_extent(window);
    let anchor = match axis {
        PolyAxis::YOfX => Point2D::new(cp.x, c[0]),
        PolyAxis::XOfY => Point2D::new(c[0], cp.y),
    };
    let tip = Point2D::new(anchor.x + dx / norm * len, anchor.y + dy / norm * len);
    Some((calculate_contact_angle(slope, side), c, axis, Line::new(anchor, tip)))
}

/// Quadratic fit on a baseline-frame profile (left contact first). Angles
/// are `NaN` when a side has fewer than three points.
pub fn fit_polynomial(profile: &[Point2D], n: usize) -> (f64, f64, PolynomialFit) {
    let n = n.max(3).min(profile.len());
    let left: Vec<Point2D> = profile.iter().take(n).copied().collect();
    let right: Vec<Point2D> = profile.iter().rev().take(n).copied().collect();
    let nan = (f64::NAN, [f64::NAN; 3], PolyAxis::YOfX, Line::default());
    let (la, lc, lx, ll) = side_polynomial(&left, Side::Left).unwrap_or(nan);
    let (ra, rc, rx, rl) = side_polynomial(&right, Side::Right).unwrap_or(nan);
    (
        la,
        ra,
        PolynomialFit {
            coeffs: [lc, rc],
            axes: [lx, rx],
            tangent_lines: [ll, rl],
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn recovers_an_exact_parabola() {
        let u: Vec<f64> = (0..15).map(|i| i as f64 - 4.0).collect();
        let v: Vec<f64> = u.iter().map(|x| 2.0 - 0.5 * x + 0.25 * x * x).collect();
        let c = quadratic_least_squares(&u, &v).unwrap();
        assert_abs_diff_eq!(c[0], 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c[1], -0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(c[2], 0.25, epsilon = 1e-9);
        assert!(quadratic_least_squares(&u[..2], &v[..2]).is_none());
    }

    #[test]
    fn circle_arc_angle_from_derivative() {
        // Circle of radius 100 centred 50 below the baseline: contact angle
        // 60° on both sides.
        let (r, h) = (100.0f64, 50.0f64);
        let half = (r * r - h * h).sqrt();
        let arc = |t: f64| Point2D::new(half - r * t.sin(), h - r * t.cos());
        let t0 = (half / r).asin();
        let steps = 200;
        let profile: Vec<Point2D> = (0..=steps)
            .map(|i| arc(t0 - 2.0 * t0 * i as f64 / steps as f64))
            .collect();
        let (la, ra, fit) = fit_polynomial(&profile, 30);
        assert_abs_diff_eq!(la, 60.0, epsilon = 1.0);
        assert_abs_diff_eq!(ra, 60.0, epsilon = 1.0);
        // The flank near the contact is steeper than 45°.
        assert_eq!(fit.axes, [PolyAxis::XOfY; 2]);
    }
}
