//! Direct least-squares ellipse fit (Halíř–Flusser).
//!
//! The conic `A·x² + B·xy + C·y² + D·x + E·y + F = 0` is fitted on
//! normalised points under the ellipse constraint `4AC − B² > 0`, then mapped
//! back to the input frame. Contact angles come from the implicit tangent at
//! the intersections with `y = 0`.
use crate::angle::{calculate_contact_angle, normalize_rotation};
use crate::types::{Point2D, Side};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ellipse {
    pub center: Point2D,
    /// Major then minor semi-axis.
    pub semi_axes: [f64; 2],
    /// Orientation of the major axis in `(-π/2, π/2]`, radians.
    pub angle: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EllipseFit {
    pub ellipse: Ellipse,
    /// `[A, B, C, D, E, F]`.
    pub conic: [f64; 6],
    pub intercepts: Option<[Point2D; 2]>,
}

/// Null vector of a rank-2 3×3 matrix from the best-conditioned row pair.
fn null_vector(m: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let rows = [
        m.row(0).transpose(),
        m.row(1).transpose(),
        m.row(2).transpose(),
    ];
    [(0, 1), (0, 2), (1, 2)]
        .iter()
        .map(|&(i, j)| rows[i].cross(&rows[j]))
        .max_by(|a, b| a.norm().total_cmp(&b.norm()))
        .filter(|v| v.norm() > 0.0)
}

/// Conic coefficients of the best-fitting ellipse.
pub fn fit_conic(points: &[Point2D]) -> Option<[f64; 6]> {
    if points.len() < 6 {
        return None;
    }
    let n = points.len() as f64;
    let mx = points.iter().map(|p| p.x).sum::<f64>() / n;
    let my = points.iter().map(|p| p.y).sum::<f64>() / n;
    let spread = (points
        .iter()
        .map(|p| (p.x - mx).powi(2) + (p.y - my).powi(2))
        .sum::<f64>()
        / n)
        .sqrt();
    if !(spread > 0.0) {
        return None;
    }
    let s = spread / std::f64::consts::SQRT_2;

    let mut s1 = Matrix3::<f64>::zeros();
    let mut s2 = Matrix3::<f64>::zeros();
    let mut s3 = Matrix3::<f64>::zeros();
    for p in points {
        let (x, y) = ((p.x - mx) / s, (p.y - my) / s);
        let d1 = Vector3::new(x * x, x * y, y * y);
        let d2 = Vector3::new(x, y, 1.0);
        s1 += d1 * d1.transpose();
        s2 += d1 * d2.transpose();
        s3 += d2 * d2.transpose();
    }
    let t = -s3.try_inverse()? * s2.transpose();
    let m = s1 + s2 * t;
    // C1⁻¹·M for the constraint matrix C1 = [[0, 0, 2], [0, -1, 0], [2, 0, 0]].
    let reduced = Matrix3::from_rows(&[m.row(2) * 0.5, m.row(1) * -1.0, m.row(0) * 0.5]);

    let mut best: Option<(f64, Vector3<f64>)> = None;
    for lambda in reduced.complex_eigenvalues().iter() {
        if lambda.im.abs() > 1e-9 * (1.0 + lambda.re.abs()) {
            continue;
        }
        let shifted = reduced - Matrix3::identity() * lambda.re;
        let Some(v) = null_vector(&shifted) else {
            continue;
        };
        if 4.0 * v[0] * v[2] - v[1] * v[1] <= 0.0 {
            continue;
        }
        if best.map_or(true, |(l, _)| lambda.re.abs() < l) {
            best = Some((lambda.re.abs(), v));
        }
    }
    let (_, a1) = best?;
    let a2 = t * a1;
    let [a, b, c] = [a1[0], a1[1], a1[2]];
    let [d, e, f] = [a2[0], a2[1], a2[2]];

    let s_sq = s * s;
    let conic = [
        a / s_sq,
        b / s_sq,
        c / s_sq,
        (-2.0 * a * mx - b * my) / s_sq + d / s,
        (-2.0 * c * my - b * mx) / s_sq + e / s,
        (a * mx * mx + b * mx * my + c * my * my) / s_sq - (d * mx + e * my) / s + f,
    ];
    conic.iter().all(|v| v.is_finite()).then_some(conic)
}

/// Geometric parameters of an ellipse conic.
pub fn conic_to_ellipse(conic: &[f64; 6]) -> Option<Ellipse> {
    let [a, b, c, d, e, f] = *conic;
    let det = 4.0 * a * c - b * b;
    if det <= 0.0 {
        return None;
    }
    let cx = (b * e - 2.0 * c * d) / det;
    let cy = (b * d - 2.0 * a * e) / det;
    let f0 = f + (d * cx + e * cy) / 2.0;
    let angle = 0.5 * b.atan2(a - c);
    let (sn, cs) = angle.sin_cos();
    let l1 = a * cs * cs + b * cs * sn + c * sn * sn;
    let l2 = a * sn * sn - b * cs * sn + c * cs * cs;
    let (r1, r2) = (-f0 / l1, -f0 / l2);
    if !(r1 > 0.0 && r2 > 0.0) {
        return None;
    }
    // Report the major axis first.
    let (semi_axes, angle) = if r1 >= r2 {
        ([r1.sqrt(), r2.sqrt()], angle)
    } else {
        ([r2.sqrt(), r1.sqrt()], angle + FRAC_PI_2)
    };
    Some(Ellipse {
        center: Point2D::new(cx, cy),
        semi_axes,
        angle: normalize_rotation(angle),
    })
}

/// Ellipse fit on a baseline-frame profile, where the baseline is `y = 0`.
///
/// Angles are `NaN` when the fit fails or the ellipse misses the baseline.
pub fn fit_ellipse(profile: &[Point2D]) -> (f64, f64, Option<EllipseFit>) {
    let Some(conic) = fit_conic(profile) else {
        return (f64::NAN, f64::NAN, None);
    };
    let Some(ellipse) = conic_to_ellipse(&conic) else {
        return (f64::NAN, f64::NAN, None);
    };
    let [a, b, _, d, e, f] = conic;
    let disc = d * d - 4.0 * a * f;
    if disc < 0.0 || a == 0.0 {
        let fit = EllipseFit {
            ellipse,
            conic,
            intercepts: None,
        };
        return (f64::NAN, f64::NAN, Some(fit));
    }
    let root = disc.sqrt();
    let (x1, x2) = ((-d - root) / (2.0 * a), (-d + root) / (2.0 * a));
    let (xl, xr) = (x1.min(x2), x1.max(x2));
    let slope = |x: f64| {
        let den = b * x + e;
        if den == 0.0 {
            f64::INFINITY
        } else {
            -(2.0 * a * x + d) / den
        }
    };
    let left = calculate_contact_angle(slope(xl), Side::Left);
    let right = calculate_contact_angle(slope(xr), Side::Right);
    let fit = EllipseFit {
        ellipse,
        conic,
        intercepts: Some([Point2D::new(xl, 0.0), Point2D::new(xr, 0.0)]),
    };
    (left, right, Some(fit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn ellipse_points(e: &Ellipse, from: f64, to: f64, n: usize) -> Vec<Point2D> {
        let (sn, cs) = e.angle.sin_cos();
        (0..n)
            .map(|i| {
                let t = from + (to - from) * i as f64 / (n - 1) as f64;
                let (u, v) = (e.semi_axes[0] * t.cos(), e.semi_axes[1] * t.sin());
                Point2D::new(e.center.x + cs * u - sn * v, e.center.y + sn * u + cs * v)
            })
            .collect()
    }

    #[test]
    fn recovers_an_exact_ellipse() {
        let truth = Ellipse {
            center: Point2D::new(100.0, 50.0),
            semi_axes: [80.0, 40.0],
            angle: 0.3,
        };
        let pts = ellipse_points(&truth, 0.0, 5.0, 80);
        let fit = conic_to_ellipse(&fit_conic(&pts).unwrap()).unwrap();
        assert_abs_diff_eq!(fit.center.x, 100.0, epsilon = 1e-4);
        assert_abs_diff_eq!(fit.center.y, 50.0, epsilon = 1e-4);
        assert_abs_diff_eq!(fit.semi_axes[0], 80.0, epsilon = 1e-4);
        assert_abs_diff_eq!(fit.semi_axes[1], 40.0, epsilon = 1e-4);
        assert_abs_diff_eq!(fit.angle, 0.3, epsilon = 1e-4);
    }

    #[test]
    fn contact_angles_of_a_truncated_ellipse() {
        // Axis-aligned, centred 20 below the baseline: meets y = 0 at
        // x = ±60·cos(π/6) with slope x / 45.
        let truth = Ellipse {
            center: Point2D::new(0.0, 20.0),
            semi_axes: [60.0, 40.0],
            angle: 0.0,
        };
        let profile = ellipse_points(&truth, -5.0 * PI / 6.0, -PI / 6.0, 150);
        let (la, ra, fit) = fit_ellipse(&profile);
        let xr = 60.0 * (PI / 6.0).cos();
        let expected = (xr / 45.0).atan().to_degrees();
        assert_abs_diff_eq!(la, expected, epsilon = 1e-4);
        assert_abs_diff_eq!(ra, expected, epsilon = 1e-4);
        let [l, r] = fit.unwrap().intercepts.unwrap();
        assert_abs_diff_eq!(l.x, -xr, epsilon = 1e-4);
        assert_abs_diff_eq!(r.x, xr, epsilon = 1e-4);
    }

    #[test]
    fn collinear_points_are_rejected() {
        let pts: Vec<Point2D> = (0..10).map(|i| Point2D::new(i as f64, 2.0)).collect();
        let (la, ra, fit) = fit_ellipse(&pts);
        assert!(la.is_nan() && ra.is_nan() && fit.is_none());
    }
}
