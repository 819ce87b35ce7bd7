//! Algebraic (Kåsa) circle fit of the drop profile.
use crate::angle::calculate_contact_angle;
use crate::types::{Circle, Point2D, Side};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleFit {
    /// Fitted circle, in the same frame as the input profile.
    pub circle: Circle,
    /// Intersections with the baseline, `None` when the circle misses it.
    pub intercepts: Option<[Point2D; 2]>,
    /// Root-mean-square radial residual.
    pub rmse: f64,
}

/// Least-squares circle minimising `Σ (x² + y² + D·x + E·y + F)²`.
///
/// Points are centred first to keep the normal equations well conditioned.
pub fn kasa_circle(points: &[Point2D]) -> Option<Circle> {
    if points.len() < 3 {
        return None;
    }
    let n = points.len() as f64;
    let mx = points.iter().map(|p| p.x).sum::<f64>() / n;
    let my = points.iter().map(|p| p.y).sum::<f64>() / n;
    let mut ata = Matrix3::<f64>::zeros();
    let mut atb = Vector3::<f64>::zeros();
    for p in points {
        let (x, y) = (p.x - mx, p.y - my);
        let row = Vector3::new(x, y, 1.0);
        ata += row * row.transpose();
        atb -= row * (x * x + y * y);
    }
    let sol = ata.lu().solve(&atb)?;
    let (cx, cy) = (-sol[0] / 2.0, -sol[1] / 2.0);
    let r2 = cx * cx + cy * cy - sol[2];
    if !(r2 > 0.0) || !r2.is_finite() {
        return None;
    }
    Some(Circle {
        center: Point2D::new(cx + mx, cy + my),
        radius: r2.sqrt(),
    })
}

/// Circle fit on a baseline-frame profile, where the baseline is `y = 0`.
///
/// Angles are `NaN` when the fit fails or the circle does not reach the
/// baseline.
pub fn fit_circle(profile: &[Point2D]) -> (f64, f64, Option<CircleFit>) {
    let Some(circle) = kasa_circle(profile) else {
        return (f64::NAN, f64::NAN, None);
    };
    let rmse = (profile
        .iter()
        .map(|p| (p.distance(&circle.center) - circle.radius).powi(2))
        .sum::<f64>()
        / profile.len() as f64)
        .sqrt();
    let (cx, cy, r) = (circle.center.x, circle.center.y, circle.radius);
    let disc = r * r - cy * cy;
    if disc < 0.0 {
        return (
            f64::NAN,
            f64::NAN,
            Some(CircleFit {
                circle,
                intercepts: None,
                rmse,
            }),
        );
    }
    let half = disc.sqrt();
    let (xl, xr) = (cx - half, cx + half);
    // Tangent slope of the circle at (x, 0) is (x − cx) / cy.
    let slope = |x: f64| {
        if cy == 0.0 {
            f64::INFINITY
        } else {
            (x - cx) / cy
        }
    };
    let left = calculate_contact_angle(slope(xl), Side::Left);
    let right = calculate_contact_angle(slope(xr), Side::Right);
    (
        left,
        right,
        Some(CircleFit {
            circle,
            intercepts: Some([Point2D::new(xl, 0.0), Point2D::new(xr, 0.0)]),
            rmse,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn arc(cx: f64, cy: f64, r: f64, from: f64, to: f64, n: usize) -> Vec<Point2D> {
        (0..n)
            .map(|i| {
                let t = from + (to - from) * i as f64 / (n - 1) as f64;
                Point2D::new(cx + r * t.cos(), cy + r * t.sin())
            })
            .collect()
    }

    #[test]
    fn recovers_an_exact_circle() {
        let pts = arc(320.0, 180.0, 75.0, 0.3, 2.8, 60);
        let c = kasa_circle(&pts).unwrap();
        assert_relative_eq!(c.center.x, 320.0, max_relative = 1e-3);
        assert_relative_eq!(c.center.y, 180.0, max_relative = 1e-3);
        assert_relative_eq!(c.radius, 75.0, max_relative = 1e-3);
    }

    #[test]
    fn contact_angles_of_a_cap() {
        // Centre 50 below the baseline (y down), radius 100: 60° both sides.
        let half = (100.0f64 * 100.0 - 50.0 * 50.0).sqrt();
        let start = (-50.0f64).atan2(-half);
        let end = (-50.0f64).atan2(half);
        let profile = arc(0.0, 50.0, 100.0, start, end, 120);
        let (la, ra, fit) = fit_circle(&profile);
        let fit = fit.unwrap();
        assert_relative_eq!(la, 60.0, epsilon = 1e-6);
        assert_relative_eq!(ra, 60.0, epsilon = 1e-6);
        let [l, r] = fit.intercepts.unwrap();
        assert_relative_eq!(l.x, -half, epsilon = 1e-6);
        assert_relative_eq!(r.x, half, epsilon = 1e-6);
    }

    #[test]
    fn circle_above_the_baseline_has_no_angle() {
        let pts = arc(0.0, -200.0, 50.0, 0.0, 6.0, 40);
        let (la, ra, fit) = fit_circle(&pts);
        assert!(la.is_nan() && ra.is_nan());
        assert!(fit.unwrap().intercepts.is_none());
    }
}
