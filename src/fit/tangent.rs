//! Tangents at the contact points.
//!
//! A chord through the points next to a contact point leans towards the
//! apex by half the arc it spans. Offsets from the chord are therefore fitted
//! as a quadratic of the position along it, and the tangent is the derivative
//! of that quadratic at the contact point.
use super::line::fit_line_orthogonal;
use super::polynomial::quadratic_least_squares;
use crate::angle::contact_angle_from_direction;
use crate::types::{Line, Point2D, Side};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TangentFit {
    /// Left and right tangent segments, starting at the contact points.
    pub tangent_lines: [Line; 2],
}

/// Tangent at `window[0]` from the points of `window` (contact point first).
/// Returns the contact angle and the tangent segment in the same frame.
pub(crate) fn side_tangent(window: &[Point2D], side: Side) -> Option<(f64, Line)> {
    let chord = fit_line_orthogonal(window)?;
    let cp = window[0];
    let [ux, uy] = chord.direction;
    let (u, v): (Vec<f64>, Vec<f64>) = window
        .iter()
        .map(|p| {
            let (px, py) = (p.x - cp.x, p.y - cp.y);
            (px * ux + py * uy, py * ux - px * uy)
        })
        .unzip();
    // Two points, or a window with no spread along the chord: keep the chord.
    let (mut dx, mut dy) = match quadratic_least_squares(&u, &v) {
        Some(c) => (ux - c[1] * uy, uy + c[1] * ux),
        None => (ux, uy),
    };
    let norm = dx.hypot(dy);
    dx /= norm;
    dy /= norm;
    // Point the segment up, away from the substrate.
    if dy > 0.0 || (dy == 0.0 && matches!(side, Side::Right) == (dx > 0.0)) {
        dx = -dx;
        dy = -dy;
    }
    let len = super::window_extent(window);
    let angle = contact_angle_from_direction(dx, dy, side);
    let tip = Point2D::new(cp.x + dx * len, cp.y + dy * len);
    Some((angle, Line::new(cp, tip)))
}

/// Tangent fit on a baseline-frame profile running from the left to the
/// right contact point. Angles are `NaN` when a side has fewer than two
/// points.
pub fn fit_tangent(profile: &[Point2D], n: usize) -> (f64, f64, TangentFit) {
    let n = n.max(2).min(profile.len());
    let left: Vec<Point2D> = profile.iter().take(n).copied().collect();
    let right: Vec<Point2D> = profile.iter().rev().take(n).copied().collect();
    let (la, ll) = side_tangent(&left, Side::Left).unwrap_or((f64::NAN, Line::default()));
    let (ra, rl) = side_tangent(&right, Side::Right).unwrap_or((f64::NAN, Line::default()));
    (
        la,
        ra,
        TangentFit {
            tangent_lines: [ll, rl],
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn wedge_profile_gives_exact_angles() {
        // 60° on the left; the right flank leans outward for 120°.
        let (c, s) = (60f64.to_radians().cos(), 60f64.to_radians().sin());
        let mut profile: Vec<Point2D> = (0..20)
            .map(|k| Point2D::new(k as f64 * c, -(k as f64) * s))
            .collect();
        profile.extend(
            (0..20)
                .rev()
                .map(|k| Point2D::new(40.0 + k as f64 * c, -(k as f64) * s)),
        );
        let (la, ra, fit) = fit_tangent(&profile, 8);
        assert_abs_diff_eq!(la, 60.0, epsilon = 1e-6);
        assert_abs_diff_eq!(ra, 120.0, epsilon = 1e-6);
        assert!(fit.tangent_lines[0].p2.y < fit.tangent_lines[0].p1.y);
    }

    /// Left flank of a binary-rendered cap on the baseline `y = 0`, from the
    /// contact row up. Each row contributes its first pixel inside the circle;
    /// a horizontal step lands on the row whose edge reaches further out.
    fn pixel_flank(radius: f64, angle_deg: f64, rows: usize) -> Vec<Point2D> {
        let cy = radius * angle_deg.to_radians().cos();
        let mut pts: Vec<Point2D> = Vec::new();
        for k in 0..rows {
            let y = -(k as f64);
            let half_sq = radius * radius - (y - cy).powi(2);
            if half_sq < 0.0 {
                break;
            }
            let x = (0.3 - half_sq.sqrt()).ceil();
            if let Some(prev) = pts.last().copied() {
                if x < prev.x - 1.0 {
                    let mut f = prev.x - 1.0;
                    while f > x {
                        pts.push(Point2D::new(f, y));
                        f -= 1.0;
                    }
                } else if x > prev.x + 1.0 {
                    let mut f = prev.x + 1.0;
                    while f < x {
                        pts.push(Point2D::new(f, prev.y));
                        f += 1.0;
                    }
                }
            }
            pts.push(Point2D::new(x, y));
        }
        pts
    }

    #[test]
    fn pixel_edges_give_the_true_angle() {
        for (radius, angle) in [(100.0, 60.0), (100.0, 120.0), (150.0, 45.0), (150.0, 101.5)] {
            let flank = pixel_flank(radius, angle, 80);
            let window = &flank[..40];
            let (fitted, _) = side_tangent(window, Side::Left).unwrap();
            assert_abs_diff_eq!(fitted, angle, epsilon = 1.0);
            // The chord over the same window leans towards the apex.
            let chord = fit_line_orthogonal(window).unwrap();
            let chord_angle = contact_angle_from_direction(
                chord.direction[0],
                chord.direction[1],
                Side::Left,
            );
            assert!(angle - chord_angle > 5.0, "r={radius} chord={chord_angle}");
        }
    }

    #[test]
    fn single_point_gives_nan() {
        let (la, ra, _) = fit_tangent(&[Point2D::new(0.0, 0.0)], 10);
        assert!(la.is_nan() && ra.is_nan());
    }
}
