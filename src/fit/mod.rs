//! Geometric contact-angle fits.
//!
//! Every fit runs on a [`DropProfile`]: the contour segment between the two
//! contact points, expressed in a frame whose x axis follows the baseline.
//! Local slopes therefore map to contact angles with the same
//! [`calculate_contact_angle`](crate::angle::calculate_contact_angle) rule
//! for every fit kind. Results are reported in image coordinates except
//! where a field says otherwise.
pub mod circle;
pub mod ellipse;
pub mod frame;
pub mod line;
pub mod polynomial;
pub mod tangent;

pub use circle::{fit_circle, kasa_circle, CircleFit};
pub use ellipse::{conic_to_ellipse, fit_conic, fit_ellipse, Ellipse, EllipseFit};
pub use frame::BaselineFrame;
pub use line::{fit_line_orthogonal, LineFit};
pub use polynomial::{fit_polynomial, quadratic_least_squares, PolyAxis, PolynomialFit};
pub use tangent::{fit_tangent, TangentFit};

use crate::angle::normalize_rotation;
use crate::error::DropError;
use crate::types::{Baseline, Circle, Contour, Point2D};
use crate::younglaplace::YoungLaplaceFit;
use log::debug;
use serde::{Deserialize, Serialize};

/// Length of a tangent segment drawn for a fit window.
pub(crate) fn window_extent(points: &[Point2D]) -> f64 {
    match (points.first(), points.last()) {
        (Some(a), Some(b)) => a.distance(b).max(1.0),
        _ => 1.0,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FitKind {
    Tangent,
    Polynomial,
    Circle,
    Ellipse,
    YoungLaplace,
}

impl FitKind {
    /// The fits [`GeometricFitEngine`] runs.
    pub const GEOMETRIC: [FitKind; 4] = [
        FitKind::Tangent,
        FitKind::Polynomial,
        FitKind::Circle,
        FitKind::Ellipse,
    ];

    /// Fewest profile points the fit needs.
    pub fn min_points(self) -> usize {
        match self {
            FitKind::Tangent => 2,
            FitKind::Polynomial | FitKind::Circle => 3,
            FitKind::Ellipse => 6,
            FitKind::YoungLaplace => 5,
        }
    }
}

/// Fit-specific output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "fit", rename_all = "camelCase")]
pub enum FitDetail {
    Tangent(TangentFit),
    Polynomial(PolynomialFit),
    /// `None` when the points admit no circle.
    Circle(Option<CircleFit>),
    /// `None` when the points admit no ellipse.
    Ellipse(Option<EllipseFit>),
    YoungLaplace(Box<YoungLaplaceFit>),
}

/// Contact angles of one fit, in degrees. `NaN` marks a side the fit could
/// not resolve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitResult {
    pub left_angle: f64,
    pub right_angle: f64,
    pub detail: FitDetail,
}

impl FitResult {
    pub fn kind(&self) -> FitKind {
        match self.detail {
            FitDetail::Tangent(_) => FitKind::Tangent,
            FitDetail::Polynomial(_) => FitKind::Polynomial,
            FitDetail::Circle(_) => FitKind::Circle,
            FitDetail::Ellipse(_) => FitKind::Ellipse,
            FitDetail::YoungLaplace(_) => FitKind::YoungLaplace,
        }
    }

    /// Both angles are finite and inside `[0°, 180°]`.
    pub fn is_valid(&self) -> bool {
        [self.left_angle, self.right_angle]
            .iter()
            .all(|a| a.is_finite() && (0.0..=180.0).contains(a))
    }
}

/// Drop boundary between the contact points in the baseline frame.
#[derive(Clone, Debug)]
pub struct DropProfile {
    pub frame: BaselineFrame,
    /// Local points from the left to the right contact point; the baseline
    /// is `y = 0` and the drop lies at `y < 0`.
    pub points: Vec<Point2D>,
}

impl DropProfile {
    /// Profile of `contour` between the points at `left` and `right`.
    ///
    /// On a closed contour both arcs join the contact points; the one lying
    /// higher in the image is the drop. Without a baseline, the baseline
    /// runs through the two contact points.
    pub fn between(
        contour: &Contour,
        left: usize,
        right: usize,
        baseline: Option<&Baseline>,
    ) -> Result<Self, DropError> {
        let pts = contour.as_slice();
        if left >= pts.len() || right >= pts.len() {
            return Err(DropError::InvalidInput(format!(
                "contact index out of range ({left}, {right}) for {} points",
                pts.len()
            )));
        }
        let (lo, hi) = (left.min(right), left.max(right));
        let inner: Vec<Point2D> = pts[lo..=hi].to_vec();
        let mut outer: Vec<Point2D> = pts[hi..].to_vec();
        outer.extend_from_slice(&pts[..=lo]);
        let mean_y = |v: &[Point2D]| v.iter().map(|p| p.y).sum::<f64>() / v.len() as f64;
        let mut path = if outer.len() > 2 && mean_y(&outer) < mean_y(&inner) {
            outer
        } else {
            inner
        };
        if let (Some(a), Some(b)) = (path.first(), path.last()) {
            if a.x > b.x {
                path.reverse();
            }
        }
        let (l, r) = (path[0], path[path.len() - 1]);
        let frame = match baseline {
            Some(line) => BaselineFrame::along(line, project_onto(line, &l)),
            None => BaselineFrame::through(l, r),
        };
        Ok(Self {
            points: frame.points_to_local(&path),
            frame,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

fn project_onto(line: &Baseline, p: &Point2D) -> Point2D {
    let (dx, dy) = (line.p2.x - line.p1.x, line.p2.y - line.p1.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return *p;
    }
    let t = ((p.x - line.p1.x) * dx + (p.y - line.p1.y) * dy) / len_sq;
    Point2D::new(line.p1.x + t * dx, line.p1.y + t * dy)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Points per side for the tangent fit. Pixel edges need a few dozen
    /// points before the curvature term settles.
    pub tangent_window: usize,
    /// Points per side for the polynomial fit.
    pub polynomial_window: usize,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            tangent_window: 40,
            polynomial_window: 30,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct GeometricFitEngine {
    pub options: FitOptions,
}

impl GeometricFitEngine {
    pub fn new(options: FitOptions) -> Self {
        Self { options }
    }

    /// Run one geometric fit. Too few points give `NaN` angles.
    ///
    /// [`FitKind::YoungLaplace`] is not a geometric fit; it yields `NaN`
    /// angles here and is run by [`crate::younglaplace`].
    pub fn fit(&self, kind: FitKind, profile: &DropProfile) -> FitResult {
        let frame = &profile.frame;
        let pts = &profile.points;
        let (left_angle, right_angle, detail) = match kind {
            FitKind::Tangent => {
                let (l, r, mut fit) = fit_tangent(pts, self.options.tangent_window);
                fit.tangent_lines = fit.tangent_lines.map(|t| frame.line_to_image(&t));
                (l, r, FitDetail::Tangent(fit))
            }
            FitKind::Polynomial => {
                let (l, r, mut fit) = fit_polynomial(pts, self.options.polynomial_window);
                fit.tangent_lines = fit.tangent_lines.map(|t| frame.line_to_image(&t));
                (l, r, FitDetail::Polynomial(fit))
            }
            FitKind::Circle => {
                let (l, r, fit) = fit_circle(pts);
                let fit = fit.map(|f| CircleFit {
                    circle: Circle {
                        center: frame.to_image(&f.circle.center),
                        radius: f.circle.radius,
                    },
                    intercepts: f.intercepts.map(|i| i.map(|p| frame.to_image(&p))),
                    rmse: f.rmse,
                });
                (l, r, FitDetail::Circle(fit))
            }
            FitKind::Ellipse => {
                let (l, r, fit) = fit_ellipse(pts);
                let fit = fit.map(|f| EllipseFit {
                    ellipse: Ellipse {
                        center: frame.to_image(&f.ellipse.center),
                        semi_axes: f.ellipse.semi_axes,
                        angle: normalize_rotation(f.ellipse.angle + frame.angle),
                    },
                    conic: f.conic,
                    intercepts: f.intercepts.map(|i| i.map(|p| frame.to_image(&p))),
                });
                (l, r, FitDetail::Ellipse(fit))
            }
            FitKind::YoungLaplace => {
                return FitResult {
                    left_angle: f64::NAN,
                    right_angle: f64::NAN,
                    detail: FitDetail::YoungLaplace(Box::default()),
                };
            }
        };
        debug!(
            "GeometricFitEngine: {kind:?} on {} points -> ({left_angle:.2}, {right_angle:.2})",
            pts.len()
        );
        FitResult {
            left_angle,
            right_angle,
            detail,
        }
    }

    /// Like [`Self::fit`], but too few points is an error.
    pub fn fit_strict(&self, kind: FitKind, profile: &DropProfile) -> Result<FitResult, DropError> {
        let needed = kind.min_points();
        if profile.len() < needed {
            return Err(DropError::InsufficientPoints {
                needed,
                found: profile.len(),
            });
        }
        Ok(self.fit(kind, profile))
    }

    /// Every kind in `kinds`, in order.
    pub fn fit_all(&self, kinds: &[FitKind], profile: &DropProfile) -> Vec<FitResult> {
        kinds.iter().map(|&k| self.fit(k, profile)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Line;
    use approx::assert_abs_diff_eq;

    /// Circle cap of radius 100 whose centre sits `h` below a baseline at
    /// y = 300, sampled from the left contact over the apex, followed by
    /// substrate on the right.
    fn cap(h: f64) -> (Contour, usize, usize) {
        let (cx, base, r) = (200.0, 300.0, 100.0);
        let cy = base + h;
        let half = (r * r - h * h).sqrt();
        let t0 = (-h).atan2(-half);
        let mut t1 = (-h).atan2(half);
        // Sweep over the apex, which sits at t = -π/2.
        if t1 < t0 {
            t1 += 2.0 * std::f64::consts::PI;
        }
        let n = 400;
        let mut pts: Vec<Point2D> = (0..=n)
            .map(|i| {
                let t = t0 + (t1 - t0) * i as f64 / n as f64;
                Point2D::new(cx + r * t.cos(), cy + r * t.sin())
            })
            .collect();
        let right = pts.len() - 1;
        pts.extend((1..30).map(|k| Point2D::new(cx + half + k as f64, base)));
        (Contour::new(pts), 0, right)
    }

    #[test]
    fn all_fits_agree_on_a_circular_cap() {
        let (contour, l, r) = cap(50.0);
        let profile = DropProfile::between(&contour, l, r, None).unwrap();
        let engine = GeometricFitEngine::default();
        for result in engine.fit_all(&FitKind::GEOMETRIC, &profile) {
            let tol = match result.kind() {
                FitKind::Tangent => 4.0,
                FitKind::Polynomial => 1.0,
                _ => 1e-3,
            };
            assert_abs_diff_eq!(result.left_angle, 60.0, epsilon = tol);
            assert_abs_diff_eq!(result.right_angle, 60.0, epsilon = tol);
            assert!(result.is_valid());
        }
        let FitDetail::Circle(Some(c)) = engine.fit(FitKind::Circle, &profile).detail else {
            panic!("circle fit failed");
        };
        assert_abs_diff_eq!(c.circle.center.x, 200.0, epsilon = 1e-6);
        assert_abs_diff_eq!(c.circle.center.y, 350.0, epsilon = 1e-6);
    }

    #[test]
    fn explicit_baseline_sets_the_frame() {
        let (contour, l, r) = cap(-40.0);
        let base = Line::new(Point2D::new(0.0, 300.0), Point2D::new(400.0, 300.0));
        let profile = DropProfile::between(&contour, l, r, Some(&base)).unwrap();
        let res = GeometricFitEngine::default().fit(FitKind::Circle, &profile);
        let expected = 180.0 - (40.0f64 / 100.0).acos().to_degrees();
        assert_abs_diff_eq!(res.left_angle, expected, epsilon = 1e-3);
        assert_abs_diff_eq!(res.right_angle, expected, epsilon = 1e-3);
    }

    #[test]
    fn closed_contour_takes_the_upper_arc() {
        // Square loop: the upper arc from the bottom-left corner to the
        // bottom-right one runs over the top.
        let mut pts: Vec<Point2D> = (0..=10).map(|x| Point2D::new(x as f64, 10.0)).collect();
        pts.extend((0..10).rev().map(|y| Point2D::new(10.0, y as f64)));
        pts.extend((0..10).rev().map(|x| Point2D::new(x as f64, 0.0)));
        pts.extend((1..10).map(|y| Point2D::new(0.0, y as f64)));
        let contour = Contour::new(pts);
        let profile = DropProfile::between(&contour, 0, 10, None).unwrap();
        assert!(profile.points.iter().any(|p| p.y < -5.0));
        assert_abs_diff_eq!(profile.points[0].x, 0.0, epsilon = 1e-12);
        assert!(profile.points.last().unwrap().x > 9.0);
    }

    #[test]
    fn strict_fit_reports_missing_points() {
        let contour = Contour::new(vec![Point2D::new(0.0, 0.0), Point2D::new(5.0, 0.0)]);
        let profile = DropProfile::between(&contour, 0, 1, None).unwrap();
        let engine = GeometricFitEngine::default();
        assert!(matches!(
            engine.fit_strict(FitKind::Circle, &profile),
            Err(DropError::InsufficientPoints { needed: 3, found: 2 })
        ));
        let lax = engine.fit(FitKind::Ellipse, &profile);
        assert!(lax.left_angle.is_nan() && lax.right_angle.is_nan());
        assert!(engine.fit_strict(FitKind::Tangent, &profile).is_ok());
    }
}
