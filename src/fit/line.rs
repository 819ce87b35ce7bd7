//! Orthogonal-distance line fitting.
use crate::types::{Line, Point2D};

/// Result of a total least squares line fit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineFit {
    /// dy/dx; `+inf` for vertical lines.
    pub slope: f64,
    /// y-intercept, or the mean x for vertical lines.
    pub intercept: f64,
    /// Root mean square of the perpendicular distances.
    pub rmse: f64,
    pub centroid: Point2D,
    /// Unit direction of the line.
    pub direction: [f64; 2],
}

impl LineFit {
    /// Segment of the fitted line spanning `half_len` either side of the
    /// centroid.
    pub fn to_line(&self, half_len: f64) -> Line {
        let [dx, dy] = self.direction;
        Line::new(
            Point2D::new(
                self.centroid.x - dx * half_len,
                self.centroid.y - dy * half_len,
            ),
            Point2D::new(
                self.centroid.x + dx * half_len,
                self.centroid.y + dy * half_len,
            ),
        )
    }
}

/// Fit a line minimising perpendicular distances (principal axis of the
/// point cloud). Returns `None` for fewer than two points.
pub fn fit_line_orthogonal(points: &[Point2D]) -> Option<LineFit> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let (mx, my) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    let (mx, my) = (mx / n, my / n);
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for p in points {
        let (dx, dy) = (p.x - mx, p.y - my);
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    let (sxx, syy, sxy) = (sxx / n, syy / n, sxy / n);
    let centroid = Point2D::new(mx, my);

    if sxx.sqrt() < 1e-6 {
        return Some(LineFit {
            slope: f64::INFINITY,
            intercept: mx,
            rmse: 0.0,
            centroid,
            direction: [0.0, 1.0],
        });
    }

    let half_tr = 0.5 * (sxx + syy);
    let disc = (0.25 * (sxx - syy) * (sxx - syy) + sxy * sxy).sqrt();
    let lambda_min = (half_tr - disc).max(0.0);
    let theta = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    let (s, c) = theta.sin_cos();
    let (slope, intercept) = if c.abs() < 1e-12 {
        (f64::INFINITY, mx)
    } else {
        let m = s / c;
        (m, my - m * mx)
    };
    Some(LineFit {
        slope,
        intercept,
        rmse: lambda_min.sqrt(),
        centroid,
        direction: [c, s],
    })
}
