//! Baseline-aligned coordinate frame.
use crate::types::{Line, Point2D};

/// Rigid frame whose x axis runs along the substrate.
///
/// The origin sits on the left contact point, so the baseline is `y = 0`.
/// The y axis keeps the image convention (downward), which keeps
/// [`crate::angle::calculate_contact_angle`] valid on local slopes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BaselineFrame {
    pub origin: Point2D,
    /// Baseline direction in the image, radians.
    pub angle: f64,
}

impl BaselineFrame {
    /// Frame through two contact points.
    pub fn through(left: Point2D, right: Point2D) -> Self {
        let angle = if left == right {
            0.0
        } else {
            (right.y - left.y).atan2(right.x - left.x)
        };
        Self {
            origin: left,
            angle,
        }
    }

    /// Frame along an explicit baseline, anchored at `origin`.
    pub fn along(line: &Line, origin: Point2D) -> Self {
        let mut angle = line.angle();
        // Keep the x axis pointing right.
        if angle.cos() < 0.0 {
            angle -= std::f64::consts::PI.copysign(angle);
        }
        Self { origin, angle }
    }

    pub fn to_local(&self, p: &Point2D) -> Point2D {
        let (s, c) = self.angle.sin_cos();
        let (dx, dy) = (p.x - self.origin.x, p.y - self.origin.y);
        Point2D::new(c * dx + s * dy, -s * dx + c * dy)
    }

    pub fn to_image(&self, q: &Point2D) -> Point2D {
        let (s, c) = self.angle.sin_cos();
        Point2D::new(
            self.origin.x + c * q.x - s * q.y,
            self.origin.y + s * q.x + c * q.y,
        )
    }

    pub fn line_to_image(&self, line: &Line) -> Line {
        Line::new(self.to_image(&line.p1), self.to_image(&line.p2))
    }

    pub fn points_to_local(&self, points: &[Point2D]) -> Vec<Point2D> {
        points.iter().map(|p| self.to_local(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn contact_points_land_on_the_local_axis() {
        let (l, r) = (Point2D::new(10.0, 50.0), Point2D::new(110.0, 60.0));
        let f = BaselineFrame::through(l, r);
        let lr = f.to_local(&r);
        assert_abs_diff_eq!(lr.y, 0.0, epsilon = 1e-9);
        assert!(lr.x > 0.0);
        let p = Point2D::new(42.0, 17.0);
        let back = f.to_image(&f.to_local(&p));
        assert_abs_diff_eq!(back.x, p.x, epsilon = 1e-9);
        assert_abs_diff_eq!(back.y, p.y, epsilon = 1e-9);
    }

    #[test]
    fn reversed_baseline_points_right() {
        let line = Line::new(Point2D::new(100.0, 5.0), Point2D::new(0.0, 5.0));
        let f = BaselineFrame::along(&line, Point2D::new(0.0, 5.0));
        assert_abs_diff_eq!(f.angle, 0.0, epsilon = 1e-12);
    }
}
