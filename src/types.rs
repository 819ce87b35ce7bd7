//! Core value types shared by every stage: points, contours, lines, circles
//! and the per-image region description.
use serde::{Deserialize, Serialize};

/// Image-pixel coordinate (y grows downward).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn distance(&self, other: &Point2D) -> f64 {
        self.distance_sq(other).sqrt()
    }

    #[inline]
    pub fn distance_sq(&self, other: &Point2D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    #[inline]
    pub fn midpoint(&self, other: &Point2D) -> Point2D {
        Point2D::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Point2D {
    fn from(p: [f64; 2]) -> Self {
        Point2D::new(p[0], p[1])
    }
}

/// Axis-aligned bounding box in pixel coordinates (inclusive edges).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn contains(&self, p: &Point2D) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    /// Clamp to an image of size `w × h`.
    pub fn clamped(&self, w: usize, h: usize) -> Bounds {
        let max_x = w.saturating_sub(1) as f64;
        let max_y = h.saturating_sub(1) as f64;
        Bounds {
            left: self.left.clamp(0.0, max_x),
            right: self.right.clamp(0.0, max_x),
            top: self.top.clamp(0.0, max_y),
            bottom: self.bottom.clamp(0.0, max_y),
        }
    }
}

/// Ordered sequence of boundary points.
///
/// Consecutive points are neighbours along the traced boundary. The contour
/// may be open or closed; nothing downstream relies on closure.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Contour {
    pub points: Vec<Point2D>,
}

impl Contour {
    pub fn new(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Point2D> {
        self.points.iter()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Point2D] {
        &self.points
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.points.first()?;
        let mut b = Bounds {
            left: first.x,
            right: first.x,
            top: first.y,
            bottom: first.y,
        };
        for p in &self.points[1..] {
            b.left = b.left.min(p.x);
            b.right = b.right.max(p.x);
            b.top = b.top.min(p.y);
            b.bottom = b.bottom.max(p.y);
        }
        Some(b)
    }

    pub fn min_y(&self) -> f64 {
        self.points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min)
    }

    pub fn max_y(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.y)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Index of the point closest to `target`.
    pub fn nearest_index(&self, target: &Point2D) -> Option<usize> {
        self.points
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.distance_sq(target).total_cmp(&b.distance_sq(target)))
            .map(|(i, _)| i)
    }

    /// Index of the first point exactly equal to `target`.
    pub fn position_of(&self, target: &Point2D) -> Option<usize> {
        self.points.iter().position(|p| p == target)
    }

    /// Sum of segment lengths along the sequence; `closed` adds the wrap segment.
    pub fn arc_length(&self, closed: bool) -> f64 {
        arc_length(&self.points, closed)
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Contour {
        Contour::new(
            self.points
                .iter()
                .map(|p| Point2D::new(p.x + dx, p.y + dy))
                .collect(),
        )
    }
}

impl From<Vec<Point2D>> for Contour {
    fn from(points: Vec<Point2D>) -> Self {
        Contour::new(points)
    }
}

impl FromIterator<Point2D> for Contour {
    fn from_iter<T: IntoIterator<Item = Point2D>>(iter: T) -> Self {
        Contour::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Contour {
    type Item = &'a Point2D;
    type IntoIter = std::slice::Iter<'a, Point2D>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

pub fn arc_length(points: &[Point2D], closed: bool) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let open: f64 = points.windows(2).map(|w| w[0].distance(&w[1])).sum();
    if closed {
        open + points[points.len() - 1].distance(&points[0])
    } else {
        open
    }
}

/// Line through two points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub p1: Point2D,
    pub p2: Point2D,
}

/// The substrate line a sessile drop rests on.
pub type Baseline = Line;

impl Line {
    pub const fn new(p1: Point2D, p2: Point2D) -> Self {
        Self { p1, p2 }
    }

    /// dy/dx in image coordinates; `±inf` for vertical lines.
    pub fn slope(&self) -> f64 {
        let dx = self.p2.x - self.p1.x;
        let dy = self.p2.y - self.p1.y;
        if dx == 0.0 {
            if dy >= 0.0 {
                f64::INFINITY
            } else {
                f64::NEG_INFINITY
            }
        } else {
            dy / dx
        }
    }

    /// Direction angle in radians, `atan2(dy, dx)`.
    pub fn angle(&self) -> f64 {
        (self.p2.y - self.p1.y).atan2(self.p2.x - self.p1.x)
    }

    pub fn length(&self) -> f64 {
        self.p1.distance(&self.p2)
    }

    /// y on the infinite line at `x`; `None` for vertical lines.
    pub fn y_at(&self, x: f64) -> Option<f64> {
        let dx = self.p2.x - self.p1.x;
        if dx.abs() < 1e-12 {
            return None;
        }
        let t = (x - self.p1.x) / dx;
        Some(self.p1.y + t * (self.p2.y - self.p1.y))
    }

    pub fn min_y(&self) -> f64 {
        self.p1.y.min(self.p2.y)
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Line {
        Line::new(
            Point2D::new(self.p1.x + dx, self.p1.y + dy),
            Point2D::new(self.p2.x + dx, self.p2.y + dy),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point2D,
    pub radius: f64,
}

impl Circle {
    pub fn top(&self) -> f64 {
        self.center.y - self.radius
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Circle {
        Circle {
            center: Point2D::new(self.center.x + dx, self.center.y + dy),
            radius: self.radius,
        }
    }
}

/// Coarse localisation of the drop found by the region isolator.
///
/// `circle` and `baseline` are expressed in the coordinates of the cropped
/// image; `bounds` is the crop window inside the (tilt-corrected) input.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionInfo {
    pub circle: Option<Circle>,
    pub baseline: Option<Baseline>,
    pub bounds: Bounds,
    pub threshold: u8,
    /// Rotation applied to level the substrate, in degrees (0 when untouched).
    pub tilt_deg: f64,
    /// Row separating the drop (above) from the substrate and its
    /// reflection (below).
    pub split_y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContactPoint {
    pub position: Point2D,
    pub side: Side,
}

impl ContactPoint {
    pub const fn new(position: Point2D, side: Side) -> Self {
        Self { position, side }
    }
}
