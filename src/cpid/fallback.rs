//! Contact points of short contours: the innermost points of the bottom
//! band of each half drop.
use crate::types::Point2D;

/// Fraction of the height at the top used to place the apex column.
const TOP_BAND: f64 = 0.9;
/// Fraction of the height at the bottom searched for contacts.
const BOTTOM_BAND: f64 = 0.2;

/// `[left, right]` contact points, or `None` when either half has no points
/// in the bottom band.
pub fn static_hydrophobic(points: &[Point2D]) -> Option<[Point2D; 2]> {
    let top = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let bottom = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
    if !top.is_finite() {
        return None;
    }
    let span = bottom - top;

    let upper_limit = bottom - span * (1.0 - TOP_BAND);
    let (lo, hi) = points
        .iter()
        .filter(|p| p.y < upper_limit)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.x), hi.max(p.x))
        });
    // A flat contour has no upper part; split at the middle of everything.
    let x_apex = if lo.is_finite() {
        (lo + hi) / 2.0
    } else {
        let (lo, hi) = points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.x), hi.max(p.x))
            });
        (lo + hi) / 2.0
    };

    let lower_limit = bottom - span * BOTTOM_BAND;
    let in_band = |p: &&Point2D| p.y > lower_limit || span == 0.0;
    let left: Vec<Point2D> = points
        .iter()
        .filter(|p| p.x < x_apex)
        .filter(in_band)
        .copied()
        .collect();
    let right: Vec<Point2D> = points
        .iter()
        .filter(|p| p.x >= x_apex)
        .filter(in_band)
        .copied()
        .collect();

    // Highest point of the innermost column.
    let innermost = |half: &[Point2D], pick_max: bool| -> Option<Point2D> {
        let x = half
            .iter()
            .map(|p| p.x)
            .reduce(|a, b| if pick_max { a.max(b) } else { a.min(b) })?;
        let y = half
            .iter()
            .filter(|p| p.x == x)
            .map(|p| p.y)
            .fold(f64::INFINITY, f64::min);
        Some(Point2D::new(x, y))
    };
    Some([innermost(&left, true)?, innermost(&right, false)?])
}
