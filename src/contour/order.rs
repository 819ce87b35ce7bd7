//! Ordering helpers for unstructured boundary point sets.
use crate::types::{Contour, Point2D};
use std::collections::BTreeMap;

/// Greedy nearest-neighbour walk starting at `points[start]`.
///
/// Every point is visited once; ties go to the earliest remaining point.
pub fn nearest_neighbour_path(points: &[Point2D], start: usize) -> Vec<Point2D> {
    if points.is_empty() {
        return Vec::new();
    }
    let start = start.min(points.len() - 1);
    let mut remaining: Vec<Point2D> = points.to_vec();
    let mut path = Vec::with_capacity(points.len());
    let mut current = remaining.remove(start);
    path.push(current);
    while !remaining.is_empty() {
        let mut best = 0usize;
        let mut best_d = f64::INFINITY;
        for (i, p) in remaining.iter().enumerate() {
            let d = p.distance_sq(&current);
            if d < best_d {
                best_d = d;
                best = i;
            }
        }
        current = remaining.remove(best);
        path.push(current);
    }
    path
}

/// Row-key for pixel coordinates; rows are compared on their rounded y.
#[inline]
fn row_key(y: f64) -> i64 {
    y.round() as i64
}

fn extreme_per_row(points: &[Point2D], keep_left: bool) -> Vec<Point2D> {
    let mut rows: BTreeMap<i64, Point2D> = BTreeMap::new();
    for p in points {
        rows.entry(row_key(p.y))
            .and_modify(|best| {
                if (keep_left && p.x < best.x) || (!keep_left && p.x > best.x) {
                    *best = *p;
                }
            })
            .or_insert(*p);
    }
    rows.into_values().collect()
}

/// Minimum-x point of every row, sorted top to bottom.
pub fn leftmost_per_row(points: &[Point2D]) -> Vec<Point2D> {
    extreme_per_row(points, true)
}

/// Maximum-x point of every row, sorted top to bottom.
pub fn rightmost_per_row(points: &[Point2D]) -> Vec<Point2D> {
    extreme_per_row(points, false)
}

/// A drop contour split into the halves either side of the apex column.
#[derive(Clone, Debug)]
pub struct ApexSplit {
    pub apex_x: f64,
    pub apex_y: f64,
    /// Points with `x <= apex_x`, in input order.
    pub left: Vec<Point2D>,
    /// Points with `x > apex_x`, in input order.
    pub right: Vec<Point2D>,
}

/// Split at the apex column: the mid-x of the topmost row of the drop.
pub fn split_at_apex(points: &[Point2D]) -> Option<ApexSplit> {
    let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    if !min_y.is_finite() {
        return None;
    }
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in points.iter().filter(|p| p.y == min_y) {
        lo = lo.min(p.x);
        hi = hi.max(p.x);
    }
    let apex_x = lo + (hi - lo) / 2.0;
    let (left, right): (Vec<Point2D>, Vec<Point2D>) =
        points.iter().copied().partition(|p| p.x <= apex_x);
    Some(ApexSplit {
        apex_x,
        apex_y: min_y,
        left,
        right,
    })
}

/// Order a drop boundary from its bottom-left end, up the left flank, over
/// the apex and down the right flank.
pub fn order_drop_contour(contour: &Contour) -> Contour {
    let Some(split) = split_at_apex(contour.as_slice()) else {
        return contour.clone();
    };
    let start = contour
        .iter()
        .enumerate()
        .filter(|(_, p)| p.x <= split.apex_x)
        .max_by(|(_, a), (_, b)| a.y.total_cmp(&b.y).then(b.x.total_cmp(&a.x)))
        .map(|(i, _)| i)
        .unwrap_or(0);
    Contour::new(nearest_neighbour_path(contour.as_slice(), start))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[[f64; 2]]) -> Vec<Point2D> {
        raw.iter().map(|&p| p.into()).collect()
    }

    #[test]
    fn per_row_extremes() {
        let p = pts(&[[1.0, 2.0], [3.0, 2.0], [2.0, 3.0], [4.0, 3.0], [0.0, 1.0], [5.0, 1.0]]);
        assert_eq!(leftmost_per_row(&p), pts(&[[0.0, 1.0], [1.0, 2.0], [2.0, 3.0]]));
        assert_eq!(rightmost_per_row(&p), pts(&[[5.0, 1.0], [3.0, 2.0], [4.0, 3.0]]));
    }

    #[test]
    fn nearest_neighbour_recovers_a_shuffled_polyline() {
        let ordered: Vec<Point2D> = (0..20).map(|i| Point2D::new(i as f64, 0.0)).collect();
        let mut shuffled = ordered.clone();
        shuffled.swap(3, 17);
        shuffled.swap(5, 11);
        shuffled.swap(0, 9);
        let start = shuffled.iter().position(|p| p.x == 0.0).unwrap();
        assert_eq!(nearest_neighbour_path(&shuffled, start), ordered);
    }

    #[test]
    fn drop_ordering_runs_left_to_right() {
        // Semicircular cap, shuffled.
        let mut cap: Vec<Point2D> = (0..=60)
            .map(|i| {
                let t = std::f64::consts::PI * i as f64 / 60.0;
                Point2D::new(50.0 - 30.0 * t.cos(), 80.0 - 30.0 * t.sin())
            })
            .collect();
        cap.reverse();
        cap.rotate_left(17);
        let ordered = order_drop_contour(&Contour::new(cap));
        assert!(ordered.points[0].x < 25.0);
        assert!(ordered.points[ordered.len() - 1].x > 75.0);
        let split = split_at_apex(ordered.as_slice()).unwrap();
        assert!((split.apex_x - 50.0).abs() < 1e-9);
    }
}
