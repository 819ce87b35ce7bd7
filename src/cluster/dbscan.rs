//! Density clustering with a fixed neighbourhood radius.
use crate::types::Point2D;
use std::collections::{HashMap, VecDeque};

/// Uniform grid over the points with cell size `eps`, so a radius query only
/// inspects the 3×3 block of cells around the query.
pub(crate) struct GridIndex {
    cell: f64,
    cells: HashMap<(i64, i64), Vec<usize>>,
}

impl GridIndex {
    pub(crate) fn build(points: &[Point2D], cell: f64) -> Self {
        let cell = cell.max(1e-9);
        let mut cells: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
        for (i, p) in points.iter().enumerate() {
            cells.entry(Self::key(p, cell)).or_default().push(i);
        }
        Self { cell, cells }
    }

    #[inline]
    fn key(p: &Point2D, cell: f64) -> (i64, i64) {
        ((p.x / cell).floor() as i64, (p.y / cell).floor() as i64)
    }

    /// Indices of all points within `radius` of `points[idx]` (itself included).
    pub(crate) fn within(&self, points: &[Point2D], idx: usize, radius: f64) -> Vec<usize> {
        let p = &points[idx];
        let (cx, cy) = Self::key(p, self.cell);
        let r2 = radius * radius;
        let mut out = Vec::new();
        for dy in -1..=1 {
            for dx in -1..=1 {
                if let Some(bucket) = self.cells.get(&(cx + dx, cy + dy)) {
                    out.extend(
                        bucket
                            .iter()
                            .copied()
                            .filter(|&j| points[j].distance_sq(p) <= r2),
                    );
                }
            }
        }
        out
    }
}

/// Label every point with its cluster index, `None` for noise.
///
/// A point is a core point when at least `min_samples` points (itself
/// included) lie within `eps`.
pub fn dbscan(points: &[Point2D], eps: f64, min_samples: usize) -> Vec<Option<usize>> {
    let n = points.len();
    let mut labels: Vec<Option<usize>> = vec![None; n];
    let mut visited = vec![false; n];
    let index = GridIndex::build(points, eps);
    let mut next_label = 0usize;

    for i in 0..n {
        if visited[i] {
            continue;
        }
        visited[i] = true;
        let neighbours = index.within(points, i, eps);
        if neighbours.len() < min_samples {
            continue;
        }
        let label = next_label;
        next_label += 1;
        labels[i] = Some(label);

        let mut queue: VecDeque<usize> = neighbours.into_iter().collect();
        while let Some(j) = queue.pop_front() {
            if labels[j].is_none() {
                labels[j] = Some(label);
            }
            if visited[j] {
                continue;
            }
            visited[j] = true;
            let nbrs = index.within(points, j, eps);
            if nbrs.len() >= min_samples {
                queue.extend(nbrs.into_iter().filter(|&k| !visited[k] || labels[k].is_none()));
            }
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_blobs_and_an_outlier() {
        let mut pts: Vec<Point2D> = (0..10).map(|i| Point2D::new(i as f64, 0.0)).collect();
        pts.extend((0..6).map(|i| Point2D::new(50.0 + i as f64, 20.0)));
        pts.push(Point2D::new(100.0, 100.0));
        let labels = dbscan(&pts, 2.0, 2);
        assert!(labels[..10].iter().all(|l| *l == Some(0)));
        assert!(labels[10..16].iter().all(|l| *l == Some(1)));
        assert_eq!(labels[16], None);
    }
}
