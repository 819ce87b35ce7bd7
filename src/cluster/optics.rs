//! OPTICS ordering with a steepness split of the reachability plot.
//!
//! With no distance cap the ordering is a Prim walk: the next point is always
//! the unprocessed one with the lowest reachability. Clusters are the runs of
//! the ordering separated by steep upward jumps, where the reachability of a
//! point is at least `1 / (1 - xi)` times that of its predecessor.
use crate::types::Point2D;

/// Reachability ordering of the points.
#[derive(Clone, Debug)]
pub struct Reachability {
    /// Point indices in visiting order.
    pub ordering: Vec<usize>,
    /// Reachability of `ordering[i]`; the first entry is infinite.
    pub reachability: Vec<f64>,
}

/// Distance from each point to its `min_samples - 1`-th nearest neighbour.
fn core_distances(points: &[Point2D], min_samples: usize) -> Vec<f64> {
    let k = min_samples.saturating_sub(1).max(1);
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let others = points
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, q)| q.distance(p));
            if k == 1 {
                return others.fold(f64::INFINITY, f64::min);
            }
            let mut d: Vec<f64> = others.collect();
            if d.len() < k {
                return f64::INFINITY;
            }
            let (_, kth, _) = d.select_nth_unstable_by(k - 1, |a, b| a.total_cmp(b));
            *kth
        })
        .collect()
}

pub fn reachability(points: &[Point2D], min_samples: usize) -> Reachability {
    let n = points.len();
    let core = core_distances(points, min_samples);
    let mut reach = vec![f64::INFINITY; n];
    let mut processed = vec![false; n];
    let mut ordering = Vec::with_capacity(n);
    let mut reach_ordered = Vec::with_capacity(n);

    let mut current = 0usize;
    for _ in 0..n {
        processed[current] = true;
        ordering.push(current);
        reach_ordered.push(reach[current]);
        let p = points[current];
        let mut next: Option<usize> = None;
        for j in 0..n {
            if processed[j] {
                continue;
            }
            let r = core[current].max(points[j].distance(&p));
            if r < reach[j] {
                reach[j] = r;
            }
            match next {
                Some(k) if reach[k] <= reach[j] => {}
                _ => next = Some(j),
            }
        }
        match next {
            Some(k) => current = k,
            None => break,
        }
    }
    Reachability {
        ordering,
        reachability: reach_ordered,
    }
}

/// Label every point by splitting the ordering at steep upward jumps.
///
/// Runs shorter than `min_cluster_size` are noise (`None`).
pub fn optics_xi(
    points: &[Point2D],
    xi: f64,
    min_samples: usize,
    min_cluster_size: usize,
) -> Vec<Option<usize>> {
    let n = points.len();
    let mut labels = vec![None; n];
    if n == 0 {
        return labels;
    }
    let plot = reachability(points, min_samples);
    let keep = (1.0 - xi).clamp(0.0, 1.0);

    let r = &plot.reachability;
    let mut runs: Vec<(usize, usize)> = Vec::new();
    let mut start = 0usize;
    for i in 1..plot.ordering.len() {
        let cur = r[i];
        let steep_from_prev = r[i - 1].is_finite() && r[i - 1] > 0.0 && r[i - 1] <= cur * keep;
        // A point reached across a gap that opens onto a dense run starts it.
        let steep_into_next = r
            .get(i + 1)
            .is_some_and(|&next| next > 0.0 && next <= cur * keep);
        if steep_from_prev || steep_into_next {
            runs.push((start, i));
            start = i;
        }
    }
    runs.push((start, plot.ordering.len()));

    let mut label = 0usize;
    for (a, b) in runs {
        if b - a >= min_cluster_size {
            for &idx in &plot.ordering[a..b] {
                labels[idx] = Some(label);
            }
            label += 1;
        }
    }
    labels
}
