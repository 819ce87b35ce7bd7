//! Local linear fit refinement of contact points.
//!
//! Each flank is ordered from the apex outward and a window of `n` points is
//! slid along it. The contact point shows up as a spike in the fit error
//! (the boundary kinks where drop meets substrate) or, on reflective
//! substrates, as a flat gradient changing sign where the drop meets its
//! mirror image.
use crate::contour::{nearest_neighbour_path, split_at_apex};
use crate::fit::line::fit_line_orthogonal;
use crate::signal::{find_peaks, PeakCriteria};
use crate::types::Point2D;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LfitOptions {
    /// Smallest window accepted.
    pub min_window: usize,
    /// RMSE peak height as a fraction of the largest RMSE.
    pub peak_height_frac: f64,
    pub peak_prominence: f64,
    pub peak_width: f64,
    /// Gradients below this fraction of the gradient range count as flat.
    pub flat_gradient_frac: f64,
    /// Largest RMSE jump to a neighbour, as a fraction of the RMSE range.
    pub rmse_jump_frac: f64,
    /// Gradients at or below this magnitude survive the jump filter.
    pub shallow_gradient: f64,
    /// Leading fraction of the flank (apex region) never holds a contact.
    pub apex_frac: f64,
    /// Fraction of the flank height, measured down from the apex, in which
    /// no candidate is accepted; `0.4` keeps the lower 60 %.
    pub height_frac: f64,
    /// Candidates closer than this many windows to the apex are dropped.
    pub start_windows: usize,
}

impl Default for LfitOptions {
    fn default() -> Self {
        Self {
            min_window: 12,
            peak_height_frac: 0.3,
            peak_prominence: 0.3,
            peak_width: 5.0,
            flat_gradient_frac: 0.3,
            rmse_jump_frac: 0.25,
            shallow_gradient: 0.5,
            apex_frac: 0.15,
            height_frac: 0.4,
            start_windows: 3,
        }
    }
}

/// Gradient and fit error of every window start along a path.
#[derive(Clone, Debug, Default)]
pub struct WindowProfile {
    pub gradients: Vec<f64>,
    pub rmses: Vec<f64>,
}

/// Slide a window of `n` points along `path`.
///
/// Vertical windows inherit the previous gradient so the series stays
/// finite.
pub fn window_profile(path: &[Point2D], n: usize) -> WindowProfile {
    let mut profile = WindowProfile::default();
    if n < 2 || path.len() <= n {
        return profile;
    }
    for i in 0..path.len() - n {
        if let Some(fit) = fit_line_orthogonal(&path[i..i + n]) {
            profile.gradients.push(fit.slope);
            profile.rmses.push(fit.rmse);
        }
    }
    let mut last = profile.gradients.iter().copied().find(|g| g.is_finite());
    for g in profile.gradients.iter_mut() {
        if g.is_finite() {
            last = Some(*g);
        } else if let Some(prev) = last {
            *g = prev;
        }
    }
    profile
}

/// Contact point on each flank plus whether either one fell back to the
/// global RMSE maximum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LfitResult {
    pub left: Point2D,
    pub right: Point2D,
    pub low_confidence: bool,
}

fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Contact point on one apex-first flank path.
fn flank_contact(path: &[Point2D], n: usize, opts: &LfitOptions) -> Option<(Point2D, bool)> {
    let WindowProfile { gradients, rmses } = window_profile(path, n);
    if rmses.is_empty() {
        return None;
    }
    let (max_idx, max_rmse) = rmses
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, r)| if r > best.1 { (i, r) } else { best });
    let min_rmse = rmses.iter().copied().fold(f64::INFINITY, f64::min);
    let rmse_range = max_rmse - min_rmse;

    let mut candidates: BTreeSet<usize> = find_peaks(
        &rmses,
        &PeakCriteria {
            min_height: Some(max_rmse * opts.peak_height_frac),
            min_prominence: Some(opts.peak_prominence),
            min_width: Some(opts.peak_width),
        },
    )
    .into_iter()
    .collect();
    candidates.insert(max_idx);

    let g_max = gradients.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let g_min = gradients.iter().copied().fold(f64::INFINITY, f64::min);
    let flat = (g_max - g_min) * opts.flat_gradient_frac;
    for i in 0..gradients.len().saturating_sub(1) {
        if sign(gradients[i]) != sign(gradients[i + 1]) && gradients[i].abs() < flat {
            candidates.insert(i);
        }
    }

    let last = rmses.len() - 1;
    let mut kept: Vec<usize> = candidates
        .into_iter()
        .filter(|&i| i != 0 && i != last)
        .filter(|&i| i >= opts.start_windows * n)
        .filter(|&i| rmses[i - 1] != 0.0 && rmses[i + 1] != 0.0)
        .collect();
    if kept.len() > 1 {
        let jump = rmse_range * opts.rmse_jump_frac;
        kept.retain(|&i| {
            let smooth = (rmses[i] - rmses[i - 1]).abs() <= jump
                && (rmses[i] - rmses[i + 1]).abs() <= jump;
            smooth || gradients[i].abs() <= opts.shallow_gradient
        });
    }
    let apex_limit = path.len() as f64 * opts.apex_frac;
    let top = path.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let bottom = path.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
    let floor = top + (bottom - top) * opts.height_frac;
    kept.retain(|&i| i as f64 > apex_limit && path[i].y >= floor);

    let (idx, low_confidence) = match kept.first() {
        Some(&i) => (i, false),
        None => (max_idx, true),
    };
    let cp = (idx + n / 2).min(path.len() - 1);
    debug!(
        "iterative_lfit: n={n} windows={} candidate={idx} low_confidence={low_confidence}",
        rmses.len()
    );
    Some((path[cp], low_confidence))
}

/// Refine both contact points of an ordered drop contour (or a slice of
/// one around the apex) with windows of `n` points.
pub fn iterative_lfit(points: &[Point2D], n: usize, opts: &LfitOptions) -> Option<LfitResult> {
    let n = n.max(opts.min_window);
    let split = split_at_apex(points)?;

    // Top-down ordering; equal rows keep the order nearest the apex first.
    let mut left: Vec<Point2D> = split.left.iter().rev().copied().collect();
    left.sort_by(|a, b| a.y.total_cmp(&b.y));
    let mut right = split.right.clone();
    right.sort_by(|a, b| a.y.total_cmp(&b.y));

    let left_path = nearest_neighbour_path(&left, 0);
    let right_path = nearest_neighbour_path(&right, 0);
    let (l, l_low) = flank_contact(&left_path, n, opts)?;
    let (r, r_low) = flank_contact(&right_path, n, opts)?;
    Some(LfitResult {
        left: l,
        right: r,
        low_confidence: l_low || r_low,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Apex-first flank: a 45° slope that meets a flat substrate at
    /// (30, 90), then runs outward along the substrate.
    fn kinked_flank() -> Vec<Point2D> {
        let mut path: Vec<Point2D> = (0..=60)
            .map(|i| Point2D::new(90.0 - i as f64, 30.0 + i as f64))
            .collect();
        path.extend((1..=40).map(|i| Point2D::new(30.0 - i as f64, 90.0)));
        path
    }

    #[test]
    fn window_profile_lengths_and_vertical_fill() {
        let mut path: Vec<Point2D> = (0..5).map(|i| Point2D::new(i as f64, i as f64)).collect();
        path.extend((5..30).map(|i| Point2D::new(4.0, i as f64)));
        let p = window_profile(&path, 4);
        assert_eq!(p.gradients.len(), 26);
        assert_eq!(p.rmses.len(), 26);
        assert!(p.gradients.iter().all(|g| g.is_finite()));
        assert!(window_profile(&path[..4], 4).rmses.is_empty());
    }

    #[test]
    fn kink_is_found_at_the_substrate() {
        let (cp, low) = flank_contact(&kinked_flank(), 12, &LfitOptions::default()).unwrap();
        assert!(!low);
        assert!(cp.distance(&Point2D::new(30.0, 90.0)) <= 3.0, "{cp:?}");
    }

    #[test]
    fn symmetric_drop_gives_mirrored_points() {
        let right = kinked_flank();
        let left: Vec<Point2D> = right.iter().map(|p| Point2D::new(180.0 - p.x, p.y)).collect();
        let mut drop: Vec<Point2D> = left.into_iter().rev().collect();
        drop.extend(right);
        let out = iterative_lfit(&drop, 12, &LfitOptions::default()).unwrap();
        assert!((out.left.x + out.right.x - 180.0).abs() <= 1.0, "{out:?}");
        assert_eq!(out.left.y, out.right.y);
    }
}
