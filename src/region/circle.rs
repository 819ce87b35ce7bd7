//! Gradient-directed circle Hough transform over contour pixels.
//!
//! Each edge pixel votes for centres along its gradient line (both senses)
//! over the admissible radius range. The strongest accumulator cell is the
//! centre; the radius is the densest bin of edge distances to it.
use crate::edges::Grad;
use crate::types::{Circle, Point2D};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleOptions {
    /// Minimum accumulator votes for the centre.
    pub min_votes: u32,
    /// Minimum radius of the first search, as a fraction of image width.
    pub min_radius_frac: f64,
    /// Radius bounds of the retry used when a circle leaves the image.
    pub retry_radius_frac: (f64, f64),
    /// Reject circles whose top lies this fraction of the image height
    /// above the highest edge pixel.
    pub top_tolerance_frac: f64,
    /// Gradient magnitude below which a pixel carries no direction.
    pub min_gradient: f32,
}

impl Default for CircleOptions {
    fn default() -> Self {
        Self {
            min_votes: 14,
            min_radius_frac: 0.05,
            retry_radius_frac: (0.10, 0.40),
            top_tolerance_frac: 0.10,
            min_gradient: 1e-3,
        }
    }
}

/// One Hough pass with explicit radius bounds.
pub fn hough_circle(
    edges: &[Point2D],
    grad: &Grad,
    min_radius: f64,
    max_radius: f64,
    min_votes: u32,
    min_gradient: f32,
) -> Option<Circle> {
    let (w, h) = (grad.mag.w, grad.mag.h);
    if w == 0 || h == 0 || edges.len() < 3 {
        return None;
    }
    let r_lo = min_radius.max(2.0).floor() as usize;
    let r_hi = max_radius.max(r_lo as f64 + 1.0).ceil() as usize;
    let mut acc = vec![0u32; w * h];
    let mut voters = 0usize;

    for p in edges {
        let (px, py) = (p.x.round() as usize, p.y.round() as usize);
        let Some(d) = grad.direction(px, py, min_gradient) else {
            continue;
        };
        voters += 1;
        for sign in [-1.0, 1.0] {
            let mut last = usize::MAX;
            for r in r_lo..=r_hi {
                let cx = p.x + sign * r as f64 * d[0];
                let cy = p.y + sign * r as f64 * d[1];
                if cx < 0.0 || cy < 0.0 || cx >= w as f64 || cy >= h as f64 {
                    break;
                }
                let idx = cy as usize * w + cx as usize;
                // a diagonal walk can land twice in one cell
                if idx != last {
                    acc[idx] += 1;
                    last = idx;
                }
            }
        }
    }
    if voters == 0 {
        return None;
    }

    // 3×3 box sum so a centre split across neighbouring cells still wins.
    let mut best = (0u32, 0usize, 0usize);
    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let mut s = 0u32;
            for dy in 0..3 {
                let row = (y + dy - 1) * w;
                s += acc[row + x - 1] + acc[row + x] + acc[row + x + 1];
            }
            if s > best.0 {
                best = (s, x, y);
            }
        }
    }
    let (votes, bx, by) = best;
    if votes < min_votes {
        debug!("hough_circle: best centre has {votes} votes (< {min_votes})");
        return None;
    }
    let center = refine_centre(&acc, w, h, bx, by);
    let radius = densest_radius(edges, &center, r_lo as f64, r_hi as f64)?;
    debug!(
        "hough_circle: centre=({:.1}, {:.1}) r={radius:.1} votes={votes}",
        center.x, center.y
    );
    Some(Circle { center, radius })
}

/// Vote-weighted centroid of the 3×3 neighbourhood, in pixel-centre units.
fn refine_centre(acc: &[u32], w: usize, h: usize, x: usize, y: usize) -> Point2D {
    let (mut sx, mut sy, mut sw) = (0.0, 0.0, 0.0);
    for yy in y.saturating_sub(1)..=(y + 1).min(h - 1) {
        for xx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
            let v = acc[yy * w + xx] as f64;
            sx += v * xx as f64;
            sy += v * yy as f64;
            sw += v;
        }
    }
    if sw <= 0.0 {
        return Point2D::new(x as f64, y as f64);
    }
    // votes land in the cell containing the continuous centre
    Point2D::new(sx / sw + 0.5, sy / sw + 0.5)
}

fn densest_radius(edges: &[Point2D], center: &Point2D, lo: f64, hi: f64) -> Option<f64> {
    let bins = (hi - lo).ceil() as usize + 1;
    let mut hist = vec![0u32; bins];
    let dists: Vec<f64> = edges.iter().map(|p| p.distance(center)).collect();
    for &d in &dists {
        if d >= lo && d <= hi {
            hist[((d - lo).floor() as usize).min(bins - 1)] += 1;
        }
    }
    let mut best = (0u32, 0usize);
    for i in 0..bins {
        let prev = if i > 0 { hist[i - 1] } else { 0 };
        let s = prev + hist[i] + hist.get(i + 1).copied().unwrap_or(0);
        if s > best.0 {
            best = (s, i);
        }
    }
    if best.0 == 0 {
        return None;
    }
    let mid = lo + best.1 as f64 + 0.5;
    let near: Vec<f64> = dists.into_iter().filter(|d| (d - mid).abs() <= 1.5).collect();
    if near.is_empty() {
        return None;
    }
    Some(near.iter().sum::<f64>() / near.len() as f64)
}

/// Circle search with the sanity checks and the retry ladder.
pub fn detect_circle(edges: &[Point2D], grad: &Grad, opts: &CircleOptions) -> Option<Circle> {
    let (w, h) = (grad.mag.w as f64, grad.mag.h as f64);
    let max_r = w.max(h) / 2.0;
    let edges_top = edges.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);

    let mut circle = hough_circle(
        edges,
        grad,
        w * opts.min_radius_frac,
        max_r,
        opts.min_votes,
        opts.min_gradient,
    );
    if let Some(c) = circle {
        if c.top() < edges_top - h * opts.top_tolerance_frac {
            debug!("detect_circle: circle top {:.1} far above edges {edges_top:.1}", c.top());
            circle = hough_circle(edges, grad, 2.0, max_r, opts.min_votes, opts.min_gradient);
        }
    }
    if let Some(c) = circle {
        if c.radius > c.center.y {
            let (lo, hi) = opts.retry_radius_frac;
            circle = hough_circle(edges, grad, w * lo, w * hi, opts.min_votes, opts.min_gradient);
        }
    }
    circle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edges::sobel_gradients;
    use crate::image::filters::blur_3x3;
    use crate::image::ImageF32;
    use image::{GrayImage, Luma};

    #[test]
    fn finds_a_dark_disk() {
        let (w, h) = (160u32, 140u32);
        let (cx, cy, r) = (82.0, 70.0, 40.0);
        let mut img = GrayImage::from_pixel(w, h, Luma([220]));
        let mut border = Vec::new();
        for y in 0..h {
            for x in 0..w {
                let d = ((x as f64 - cx).powi(2) + (y as f64 - cy).powi(2)).sqrt();
                if d <= r {
                    img.put_pixel(x, y, Luma([30]));
                    if d > r - 1.0 {
                        border.push(Point2D::new(x as f64, y as f64));
                    }
                }
            }
        }
        let grad = sobel_gradients(&ImageF32::from_gray(&blur_3x3(&img)));
        let c = detect_circle(&border, &grad, &CircleOptions::default()).expect("circle");
        assert!((c.center.x - cx).abs() < 2.0, "{c:?}");
        assert!((c.center.y - cy).abs() < 2.0, "{c:?}");
        assert!((c.radius - r).abs() < 2.0, "{c:?}");
    }
}
