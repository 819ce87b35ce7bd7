//! Substrate line detection, levelling and line/circle geometry.
use crate::angle::fold_quarter_pi;
use crate::contour::render_points;
use crate::types::{Baseline, Circle, Contour, Line, Point2D};
use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineOptions {
    /// Hough accumulator votes needed for a line.
    pub vote_threshold: u32,
    /// Maximum deviation from horizontal, in degrees.
    pub max_tilt_deg: u32,
    /// Non-maximum suppression radius in the (r, θ) accumulator.
    pub suppression_radius: u32,
    /// End-point height difference (px) below which no levelling is done.
    pub level_tolerance_px: f64,
}

impl Default for BaselineOptions {
    fn default() -> Self {
        Self {
            vote_threshold: 20,
            max_tilt_deg: 10,
            suppression_radius: 8,
            level_tolerance_px: 1.0,
        }
    }
}

/// End points of a polar line at `x = 0` and `x = w - 1`; `None` if vertical.
pub fn polar_to_line(line: &PolarLine, w: u32) -> Option<Line> {
    let theta = (line.angle_in_degrees as f64).to_radians();
    let (s, c) = theta.sin_cos();
    if s.abs() < 1e-9 {
        return None;
    }
    let r = line.r as f64;
    let x2 = w.saturating_sub(1) as f64;
    Some(Line::new(
        Point2D::new(0.0, r / s),
        Point2D::new(x2, (r - x2 * c) / s),
    ))
}

fn support(contour: &Contour, line: &Line) -> usize {
    let (dx, dy) = (line.p2.x - line.p1.x, line.p2.y - line.p1.y);
    let norm = (dx * dx + dy * dy).sqrt().max(1e-12);
    contour
        .iter()
        .filter(|p| ((p.x - line.p1.x) * dy - (p.y - line.p1.y) * dx).abs() / norm <= 1.0)
        .count()
}

/// Near-horizontal Hough line through the contour pixels.
///
/// Lines at or above the top of the contour are the flat top of the drop,
/// not the substrate, and are skipped. Among the rest the best supported
/// line wins.
pub fn detect_baseline(
    contour: &Contour,
    w: u32,
    h: u32,
    opts: &BaselineOptions,
) -> Option<Baseline> {
    if contour.len() < 2 || w == 0 || h == 0 {
        return None;
    }
    let canvas = render_points(contour.as_slice(), w, h, 255, 0);
    let lines = detect_lines(
        &canvas,
        LineDetectionOptions {
            vote_threshold: opts.vote_threshold,
            suppression_radius: opts.suppression_radius,
        },
    );
    let top = contour.min_y();
    let best = lines
        .iter()
        .filter(|l| (l.angle_in_degrees as i64 - 90).unsigned_abs() < opts.max_tilt_deg as u64)
        .filter_map(|l| polar_to_line(l, w))
        .filter(|l| l.min_y() > top)
        .map(|l| (support(contour, &l), l))
        .max_by(|a, b| {
            a.0.cmp(&b.0)
                .then(b.1.slope().abs().total_cmp(&a.1.slope().abs()))
        });
    match best {
        Some((votes, line)) => {
            debug!(
                "detect_baseline: y={:.1}..{:.1} support={votes}",
                line.p1.y, line.p2.y
            );
            Some(line)
        }
        None => {
            debug!("detect_baseline: no near-horizontal line below the drop top");
            None
        }
    }
}

/// Signed levelling angle (radians) for a baseline, folded into ±45°.
pub fn baseline_tilt(line: &Line) -> f64 {
    let dx = line.p2.x - line.p1.x;
    if dx.abs() < 1e-12 {
        return 0.0;
    }
    fold_quarter_pi(((line.p2.y - line.p1.y) / dx).atan())
}

/// Rotate the image so `baseline` becomes horizontal, then crop away the
/// blank wedges the rotation brings in. Returns the image and the applied
/// angle in radians.
pub fn tilt_correction(img: &GrayImage, baseline: &Line) -> (GrayImage, f64) {
    let angle = baseline_tilt(baseline);
    if angle == 0.0 {
        return (img.clone(), 0.0);
    }
    // rotate_about_center turns clockwise on screen; undo the tilt.
    let rotated = rotate_about_center(img, -angle as f32, Interpolation::Bilinear, Luma([255]));
    let (w, h) = (img.width() as f64, img.height() as f64);
    let (s, c) = (angle.sin().abs(), angle.cos());
    let side = (0.5 * h * s + 0.5 * w * (1.0 - c)).ceil() as u32;
    let roof = (0.5 * w * s + 0.5 * h * (1.0 - c)).ceil() as u32;
    if 2 * side >= img.width() || 2 * roof >= img.height() {
        return (rotated, angle);
    }
    let cropped = image::imageops::crop_imm(
        &rotated,
        side,
        roof,
        img.width() - 2 * side,
        img.height() - 2 * roof,
    )
    .to_image();
    (cropped, angle)
}

/// Intersections of the infinite line through `line` with `circle`,
/// sorted by x.
pub fn line_circle_intersection(line: &Line, circle: &Circle) -> Vec<Point2D> {
    let d = (line.p2.x - line.p1.x, line.p2.y - line.p1.y);
    let f = (line.p1.x - circle.center.x, line.p1.y - circle.center.y);
    let a = d.0 * d.0 + d.1 * d.1;
    if a <= 0.0 {
        return Vec::new();
    }
    let b = 2.0 * (f.0 * d.0 + f.1 * d.1);
    let c = f.0 * f.0 + f.1 * f.1 - circle.radius * circle.radius;
    let disc = b * b - 4.0 * a * c;
    let at = |t: f64| Point2D::new(line.p1.x + t * d.0, line.p1.y + t * d.1);
    if disc < 0.0 {
        Vec::new()
    } else if disc == 0.0 {
        vec![at(-b / (2.0 * a))]
    } else {
        let sq = disc.sqrt();
        let mut pts = vec![at((-b + sq) / (2.0 * a)), at((-b - sq) / (2.0 * a))];
        pts.sort_by(|p, q| p.x.total_cmp(&q.x));
        pts
    }
}
