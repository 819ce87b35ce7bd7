#![allow(dead_code)]

use drop_shape::types::{Contour, Point2D};
use drop_shape::younglaplace::YoungLaplaceShape;
use image::{GrayImage, Luma};

pub const BACKGROUND: u8 = 215;
pub const DROP: u8 = 25;

/// Ordered outline of a sessile cap with contact angle `angle_deg`, resting on
/// the row `base` and centred on `cx`: a flat substrate leg of `leg` points
/// on each side, then the arc from the left to the right contact point.
/// Points are about 1 px apart and the right half mirrors the left.
pub fn sessile_contour(cx: f64, base: f64, radius: f64, angle_deg: f64, leg: usize) -> Contour {
    let theta = angle_deg.to_radians();
    let half = radius * theta.sin();
    let cy = base + radius * theta.cos();
    // Arc parameter: angle from the downward vertical through the centre.
    let n = (radius * theta).ceil() as usize;
    let left_arc: Vec<Point2D> = (0..n)
        .map(|i| {
            let a = theta - theta * i as f64 / n as f64;
            Point2D::new(cx - radius * a.sin(), cy - radius * a.cos())
        })
        .collect();
    let mut left: Vec<Point2D> = (1..=leg)
        .rev()
        .map(|i| Point2D::new(cx - half - i as f64, base))
        .collect();
    left.extend(left_arc);
    let apex = Point2D::new(cx, cy - radius);
    let mut pts = left.clone();
    pts.push(apex);
    pts.extend(left.iter().rev().map(|p| Point2D::new(2.0 * cx - p.x, p.y)));
    Contour::new(pts)
}

/// Pendant profile of the given Bond number and apex radius (px), apex at
/// `apex` and hanging down, sampled on both sides up to the dimensionless
/// arclength `s_max`.
pub fn pendant_contour(bond: f64, radius: f64, apex: Point2D, s_max: f64, n: usize) -> Contour {
    let shape = YoungLaplaceShape::new(bond);
    let at = |s: f64, sign: f64| {
        let (x, z) = shape.point_at(s);
        Point2D::new(apex.x + sign * x * radius, apex.y - z * radius)
    };
    let mut pts: Vec<Point2D> = (1..=n)
        .rev()
        .map(|i| at(s_max * i as f64 / n as f64, -1.0))
        .collect();
    pts.push(apex);
    pts.extend((1..=n).map(|i| at(s_max * i as f64 / n as f64, 1.0)));
    Contour::new(pts)
}

/// Pendant drop hanging from a needle entering at the top of the frame.
///
/// The drop is the profile up to `s_top`, which should lie between the
/// equator and the neck; the needle is a dark vertical band `needle_width` px
/// wide from row 0 down into the drop.
pub fn pendant_image(
    w: u32,
    h: u32,
    bond: f64,
    radius: f64,
    apex: Point2D,
    s_top: f64,
    needle_width: f64,
) -> GrayImage {
    let shape = YoungLaplaceShape::new(bond);
    let nodes: Vec<(f64, f64)> = shape
        .nodes()
        .iter()
        .take_while(|n| n.s <= s_top)
        .map(|n| (n.x * radius, n.z * radius))
        .collect();
    let top_z = nodes.last().map_or(0.0, |n| n.1);
    let half_width_at = |z: f64| -> Option<f64> {
        if z < 0.0 || z > top_z {
            return None;
        }
        let k = nodes.partition_point(|n| n.1 < z);
        if k == 0 {
            return Some(0.0);
        }
        let (a, b) = (nodes[k - 1], nodes[k.min(nodes.len() - 1)]);
        let t = if b.1 > a.1 { (z - a.1) / (b.1 - a.1) } else { 0.0 };
        Some(a.0 + t * (b.0 - a.0))
    };
    GrayImage::from_fn(w, h, |x, y| {
        let (xf, yf) = (x as f64, y as f64);
        let z = apex.y - yf;
        let in_drop = half_width_at(z).is_some_and(|hw| (xf - apex.x).abs() <= hw);
        let in_needle = z >= top_z - 2.0 && (xf - apex.x).abs() <= needle_width / 2.0;
        Luma([if in_drop || in_needle { DROP } else { BACKGROUND }])
    })
}

/// Dark circular cap of radius `r` centred at (`cx`, `cy`) on a dark
/// substrate filling every row below `base`.
pub fn sessile_image(w: u32, h: u32, cx: f64, base: f64, r: f64, cy: f64) -> GrayImage {
    GrayImage::from_fn(w, h, |x, y| {
        let (xf, yf) = (x as f64, y as f64);
        let in_cap = yf <= base && (xf - cx).powi(2) + (yf - cy).powi(2) <= r * r;
        Luma([if in_cap || yf > base { DROP } else { BACKGROUND }])
    })
}

/// Filled dark disc, used for extraction round trips.
pub fn disc_image(w: u32, h: u32, cx: f64, cy: f64, r: f64) -> GrayImage {
    GrayImage::from_fn(w, h, |x, y| {
        let d = ((x as f64 - cx).powi(2) + (y as f64 - cy).powi(2)).sqrt();
        Luma([if d <= r { DROP } else { BACKGROUND }])
    })
}
