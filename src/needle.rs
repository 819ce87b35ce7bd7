//! Needle width measurement for pendant-drop calibration.
//!
//! The needle enters from the top of the frame as a dark vertical band. Its
//! two walls are the widest-apart pair of parallel, near-vertical Hough lines
//! on the Canny edges of the upper part of the image.
use crate::image::filters::blur_3x3;
use crate::types::{Contour, Line, Point2D};
use image::imageops::crop_imm;
use image::GrayImage;
use imageproc::edges::canny;
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NeedleOptions {
    /// Fraction of the image height searched, from the top.
    pub top_frac: f64,
    pub canny_low: f32,
    pub canny_high: f32,
    pub vote_threshold: u32,
    pub suppression_radius: u32,
    /// Allowed deviation from vertical, degrees.
    pub angle_tolerance_deg: u32,
    /// Allowed angle difference between the two walls, degrees.
    pub pair_angle_tolerance_deg: u32,
    /// Walls closer than this (px) are the same edge.
    pub min_separation_px: f64,
}

impl Default for NeedleOptions {
    fn default() -> Self {
        Self {
            top_frac: 0.5,
            canny_low: 50.0,
            canny_high: 150.0,
            vote_threshold: 39,
            suppression_radius: 4,
            angle_tolerance_deg: 5,
            pair_angle_tolerance_deg: 1,
            min_separation_px: 5.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeedleMeasurement {
    pub width_px: f64,
    /// The two walls, clipped to the searched band.
    pub walls: [Line; 2],
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NeedleStripOptions {
    /// The drop starts where a row spans this many pixels more than the
    /// needle.
    pub widen_px: f64,
    /// Rows removed below the detected junction.
    pub margin_px: f64,
    /// Without a measurement, this fraction of the contour height is removed
    /// from the top.
    pub fallback_frac: f64,
}

impl Default for NeedleStripOptions {
    fn default() -> Self {
        Self {
            widen_px: 3.0,
            margin_px: 2.0,
            fallback_frac: 0.1,
        }
    }
}

/// Remove the needle walls from a pendant-drop contour.
///
/// Rows are scanned from the top of the contour; the needle ends at the first
/// row whose horizontal span exceeds the measured width by
/// [`NeedleStripOptions::widen_px`].
pub fn strip_needle(
    contour: &Contour,
    needle: Option<&NeedleMeasurement>,
    opts: &NeedleStripOptions,
) -> Contour {
    let Some(bounds) = contour.bounds() else {
        return contour.clone();
    };
    let cut = match needle {
        Some(m) => {
            let mut rows: BTreeMap<i64, (f64, f64)> = BTreeMap::new();
            for p in contour.iter() {
                let span = rows.entry(p.y.round() as i64).or_insert((p.x, p.x));
                span.0 = span.0.min(p.x);
                span.1 = span.1.max(p.x);
            }
            let junction = rows
                .iter()
                .find(|(_, (lo, hi))| hi - lo > m.width_px + opts.widen_px)
                .map(|(&y, _)| y as f64);
            match junction {
                Some(y) => y + opts.margin_px,
                None => {
                    debug!("strip_needle: contour never widens past the needle");
                    return contour.clone();
                }
            }
        }
        None => bounds.top + bounds.height() * opts.fallback_frac,
    };
    let kept: Contour = contour.iter().copied().filter(|p| p.y >= cut).collect();
    debug!(
        "strip_needle: cut at y={cut:.1}, kept {}/{} points",
        kept.len(),
        contour.len()
    );
    kept
}

/// Signed deviation of a Hough normal angle from vertical, degrees.
fn tilt_from_vertical(line: &PolarLine) -> i64 {
    let a = line.angle_in_degrees as i64;
    if a > 90 {
        a - 180
    } else {
        a
    }
}

/// x of a near-vertical polar line at row `y`.
fn x_at(line: &PolarLine, y: f64) -> f64 {
    let theta = (line.angle_in_degrees as f64).to_radians();
    let (s, c) = theta.sin_cos();
    (line.r as f64 - y * s) / c
}

/// Width of the needle in pixels, or `None` when no wall pair is found.
pub fn measure_needle_width(img: &GrayImage, opts: &NeedleOptions) -> Option<NeedleMeasurement> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let band_h = ((h as f64 * opts.top_frac).round() as u32).clamp(1, h);
    let band = crop_imm(img, 0, 0, w, band_h).to_image();
    let edges = canny(&blur_3x3(&band), opts.canny_low, opts.canny_high);
    let lines: Vec<PolarLine> = detect_lines(
        &edges,
        LineDetectionOptions {
            vote_threshold: opts.vote_threshold,
            suppression_radius: opts.suppression_radius,
        },
    )
    .into_iter()
    .filter(|l| tilt_from_vertical(l).unsigned_abs() <= opts.angle_tolerance_deg as u64)
    .collect();
    debug!("measure_needle_width: {} near-vertical line(s)", lines.len());

    let mid = band_h as f64 / 2.0;
    let mut best: Option<(f64, usize, usize)> = None;
    for i in 0..lines.len() {
        for j in i + 1..lines.len() {
            let (ti, tj) = (tilt_from_vertical(&lines[i]), tilt_from_vertical(&lines[j]));
            if (ti - tj).unsigned_abs() > opts.pair_angle_tolerance_deg as u64 {
                continue;
            }
            let sep = (x_at(&lines[i], mid) - x_at(&lines[j], mid)).abs();
            if sep >= opts.min_separation_px && best.map_or(true, |(d, _, _)| sep > d) {
                best = Some((sep, i, j));
            }
        }
    }
    let (width_px, i, j) = best?;
    let bottom = band_h.saturating_sub(1) as f64;
    let wall = |l: &PolarLine| {
        Line::new(
            Point2D::new(x_at(l, 0.0), 0.0),
            Point2D::new(x_at(l, bottom), bottom),
        )
    };
    debug!("measure_needle_width: width={width_px:.1} px");
    Some(NeedleMeasurement {
        width_px,
        walls: [wall(&lines[i]), wall(&lines[j])],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn measures_a_vertical_bar() {
        let img = GrayImage::from_fn(200, 240, |x, y| {
            let needle = (80..120).contains(&x) && y < 100;
            let drop = ((x as f64 - 100.0).powi(2) + (y as f64 - 160.0).powi(2)).sqrt() < 60.0;
            Luma([if needle || drop { 20 } else { 230 }])
        });
        let m = measure_needle_width(&img, &NeedleOptions::default()).unwrap();
        assert!((m.width_px - 40.0).abs() <= 2.0, "{m:?}");
    }

    #[test]
    fn strips_walls_above_the_junction() {
        let mut pts = Vec::new();
        for y in 2..50 {
            pts.push(Point2D::new(80.0, y as f64));
            pts.push(Point2D::new(119.0, y as f64));
        }
        for d in 0..360 {
            let t = (d as f64).to_radians();
            let p = Point2D::new(100.0 + 60.0 * t.cos(), 100.0 + 60.0 * t.sin());
            if p.y >= 50.0 {
                pts.push(p);
            }
        }
        let contour = Contour::new(pts);
        let needle = NeedleMeasurement {
            width_px: 40.0,
            walls: [Line::default(); 2],
        };
        let stripped = strip_needle(&contour, Some(&needle), &NeedleStripOptions::default());
        assert!(stripped.iter().all(|p| p.y >= 50.0));
        assert!(stripped.len() > 200);

        let fallback = strip_needle(&contour, None, &NeedleStripOptions::default());
        let top = contour.bounds().unwrap().top;
        assert!(fallback.iter().all(|p| p.y >= top + 0.1 * 158.0 - 1e-9));
    }

    #[test]
    fn blank_frame_has_no_needle() {
        let img = GrayImage::from_pixel(64, 64, Luma([200]));
        assert!(measure_needle_width(&img, &NeedleOptions::default()).is_none());
    }
}
