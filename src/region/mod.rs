//! Region isolation: find the drop in a full frame and crop to it.
//!
//! The isolator extracts and clusters the frame contour, looks for the
//! substrate line and the circular cap, levels a tilted substrate (one retry
//! pass on the rotated frame), then crops around whichever cues were found
//! and re-extracts the drop inside the crop with the same threshold.
//!
//! Missing cues are never fatal:
//! - no baseline: the split line comes from the circle or the contour extent;
//! - no circle: the crop box comes from the contour extent;
//! - a baseline missing the circle is discarded.
pub mod baseline;
pub mod circle;

pub use baseline::{
    baseline_tilt, detect_baseline, line_circle_intersection, tilt_correction, BaselineOptions,
};
pub use circle::{detect_circle, hough_circle, CircleOptions};

use crate::cluster::{ClusterMethod, ClusterOptions, ContourClusterer};
use crate::contour::{ContourExtractor, ExtractorOptions};
use crate::edges::sobel_gradients;
use crate::error::DropError;
use crate::image::filters::blur_3x3;
use crate::image::ImageF32;
use crate::types::{Baseline, Bounds, Circle, Contour, Point2D, RegionInfo};
use image::GrayImage;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionOptions {
    pub extractor: ExtractorOptions,
    pub cluster: ClusterOptions,
    /// Steepness used to separate the drop from clutter on the full frame.
    pub cluster_xi: f64,
    /// Neighbour distance used on the cropped contour.
    pub crop_eps: f64,
    pub baseline: BaselineOptions,
    /// Hough vote threshold of the pass on the levelled frame.
    pub retry_vote_threshold: u32,
    pub circle: CircleOptions,
    /// Rows from the top of the frame inspected for a needle.
    pub needle_band_px: f64,
    /// Crop padding around the circle, in radii.
    pub circle_pad: f64,
    /// Horizontal padding when only a circle is known, in radii.
    pub circle_only_pad_x: f64,
    /// Padding below the baseline, as a fraction of the cap height.
    pub below_baseline_pad: f64,
    /// Contour-extent padding when neither cue is known.
    pub extent_pad: f64,
    /// Split line position between the contour top and the baseline,
    /// measured up from the baseline.
    pub split_above_baseline: f64,
}

impl Default for RegionOptions {
    fn default() -> Self {
        Self {
            extractor: ExtractorOptions::default(),
            cluster: ClusterOptions::default(),
            cluster_xi: 0.8,
            crop_eps: 2.0,
            baseline: BaselineOptions::default(),
            retry_vote_threshold: 40,
            circle: CircleOptions::default(),
            needle_band_px: 10.0,
            circle_pad: 1.2,
            circle_only_pad_x: 1.5,
            below_baseline_pad: 0.4,
            extent_pad: 0.4,
            split_above_baseline: 0.2,
        }
    }
}

/// Output of [`RegionIsolator::isolate`]: the crop, the drop contour inside
/// it and the cues found on the way (all in crop coordinates).
#[derive(Clone, Debug)]
pub struct IsolatedRegion {
    pub image: GrayImage,
    pub contour: Contour,
    pub info: RegionInfo,
}

/// What one extraction pass over a frame yields.
struct Cues {
    contour: Contour,
    threshold: u8,
    baseline: Option<Baseline>,
}

#[derive(Clone, Debug, Default)]
pub struct RegionIsolator {
    pub options: RegionOptions,
}

impl RegionIsolator {
    pub fn new(options: RegionOptions) -> Self {
        Self { options }
    }

    fn extractor(&self) -> ContourExtractor {
        ContourExtractor::new(self.options.extractor.clone())
    }

    fn clusterer(&self) -> ContourClusterer {
        ContourClusterer::new(self.options.cluster.clone())
    }

    /// Isolate the drop. `threshold` pins the binarisation level (e.g. reused
    /// from an earlier frame); `None` runs Otsu.
    pub fn isolate(
        &self,
        img: &GrayImage,
        threshold: Option<u8>,
    ) -> Result<IsolatedRegion, DropError> {
        let opts = &self.options;
        let mut cues = self.locate(img, &opts.baseline, threshold)?;

        let mut working = img.clone();
        let mut tilt = 0.0;
        if let Some(line) = cues.baseline {
            if (line.p2.y - line.p1.y).abs() > opts.baseline.level_tolerance_px {
                let (rotated, angle) = tilt_correction(img, &line);
                tilt = angle;
                debug!(
                    "RegionIsolator: levelling by {:.2} deg, rerunning on {}x{}",
                    angle.to_degrees(),
                    rotated.width(),
                    rotated.height()
                );
                let retry = BaselineOptions {
                    vote_threshold: opts.retry_vote_threshold,
                    ..opts.baseline.clone()
                };
                cues = self.locate(&rotated, &retry, threshold)?;
                working = rotated;
            }
        }

        let grad = sobel_gradients(&ImageF32::from_gray(&blur_3x3(&working)));
        let circle = detect_circle(cues.contour.as_slice(), &grad, &opts.circle);
        let mut baseline = cues.baseline;
        let mut intercepts = Vec::new();
        match (circle, baseline) {
            (Some(c), Some(b)) => {
                intercepts = line_circle_intersection(&b, &c);
                if intercepts.is_empty() {
                    warn!("RegionIsolator: baseline misses the circle; ignoring the baseline");
                    baseline = None;
                }
            }
            (None, _) => warn!("RegionIsolator: no circle found"),
            (_, None) => warn!("RegionIsolator: no baseline found"),
        }

        let extent = cues
            .contour
            .bounds()
            .ok_or_else(|| DropError::RegionIsolationFailed("empty contour".into()))?;
        let split_y = split_line(&extent, circle.as_ref(), baseline.as_ref(), opts);
        let (w, h) = (working.width() as usize, working.height() as usize);
        let bounds = crop_bounds(
            &cues.contour,
            &extent,
            circle.as_ref(),
            baseline.as_ref(),
            &intercepts,
            split_y,
            opts,
        )
        .clamped(w, h);

        let (left, top) = (bounds.left.floor(), bounds.top.floor());
        let cw = (bounds.right.ceil() - left + 1.0).max(1.0) as u32;
        let ch = (bounds.bottom.ceil() - top + 1.0).max(1.0) as u32;
        let crop = image::imageops::crop_imm(&working, left as u32, top as u32, cw, ch).to_image();
        debug!(
            "RegionIsolator: crop x={left} y={top} {cw}x{ch} threshold={}",
            cues.threshold
        );

        let inner = match self.extractor().extract(&crop, Some(cues.threshold)) {
            Ok(e) => e.contour,
            Err(err) => {
                return Err(DropError::RegionIsolationFailed(format!(
                    "re-extraction inside crop: {err}"
                )))
            }
        };
        let contour = self
            .clusterer()
            .dominant(inner.as_slice(), ClusterMethod::Eps(opts.crop_eps));
        if contour.is_empty() {
            return Err(DropError::RegionIsolationFailed(
                "no dominant cluster inside crop".into(),
            ));
        }

        let info = RegionInfo {
            circle: circle.map(|c| c.translated(-left, -top)),
            baseline: baseline.map(|b| b.translated(-left, -top)),
            bounds,
            threshold: cues.threshold,
            tilt_deg: tilt.to_degrees(),
            split_y: split_y - top,
        };
        Ok(IsolatedRegion {
            image: crop,
            contour,
            info,
        })
    }

    fn locate(
        &self,
        img: &GrayImage,
        baseline_opts: &BaselineOptions,
        threshold: Option<u8>,
    ) -> Result<Cues, DropError> {
        let extraction = self.extractor().extract(img, threshold)?;
        let mut groups = self
            .clusterer()
            .ranked(extraction.contour.as_slice(), ClusterMethod::Xi(self.options.cluster_xi))
            .into_iter();
        let first = groups.next().ok_or_else(|| {
            DropError::RegionIsolationFailed("every contour point was classified as noise".into())
        })?;
        let contour = if has_needle_gap(&first, img.width() as f64, self.options.needle_band_px) {
            match groups.next() {
                Some(next) => {
                    debug!("RegionIsolator: largest group is a needle; using the next one");
                    next
                }
                None => first,
            }
        } else {
            first
        };
        let baseline = detect_baseline(&contour, img.width(), img.height(), baseline_opts);
        Ok(Cues {
            contour,
            threshold: extraction.threshold,
            baseline,
        })
    }
}

/// True when the points in the top band form two walls separated by a gap
/// typical of a needle (wider than 5 px, narrower than 10% of the frame).
fn has_needle_gap(group: &Contour, width: f64, band: f64) -> bool {
    let mut xs: Vec<f64> = group.iter().filter(|p| p.y <= band).map(|p| p.x).collect();
    if xs.len() < 2 {
        return false;
    }
    xs.sort_by(f64::total_cmp);
    let mid = (xs[0] + xs[xs.len() - 1]) / 2.0;
    let inner_left = xs.iter().copied().filter(|&x| x < mid).fold(f64::NEG_INFINITY, f64::max);
    let inner_right = xs.iter().copied().filter(|&x| x > mid).fold(f64::INFINITY, f64::min);
    let gap = inner_right - inner_left;
    gap.is_finite() && gap > 5.0 && gap < 0.1 * width
}

fn split_line(
    extent: &Bounds,
    circle: Option<&Circle>,
    baseline: Option<&Baseline>,
    opts: &RegionOptions,
) -> f64 {
    match (baseline, circle) {
        (Some(b), _) => {
            let base = b.min_y();
            base - (base - extent.top) * opts.split_above_baseline
        }
        (None, Some(c)) => c.center.y + c.radius / 2.0,
        (None, None) => extent.top + extent.height() * 0.5,
    }
}

fn crop_bounds(
    contour: &Contour,
    extent: &Bounds,
    circle: Option<&Circle>,
    baseline: Option<&Baseline>,
    intercepts: &[Point2D],
    split_y: f64,
    opts: &RegionOptions,
) -> Bounds {
    match (circle, baseline) {
        (Some(c), Some(b)) if !intercepts.is_empty() => {
            let lowest = b.p1.y.max(b.p2.y);
            let mid = intercepts[0].midpoint(&intercepts[intercepts.len() - 1]);
            let (top, bottom) = (
                c.center.y - opts.circle_pad * c.radius,
                lowest + (lowest - c.center.y + c.radius) * opts.below_baseline_pad,
            );
            let half_width = if c.center.y < mid.y - 0.4 * c.radius {
                // High angle: the widest point sits on the centre row.
                let r = contour
                    .iter()
                    .filter(|p| (p.y - c.center.y).abs() <= 0.5)
                    .map(|p| p.distance(&c.center))
                    .fold(c.radius, f64::max);
                opts.circle_pad * r
            } else {
                let near = |q: &Point2D| contour.nearest_index(q).map(|i| contour.points[i]);
                match (near(&intercepts[0]), near(&intercepts[intercepts.len() - 1])) {
                    (Some(a), Some(z)) => a.distance(&z) / 2.0 * 1.5,
                    _ => opts.circle_pad * c.radius,
                }
            };
            Bounds {
                left: c.center.x - half_width,
                right: c.center.x + half_width,
                top,
                bottom,
            }
        }
        (Some(c), _) => Bounds {
            left: c.center.x - opts.circle_only_pad_x * c.radius,
            right: c.center.x + opts.circle_only_pad_x * c.radius,
            top: c.center.y - opts.circle_pad * c.radius,
            bottom: c.center.y + opts.circle_pad * c.radius,
        },
        _ => {
            let above: Contour = contour.iter().filter(|p| p.y <= split_y).copied().collect();
            let drop = above.bounds().unwrap_or(*extent);
            Bounds {
                left: drop.left - opts.extent_pad * drop.width(),
                right: drop.right + opts.extent_pad * drop.width(),
                top: extent.top - opts.extent_pad * extent.height(),
                bottom: extent.bottom + opts.extent_pad * extent.height(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Line;
    use image::Luma;

    /// Dark circular cap resting on a dark substrate band.
    fn sessile_frame(w: u32, h: u32, cx: f64, base: f64, r: f64, cy: f64) -> GrayImage {
        let mut img = GrayImage::from_pixel(w, h, Luma([215]));
        for y in 0..h {
            for x in 0..w {
                let (xf, yf) = (x as f64, y as f64);
                let in_cap = yf <= base && (xf - cx).powi(2) + (yf - cy).powi(2) <= r * r;
                if in_cap || yf > base {
                    img.put_pixel(x, y, Luma([25]));
                }
            }
        }
        img
    }

    #[test]
    fn needle_gap_detection() {
        let mut pts: Vec<Point2D> = (2..10)
            .flat_map(|y| [Point2D::new(40.0, y as f64), Point2D::new(52.0, y as f64)])
            .collect();
        assert!(has_needle_gap(&Contour::new(pts.clone()), 200.0, 10.0));
        pts.retain(|p| p.x < 45.0);
        assert!(!has_needle_gap(&Contour::new(pts), 200.0, 10.0));
    }

    #[test]
    fn split_line_fallbacks() {
        let extent = Bounds {
            left: 10.0,
            right: 90.0,
            top: 20.0,
            bottom: 120.0,
        };
        let opts = RegionOptions::default();
        assert_eq!(split_line(&extent, None, None, &opts), 70.0);
        let c = Circle {
            center: Point2D::new(50.0, 60.0),
            radius: 40.0,
        };
        assert_eq!(split_line(&extent, Some(&c), None, &opts), 80.0);
        let b = Line::new(Point2D::new(0.0, 100.0), Point2D::new(99.0, 100.0));
        assert!((split_line(&extent, Some(&c), Some(&b), &opts) - 84.0).abs() < 1e-9);
    }

    #[test]
    fn isolates_a_sessile_drop() {
        let img = sessile_frame(240, 180, 120.0, 120.0, 50.0, 110.0);
        let region = RegionIsolator::default().isolate(&img, None).unwrap();
        assert!(!region.contour.is_empty());
        let b = region.info.bounds;
        assert!(b.left <= 70.0 && b.right >= 170.0, "{b:?}");
        assert!(b.top <= 60.0, "{b:?}");
        assert_eq!(region.image.width() as f64, b.right.ceil() - b.left.floor() + 1.0);
        assert!(region.info.split_y > 0.0);
        assert_eq!(region.info.tilt_deg, 0.0);
    }

    #[test]
    fn blank_frame_fails_cleanly() {
        let img = GrayImage::new(50, 40);
        assert_eq!(
            RegionIsolator::default().isolate(&img, None).unwrap_err(),
            DropError::NoContourFound
        );
    }
}
