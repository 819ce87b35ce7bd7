//! Contour extraction: raster image → ordered boundary of the drop.
//!
//! The extractor blurs, binarises (Otsu unless a threshold is supplied),
//! follows all borders and keeps the longest one, on the assumption that the
//! drop silhouette is the longest boundary in the frame. Points hugging the
//! image border are cropping artefacts and are dropped, and repeated pixels
//! from the border follower are removed while keeping first-visit order.
pub mod order;

pub use order::{
    leftmost_per_row, nearest_neighbour_path, order_drop_contour, rightmost_per_row,
    split_at_apex, ApexSplit,
};

use crate::error::DropError;
use crate::image::filters::blur_3x3;
use crate::types::{Bounds, Contour, Point2D};
use image::{GrayImage, Luma};
use imageproc::contours::find_contours;
use imageproc::contrast::{otsu_level, ThresholdType};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorOptions {
    /// Apply the 3×3 Gaussian before thresholding.
    pub blur: bool,
    /// Points closer than this many pixels to the image border are dropped.
    pub border_margin: usize,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            blur: true,
            border_margin: 1,
        }
    }
}

/// Output of one extraction: the contour and the threshold that produced it.
#[derive(Clone, Debug)]
pub struct Extraction {
    pub contour: Contour,
    pub threshold: u8,
}

#[derive(Clone, Debug, Default)]
pub struct ContourExtractor {
    pub options: ExtractorOptions,
}

impl ContourExtractor {
    pub fn new(options: ExtractorOptions) -> Self {
        Self { options }
    }

    /// Extract the drop boundary. Dark pixels (at or below the threshold) are
    /// treated as the drop.
    pub fn extract(&self, img: &GrayImage, threshold: Option<u8>) -> Result<Extraction, DropError> {
        let (w, h) = (img.width() as usize, img.height() as usize);
        if w == 0 || h == 0 {
            return Err(DropError::NoContourFound);
        }
        let smoothed = if self.options.blur {
            blur_3x3(img)
        } else {
            img.clone()
        };
        let level = threshold.unwrap_or_else(|| otsu_level(&smoothed));
        let binary =
            imageproc::contrast::threshold(&smoothed, level, ThresholdType::BinaryInverted);

        let mut borders: Vec<Vec<Point2D>> = find_contours::<i32>(&binary)
            .into_iter()
            .map(|c| {
                c.points
                    .iter()
                    .map(|p| Point2D::new(p.x as f64, p.y as f64))
                    .collect()
            })
            .collect();
        if borders.is_empty() {
            debug!("ContourExtractor: no borders at threshold {level}");
            return Err(DropError::NoContourFound);
        }
        // Stable sort keeps raster order among equally long borders.
        borders.sort_by(|a, b| {
            crate::types::arc_length(b, false).total_cmp(&crate::types::arc_length(a, false))
        });
        let longest = borders.swap_remove(0);
        let total = longest.len();

        let m = self.options.border_margin as f64;
        let (wf, hf) = (w as f64, h as f64);
        let mut seen = HashSet::with_capacity(total);
        let points: Vec<Point2D> = longest
            .into_iter()
            .filter(|p| m < p.x && p.x < wf - 1.0 - m && m < p.y && p.y < hf - 1.0 - m)
            .filter(|p| seen.insert((p.x as i64, p.y as i64)))
            .collect();
        debug!(
            "ContourExtractor: threshold={level} longest={total} kept={}",
            points.len()
        );
        if points.is_empty() {
            return Err(DropError::NoContourFound);
        }
        Ok(Extraction {
            contour: Contour::new(points),
            threshold: level,
        })
    }
}

/// Paint contour pixels with `fg` on a `bg` canvas of size `w × h`.
pub fn render_points(points: &[Point2D], w: u32, h: u32, fg: u8, bg: u8) -> GrayImage {
    let mut img = GrayImage::from_pixel(w, h, Luma([bg]));
    for p in points {
        let (x, y) = (p.x.round(), p.y.round());
        if x >= 0.0 && y >= 0.0 && (x as u32) < w && (y as u32) < h {
            img.put_pixel(x as u32, y as u32, Luma([fg]));
        }
    }
    img
}

/// Keep only the points inside `bounds`.
pub fn mask_to_bounds(contour: &Contour, bounds: &Bounds) -> Contour {
    contour.iter().filter(|p| bounds.contains(p)).copied().collect()
}
