//! Contact point identification for sessile drops.
//!
//! The locator works on a drop contour ordered from its bottom-left end, up
//! the left flank, over the apex and down the right flank (see
//! [`crate::contour::order_drop_contour`]). It runs once per contour:
//!
//! 1. walk both flanks for the widest points and rough contact guesses;
//! 2. classify the drop from the flank angles around the widest points;
//! 3. resolve contacts with the strategy the regime selects (widest points,
//!    rough guesses, or a local linear fit refinement around either).
//!
//! Contours too short for the walk fall back to the innermost points of the
//! bottom band. Both returned points lie on the input contour.
pub mod fallback;
pub mod lfit;
pub mod regime;
pub mod widest;

pub use fallback::static_hydrophobic;
pub use lfit::{iterative_lfit, window_profile, LfitOptions, LfitResult, WindowProfile};
pub use regime::{classify, flank_angles, FlankAngles, Regime, RegimeThresholds, Strategy};
pub use widest::{rough_guesses, RoughGuesses};

use crate::error::DropError;
use crate::types::{ContactPoint, Contour, Point2D, Side};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CpidOptions {
    /// Contours with this many points or fewer use the static fallback.
    pub min_points: usize,
    /// Window used for the flank angles around the widest points.
    pub angle_window: usize,
    /// Refinement window as a percentage of the points between the widest
    /// points.
    pub lfit_percentage: f64,
    /// Margin, in angle windows, kept around the widest points or guesses
    /// when restricting the refinement.
    pub restrict_windows: usize,
    pub lfit: LfitOptions,
    pub thresholds: RegimeThresholds,
}

impl Default for CpidOptions {
    fn default() -> Self {
        Self {
            min_points: 110,
            angle_window: 10,
            lfit_percentage: 2.5,
            restrict_windows: 4,
            lfit: LfitOptions::default(),
            thresholds: RegimeThresholds::default(),
        }
    }
}

/// The two contact points of a drop and how they were found.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPoints {
    pub left: ContactPoint,
    pub right: ContactPoint,
    /// Indices of `left` and `right` in the input contour.
    pub left_index: usize,
    pub right_index: usize,
    pub regime: Regime,
    /// Flank angles measured for the classification, when it ran.
    pub flank_angles: Option<FlankAngles>,
    /// Set when a refinement fell back to its best-effort candidate.
    pub low_confidence: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ContactPointLocator {
    pub options: CpidOptions,
}

impl ContactPointLocator {
    pub fn new(options: CpidOptions) -> Self {
        Self { options }
    }

    /// Locate both contact points of an ordered drop contour.
    pub fn locate(&self, contour: &Contour) -> Result<ContactPoints, DropError> {
        let pts = contour.as_slice();
        if pts.len() < 2 {
            return Err(DropError::InsufficientPoints {
                needed: 2,
                found: pts.len(),
            });
        }
        let opts = &self.options;
        let Some(rough) = rough_guesses(pts, opts.min_points) else {
            return self.static_points(contour);
        };
        let (Some(i1), Some(i2)) = (
            contour.position_of(&rough.widest[0]),
            contour.position_of(&rough.widest[1]),
        ) else {
            return self.static_points(contour);
        };
        let between = i2.abs_diff(i1);
        let lfit_n = (between as f64 * opts.lfit_percentage / 100.0) as usize;
        let n = opts.angle_window;
        let margin = opts.restrict_windows * n;

        if rough.guess_at_widest() {
            let lo = i1.min(i2).saturating_sub(margin);
            let hi = (i1.max(i2) + margin).min(pts.len());
            let refined = iterative_lfit(&pts[lo..hi], lfit_n, &opts.lfit);
            let (left, right, low) = match refined {
                Some(r) => (
                    max_by_x(r.left, rough.widest[0]),
                    min_by_x(r.right, rough.widest[1]),
                    r.low_confidence,
                ),
                None => (rough.widest[0], rough.widest[1], true),
            };
            return Ok(self.finish(contour, left, right, Regime::GuessAtWidest, None, low));
        }

        let angles = flank_angles(pts, i1, i2, n);
        let regime = classify(&angles, &opts.thresholds);
        debug!(
            "ContactPointLocator: regime={regime:?} above=({:.1}, {:.1}) below=({:.1}, {:.1})",
            angles.left_above, angles.right_above, angles.left_below, angles.right_below
        );
        let (left, right, low) = match regime.strategy() {
            Strategy::Widest => (rough.widest[0], rough.widest[1], false),
            Strategy::Guesses => (rough.guesses[0], rough.guesses[1], false),
            _ => {
                let g1 = contour.position_of(&rough.guesses[0]).unwrap_or(i1);
                let g2 = contour.position_of(&rough.guesses[1]).unwrap_or(i2);
                let lo = g1.min(g2).saturating_sub(margin);
                let hi = (g1.max(g2) + margin).min(pts.len());
                match iterative_lfit(&pts[lo..hi], lfit_n, &opts.lfit) {
                    Some(r) => (r.left, r.right, r.low_confidence),
                    None => (rough.guesses[0], rough.guesses[1], true),
                }
            }
        };
        Ok(self.finish(contour, left, right, regime, Some(angles), low))
    }

    fn static_points(&self, contour: &Contour) -> Result<ContactPoints, DropError> {
        match static_hydrophobic(contour.as_slice()) {
            Some([l, r]) => Ok(self.finish(contour, l, r, Regime::ShortContour, None, false)),
            None => Err(DropError::ContactPointAmbiguous(
                "no points in the bottom band of either half".into(),
            )),
        }
    }

    fn finish(
        &self,
        contour: &Contour,
        a: Point2D,
        b: Point2D,
        regime: Regime,
        flank_angles: Option<FlankAngles>,
        low_confidence: bool,
    ) -> ContactPoints {
        let snap = |p: Point2D| -> (Point2D, usize) {
            match contour.position_of(&p).or_else(|| contour.nearest_index(&p)) {
                Some(i) => (contour.points[i], i),
                None => (p, 0),
            }
        };
        let (mut l, mut r) = (snap(a), snap(b));
        if l.0.x > r.0.x {
            std::mem::swap(&mut l, &mut r);
        }
        if low_confidence {
            warn!(
                "{}",
                DropError::ContactPointAmbiguous(format!(
                    "{regime:?}: refinement fell back to the largest fit error"
                ))
            );
        }
        ContactPoints {
            left: ContactPoint::new(l.0, Side::Left),
            right: ContactPoint::new(r.0, Side::Right),
            left_index: l.1,
            right_index: r.1,
            regime,
            flank_angles,
            low_confidence,
        }
    }
}

fn max_by_x(a: Point2D, b: Point2D) -> Point2D {
    if b.x > a.x {
        b
    } else {
        a
    }
}

fn min_by_x(a: Point2D, b: Point2D) -> Point2D {
    if b.x < a.x {
        b
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::order_drop_contour;

    /// Pixel circle cap (centre `h` above the substrate at y = 200, radius
    /// 60) on a substrate line running 40 px past each side. The left half
    /// is rasterised and mirrored about x = 150.
    fn cap_on_substrate(h: f64) -> Contour {
        let (cx, base, r) = (150.0, 200.0, 60.0);
        let cy = base - h;
        let half = (r * r - h * h).sqrt();
        let mut set = std::collections::BTreeSet::new();
        let steps = 2000;
        for i in 0..=steps {
            let t = std::f64::consts::PI * i as f64 / steps as f64;
            let (x, y) = (cx - r * t.sin(), cy + r * t.cos());
            if y <= base {
                set.insert((x.round() as i64, y.round() as i64));
            }
        }
        let xl = (cx - half).round() as i64;
        for x in (xl - 40)..=xl {
            set.insert((x, base as i64));
        }
        let mirrored: Vec<(i64, i64)> = set
            .iter()
            .filter(|(x, _)| *x < 150)
            .map(|&(x, y)| (300 - x, y))
            .collect();
        set.extend(mirrored);
        let pts: Contour = set
            .into_iter()
            .map(|(x, y)| Point2D::new(x as f64, y as f64))
            .collect();
        order_drop_contour(&pts)
    }

    #[test]
    fn symmetric_cap_gives_mirrored_contacts() {
        for h in [-30.0, 0.0, 30.0] {
            let contour = cap_on_substrate(h);
            let cps = ContactPointLocator::default().locate(&contour).unwrap();
            let (l, r) = (cps.left.position, cps.right.position);
            assert!(l.x < r.x);
            assert!((l.x + r.x - 300.0).abs() <= 4.0, "h={h} {cps:?}");
            assert!((l.y - r.y).abs() <= 3.0, "h={h} {cps:?}");
            assert_eq!(contour.points[cps.left_index], l);
            assert_eq!(contour.points[cps.right_index], r);
        }
    }

    #[test]
    fn short_contour_uses_static_points() {
        let pts: Contour = (0..=30)
            .map(|i| {
                let t = std::f64::consts::PI * i as f64 / 30.0;
                Point2D::new(
                    (50.0 - 15.0 * t.cos()).round(),
                    (40.0 - 15.0 * t.sin()).round(),
                )
            })
            .collect();
        let cps = ContactPointLocator::default().locate(&pts).unwrap();
        assert_eq!(cps.regime, Regime::ShortContour);
        assert!(cps.left.position.x < 50.0 && cps.right.position.x > 50.0);
    }

    #[test]
    fn too_few_points_is_an_error() {
        let pts = Contour::new(vec![Point2D::new(1.0, 1.0)]);
        assert!(matches!(
            ContactPointLocator::default().locate(&pts),
            Err(DropError::InsufficientPoints { .. })
        ));
    }
}
