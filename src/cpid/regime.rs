//! Drop regime classification from the flank angles at the widest points.
use crate::angle::calculate_contact_angle;
use crate::fit::line::fit_line_orthogonal;
use crate::types::{Point2D, Side};
use serde::{Deserialize, Serialize};

/// Shape class of a sessile drop, decided once per contour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Regime {
    /// Drop sitting on its mirror image; contacts at the widest points.
    Reflective,
    /// Near-vertical approach to the substrate; contacts at the rough guesses.
    HighAngleReflective,
    /// Steep above the widest point but shallow below; refined near the guesses.
    LowAngleReflective,
    /// Flank already shallow above the widest point; contacts at the widest points.
    LowAngle,
    /// Borderline steepness; refined near the guesses.
    MaybeHighAngle,
    /// Undercut flanks; contacts at the rough guesses.
    Hydrophobic,
    /// Guess and widest point coincide; refined around the widest points.
    GuessAtWidest,
    /// Contour too short for the walk; innermost bottom points.
    ShortContour,
}

/// How a regime turns rough cues into contact points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    Widest,
    Guesses,
    LfitNearGuesses,
    LfitNearWidest,
    Static,
}

impl Regime {
    pub fn strategy(self) -> Strategy {
        match self {
            Regime::Reflective | Regime::LowAngle => Strategy::Widest,
            Regime::HighAngleReflective | Regime::Hydrophobic => Strategy::Guesses,
            Regime::LowAngleReflective | Regime::MaybeHighAngle => Strategy::LfitNearGuesses,
            Regime::GuessAtWidest => Strategy::LfitNearWidest,
            Regime::ShortContour => Strategy::Static,
        }
    }
}

/// Angle thresholds of the decision table, in degrees.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeThresholds {
    /// Allowance below 90° for a flank to count as steep.
    pub error_margin: f64,
    /// Below-angle beyond which a drop meets its reflection.
    pub reflective_below: f64,
    /// Largest fold (180 − above − below) of a reflection.
    pub reflection_fold: f64,
    /// Below-angle required alongside a small fold.
    pub fold_below: f64,
    /// Smallest approach angle (180 − below) of a high-angle drop.
    pub steep_approach: f64,
    /// Above-angle under which a drop is low angle.
    pub low_angle: f64,
}

impl Default for RegimeThresholds {
    fn default() -> Self {
        Self {
            error_margin: 18.0,
            reflective_below: 100.0,
            reflection_fold: 8.0,
            fold_below: 99.0,
            steep_approach: 79.0,
            low_angle: 65.0,
        }
    }
}

/// Tangent angles just above and just below each widest point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlankAngles {
    pub left_above: f64,
    pub left_below: f64,
    pub right_above: f64,
    pub right_below: f64,
}

fn segment_angle(points: &[Point2D], side: Side) -> f64 {
    let slope = fit_line_orthogonal(points).map_or(f64::NAN, |f| f.slope);
    calculate_contact_angle(slope, side)
}

/// Measure the flank angles around the widest points at indices `left` and
/// `right` of an ordered contour, with windows of `n` points.
pub fn flank_angles(points: &[Point2D], left: usize, right: usize, n: usize) -> FlankAngles {
    let len = points.len();
    let span = |a: usize, b: usize| &points[a.min(len)..b.min(len)];
    FlankAngles {
        left_below: segment_angle(span(left.saturating_sub(n), left), Side::Left),
        left_above: segment_angle(span(left, left + n), Side::Left),
        right_below: segment_angle(span(right, right + n), Side::Right),
        right_above: segment_angle(span(right.saturating_sub(n), right), Side::Right),
    }
}

/// The decision table. Rules are tried in order; the first match wins.
pub fn classify(a: &FlankAngles, t: &RegimeThresholds) -> Regime {
    let steep = 90.0 - t.error_margin;
    let either = |f: &dyn Fn(f64, f64) -> bool| {
        f(a.left_above, a.left_below) || f(a.right_above, a.right_below)
    };
    if a.left_above > steep || a.right_above > steep {
        let both_steep = a.left_above >= steep && a.right_above >= steep;
        let both_folded = a.left_below > t.reflective_below && a.right_below > t.reflective_below;
        if both_steep && both_folded {
            Regime::Reflective
        } else if either(&|above, below| {
            180.0 - above - below < t.reflection_fold && below > t.fold_below
        }) {
            Regime::Reflective
        } else if either(&|_, below| 180.0 - below > t.steep_approach) {
            Regime::HighAngleReflective
        } else {
            Regime::LowAngleReflective
        }
    } else if a.left_above < t.low_angle || a.right_above < t.low_angle {
        Regime::LowAngle
    } else if either(&|above, _| t.low_angle < above && above < steep) {
        Regime::MaybeHighAngle
    } else {
        Regime::Hydrophobic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn angles(la: f64, lb: f64, ra: f64, rb: f64) -> FlankAngles {
        FlankAngles {
            left_above: la,
            left_below: lb,
            right_above: ra,
            right_below: rb,
        }
    }

    #[test]
    fn decision_table() {
        let t = RegimeThresholds::default();
        assert_eq!(classify(&angles(80.0, 110.0, 85.0, 105.0), &t), Regime::Reflective);
        // Fold on the right flank only.
        assert_eq!(classify(&angles(75.0, 95.0, 80.0, 99.5), &t), Regime::Reflective);
        assert_eq!(
            classify(&angles(80.0, 95.0, 78.0, 96.0), &t),
            Regime::HighAngleReflective
        );
        // With the default thresholds a steep flank folding past 101° is
        // always caught as a reflection first.
        let strict = RegimeThresholds {
            fold_below: 179.0,
            ..Default::default()
        };
        assert_eq!(
            classify(&angles(80.0, 150.0, 70.0, 170.0), &strict),
            Regime::LowAngleReflective
        );
        assert_eq!(classify(&angles(40.0, 170.0, 45.0, 175.0), &t), Regime::LowAngle);
        assert_eq!(classify(&angles(68.0, 90.0, 70.0, 90.0), &t), Regime::MaybeHighAngle);
        assert_eq!(classify(&angles(72.0, 90.0, 65.0, 90.0), &t), Regime::Hydrophobic);
    }

    #[test]
    fn strategies() {
        assert_eq!(Regime::Reflective.strategy(), Strategy::Widest);
        assert_eq!(Regime::Hydrophobic.strategy(), Strategy::Guesses);
        assert_eq!(Regime::MaybeHighAngle.strategy(), Strategy::LfitNearGuesses);
        assert_eq!(Regime::GuessAtWidest.strategy(), Strategy::LfitNearWidest);
    }

    #[test]
    fn flank_angles_of_a_vertical_wall() {
        // Left flank running straight up at x = 10, then across the top.
        let mut pts: Vec<Point2D> = (0..30).map(|i| Point2D::new(10.0, 60.0 - i as f64)).collect();
        pts.extend((1..30).map(|i| Point2D::new(10.0 + i as f64, 31.0)));
        let a = flank_angles(&pts, 15, pts.len() - 1, 10);
        assert!((a.left_above - 90.0).abs() < 1e-9);
        assert!((a.left_below - 90.0).abs() < 1e-9);
    }
}
