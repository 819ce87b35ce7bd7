//! Widest points and rough contact-point guesses.
//!
//! Each flank is reduced to its innermost pixel per row and walked from the
//! apex downward. The widest point follows the flank outward; once the flank
//! turns back in, the guess tracks the inward-curling tail until the flank
//! widens again.
use crate::contour::{leftmost_per_row, rightmost_per_row, split_at_apex};
use crate::types::{Point2D, Side};

/// Widest point and rough contact point of each flank (`[left, right]`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoughGuesses {
    pub guesses: [Point2D; 2],
    pub widest: [Point2D; 2],
}

impl RoughGuesses {
    /// True when either guess coincides with a widest point.
    pub fn guess_at_widest(&self) -> bool {
        self.guesses
            .iter()
            .any(|g| self.widest.iter().any(|w| w == g))
    }
}

/// Rows skipped below the apex before the walk starts.
const APEX_SKIP: usize = 10;
/// Largest horizontal step accepted when moving the widest point outward.
const MAX_WIDEN_STEP: f64 = 15.0;

/// Walk one flank. `edge` runs top to bottom.
fn walk_flank(edge: &[Point2D], side: Side) -> (Point2D, Point2D) {
    let outward = |a: &Point2D, b: &Point2D| match side {
        Side::Left => a.x < b.x,
        Side::Right => a.x > b.x,
    };
    let mut widest = edge[APEX_SKIP];
    let mut guess: Option<Point2D> = None;
    for c in &edge[APEX_SKIP + 1..] {
        match guess {
            None => {
                if outward(c, &widest) && c.y > widest.y && (c.x - widest.x).abs() < MAX_WIDEN_STEP
                {
                    widest = *c;
                }
                if outward(&widest, c) && c.y > widest.y {
                    guess = Some(*c);
                }
            }
            Some(g) => {
                if outward(c, &widest) && c.y > widest.y && c.y <= g.y {
                    widest = *c;
                }
                if !outward(c, &g) && c.y > g.y {
                    guess = Some(*c);
                } else if outward(c, &g) && c.y > g.y {
                    break;
                }
            }
        }
    }
    (guess.unwrap_or(widest), widest)
}

/// Rough contact points and widest points of a drop contour.
///
/// Returns `None` when the contour has `min_points` points or fewer, or a
/// flank has too few rows to walk.
pub fn rough_guesses(points: &[Point2D], min_points: usize) -> Option<RoughGuesses> {
    if points.len() <= min_points {
        return None;
    }
    let split = split_at_apex(points)?;
    // Innermost pixel per row ignores substrate roughness outside the drop.
    let left = rightmost_per_row(&split.left);
    let right = leftmost_per_row(&split.right);
    if left.len() <= APEX_SKIP || right.len() <= APEX_SKIP {
        return None;
    }
    let (lg, lw) = walk_flank(&left, Side::Left);
    let (rg, rw) = walk_flank(&right, Side::Right);
    Some(RoughGuesses {
        guesses: [lg, rg],
        widest: [lw, rw],
    })
}
