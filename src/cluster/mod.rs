//! Density clustering of contour points.
//!
//! Used to throw away scattered edge noise (keep the largest spatial group)
//! and to separate needle pixels from drop pixels. Two rules are available:
//! a fixed neighbourhood radius (`eps`, DBSCAN) and a relative steepness on
//! the OPTICS reachability plot (`xi`). Groups keep the input point order.
pub mod dbscan;
pub mod optics;

use crate::error::DropError;
use crate::types::{Contour, Point2D};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Clustering rule.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClusterMethod {
    /// Maximum neighbour distance in pixels.
    Eps(f64),
    /// Minimum relative steepness of a cluster boundary, in (0, 1).
    Xi(f64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GroupId {
    Noise,
    Cluster(usize),
}

pub type ClusterMap = BTreeMap<GroupId, Contour>;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterOptions {
    /// Points (itself included) needed in a neighbourhood; also the minimum
    /// cluster size.
    pub min_samples: usize,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self { min_samples: 2 }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ContourClusterer {
    pub options: ClusterOptions,
}

impl ContourClusterer {
    pub fn new(options: ClusterOptions) -> Self {
        Self { options }
    }

    /// Group points; never fails. Degenerate input (at most one point, or
    /// all points identical) yields a single trivial group.
    pub fn cluster(&self, points: &[Point2D], method: ClusterMethod) -> ClusterMap {
        let mut map = ClusterMap::new();
        if is_degenerate(points) {
            warn!(
                "{}; returning a trivial group",
                DropError::ClusteringDegenerate {
                    points: points.len()
                }
            );
            map.insert(GroupId::Cluster(0), Contour::new(points.to_vec()));
            return map;
        }
        let min_samples = self.options.min_samples.max(1);
        let labels = match method {
            ClusterMethod::Eps(eps) => dbscan::dbscan(points, eps, min_samples),
            ClusterMethod::Xi(xi) => optics::optics_xi(points, xi, min_samples, min_samples),
        };
        for (p, label) in points.iter().zip(labels) {
            let id = label.map_or(GroupId::Noise, GroupId::Cluster);
            map.entry(id).or_default().points.push(*p);
        }
        map
    }

    /// Non-noise groups, largest first.
    pub fn ranked(&self, points: &[Point2D], method: ClusterMethod) -> Vec<Contour> {
        let mut groups: Vec<Contour> = self
            .cluster(points, method)
            .into_iter()
            .filter(|(id, _)| *id != GroupId::Noise)
            .map(|(_, c)| c)
            .collect();
        // Stable: equal sizes keep discovery order.
        groups.sort_by(|a, b| b.len().cmp(&a.len()));
        groups
    }

    /// The largest group; empty only when every point is noise.
    pub fn dominant(&self, points: &[Point2D], method: ClusterMethod) -> Contour {
        self.ranked(points, method)
            .into_iter()
            .next()
            .unwrap_or_default()
    }
}

fn is_degenerate(points: &[Point2D]) -> bool {
    match points.split_first() {
        None => true,
        Some((first, rest)) => rest.iter().all(|p| p == first),
    }
}
