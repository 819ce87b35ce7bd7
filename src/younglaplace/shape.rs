//! Dimensionless Young–Laplace profile.
//!
//! The axisymmetric interface of a hanging drop is traced from its lowest
//! point by arclength `s`, with `Z` rising from the apex towards the needle:
//!
//! ```text
//! dφ/ds = 2 − Bo·Z − sin φ / X
//! dX/ds = cos φ
//! dZ/ds = sin φ
//! ```
//!
//! with the apex radius of curvature as the unit length. Measured along
//! gravity instead (`Z' = −Z`) this is the familiar `2 + Bo·Z' − sin φ / X`.
//! Hydrostatic pressure falls with height, so a pendant drop has `Bo > 0` and
//! narrows into a neck above its equator. Volume and surface area of the body
//! of revolution are integrated alongside. The table is built once per Bond
//! number with a fixed-step RK4 and queried by closest-point projection.
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeOptions {
    /// Integration step in apex radii.
    pub step: f64,
    /// Longest arclength tabulated.
    pub max_arclength: f64,
}

impl Default for ShapeOptions {
    fn default() -> Self {
        Self {
            step: 0.01,
            max_arclength: 20.0,
        }
    }
}

/// One tabulated node of the profile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProfileNode {
    pub s: f64,
    pub phi: f64,
    pub x: f64,
    pub z: f64,
    /// Volume enclosed between the apex and this node.
    pub volume: f64,
    /// Surface area between the apex and this node.
    pub area: f64,
}

/// Closest profile point to a query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Closest {
    /// Arclength of the closest point.
    pub s: f64,
    pub x: f64,
    pub z: f64,
    /// Signed distance along the outward normal.
    pub distance: f64,
}

#[derive(Clone, Debug)]
pub struct YoungLaplaceShape {
    bond: f64,
    nodes: Vec<ProfileNode>,
}

type State = [f64; 5];

fn derivative(bond: f64, st: &State) -> State {
    let [phi, x, z, _, _] = *st;
    let (sp, cp) = phi.sin_cos();
    [
        2.0 - bond * z - sp / x,
        cp,
        sp,
        PI * x * x * sp,
        2.0 * PI * x,
    ]
}

fn rk4_step(bond: f64, st: &State, h: f64) -> State {
    let add = |a: &State, k: &State, f: f64| -> State {
        let mut out = *a;
        for (o, d) in out.iter_mut().zip(k) {
            *o += f * d;
        }
        out
    };
    let k1 = derivative(bond, st);
    let k2 = derivative(bond, &add(st, &k1, h / 2.0));
    let k3 = derivative(bond, &add(st, &k2, h / 2.0));
    let k4 = derivative(bond, &add(st, &k3, h));
    let mut out = *st;
    for i in 0..5 {
        out[i] += h / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
    }
    out
}

impl YoungLaplaceShape {
    pub fn new(bond: f64) -> Self {
        Self::with_options(bond, &ShapeOptions::default())
    }

    /// Tabulate the profile until it closes over (`φ ≥ π`), returns to the
    /// axis, passes its first neck, or reaches the arclength limit.
    pub fn with_options(bond: f64, opts: &ShapeOptions) -> Self {
        let h = opts.step.max(1e-4);
        let mut nodes = vec![ProfileNode {
            s: 0.0,
            phi: 0.0,
            x: 0.0,
            z: 0.0,
            volume: 0.0,
            area: 0.0,
        }];
        // Series expansion about the apex, where sin φ / X is singular.
        let s0 = h;
        let mut st: State = [
            s0,
            s0 - s0.powi(3) / 6.0,
            s0 * s0 / 2.0,
            PI * s0.powi(4) / 4.0,
            PI * s0 * s0,
        ];
        let mut s = s0;
        let mut past_equator = false;
        while s <= opts.max_arclength {
            let [phi, x, z, volume, area] = st;
            if !st.iter().all(|v| v.is_finite()) || x <= 0.0 {
                break;
            }
            nodes.push(ProfileNode {
                s,
                phi,
                x,
                z,
                volume,
                area,
            });
            // Past the neck the profile widens again into a bulb that no
            // needle-held drop reaches.
            if phi >= PI || (past_equator && phi < PI / 2.0) {
                break;
            }
            past_equator |= phi > PI / 2.0;
            st = rk4_step(bond, &st, h);
            s += h;
        }
        Self { bond, nodes }
    }

    pub fn bond(&self) -> f64 {
        self.bond
    }

    pub fn nodes(&self) -> &[ProfileNode] {
        &self.nodes
    }

    /// Arclength covered by the table.
    pub fn max_arclength(&self) -> f64 {
        self.nodes.last().map_or(0.0, |n| n.s)
    }

    fn interpolate(&self, s: f64) -> ProfileNode {
        let s = s.clamp(0.0, self.max_arclength());
        let i = self.nodes.partition_point(|n| n.s < s).min(self.nodes.len() - 1);
        if i == 0 {
            return self.nodes[0];
        }
        let (a, b) = (self.nodes[i - 1], self.nodes[i]);
        let t = if b.s > a.s { (s - a.s) / (b.s - a.s) } else { 0.0 };
        let lerp = |u: f64, v: f64| u + t * (v - u);
        ProfileNode {
            s,
            phi: lerp(a.phi, b.phi),
            x: lerp(a.x, b.x),
            z: lerp(a.z, b.z),
            volume: lerp(a.volume, b.volume),
            area: lerp(a.area, b.area),
        }
    }

    /// `(X, Z)` at arclength `s`, clamped to the table.
    pub fn point_at(&self, s: f64) -> (f64, f64) {
        let n = self.interpolate(s);
        (n.x, n.z)
    }

    /// Volume between the apex and arclength `s`.
    pub fn volume(&self, s: f64) -> f64 {
        self.interpolate(s).volume
    }

    /// Surface area between the apex and arclength `s`.
    pub fn surface_area(&self, s: f64) -> f64 {
        self.interpolate(s).area
    }

    /// Closest profile point to `(r, z)`, with `r ≥ 0` the distance from the
    /// axis. The distance is positive outside the profile.
    pub fn closest(&self, r: f64, z: f64) -> Closest {
        let nearest = self
            .nodes
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                let da = (a.x - r).powi(2) + (a.z - z).powi(2);
                let db = (b.x - r).powi(2) + (b.z - z).powi(2);
                da.total_cmp(&db)
            })
            .map_or(0, |(i, _)| i);

        let mut best: Option<(f64, Closest)> = None;
        let lo = nearest.saturating_sub(1);
        let hi = (nearest + 1).min(self.nodes.len() - 1);
        for i in lo..hi.max(lo + 1) {
            let a = self.nodes[i];
            let b = self.nodes[(i + 1).min(self.nodes.len() - 1)];
            let (dx, dz) = (b.x - a.x, b.z - a.z);
            let len_sq = dx * dx + dz * dz;
            let t = if len_sq > 0.0 {
                (((r - a.x) * dx + (z - a.z) * dz) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let (px, pz) = (a.x + t * dx, a.z + t * dz);
            let d_sq = (r - px).powi(2) + (z - pz).powi(2);
            if best.as_ref().map_or(true, |(d, _)| d_sq < *d) {
                // Outward normal of a curve running away from the apex.
                let (nx, nz) = if len_sq > 0.0 {
                    let len = len_sq.sqrt();
                    (dz / len, -dx / len)
                } else {
                    (0.0, -1.0)
                };
                let signed = (r - px) * nx + (z - pz) * nz;
                let distance = if d_sq > 0.0 {
                    d_sq.sqrt().copysign(signed)
                } else {
                    0.0
                };
                best = Some((
                    d_sq,
                    Closest {
                        s: a.s + t * (b.s - a.s),
                        x: px,
                        z: pz,
                        distance,
                    },
                ));
            }
        }
        best.map_or(
            Closest {
                s: 0.0,
                x: 0.0,
                z: 0.0,
                distance: (r * r + z * z).sqrt(),
            },
            |(_, c)| c,
        )
    }
}
