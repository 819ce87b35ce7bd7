//! Levenberg–Marquardt over the profile parameters.
//!
//! Parameters are `[apex_x, apex_y, rotation, radius, bond]`. A contour point
//! `p` maps to `(u, v) = R(-rotation)·(p - apex) / radius` and is compared
//! with the profile at `(X, Z) = (|u|, -v)`: with `rotation = 0` the apex is
//! the lowest point in the image and `Z` grows up towards the needle, the
//! orientation in which a pendant drop has a positive Bond number.
//! The residual is the signed closest-point distance to the profile, in
//! pixels. The Jacobian is taken by forward differences.
use super::shape::{ShapeOptions, YoungLaplaceShape};
use super::CancelToken;
use crate::error::DropError;
use crate::types::Point2D;
use log::debug;
use nalgebra::{SMatrix, SVector};
use serde::{Deserialize, Serialize};

pub(crate) const N_PARAMS: usize = 5;
pub(crate) type Params = SVector<f64, N_PARAMS>;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    pub max_iterations: usize,
    /// Relative decrease of the objective below which the fit has converged.
    pub ftol: f64,
    /// Relative step size below which the fit has converged.
    pub xtol: f64,
    /// Largest gradient component below which the fit has converged.
    pub gtol: f64,
    pub initial_damping: f64,
    pub shape: ShapeOptions,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-10,
            initial_damping: 1e-3,
            shape: ShapeOptions::default(),
        }
    }
}

/// Final state of one solve.
#[derive(Clone, Debug)]
pub(crate) struct Solution {
    pub params: Params,
    pub shape: YoungLaplaceShape,
    pub iterations: usize,
    pub objective: f64,
}

/// Dimensionless `(u, z)` of an image point; `|u|` is the distance from the
/// axis and its sign the side.
pub(crate) fn to_model(params: &Params, p: &Point2D) -> (f64, f64) {
    let (s, c) = params[2].sin_cos();
    let (dx, dy) = (p.x - params[0], p.y - params[1]);
    let u = (c * dx + s * dy) / params[3];
    let v = (-s * dx + c * dy) / params[3];
    (u, -v)
}

/// Image position of the profile point `(x, z)` on the side `sign`.
pub(crate) fn to_image(params: &Params, x: f64, z: f64, sign: f64) -> Point2D {
    let (s, c) = params[2].sin_cos();
    let (u, v) = (sign * x * params[3], -z * params[3]);
    Point2D::new(params[0] + c * u - s * v, params[1] + s * u + c * v)
}

fn residuals(params: &Params, shape: &YoungLaplaceShape, points: &[Point2D], out: &mut Vec<f64>) {
    out.clear();
    out.extend(points.iter().map(|p| {
        let (u, z) = to_model(params, p);
        shape.closest(u.abs(), z).distance * params[3]
    }));
}

fn objective(r: &[f64]) -> f64 {
    r.iter().map(|v| v * v).sum()
}

fn step_size(value: f64) -> f64 {
    1e-6 * value.abs().max(1.0)
}

/// Minimise the squared closest-point distances from `initial`.
pub(crate) fn solve(
    points: &[Point2D],
    initial: Params,
    opts: &SolverOptions,
    cancel: Option<&CancelToken>,
) -> Result<Solution, DropError> {
    let shape_for = |bond: f64| YoungLaplaceShape::with_options(bond, &opts.shape);
    let mut params = initial;
    let mut shape = shape_for(params[4]);
    let mut r = Vec::with_capacity(points.len());
    residuals(&params, &shape, points, &mut r);
    let mut cost = objective(&r);
    let mut lambda = opts.initial_damping;
    let mut r_shifted = Vec::with_capacity(points.len());

    for iteration in 1..=opts.max_iterations {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(DropError::Cancelled);
        }
        if cost < 1e-12 {
            return Ok(Solution {
                params,
                shape,
                iterations: iteration - 1,
                objective: cost,
            });
        }

        // Forward-difference Jacobian; only the bond changes the table.
        let mut jac = vec![SVector::<f64, N_PARAMS>::zeros(); points.len()];
        for k in 0..N_PARAMS {
            let h = step_size(params[k]);
            let mut shifted = params;
            shifted[k] += h;
            if k == 4 {
                residuals(&shifted, &shape_for(shifted[4]), points, &mut r_shifted);
            } else {
                residuals(&shifted, &shape, points, &mut r_shifted);
            }
            for (row, (rp, r0)) in jac.iter_mut().zip(r_shifted.iter().zip(&r)) {
                row[k] = (rp - r0) / h;
            }
        }
        let mut jtj = SMatrix::<f64, N_PARAMS, N_PARAMS>::zeros();
        let mut grad = Params::zeros();
        for (row, ri) in jac.iter().zip(&r) {
            jtj += row * row.transpose();
            grad += row * *ri;
        }
        if grad.amax() < opts.gtol {
            return Ok(Solution {
                params,
                shape,
                iterations: iteration,
                objective: cost,
            });
        }

        // Raise the damping until a step lowers the objective.
        loop {
            let mut damped = jtj;
            for k in 0..N_PARAMS {
                damped[(k, k)] += lambda * jtj[(k, k)].max(1e-12);
            }
            let Some(delta) = damped.lu().solve(&(-grad)) else {
                lambda *= 10.0;
                if lambda > 1e16 {
                    break;
                }
                continue;
            };
            let mut trial = params + delta;
            if trial[3] <= 0.0 {
                lambda *= 10.0;
                if lambda > 1e16 {
                    break;
                }
                continue;
            }
            trial[2] = crate::angle::normalize_rotation(trial[2]);
            let trial_shape = shape_for(trial[4]);
            residuals(&trial, &trial_shape, points, &mut r_shifted);
            let trial_cost = objective(&r_shifted);
            if trial_cost.is_finite() && trial_cost < cost {
                let decrease = (cost - trial_cost) / cost.max(f64::MIN_POSITIVE);
                let step = delta.norm() / (params.norm() + opts.xtol);
                params = trial;
                shape = trial_shape;
                std::mem::swap(&mut r, &mut r_shifted);
                cost = trial_cost;
                lambda = (lambda / 10.0).max(1e-12);
                debug!(
                    "YoungLaplace LM: iter={iteration} cost={cost:.3e} bond={:.5} radius={:.3}",
                    params[4], params[3]
                );
                if decrease < opts.ftol || step < opts.xtol {
                    return Ok(Solution {
                        params,
                        shape,
                        iterations: iteration,
                        objective: cost,
                    });
                }
                break;
            }
            lambda *= 10.0;
            if lambda > 1e16 {
                break;
            }
        }
        if lambda > 1e16 {
            // No step lowers the objective: a stationary point.
            return Ok(Solution {
                params,
                shape,
                iterations: iteration,
                objective: cost,
            });
        }
    }
    Err(DropError::FitDidNotConverge {
        iterations: opts.max_iterations,
    })
}
