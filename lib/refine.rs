//! Continuous optimization of circuit parameters with the gate structure held
//! fixed.
//!
//! [`ContinuousOptimizer`] turns every parameter of a circuit into a free
//! variable (see [`SymbolicCircuit`]) and minimizes the trace distance to a
//! target over the box [0, 2π]<sup>*n*</sup> by basin hopping: repeated
//! bounded [Nelder–Mead][nelder_mead] descents from randomly displaced
//! starting points, with Metropolis acceptance of each descent's result as the
//! next starting point. The search stops after `n_iters` hops, or early once
//! `patience` consecutive hops fail to improve on the best minimum.
//!
//! This is slower than the sampling-based refinement built into
//! [`Mloa`][crate::search::mloa::Mloa] and is meant to polish a finished
//! search's best circuit.

use std::f64::consts::TAU;
use ndarray as nd;
use num_complex::Complex64 as C64;
use rand::Rng;
use serde::{ Deserialize, Serialize };
use thiserror::Error;
use tracing::debug;
use crate::{
    circuit::{ Circuit, CircuitError },
    compose::SymbolicCircuit,
    distance::trace_distance,
};

#[derive(Debug, Error)]
pub enum RefineError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("target has shape {0}×{1}, but the circuit's unitary is {2}×{2}")]
    TargetShape(usize, usize, usize),

    #[error("starting point has {0} coordinate(s), but the bounds have {1}")]
    DimensionMismatch(usize, usize),

    #[error("circuit error: {0}")]
    CircuitError(#[from] CircuitError),
}
pub type RefineResult<T> = Result<T, RefineError>;
use RefineError::*;

/// Settings for [`nelder_mead`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NelderMeadConfig {
    /// Maximum number of simplex updates.
    pub max_iters: usize,
    /// Offset of the initial simplex vertices from the starting point.
    pub initial_step: f64,
    /// Convergence threshold on the spread of the simplex in each coordinate.
    pub xtol: f64,
    /// Convergence threshold on the spread of the function values.
    pub ftol: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self { max_iters: 500, initial_step: 0.5, xtol: 1e-8, ftol: 1e-12 }
    }
}

impl NelderMeadConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> RefineResult<()> {
        if self.initial_step <= 0.0 {
            return Err(InvalidConfig("initial_step must be > 0".into()));
        }
        if self.xtol < 0.0 || self.ftol < 0.0 {
            return Err(InvalidConfig("tolerances must be >= 0".into()));
        }
        Ok(())
    }
}

/// Settings for [`ContinuousOptimizer`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasinHoppingConfig {
    /// Maximum number of hops.
    pub n_iters: usize,
    /// Stop after this many consecutive hops without a new best minimum.
    pub patience: usize,
    /// Half-width of the uniform random displacement applied in each
    /// coordinate before a hop.
    pub step_size: f64,
    /// Metropolis temperature for accepting a worse minimum as the next
    /// starting point.
    pub temperature: f64,
    /// Settings for each local descent.
    pub local: NelderMeadConfig,
}

impl Default for BasinHoppingConfig {
    fn default() -> Self {
        Self {
            n_iters: 20,
            patience: 5,
            step_size: 0.5,
            temperature: 1.0,
            local: NelderMeadConfig::default(),
        }
    }
}

impl BasinHoppingConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> RefineResult<()> {
        if self.patience == 0 {
            return Err(InvalidConfig("patience must be > 0".into()));
        }
        if self.step_size < 0.0 {
            return Err(InvalidConfig("step_size must be >= 0".into()));
        }
        if self.temperature <= 0.0 {
            return Err(InvalidConfig("temperature must be > 0".into()));
        }
        self.local.validate()
    }
}

/// A located minimum.
#[derive(Clone, Debug, PartialEq)]
pub struct Minimum {
    /// Location.
    pub x: Vec<f64>,
    /// Function value at `x`.
    pub value: f64,
    /// Number of function evaluations spent finding it.
    pub n_evals: usize,
}

fn clamp_into(x: &mut [f64], lower: &[f64], upper: &[f64]) {
    x.iter_mut().zip(lower.iter().zip(upper))
        .for_each(|(xk, (lo, hi))| { *xk = xk.clamp(*lo, *hi); });
}

/// Minimize `f` over the box `lower ≤ x ≤ upper` with the Nelder–Mead
/// simplex method, starting from `x0`.
///
/// Every trial point is clamped into the box. The returned value is never
/// larger than `f` at the clamped starting point. Running out of iterations
/// is not an error; the best vertex found so far is returned.
pub fn nelder_mead<F>(
    mut f: F,
    x0: &[f64],
    lower: &[f64],
    upper: &[f64],
    config: &NelderMeadConfig,
) -> RefineResult<Minimum>
where F: FnMut(&[f64]) -> RefineResult<f64>
{
    const ALPHA: f64 = 1.0; // reflection
    const GAMMA: f64 = 2.0; // expansion
    const RHO: f64 = 0.5; // contraction
    const SIGMA: f64 = 0.5; // shrink

    let n = x0.len();
    if lower.len() != n { return Err(DimensionMismatch(n, lower.len())); }
    if upper.len() != n { return Err(DimensionMismatch(n, upper.len())); }
    let mut n_evals: usize = 0;
    let mut eval = |x: &[f64]| -> RefineResult<f64> {
        n_evals += 1;
        f(x)
    };

    let mut start = x0.to_vec();
    clamp_into(&mut start, lower, upper);
    let f0 = eval(&start)?;
    if n == 0 {
        return Ok(Minimum { x: start, value: f0, n_evals });
    }

    // initial simplex: step along each axis, away from the nearer bound
    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
    simplex.push((start.clone(), f0));
    for k in 0..n {
        let mut v = start.clone();
        v[k] =
            if v[k] + config.initial_step <= upper[k] {
                v[k] + config.initial_step
            } else {
                v[k] - config.initial_step
            };
        clamp_into(&mut v, lower, upper);
        let fv = eval(&v)?;
        simplex.push((v, fv));
    }

    let point = |a: &[f64], b: &[f64], t: f64| -> Vec<f64> {
        // a + t (b - a), clamped
        let mut p: Vec<f64> =
            a.iter().zip(b).map(|(ak, bk)| ak + t * (bk - ak)).collect();
        clamp_into(&mut p, lower, upper);
        p
    };

    for _ in 0..config.max_iters {
        simplex.sort_by(|l, r| l.1.total_cmp(&r.1));
        let f_best = simplex[0].1;
        let f_worst = simplex[n].1;
        let x_spread =
            simplex[1..].iter()
            .flat_map(|(v, _)| v.iter().zip(&simplex[0].0).map(|(a, b)| (a - b).abs()))
            .fold(0.0, f64::max);
        if (f_worst - f_best).abs() <= config.ftol && x_spread <= config.xtol {
            break;
        }

        let mut centroid = vec![0.0; n];
        for (v, _) in simplex[..n].iter() {
            centroid.iter_mut().zip(v).for_each(|(c, vk)| { *c += vk; });
        }
        centroid.iter_mut().for_each(|c| { *c /= n as f64; });

        let worst = simplex[n].0.clone();
        let xr = point(&centroid, &worst, -ALPHA);
        let fr = eval(&xr)?;
        if fr < f_best {
            let xe = point(&centroid, &xr, GAMMA);
            let fe = eval(&xe)?;
            simplex[n] = if fe < fr { (xe, fe) } else { (xr, fr) };
            continue;
        }
        if fr < simplex[n - 1].1 {
            simplex[n] = (xr, fr);
            continue;
        }
        let (xc, fc) =
            if fr < f_worst {
                let xc = point(&centroid, &xr, RHO);
                let fc = eval(&xc)?;
                (xc, fc)
            } else {
                let xc = point(&centroid, &worst, RHO);
                let fc = eval(&xc)?;
                (xc, fc)
            };
        if fc < fr.min(f_worst) {
            simplex[n] = (xc, fc);
            continue;
        }
        let best = simplex[0].0.clone();
        for vertex in simplex[1..].iter_mut() {
            let xs = point(&best, &vertex.0, SIGMA);
            let fs = eval(&xs)?;
            *vertex = (xs, fs);
        }
    }

    simplex.sort_by(|l, r| l.1.total_cmp(&r.1));
    let (x, value) = simplex.swap_remove(0);
    Ok(Minimum { x, value, n_evals })
}

/// Minimize `f` over the box `lower ≤ x ≤ upper` by basin hopping from `x0`.
///
/// The returned value is never larger than `f` at the clamped starting
/// point.
pub fn basin_hopping<F, R>(
    mut f: F,
    x0: &[f64],
    lower: &[f64],
    upper: &[f64],
    config: &BasinHoppingConfig,
    rng: &mut R,
) -> RefineResult<Minimum>
where
    F: FnMut(&[f64]) -> RefineResult<f64>,
    R: Rng,
{
    config.validate()?;
    let mut current = nelder_mead(&mut f, x0, lower, upper, &config.local)?;
    let mut n_evals = current.n_evals;
    let mut best = current.clone();
    let mut stale: usize = 0;
    for _ in 0..config.n_iters {
        let mut trial = current.x.clone();
        for xk in trial.iter_mut() {
            *xk += config.step_size * (2.0 * rng.gen::<f64>() - 1.0);
        }
        let found = nelder_mead(&mut f, &trial, lower, upper, &config.local)?;
        n_evals += found.n_evals;
        let accept =
            found.value < current.value
            || rng.gen::<f64>()
                < (-(found.value - current.value) / config.temperature).exp();
        if found.value < best.value {
            best = found.clone();
            stale = 0;
        } else {
            stale += 1;
        }
        if accept { current = found; }
        if stale >= config.patience { break; }
    }
    best.n_evals = n_evals;
    Ok(best)
}

/// The result of [`ContinuousOptimizer::optimize`].
#[derive(Clone, Debug)]
pub struct Refined {
    /// The circuit with optimized parameters and its score set to their
    /// trace distance from the target.
    pub circuit: Circuit,
    /// Number of unitary evaluations spent.
    pub n_evals: usize,
}

/// Optimizes all parameters of a circuit jointly against a target.
#[derive(Clone, Debug, Default)]
pub struct ContinuousOptimizer {
    config: BasinHoppingConfig,
}

impl ContinuousOptimizer {
    /// Create a new optimizer.
    pub fn new(config: BasinHoppingConfig) -> RefineResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Return the settings.
    pub fn config(&self) -> &BasinHoppingConfig { &self.config }

    /// Minimize the trace distance between `circuit` and `target` over the
    /// circuit's parameters.
    ///
    /// A circuit without parameters is scored as is. The result never scores
    /// worse than `circuit` itself.
    pub fn optimize<R>(&self, circuit: &Circuit, target: &nd::Array2<C64>, rng: &mut R)
        -> RefineResult<Refined>
    where R: Rng
    {
        let dim = 1_usize << circuit.n_qubits();
        let (rows, cols) = target.dim();
        if rows != dim || cols != dim { return Err(TargetShape(rows, cols, dim)); }

        let (symbolic, x0) = SymbolicCircuit::from_circuit(circuit)?;
        let objective = |x: &[f64]| -> RefineResult<f64> {
            Ok(trace_distance(&symbolic.unitary(x)?, target))
        };

        let start = objective(&x0)?;
        if symbolic.n_vars() == 0 {
            let mut circuit = circuit.clone();
            circuit.set_score(start);
            return Ok(Refined { circuit, n_evals: 1 });
        }

        let lower = vec![0.0; x0.len()];
        let upper = vec![TAU; x0.len()];
        let min = basin_hopping(objective, &x0, &lower, &upper, &self.config, rng)?;
        let n_evals = min.n_evals + 1;
        debug!(
            n_params = x0.len(),
            n_evals,
            start,
            end = min.value,
            "continuous refinement",
        );
        let refined =
            if min.value <= start {
                let mut refined = symbolic.bind(&min.x)?;
                refined.set_score(min.value);
                refined
            } else {
                let mut refined = circuit.clone();
                refined.set_score(start);
                refined
            };
        Ok(Refined { circuit: refined, n_evals })
    }
}
