//! Similarity measures between square complex matrices.
//!
//! [`trace_distance`] is the fitness used by the search; the others are
//! element-wise diagnostics that, unlike the trace distance, are sensitive to
//! global phase.

use ndarray as nd;
use num_complex::Complex64 as C64;

/// Compute 1 − |Tr(*A*<sup>†</sup>*B*)| / *N* for *N* × *N* matrices *A* and
/// *B*.
///
/// For unitaries this lies in [0, 1] and vanishes exactly when *A* and *B*
/// differ by at most a global phase. The trace of the product is accumulated
/// directly, without forming *A*<sup>†</sup>*B*.
pub fn trace_distance(a: &nd::Array2<C64>, b: &nd::Array2<C64>) -> f64 {
    let n = a.nrows();
    let tr: C64 =
        a.iter().zip(b.iter())
        .map(|(aij, bij)| aij.conj() * bij)
        .sum();
    1.0 - tr.norm() / n as f64
}

/// Sum of element-wise absolute differences.
pub fn d1(a: &nd::Array2<C64>, b: &nd::Array2<C64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).norm()).sum()
}

/// Frobenius norm of the difference.
pub fn d2(a: &nd::Array2<C64>, b: &nd::Array2<C64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).norm_sqr()).sum::<f64>().sqrt()
}

/// Largest element-wise absolute difference.
pub fn d_inf(a: &nd::Array2<C64>, b: &nd::Array2<C64>) -> f64 {
    a.iter().zip(b.iter())
        .map(|(x, y)| (x - y).norm())
        .fold(0.0, f64::max)
}

/// Selects the distance used as fitness.
#[derive(Copy, Clone, Debug, Default)]
pub enum Metric {
    /// [`trace_distance`].
    #[default]
    TraceDistance,
    /// [`d1`].
    D1,
    /// [`d2`].
    D2,
    /// [`d_inf`].
    DInf,
    /// Any other function of (circuit unitary, target).
    Custom(fn(&nd::Array2<C64>, &nd::Array2<C64>) -> f64),
}

impl Metric {
    /// Evaluate the metric.
    pub fn distance(&self, a: &nd::Array2<C64>, b: &nd::Array2<C64>) -> f64 {
        match self {
            Self::TraceDistance => trace_distance(a, b),
            Self::D1 => d1(a, b),
            Self::D2 => d2(a, b),
            Self::DInf => d_inf(a, b),
            Self::Custom(f) => f(a, b),
        }
    }
}
