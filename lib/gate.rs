//! The closed catalog of operation kinds available to the search.
//!
//! Every kind is identified by its OpenQASM (`qelib1.inc`) name and maps a
//! fixed number of real parameters to a small dense unitary. Matrices follow a
//! little-endian local basis: for an operation applied to qubits `[q0, q1,
//! ...]`, qubit `q_j` is bit `j` of the local basis index. Hence the
//! two-qubit basis order is `{∣q1 q0⟩} = {00, 01, 10, 11}` and `cx` on `[c, t]`
//! reads
//! ```text
//! 1 0 0 0
//! 0 0 0 1
//! 0 0 1 0
//! 0 1 0 0
//! ```

use std::{ f64::consts::{ FRAC_1_SQRT_2, FRAC_PI_4 }, fmt };
use ndarray::{ self as nd, array };
use num_complex::Complex64 as C64;
use thiserror::Error;
use crate::c;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("gate {0} takes {1} parameter(s), but {2} were given")]
    ParamCount(Gate, usize, usize),

    #[error("unknown gate name '{0}'")]
    UnknownName(String),
}
pub type GateResult<T> = Result<T, GateError>;
use GateError::*;

/// A kind of quantum operation.
///
/// This carries no qubit or parameter data; see
/// [`Instruction`][crate::instruction::Instruction] for a concrete
/// application.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Gate {
    /// Identity.
    I,
    /// π-rotation about *x*.
    X,
    /// π-rotation about *y*.
    Y,
    /// π-rotation about *z*.
    Z,
    /// Hadamard.
    H,
    /// π/2-rotation about *z* (√Z).
    S,
    /// Inverse of `S`.
    Sdg,
    /// π/4-rotation about *z* (⁴√Z).
    T,
    /// Inverse of `T`.
    Tdg,
    /// √X.
    V,
    /// Inverse of `V`.
    Vdg,
    /// Rotation about *x* by a single angle.
    RX,
    /// Rotation about *y* by a single angle.
    RY,
    /// Rotation about *z* by a single angle.
    RZ,
    /// Phase gate diag(1, *e*<sup>*iλ*</sup>).
    U1,
    /// Two-angle single-qubit gate U2(*φ*, *λ*).
    U2,
    /// Generic single-qubit gate U3(*θ*, *φ*, *λ*).
    U3,
    /// π-rotation about *x* on the second qubit, controlled by the first.
    CX,
    /// π-rotation about *z* on the second qubit, controlled by the first.
    CZ,
    /// Toffoli gate: π-rotation about *x* on the third qubit, controlled by the
    /// first and second.
    CCX,
}

impl Gate {
    /// Every kind in the catalog.
    pub const ALL: [Gate; 20] = [
        Self::I, Self::X, Self::Y, Self::Z, Self::H,
        Self::S, Self::Sdg, Self::T, Self::Tdg, Self::V, Self::Vdg,
        Self::RX, Self::RY, Self::RZ, Self::U1, Self::U2, Self::U3,
        Self::CX, Self::CZ, Self::CCX,
    ];

    /// Return the OpenQASM name of `self`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::I => "id",
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::H => "h",
            Self::S => "s",
            Self::Sdg => "sdg",
            Self::T => "t",
            Self::Tdg => "tdg",
            Self::V => "v",
            Self::Vdg => "vdg",
            Self::RX => "rx",
            Self::RY => "ry",
            Self::RZ => "rz",
            Self::U1 => "u1",
            Self::U2 => "u2",
            Self::U3 => "u3",
            Self::CX => "cx",
            Self::CZ => "cz",
            Self::CCX => "ccx",
        }
    }

    /// Look up a kind by its OpenQASM name.
    pub fn from_name(name: &str) -> GateResult<Self> {
        Self::ALL.iter()
            .find(|gate| gate.name() == name)
            .copied()
            .ok_or_else(|| UnknownName(name.to_string()))
    }

    /// Return the number of qubits `self` acts on.
    pub fn arity(&self) -> usize {
        match self {
            Self::CX | Self::CZ => 2,
            Self::CCX => 3,
            _ => 1,
        }
    }

    /// Return the number of real parameters `self` takes.
    pub fn n_params(&self) -> usize {
        match self {
            Self::RX | Self::RY | Self::RZ | Self::U1 => 1,
            Self::U2 => 2,
            Self::U3 => 3,
            _ => 0,
        }
    }

    /// Return `true` if `self` takes at least one parameter.
    pub fn is_parametric(&self) -> bool { self.n_params() > 0 }

    /// Return the 2<sup>*k*</sup> × 2<sup>*k*</sup> matrix of `self` for the
    /// given parameters, where *k* is the arity.
    ///
    /// Fails if the number of parameters does not match
    /// [`n_params`][Self::n_params].
    pub fn matrix(&self, params: &[f64]) -> GateResult<nd::Array2<C64>> {
        if params.len() != self.n_params() {
            return Err(ParamCount(*self, self.n_params(), params.len()));
        }
        let o = c!(0.0);
        let l = c!(1.0);
        let i = c!(i 1.0);
        let mat = match *self {
            Self::I => nd::Array2::eye(2),
            Self::X => array![[o, l], [l, o]],
            Self::Y => array![[o, -i], [i, o]],
            Self::Z => array![[l, o], [o, -l]],
            Self::H => array![[l, l], [l, -l]] * FRAC_1_SQRT_2,
            Self::S => array![[l, o], [o, i]],
            Self::Sdg => array![[l, o], [o, -i]],
            Self::T => array![[l, o], [o, c!(e FRAC_PI_4)]],
            Self::Tdg => array![[l, o], [o, c!(e -FRAC_PI_4)]],
            Self::V => array![[l + i, l - i], [l - i, l + i]] * 0.5,
            Self::Vdg => array![[l - i, l + i], [l + i, l - i]] * 0.5,
            Self::RX => {
                let (s, c) = (params[0] / 2.0).sin_cos();
                array![[c!(c), c!(i -s)], [c!(i -s), c!(c)]]
            },
            Self::RY => {
                let (s, c) = (params[0] / 2.0).sin_cos();
                array![[c!(c), c!(-s)], [c!(s), c!(c)]]
            },
            Self::RZ => {
                let a = params[0] / 2.0;
                array![[c!(e -a), o], [o, c!(e a)]]
            },
            Self::U1 => array![[l, o], [o, c!(e params[0])]],
            Self::U2 => {
                let (phi, lam) = (params[0], params[1]);
                array![
                    [l,           -c!(e lam)      ],
                    [c!(e phi),    c!(e phi + lam)],
                ] * FRAC_1_SQRT_2
            },
            Self::U3 => {
                let (theta, phi, lam) = (params[0], params[1], params[2]);
                let (s, c) = (theta / 2.0).sin_cos();
                array![
                    [c!(c),           -c!(s, e lam)      ],
                    [c!(s, e phi),     c!(c, e phi + lam)],
                ]
            },
            Self::CX => array![
                [l, o, o, o],
                [o, o, o, l],
                [o, o, l, o],
                [o, l, o, o],
            ],
            Self::CZ => array![
                [l, o, o, o],
                [o, l, o, o],
                [o, o, l, o],
                [o, o, o, -l],
            ],
            Self::CCX => {
                // flip bit 2 iff bits 0 and 1 are both set: swap ∣011⟩ and ∣111⟩
                let mut mat: nd::Array2<C64> = nd::Array2::eye(8);
                mat[[3, 3]] = o;
                mat[[7, 7]] = o;
                mat[[3, 7]] = l;
                mat[[7, 3]] = l;
                mat
            },
        };
        Ok(mat)
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
