//! Concrete applications of a [`Gate`] to specific qubits.

use std::fmt;
use itertools::Itertools;
use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::{
    circuit::{ CircuitError, CircuitResult },
    gate::Gate,
};

/// A gate applied to an ordered list of target qubits with concrete
/// parameters.
///
/// The gate is fixed at construction. Qubits and parameters may be replaced
/// wholesale, but only through checked setters, so `qubits.len()` always equals
/// the gate's arity, the qubits are always distinct, and `params.len()` always
/// equals the gate's parameter count. Whether the qubits exist in a given
/// circuit is only checked when the circuit is composed.
///
/// Two instructions compare equal when gate, qubits and parameters all match.
#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    gate: Gate,
    qubits: Vec<usize>,
    params: Vec<f64>,
}

pub(crate) fn check_qubits(gate: Gate, qubits: &[usize]) -> CircuitResult<()> {
    if qubits.len() != gate.arity() {
        return Err(CircuitError::Arity(gate, gate.arity(), qubits.len()));
    }
    if let Some((_, q)) =
        qubits.iter().enumerate()
        .find(|(k, q)| qubits[k + 1..].contains(*q))
    {
        return Err(CircuitError::RepeatedQubit(gate, *q));
    }
    Ok(())
}

fn check_params(gate: Gate, params: &[f64]) -> CircuitResult<()> {
    if params.len() != gate.n_params() {
        return Err(
            CircuitError::ParamCount(gate, gate.n_params(), params.len()));
    }
    Ok(())
}

impl Instruction {
    /// Create a new instruction.
    ///
    /// Fails if the number of qubits or parameters does not match the gate, or
    /// if a qubit is targeted more than once.
    pub fn new<Q, P>(gate: Gate, qubits: Q, params: P) -> CircuitResult<Self>
    where
        Q: IntoIterator<Item = usize>,
        P: IntoIterator<Item = f64>,
    {
        let qubits: Vec<usize> = qubits.into_iter().collect();
        let params: Vec<f64> = params.into_iter().collect();
        check_qubits(gate, &qubits)?;
        check_params(gate, &params)?;
        Ok(Self { gate, qubits, params })
    }

    /// Return the gate.
    pub fn gate(&self) -> Gate { self.gate }

    /// Return the target qubits.
    pub fn qubits(&self) -> &[usize] { &self.qubits }

    /// Return the parameters.
    pub fn params(&self) -> &[f64] { &self.params }

    /// Return the number of parameters.
    pub fn n_params(&self) -> usize { self.params.len() }

    /// Replace the target qubits.
    pub fn set_qubits(&mut self, qubits: Vec<usize>) -> CircuitResult<()> {
        check_qubits(self.gate, &qubits)?;
        self.qubits = qubits;
        Ok(())
    }

    /// Replace the parameters.
    pub fn set_params(&mut self, params: Vec<f64>) -> CircuitResult<()> {
        check_params(self.gate, &params)?;
        self.params = params;
        Ok(())
    }

    /// Return `true` if `self` and `other` apply the same gate, regardless of
    /// qubits or parameters.
    pub fn same_gate(&self, other: &Self) -> bool { self.gate == other.gate }

    /// Return the matrix of the gate with `self`'s parameters, in the local
    /// basis of [`qubits`][Self::qubits].
    pub fn matrix(&self) -> CircuitResult<nd::Array2<C64>> {
        Ok(self.gate.matrix(&self.params)?)
    }

    /// Format as a single OpenQASM 2.0 statement, without the trailing
    /// newline.
    pub fn to_qasm(&self) -> String {
        let targets = self.qubits.iter().map(|q| format!("q[{q}]")).join(",");
        if self.params.is_empty() {
            format!("{} {};", self.gate, targets)
        } else {
            let params = self.params.iter().join(",");
            format!("{}({}) {};", self.gate, params, targets)
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, ({}), ({})",
            self.gate,
            self.qubits.iter().join(","),
            self.params.iter().map(|p| format!("{p:.2}")).join(","),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation() {
        assert!(Instruction::new(Gate::CX, [0, 1], []).is_ok());
        assert!(matches!(
            Instruction::new(Gate::CX, [0], []),
            Err(CircuitError::Arity(Gate::CX, 2, 1)),
        ));
        assert!(matches!(
            Instruction::new(Gate::CCX, [0, 2, 0], []),
            Err(CircuitError::RepeatedQubit(Gate::CCX, 0)),
        ));
        assert!(matches!(
            Instruction::new(Gate::RX, [0], []),
            Err(CircuitError::ParamCount(Gate::RX, 1, 0)),
        ));
    }

    #[test]
    fn setters_keep_shape() {
        let mut instr = Instruction::new(Gate::U3, [1], [0.1, 0.2, 0.3]).unwrap();
        assert!(instr.set_qubits(vec![0, 1]).is_err());
        assert!(instr.set_params(vec![0.0]).is_err());
        instr.set_qubits(vec![2]).unwrap();
        instr.set_params(vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(instr.qubits(), &[2]);
        assert_eq!(instr.params(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn structural_equality() {
        let a = Instruction::new(Gate::RZ, [0], [0.5]).unwrap();
        let b = Instruction::new(Gate::RZ, [0], [0.5]).unwrap();
        let c = Instruction::new(Gate::RZ, [1], [0.5]).unwrap();
        let d = Instruction::new(Gate::RY, [0], [0.5]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.same_gate(&c));
        assert!(!a.same_gate(&d));
    }

    #[test]
    fn qasm() {
        let cx = Instruction::new(Gate::CX, [1, 0], []).unwrap();
        assert_eq!(cx.to_qasm(), "cx q[1],q[0];");
        let u2 = Instruction::new(Gate::U2, [3], [0.5, 1.25]).unwrap();
        assert_eq!(u2.to_qasm(), "u2(0.5,1.25) q[3];");
        assert_eq!(format!("{u2}"), "u2, (3), (0.50,1.25)");
    }
}
