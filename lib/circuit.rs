//! Ordered sequences of [`Instruction`]s on a fixed number of qubits.

use std::fmt;
use ndarray as nd;
use num_complex::Complex64 as C64;
use thiserror::Error;
use crate::{
    compose,
    gate::{ Gate, GateError },
    instruction::Instruction,
    tensor::TensorError,
};

#[derive(Debug, Error)]
pub enum CircuitError {
    #[error("gate {0} acts on {1} qubit(s), but {2} were given")]
    Arity(Gate, usize, usize),

    #[error("gate {0} targets qubit {1} more than once")]
    RepeatedQubit(Gate, usize),

    #[error("gate {0} takes {1} parameter(s), but {2} were given")]
    ParamCount(Gate, usize, usize),

    #[error("gate {0} targets qubit {1}, but the circuit has only {2}")]
    QubitOutOfRange(Gate, usize, usize),

    #[error("circuits must act on at least one qubit")]
    NoQubits,

    #[error("instruction index {0} is out of bounds for length {1}")]
    IndexOutOfBounds(usize, usize),

    #[error("crossover point {0} exceeds the shorter circuit length {1}")]
    CutOutOfBounds(usize, usize),

    #[error("cannot combine circuits on {0} and {1} qubits")]
    QubitCountMismatch(usize, usize),

    #[error("no value given for variable {0}")]
    MissingVariable(usize),

    #[error("gate error: {0}")]
    GateError(#[from] GateError),

    #[error("tensor error: {0}")]
    TensorError(#[from] TensorError),
}
pub type CircuitResult<T> = Result<T, CircuitError>;
use CircuitError::*;

/// An ordered list of instructions acting on `n_qubits` qubits, with a
/// memoized score.
///
/// Instructions are applied in list order, so the circuit realizes
/// `U_n · ... · U_1`; an empty circuit realizes the identity. Every method that
/// changes the instructions discards the memoized score, so a score that is
/// present always belongs to the current instructions.
#[derive(Clone, Debug)]
pub struct Circuit {
    n_qubits: usize,
    instructions: Vec<Instruction>,
    score: Option<f64>,
}

impl Circuit {
    /// Create a new, unscored circuit.
    ///
    /// Fails if `n_qubits` is zero or any instruction targets a qubit outside
    /// `0..n_qubits`.
    pub fn new(n_qubits: usize, instructions: Vec<Instruction>)
        -> CircuitResult<Self>
    {
        if n_qubits == 0 { return Err(NoQubits); }
        instructions.iter()
            .try_for_each(|instr| check_range(n_qubits, instr))?;
        Ok(Self { n_qubits, instructions, score: None })
    }

    /// Return the number of qubits.
    pub fn n_qubits(&self) -> usize { self.n_qubits }

    /// Return the number of instructions.
    pub fn len(&self) -> usize { self.instructions.len() }

    /// Return `true` if there are no instructions.
    pub fn is_empty(&self) -> bool { self.instructions.is_empty() }

    /// Return the instructions in application order.
    pub fn instructions(&self) -> &[Instruction] { &self.instructions }

    /// Return the instruction at `idx`, if it exists.
    pub fn get(&self, idx: usize) -> Option<&Instruction> {
        self.instructions.get(idx)
    }

    /// Return the total number of parameters over all instructions.
    pub fn n_params(&self) -> usize {
        self.instructions.iter().map(|instr| instr.n_params()).sum()
    }

    /// Return the memoized score, if there is one.
    pub fn score(&self) -> Option<f64> { self.score }

    /// Memoize a score for the current instructions.
    pub fn set_score(&mut self, score: f64) { self.score = Some(score); }

    /// Discard the memoized score.
    pub fn clear_score(&mut self) { self.score = None; }

    fn check_index(&self, idx: usize) -> CircuitResult<()> {
        (idx < self.instructions.len()).then_some(())
            .ok_or(IndexOutOfBounds(idx, self.instructions.len()))
    }

    /// Append an instruction.
    pub fn push(&mut self, instr: Instruction) -> CircuitResult<()> {
        check_range(self.n_qubits, &instr)?;
        self.instructions.push(instr);
        self.score = None;
        Ok(())
    }

    /// Insert an instruction at `idx`, shifting everything after it. `idx`
    /// may equal the length.
    pub fn insert(&mut self, idx: usize, instr: Instruction)
        -> CircuitResult<()>
    {
        if idx > self.instructions.len() {
            return Err(IndexOutOfBounds(idx, self.instructions.len()));
        }
        check_range(self.n_qubits, &instr)?;
        self.instructions.insert(idx, instr);
        self.score = None;
        Ok(())
    }

    /// Remove and return the instruction at `idx`.
    pub fn remove(&mut self, idx: usize) -> CircuitResult<Instruction> {
        self.check_index(idx)?;
        self.score = None;
        Ok(self.instructions.remove(idx))
    }

    /// Replace the instruction at `idx`, returning the old one.
    pub fn replace(&mut self, idx: usize, instr: Instruction)
        -> CircuitResult<Instruction>
    {
        self.check_index(idx)?;
        check_range(self.n_qubits, &instr)?;
        self.score = None;
        Ok(std::mem::replace(&mut self.instructions[idx], instr))
    }

    /// Retarget the instruction at `idx`.
    pub fn set_qubits(&mut self, idx: usize, qubits: Vec<usize>)
        -> CircuitResult<()>
    {
        self.check_index(idx)?;
        let instr = &mut self.instructions[idx];
        if let Some(q) = qubits.iter().find(|q| **q >= self.n_qubits) {
            return Err(QubitOutOfRange(instr.gate(), *q, self.n_qubits));
        }
        instr.set_qubits(qubits)?;
        self.score = None;
        Ok(())
    }

    /// Replace the parameters of the instruction at `idx`.
    pub fn set_params(&mut self, idx: usize, params: Vec<f64>)
        -> CircuitResult<()>
    {
        self.check_index(idx)?;
        self.instructions[idx].set_params(params)?;
        self.score = None;
        Ok(())
    }

    /// Exchange the first `cut` instructions of `self` and `other`
    /// (one-point crossover).
    ///
    /// Fails if the circuits act on different numbers of qubits or if `cut`
    /// exceeds the length of either circuit.
    pub fn swap_prefix(&mut self, other: &mut Self, cut: usize)
        -> CircuitResult<()>
    {
        if self.n_qubits != other.n_qubits {
            return Err(QubitCountMismatch(self.n_qubits, other.n_qubits));
        }
        let shorter = self.len().min(other.len());
        if cut > shorter { return Err(CutOutOfBounds(cut, shorter)); }
        self.instructions[..cut]
            .swap_with_slice(&mut other.instructions[..cut]);
        self.score = None;
        other.score = None;
        Ok(())
    }

    /// Compute the 2<sup>*Q*</sup> × 2<sup>*Q*</sup> unitary realized by
    /// `self`.
    pub fn unitary(&self) -> CircuitResult<nd::Array2<C64>> {
        compose::unitary(self.n_qubits, &self.instructions)
    }

    /// Render as an OpenQASM 2.0 program.
    pub fn to_qasm(&self) -> String {
        let mut acc =
            format!(
                "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[{}];\n",
                self.n_qubits,
            );
        for instr in self.instructions.iter() {
            acc.push_str(&instr.to_qasm());
            acc.push('\n');
        }
        acc
    }
}

fn check_range(n_qubits: usize, instr: &Instruction) -> CircuitResult<()> {
    match instr.qubits().iter().find(|q| **q >= n_qubits) {
        Some(q) => Err(QubitOutOfRange(instr.gate(), *q, n_qubits)),
        None => Ok(()),
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Circuit(q={}", self.n_qubits)?;
        match self.score {
            Some(score) => write!(f, ", score={score:.6e}")?,
            None => write!(f, ", unscored")?,
        }
        writeln!(f, ") {{")?;
        for instr in self.instructions.iter() {
            writeln!(f, "  {instr}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instr(gate: Gate, qubits: &[usize], params: &[f64]) -> Instruction {
        Instruction::new(gate, qubits.iter().copied(), params.iter().copied())
            .unwrap()
    }

    fn sample() -> Circuit {
        Circuit::new(2, vec![
            instr(Gate::H, &[0], &[]),
            instr(Gate::CX, &[0, 1], &[]),
            instr(Gate::RZ, &[1], &[0.25]),
        ]).unwrap()
    }

    #[test]
    fn construction() {
        assert!(matches!(Circuit::new(0, vec![]), Err(NoQubits)));
        assert!(matches!(
            Circuit::new(2, vec![instr(Gate::CX, &[0, 2], &[])]),
            Err(QubitOutOfRange(Gate::CX, 2, 2)),
        ));
        let circuit = sample();
        assert_eq!(circuit.len(), 3);
        assert_eq!(circuit.n_params(), 1);
        assert!(circuit.score().is_none());
    }

    #[test]
    fn mutations_clear_score() {
        let mut circuit = sample();
        let scored = |c: &mut Circuit| { c.set_score(0.5); };

        scored(&mut circuit);
        circuit.push(instr(Gate::X, &[1], &[])).unwrap();
        assert!(circuit.score().is_none());

        scored(&mut circuit);
        circuit.insert(0, instr(Gate::Z, &[0], &[])).unwrap();
        assert!(circuit.score().is_none());

        scored(&mut circuit);
        circuit.remove(0).unwrap();
        assert!(circuit.score().is_none());

        scored(&mut circuit);
        circuit.replace(0, instr(Gate::Y, &[0], &[])).unwrap();
        assert!(circuit.score().is_none());

        scored(&mut circuit);
        circuit.set_qubits(1, vec![1, 0]).unwrap();
        assert!(circuit.score().is_none());

        scored(&mut circuit);
        circuit.set_params(2, vec![1.0]).unwrap();
        assert!(circuit.score().is_none());

        // failed edits leave everything untouched
        scored(&mut circuit);
        assert!(circuit.set_qubits(0, vec![5]).is_err());
        assert!(circuit.remove(10).is_err());
        assert!(circuit.insert(0, instr(Gate::X, &[3], &[])).is_err());
        assert_eq!(circuit.score(), Some(0.5));
        assert_eq!(circuit.len(), 4);
    }

    #[test]
    fn crossover() {
        let mut a = sample();
        let mut b = Circuit::new(2, vec![
            instr(Gate::X, &[1], &[]),
            instr(Gate::Y, &[0], &[]),
        ]).unwrap();
        a.set_score(0.1);
        b.set_score(0.2);
        a.swap_prefix(&mut b, 1).unwrap();
        assert_eq!(a.instructions()[0].gate(), Gate::X);
        assert_eq!(a.instructions()[1].gate(), Gate::CX);
        assert_eq!(b.instructions()[0].gate(), Gate::H);
        assert_eq!(b.instructions()[1].gate(), Gate::Y);
        assert_eq!((a.len(), b.len()), (3, 2));
        assert!(a.score().is_none() && b.score().is_none());
        assert!(matches!(a.swap_prefix(&mut b, 3), Err(CutOutOfBounds(3, 2))));
        a.swap_prefix(&mut b, 0).unwrap();
    }

    #[test]
    fn qasm_export() {
        let qasm = sample().to_qasm();
        let expected = "\
OPENQASM 2.0;
include \"qelib1.inc\";
qreg q[2];
h q[0];
cx q[0],q[1];
rz(0.25) q[1];
";
        assert_eq!(qasm, expected);
    }

    #[test]
    fn empty_circuit_is_identity() {
        let circuit = Circuit::new(3, vec![]).unwrap();
        assert_eq!(circuit.unitary().unwrap(), nd::Array2::<C64>::eye(8));
    }
}
