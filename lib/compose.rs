//! Folding instruction sequences into dense unitaries.
//!
//! The running unitary of a *Q*-qubit circuit is held as a rank-2*Q*
//! [`Tensor`] with one ket and one bra wire per qubit. Applying a *k*-qubit
//! operation contracts its rank-2*k* tensor against the kets of its targets
//! only, which amounts to left-multiplying by the operation embedded in the
//! full space, so that a sequence `[U1, U2, ..., Un]` composes to
//! `Un · ... · U2 · U1`. The final matrix is little-endian: qubit *q* is bit *q*
//! of the basis index.
//!
//! Besides plain numeric composition, [`SymbolicCircuit`] holds operations
//! whose parameters may be free variables, resolved against a variable vector
//! at composition time.

use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::{
    circuit::{ Circuit, CircuitError, CircuitResult },
    gate::Gate,
    instruction::{ self, Instruction },
    tensor::Tensor,
};

/// A running unitary on a fixed number of qubits.
#[derive(Clone, Debug)]
pub struct Composer {
    n_qubits: usize,
    tensor: Tensor,
}

impl Composer {
    /// Start from the identity on `n_qubits` qubits.
    pub fn new(n_qubits: usize) -> CircuitResult<Self> {
        if n_qubits == 0 { return Err(CircuitError::NoQubits); }
        let tensor = Tensor::identity(n_qubits)?;
        Ok(Self { n_qubits, tensor })
    }

    /// Return the number of qubits.
    pub fn n_qubits(&self) -> usize { self.n_qubits }

    /// Apply `gate` with `params` to `qubits`, after everything applied so far.
    ///
    /// Fails if a qubit is out of range or repeated, or if the qubit or
    /// parameter counts do not match the gate.
    pub fn apply(self, gate: Gate, qubits: &[usize], params: &[f64])
        -> CircuitResult<Self>
    {
        instruction::check_qubits(gate, qubits)?;
        if let Some(q) = qubits.iter().find(|q| **q >= self.n_qubits) {
            return Err(CircuitError::QubitOutOfRange(gate, *q, self.n_qubits));
        }
        let op = Tensor::from_matrix(qubits, gate.matrix(params)?)?;
        let tensor = op.contract(self.tensor)?;
        Ok(Self { n_qubits: self.n_qubits, tensor })
    }

    /// Apply a single instruction.
    pub fn apply_instruction(self, instr: &Instruction) -> CircuitResult<Self> {
        self.apply(instr.gate(), instr.qubits(), instr.params())
    }

    /// Flatten into a 2<sup>*Q*</sup> × 2<sup>*Q*</sup> matrix.
    pub fn into_matrix(self) -> CircuitResult<nd::Array2<C64>> {
        Ok(self.tensor.into_matrix(self.n_qubits)?)
    }
}

/// Compute the unitary of `instructions` applied in order to `n_qubits`
/// qubits.
///
/// An empty sequence gives the identity.
pub fn unitary<'a, I>(n_qubits: usize, instructions: I)
    -> CircuitResult<nd::Array2<C64>>
where I: IntoIterator<Item = &'a Instruction>
{
    instructions.into_iter()
        .try_fold(Composer::new(n_qubits)?, Composer::apply_instruction)?
        .into_matrix()
}

/// A parameter slot: either a fixed value or a free variable, identified by
/// its position in a variable vector.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Param {
    /// A fixed value.
    Value(f64),
    /// The `k`-th free variable.
    Var(usize),
}

impl Param {
    fn resolve(&self, vars: &[f64]) -> CircuitResult<f64> {
        match self {
            Self::Value(x) => Ok(*x),
            Self::Var(k) =>
                vars.get(*k).copied().ok_or(CircuitError::MissingVariable(*k)),
        }
    }
}

#[derive(Clone, Debug)]
struct SymbolicOp {
    gate: Gate,
    qubits: Vec<usize>,
    params: Vec<Param>,
}

/// An instruction sequence whose parameters may be free variables.
///
/// The structure (gates and targets) is fixed; only the values bound to the
/// variables change between compositions.
#[derive(Clone, Debug)]
pub struct SymbolicCircuit {
    n_qubits: usize,
    ops: Vec<SymbolicOp>,
    n_vars: usize,
}

impl SymbolicCircuit {
    /// Create a new, empty sequence on `n_qubits` qubits.
    pub fn new(n_qubits: usize) -> Self {
        Self { n_qubits, ops: Vec::new(), n_vars: 0 }
    }

    /// Replace every parameter of `circuit` with its own free variable,
    /// numbered in instruction order, and return the result along with the
    /// circuit's current parameter values as the starting point.
    pub fn from_circuit(circuit: &Circuit) -> CircuitResult<(Self, Vec<f64>)> {
        let mut symbolic = Self::new(circuit.n_qubits());
        let mut x0: Vec<f64> = Vec::with_capacity(circuit.n_params());
        for instr in circuit.instructions() {
            let params: Vec<Param> =
                instr.params().iter()
                .map(|p| {
                    x0.push(*p);
                    Param::Var(x0.len() - 1)
                })
                .collect();
            symbolic.push(instr.gate(), instr.qubits().to_vec(), params)?;
        }
        Ok((symbolic, x0))
    }

    /// Append an operation.
    ///
    /// Fails under the same conditions as [`Composer::apply`], except that
    /// variable values are not needed yet.
    pub fn push(&mut self, gate: Gate, qubits: Vec<usize>, params: Vec<Param>)
        -> CircuitResult<()>
    {
        instruction::check_qubits(gate, &qubits)?;
        if let Some(q) = qubits.iter().find(|q| **q >= self.n_qubits) {
            return Err(CircuitError::QubitOutOfRange(gate, *q, self.n_qubits));
        }
        if params.len() != gate.n_params() {
            return Err(
                CircuitError::ParamCount(gate, gate.n_params(), params.len()));
        }
        let max_var =
            params.iter()
            .filter_map(|p| if let Param::Var(k) = p { Some(*k + 1) } else { None })
            .max()
            .unwrap_or(0);
        self.n_vars = self.n_vars.max(max_var);
        self.ops.push(SymbolicOp { gate, qubits, params });
        Ok(())
    }

    /// Return the number of qubits.
    pub fn n_qubits(&self) -> usize { self.n_qubits }

    /// Return the length of the variable vector expected by
    /// [`unitary`][Self::unitary].
    pub fn n_vars(&self) -> usize { self.n_vars }

    /// Return the number of operations.
    pub fn len(&self) -> usize { self.ops.len() }

    /// Return `true` if there are no operations.
    pub fn is_empty(&self) -> bool { self.ops.is_empty() }

    /// Compute the unitary with every variable bound to `vars`.
    pub fn unitary(&self, vars: &[f64]) -> CircuitResult<nd::Array2<C64>> {
        let mut params: Vec<f64> = Vec::with_capacity(3);
        self.ops.iter()
            .try_fold(
                Composer::new(self.n_qubits)?,
                |acc, op| {
                    params.clear();
                    for p in op.params.iter() { params.push(p.resolve(vars)?); }
                    acc.apply(op.gate, &op.qubits, &params)
                },
            )?
            .into_matrix()
    }

    /// Bind every variable to `vars`, producing an ordinary (unscored)
    /// circuit.
    pub fn bind(&self, vars: &[f64]) -> CircuitResult<Circuit> {
        let instructions: Vec<Instruction> =
            self.ops.iter()
            .map(|op| {
                let params: Vec<f64> =
                    op.params.iter()
                    .map(|p| p.resolve(vars))
                    .collect::<CircuitResult<_>>()?;
                Instruction::new(op.gate, op.qubits.iter().copied(), params)
            })
            .collect::<CircuitResult<_>>()?;
        Circuit::new(self.n_qubits, instructions)
    }
}
