//! Sets of enabled gates and uniform sampling of legal instructions.

use std::f64::consts::TAU;
use rand::{ Rng, seq::{ SliceRandom, index } };
use thiserror::Error;
use crate::{
    circuit::CircuitError,
    gate::Gate,
    instruction::Instruction,
};

#[derive(Debug, Error)]
pub enum AlphabetError {
    #[error("alphabets must act on at least one qubit")]
    NoQubits,

    #[error("gate {0} acts on {1} qubits, but the alphabet has only {2}")]
    GateTooWide(Gate, usize, usize),

    #[error("cannot sample from an empty alphabet")]
    Empty,

    #[error("cannot sample {0} distinct qubits out of {1}")]
    TooManyQubits(usize, usize),

    #[error("instruction error: {0}")]
    CircuitError(#[from] CircuitError),
}
pub type AlphabetResult<T> = Result<T, AlphabetError>;
use AlphabetError::*;

/// The gates a search may use, for a fixed number of qubits.
///
/// Registration order is preserved and duplicates are ignored. All sampling
/// draws from a caller-supplied generator, so a fixed seed reproduces the same
/// instructions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alphabet {
    n_qubits: usize,
    gates: Vec<Gate>,
}

impl Alphabet {
    /// Create a new, empty alphabet for `n_qubits` qubits.
    pub fn new(n_qubits: usize) -> AlphabetResult<Self> {
        if n_qubits == 0 { return Err(NoQubits); }
        Ok(Self { n_qubits, gates: Vec::new() })
    }

    /// Create a new alphabet with an initial set of gates.
    pub fn with_gates<I>(n_qubits: usize, gates: I) -> AlphabetResult<Self>
    where I: IntoIterator<Item = Gate>
    {
        let mut alphabet = Self::new(n_qubits)?;
        alphabet.register_gates(gates)?;
        Ok(alphabet)
    }

    /// Enable more gates.
    ///
    /// Gates already present are skipped. Fails without registering anything
    /// if any gate acts on more qubits than the alphabet has.
    pub fn register_gates<I>(&mut self, gates: I) -> AlphabetResult<()>
    where I: IntoIterator<Item = Gate>
    {
        let gates: Vec<Gate> = gates.into_iter().collect();
        if let Some(g) = gates.iter().find(|g| g.arity() > self.n_qubits) {
            return Err(GateTooWide(*g, g.arity(), self.n_qubits));
        }
        for g in gates.into_iter() {
            if !self.gates.contains(&g) { self.gates.push(g); }
        }
        Ok(())
    }

    /// Return the number of qubits.
    pub fn n_qubits(&self) -> usize { self.n_qubits }

    /// Return the enabled gates in registration order.
    pub fn gates(&self) -> &[Gate] { &self.gates }

    /// Return the number of enabled gates.
    pub fn len(&self) -> usize { self.gates.len() }

    /// Return `true` if no gates are enabled.
    pub fn is_empty(&self) -> bool { self.gates.is_empty() }

    /// Draw `arity` distinct qubits uniformly without replacement, in random
    /// order.
    pub fn sample_qubits<R>(&self, rng: &mut R, arity: usize)
        -> AlphabetResult<Vec<usize>>
    where R: Rng
    {
        if arity > self.n_qubits {
            return Err(TooManyQubits(arity, self.n_qubits));
        }
        Ok(index::sample(rng, self.n_qubits, arity).into_vec())
    }

    /// Draw `count` angles uniformly from [0, 2π).
    pub fn sample_angles<R>(&self, rng: &mut R, count: usize) -> Vec<f64>
    where R: Rng
    {
        (0..count).map(|_| rng.gen::<f64>() * TAU).collect()
    }

    /// Draw a single instruction: a uniformly chosen gate on uniformly chosen
    /// distinct qubits with uniform angles.
    pub fn sample_one<R>(&self, rng: &mut R) -> AlphabetResult<Instruction>
    where R: Rng
    {
        let gate = *self.gates.choose(rng).ok_or(Empty)?;
        let qubits = self.sample_qubits(rng, gate.arity())?;
        let params = self.sample_angles(rng, gate.n_params());
        Ok(Instruction::new(gate, qubits, params)?)
    }

    /// Draw `n` independent instructions.
    pub fn sample<R>(&self, rng: &mut R, n: usize)
        -> AlphabetResult<Vec<Instruction>>
    where R: Rng
    {
        (0..n).map(|_| self.sample_one(rng)).collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::{ SeedableRng, rngs::StdRng };
    use super::*;

    #[test]
    fn registration() {
        let mut alphabet = Alphabet::new(2).unwrap();
        assert!(alphabet.is_empty());
        alphabet.register_gates([Gate::H, Gate::CX, Gate::H]).unwrap();
        alphabet.register_gates([Gate::CX, Gate::RZ]).unwrap();
        assert_eq!(alphabet.gates(), &[Gate::H, Gate::CX, Gate::RZ]);
        assert!(matches!(
            alphabet.register_gates([Gate::T, Gate::CCX]),
            Err(GateTooWide(Gate::CCX, 3, 2)),
        ));
        assert_eq!(alphabet.len(), 3);
        assert!(matches!(Alphabet::new(0), Err(NoQubits)));
    }

    #[test]
    fn empty_alphabet_fails() {
        let alphabet = Alphabet::new(2).unwrap();
        let mut rng = StdRng::seed_from_u64(10546);
        assert!(matches!(alphabet.sample_one(&mut rng), Err(Empty)));
        assert!(alphabet.sample(&mut rng, 0).unwrap().is_empty());
    }

    #[test]
    fn samples_are_legal() {
        let alphabet =
            Alphabet::with_gates(3, [Gate::CCX, Gate::U3, Gate::CZ, Gate::X])
            .unwrap();
        let mut rng = StdRng::seed_from_u64(10546);
        for instr in alphabet.sample(&mut rng, 500).unwrap() {
            assert!(alphabet.gates().contains(&instr.gate()));
            assert_eq!(instr.qubits().len(), instr.gate().arity());
            assert!(instr.qubits().iter().all(|q| *q < 3));
            assert_eq!(instr.params().len(), instr.gate().n_params());
            assert!(instr.params().iter().all(|p| (0.0..TAU).contains(p)));
        }
    }

    #[test]
    fn sampling_covers_everything() {
        let alphabet = Alphabet::with_gates(3, [Gate::X, Gate::CX]).unwrap();
        let mut rng = StdRng::seed_from_u64(10546);
        let mut seen_gates = [false; 2];
        let mut seen_qubits = [false; 3];
        for instr in alphabet.sample(&mut rng, 200).unwrap() {
            seen_gates[usize::from(instr.gate() == Gate::CX)] = true;
            instr.qubits().iter().for_each(|q| { seen_qubits[*q] = true; });
        }
        assert!(seen_gates.iter().all(|b| *b));
        assert!(seen_qubits.iter().all(|b| *b));
    }

    #[test]
    fn seeded_reproducibility() {
        let gates = Gate::ALL.into_iter().filter(|g| g.arity() <= 2);
        let alphabet = Alphabet::with_gates(2, gates).unwrap();
        let a = alphabet.sample(&mut StdRng::seed_from_u64(7), 20).unwrap();
        let b = alphabet.sample(&mut StdRng::seed_from_u64(7), 20).unwrap();
        assert_eq!(a, b);
        assert!(alphabet.sample_qubits(&mut StdRng::seed_from_u64(7), 3).is_err());
    }
}
