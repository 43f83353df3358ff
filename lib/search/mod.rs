//! Population-based searches for circuits approximating a target unitary.
//!
//! Every search is a [`Search`] combining a shared [`Core`] with one
//! [`Strategy`]. The core owns the target, the [`Alphabet`], the fitness
//! function, the best circuit seen so far, the generation and evaluation
//! counters, and the only random number generator; the strategy owns its
//! population and implements one generation at a time.
//!
//! | Strategy   | Population                        | Module   |
//! | :--------- | :-------------------------------- | :------- |
//! | Monte Carlo| none                              | [`mc`]   |
//! | Genetic    | flat                              | [`ga`]   |
//! | GLOA       | `n_groups` × `group_size`         | [`gloa`] |
//! | MLOA       | as GLOA, plus refinement          | [`mloa`] |
//!
//! Fitness is `metric(U, target) + cost(circuit)`, where `U` is the unitary of
//! the circuit and `cost` is zero unless set with [`Core::with_cost`]. Lower is
//! better.
//!
//! ```no_run
//! use qcd::{ alphabet::Alphabet, gate::Gate, target };
//! use qcd::search::{ Budget, Core, Search, SearchConfig, ga::{ Ga, GaConfig } };
//!
//! let alphabet = Alphabet::with_gates(2, [Gate::H, Gate::CX, Gate::U3]).unwrap();
//! let config = SearchConfig { circuit_size: 8, seed: Some(1), ..Default::default() };
//! let core = Core::new(target::qft(2), alphabet, &config).unwrap();
//! let mut search = Search::new(core, Ga::new(GaConfig::default()).unwrap()).unwrap();
//! search.run(&Budget { max_evals: Some(10_000), ..Default::default() }).unwrap();
//! println!("{}", search.finalize().unwrap().to_qasm());
//! ```

use std::collections::BTreeMap;
use ndarray as nd;
use num_complex::Complex64 as C64;
use rand::{ SeedableRng, rngs::StdRng };
use serde::{ Deserialize, Serialize };
use thiserror::Error;
use tracing::{ debug, info, trace };
use crate::{
    alphabet::{ Alphabet, AlphabetError },
    circuit::{ Circuit, CircuitError },
    distance::Metric,
    instruction::Instruction,
};

pub mod stats;
pub mod mc;
pub mod ga;
pub mod gloa;
pub mod mloa;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("target must be square, but has shape {0}×{1}")]
    TargetNotSquare(usize, usize),

    #[error("target dimension {0} is not a power of two greater than 1")]
    TargetDim(usize),

    #[error("target acts on {0} qubit(s), but the alphabet on {1}")]
    QubitMismatch(usize, usize),

    #[error("cannot search with an empty alphabet")]
    EmptyAlphabet,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("a run needs at least one of max_evals, max_gens or threshold")]
    UnboundedRun,

    #[error("circuit error: {0}")]
    CircuitError(#[from] CircuitError),

    #[error("alphabet error: {0}")]
    AlphabetError(#[from] AlphabetError),
}
pub type SearchResult<T> = Result<T, SearchError>;
use SearchError::*;

/// Settings shared by every strategy.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of instructions in every freshly sampled circuit.
    pub circuit_size: usize,
    /// Seed for the random number generator; drawn from system entropy if
    /// unset.
    pub seed: Option<u64>,
    /// Distance between a circuit's unitary and the target.
    #[serde(skip)]
    pub metric: Metric,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { circuit_size: 10, seed: None, metric: Metric::default() }
    }
}

impl SearchConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> SearchResult<()> {
        if self.circuit_size == 0 {
            return Err(InvalidConfig("circuit_size must be > 0".into()));
        }
        Ok(())
    }
}

/// Extra fitness added on top of the distance to the target, e.g. to penalize
/// long circuits.
pub type CostFn = Box<dyn Fn(&Circuit) -> f64>;

/// State and primitives shared by all strategies.
pub struct Core {
    target: nd::Array2<C64>,
    n_qubits: usize,
    alphabet: Alphabet,
    circuit_size: usize,
    metric: Metric,
    cost: Option<CostFn>,
    best: Option<Circuit>,
    gen: usize,
    n_evals: usize,
    rng: StdRng,
}

impl Core {
    /// Create a new core.
    ///
    /// Fails if the configuration is invalid, the alphabet is empty, or the
    /// target is not a 2<sup>*Q*</sup> × 2<sup>*Q*</sup> matrix for the
    /// alphabet's *Q*.
    pub fn new(target: nd::Array2<C64>, alphabet: Alphabet, config: &SearchConfig)
        -> SearchResult<Self>
    {
        config.validate()?;
        let (rows, cols) = target.dim();
        if rows != cols { return Err(TargetNotSquare(rows, cols)); }
        if rows < 2 || !rows.is_power_of_two() { return Err(TargetDim(rows)); }
        let n_qubits = rows.trailing_zeros() as usize;
        if n_qubits != alphabet.n_qubits() {
            return Err(QubitMismatch(n_qubits, alphabet.n_qubits()));
        }
        if alphabet.is_empty() { return Err(EmptyAlphabet); }
        let rng =
            if let Some(seed) = config.seed {
                StdRng::seed_from_u64(seed)
            } else {
                StdRng::from_entropy()
            };
        Ok(Self {
            target,
            n_qubits,
            alphabet,
            circuit_size: config.circuit_size,
            metric: config.metric,
            cost: None,
            best: None,
            gen: 0,
            n_evals: 0,
            rng,
        })
    }

    /// Add an implementation cost to the fitness.
    pub fn with_cost<F>(mut self, cost: F) -> Self
    where F: Fn(&Circuit) -> f64 + 'static
    {
        self.cost = Some(Box::new(cost));
        self
    }

    /// Return the target.
    pub fn target(&self) -> &nd::Array2<C64> { &self.target }

    /// Return the number of qubits.
    pub fn n_qubits(&self) -> usize { self.n_qubits }

    /// Return the alphabet.
    pub fn alphabet(&self) -> &Alphabet { &self.alphabet }

    /// Return the number of instructions in a fresh random circuit.
    pub fn circuit_size(&self) -> usize { self.circuit_size }

    /// Return the best circuit seen so far, if any.
    pub fn best(&self) -> Option<&Circuit> { self.best.as_ref() }

    /// Return the score of the best circuit seen so far, if any.
    pub fn best_score(&self) -> Option<f64> {
        self.best.as_ref().and_then(|b| b.score())
    }

    /// Return the number of completed generations.
    pub fn gen(&self) -> usize { self.gen }

    /// Return the number of fitness evaluations so far.
    pub fn n_evals(&self) -> usize { self.n_evals }

    /// Return the random number generator.
    pub fn rng(&mut self) -> &mut StdRng { &mut self.rng }

    /// Compute the fitness of `circuit`, counting one evaluation.
    pub fn fitness(&mut self, circuit: &Circuit) -> SearchResult<f64> {
        let u = circuit.unitary()?;
        let dist = self.metric.distance(&u, &self.target);
        let cost = self.cost.as_ref().map(|f| f(circuit)).unwrap_or(0.0);
        self.n_evals += 1;
        Ok(dist + cost)
    }

    /// Compute the fitness of `circuit` and memoize it as its score.
    pub fn evaluate(&mut self, circuit: &mut Circuit) -> SearchResult<f64> {
        let score = self.fitness(circuit)?;
        circuit.set_score(score);
        Ok(score)
    }

    /// Like [`evaluate`][Self::evaluate], but only if `circuit` has no score
    /// yet.
    pub fn ensure_scored(&mut self, circuit: &mut Circuit) -> SearchResult<f64> {
        match circuit.score() {
            Some(score) => Ok(score),
            None => self.evaluate(circuit),
        }
    }

    /// Store a copy of `candidate` as the best circuit if there is none yet
    /// or if `candidate` scores strictly lower. Returns `true` if the best was
    /// replaced.
    ///
    /// Unscored candidates are ignored.
    pub fn update_best(&mut self, candidate: &Circuit) -> bool {
        let Some(score) = candidate.score() else { return false; };
        let better =
            self.best_score().map(|best| score < best).unwrap_or(true);
        if better {
            debug!(gen = self.gen, n_evals = self.n_evals, score, "new best");
            self.best = Some(candidate.clone());
        }
        better
    }

    /// Draw one random instruction from the alphabet.
    pub fn sample_instruction(&mut self) -> SearchResult<Instruction> {
        Ok(self.alphabet.sample_one(&mut self.rng)?)
    }

    /// Draw distinct qubits for a gate of the given arity.
    pub fn sample_qubits(&mut self, arity: usize) -> SearchResult<Vec<usize>> {
        Ok(self.alphabet.sample_qubits(&mut self.rng, arity)?)
    }

    /// Draw angles uniformly from [0, 2π).
    pub fn sample_angles(&mut self, count: usize) -> Vec<f64> {
        self.alphabet.sample_angles(&mut self.rng, count)
    }

    /// Draw an unscored circuit of [`circuit_size`][Self::circuit_size]
    /// random instructions.
    pub fn random_circuit(&mut self) -> SearchResult<Circuit> {
        let instructions =
            self.alphabet.sample(&mut self.rng, self.circuit_size)?;
        Ok(Circuit::new(self.n_qubits, instructions)?)
    }

    /// Draw a random circuit and score it.
    pub fn random_scored_circuit(&mut self) -> SearchResult<Circuit> {
        let mut circuit = self.random_circuit()?;
        self.evaluate(&mut circuit)?;
        Ok(circuit)
    }

    /// Statistics every strategy reports: `best_fit` and `n_evals`.
    pub fn base_stats(&self) -> BTreeMap<String, Option<f64>> {
        let mut stats = BTreeMap::new();
        stats.insert("best_fit".to_string(), self.best_score());
        stats.insert("n_evals".to_string(), Some(self.n_evals as f64));
        stats
    }
}

/// Score of a circuit taking part in a selection decision. Unscored circuits
/// never win.
pub(crate) fn score_of(circuit: &Circuit) -> f64 {
    circuit.score().unwrap_or(f64::INFINITY)
}

/// Index of the lowest-scoring circuit, the first one on ties.
pub(crate) fn argmin(circuits: &[Circuit]) -> Option<usize> {
    circuits.iter().enumerate()
        .fold(None, |acc: Option<(usize, f64)>, (k, c)| {
            let s = score_of(c);
            match acc {
                Some((_, best)) if best <= s => acc,
                _ => Some((k, s)),
            }
        })
        .map(|(k, _)| k)
}

/// Mean score of a set of circuits.
pub(crate) fn mean_score(circuits: &[Circuit]) -> Option<f64> {
    (!circuits.is_empty()).then(|| {
        circuits.iter().map(score_of).sum::<f64>() / circuits.len() as f64
    })
}

/// One search algorithm: its population and its generation step.
///
/// Implementors only touch shared state through the [`Core`]; the generation
/// counter is advanced by [`Search::evolve`].
pub trait Strategy {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Build and score the initial population.
    fn init(&mut self, core: &mut Core) -> SearchResult<()>;

    /// Run one generation.
    fn step(&mut self, core: &mut Core) -> SearchResult<()>;

    /// Report statistics for the state after the last completed generation.
    /// The key set must not change between calls.
    fn stats(&self, core: &Core) -> BTreeMap<String, Option<f64>>;
}

impl Strategy for Box<dyn Strategy> {
    fn name(&self) -> &'static str { self.as_ref().name() }

    fn init(&mut self, core: &mut Core) -> SearchResult<()> {
        self.as_mut().init(core)
    }

    fn step(&mut self, core: &mut Core) -> SearchResult<()> {
        self.as_mut().step(core)
    }

    fn stats(&self, core: &Core) -> BTreeMap<String, Option<f64>> {
        self.as_ref().stats(core)
    }
}

/// Stopping conditions for [`Search::run`]. The run stops as soon as any set
/// condition holds.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Budget {
    /// Stop once this many fitness evaluations have been made.
    pub max_evals: Option<usize>,
    /// Stop once this many generations have completed.
    pub max_gens: Option<usize>,
    /// Stop once the best score is at or below this value.
    pub threshold: Option<f64>,
}

impl Budget {
    /// Return `true` if no stopping condition is set.
    pub fn is_unbounded(&self) -> bool {
        self.max_evals.is_none()
            && self.max_gens.is_none()
            && self.threshold.is_none()
    }

    /// Return `true` if any stopping condition holds for `core`.
    pub fn is_exhausted(&self, core: &Core) -> bool {
        self.max_evals.is_some_and(|n| core.n_evals() >= n)
            || self.max_gens.is_some_and(|n| core.gen() >= n)
            || self.threshold
                .zip(core.best_score())
                .is_some_and(|(t, s)| s <= t)
    }
}

/// A running search.
pub struct Search<S> {
    core: Core,
    strategy: S,
}

impl<S> Search<S>
where S: Strategy
{
    /// Set up `strategy` on `core`, scoring its initial population.
    pub fn new(mut core: Core, mut strategy: S) -> SearchResult<Self> {
        strategy.init(&mut core)?;
        debug!(
            strategy = strategy.name(),
            n_evals = core.n_evals(),
            "initialized search",
        );
        Ok(Self { core, strategy })
    }

    /// Return the shared state.
    pub fn core(&self) -> &Core { &self.core }

    /// Return the strategy.
    pub fn strategy(&self) -> &S { &self.strategy }

    /// Return the best circuit seen so far, if any.
    pub fn best(&self) -> Option<&Circuit> { self.core.best() }

    /// Return the number of completed generations.
    pub fn gen(&self) -> usize { self.core.gen() }

    /// Return the number of fitness evaluations so far.
    pub fn n_evals(&self) -> usize { self.core.n_evals() }

    /// Run one generation.
    pub fn evolve(&mut self) -> SearchResult<()> {
        self.strategy.step(&mut self.core)?;
        self.core.gen += 1;
        trace!(
            gen = self.core.gen,
            n_evals = self.core.n_evals,
            best = ?self.core.best_score(),
            "generation done",
        );
        Ok(())
    }

    /// Return the statistics of the state after the last generation.
    pub fn stats(&self) -> BTreeMap<String, Option<f64>> {
        self.strategy.stats(&self.core)
    }

    /// Call [`evolve`][Self::evolve] until `budget` is exhausted, returning
    /// the best circuit.
    pub fn run(&mut self, budget: &Budget) -> SearchResult<Option<&Circuit>> {
        if budget.is_unbounded() { return Err(UnboundedRun); }
        while !budget.is_exhausted(&self.core) {
            self.evolve()?;
        }
        Ok(self.core.best())
    }

    /// End the search, logging a summary and returning the best circuit.
    pub fn finalize(self) -> Option<Circuit> {
        let Self { core, strategy } = self;
        info!(
            strategy = strategy.name(),
            gen = core.gen,
            n_evals = core.n_evals,
            best = ?core.best_score(),
            "search finished",
        );
        core.best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ gate::Gate, target };

    fn core(seed: u64) -> Core {
        let alphabet = Alphabet::with_gates(2, [Gate::CX, Gate::I]).unwrap();
        let config = SearchConfig {
            circuit_size: 1,
            seed: Some(seed),
            ..Default::default()
        };
        Core::new(Gate::CX.matrix(&[]).unwrap(), alphabet, &config).unwrap()
    }

    #[test]
    fn construction_checks() {
        let alphabet = Alphabet::with_gates(2, [Gate::H]).unwrap();
        let config = SearchConfig::default();
        assert!(matches!(
            Core::new(nd::Array2::zeros((4, 2)), alphabet.clone(), &config),
            Err(TargetNotSquare(4, 2)),
        ));
        assert!(matches!(
            Core::new(nd::Array2::zeros((3, 3)), alphabet.clone(), &config),
            Err(TargetDim(3)),
        ));
        assert!(matches!(
            Core::new(target::identity(3), alphabet.clone(), &config),
            Err(QubitMismatch(3, 2)),
        ));
        assert!(matches!(
            Core::new(target::identity(2), Alphabet::new(2).unwrap(), &config),
            Err(EmptyAlphabet),
        ));
        let bad = SearchConfig { circuit_size: 0, ..Default::default() };
        assert!(matches!(
            Core::new(target::identity(2), alphabet, &bad),
            Err(InvalidConfig(_)),
        ));
    }

    #[test]
    fn fitness_counts_and_memoizes() {
        let mut core = core(1);
        let mut circuit = core.random_circuit().unwrap();
        assert_eq!(core.n_evals(), 0);
        let score = core.evaluate(&mut circuit).unwrap();
        assert_eq!(circuit.score(), Some(score));
        assert_eq!(core.n_evals(), 1);
        core.ensure_scored(&mut circuit).unwrap();
        assert_eq!(core.n_evals(), 1);
        core.fitness(&circuit).unwrap();
        assert_eq!(core.n_evals(), 2);
    }

    #[test]
    fn cost_is_added() {
        let mut core = core(1).with_cost(|c| 0.5 * c.len() as f64);
        let exact =
            Circuit::new(2, vec![
                Instruction::new(Gate::CX, [0, 1], []).unwrap(),
            ]).unwrap();
        assert_eq!(core.fitness(&exact).unwrap(), 0.5);
    }

    #[test]
    fn best_is_a_copy_and_ties_keep_incumbent() {
        let mut core = core(1);
        let mut a = core.random_circuit().unwrap();
        assert!(!core.update_best(&a));
        a.set_score(0.5);
        assert!(core.update_best(&a));
        a.set_score(0.1);
        assert_eq!(core.best_score(), Some(0.5));

        let mut b = core.random_circuit().unwrap();
        b.set_score(0.5);
        assert!(!core.update_best(&b));
        b.set_score(0.25);
        assert!(core.update_best(&b));
        assert_eq!(core.best_score(), Some(0.25));
    }

    #[test]
    fn helpers() {
        let mut core = core(3);
        let mut pop: Vec<Circuit> =
            (0..4).map(|_| core.random_circuit().unwrap()).collect();
        for (c, s) in pop.iter_mut().zip([0.5, 0.25, 0.25, 1.0]) {
            c.set_score(s);
        }
        assert_eq!(argmin(&pop), Some(1));
        assert_eq!(mean_score(&pop), Some(0.5));
        assert_eq!(argmin(&[]), None);
        pop[0].clear_score();
        assert_eq!(score_of(&pop[0]), f64::INFINITY);
    }

    #[test]
    fn budget() {
        let mut core = core(1);
        assert!(Budget::default().is_unbounded());
        let by_gens = Budget { max_gens: Some(0), ..Default::default() };
        assert!(by_gens.is_exhausted(&core));
        let by_evals = Budget { max_evals: Some(1), ..Default::default() };
        assert!(!by_evals.is_exhausted(&core));
        core.random_scored_circuit().unwrap();
        assert!(by_evals.is_exhausted(&core));
        let by_score = Budget { threshold: Some(0.1), ..Default::default() };
        assert!(!by_score.is_exhausted(&core));
    }
}
