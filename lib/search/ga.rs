//! Generational genetic search.
//!
//! Each generation:
//! 1. the best member of the population is offered as the new best (and again
//!    once the generation is done);
//! 2. empty members are replaced by fresh random circuits;
//! 3. the population is shuffled and walked in disjoint pairs `(2i, 2i + 1)`.
//!    Each pair is copied; with probability `cx_pb` the copies exchange
//!    prefixes at a uniform cut point, then each copy is mutated with
//!    probability `mut_pb`. Both copies are rescored and each replaces its
//!    parent if it scores *no worse*. With an odd population size the last
//!    member sits the generation out.
//!
//! A mutation is one of, uniformly:
//! - delete a random instruction;
//! - change a random instruction, uniformly one of
//!     - replace it by a fresh random instruction,
//!     - redraw its qubits,
//!     - redraw its parameters;
//! - insert a fresh random instruction at a random position.
//!
//! Deleting or changing needs an instruction to act on; on an empty circuit
//! both fall back to inserting.

use std::collections::BTreeMap;
use rand::{ Rng, seq::SliceRandom };
use serde::{ Deserialize, Serialize };
use crate::circuit::Circuit;
use super::{
    Core,
    SearchError,
    SearchResult,
    Strategy,
    argmin,
    mean_score,
};

/// Settings for [`Ga`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaConfig {
    /// Number of circuits in the population.
    pub pop_size: usize,
    /// Probability of crossover for each pair.
    pub cx_pb: f64,
    /// Probability of mutation for each child.
    pub mut_pb: f64,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self { pop_size: 100, cx_pb: 0.7, mut_pb: 0.15 }
    }
}

impl GaConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> SearchResult<()> {
        if self.pop_size == 0 {
            return Err(SearchError::InvalidConfig("pop_size must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.cx_pb) {
            return Err(SearchError::InvalidConfig("cx_pb must be in [0, 1]".into()));
        }
        if !(0.0..=1.0).contains(&self.mut_pb) {
            return Err(SearchError::InvalidConfig("mut_pb must be in [0, 1]".into()));
        }
        Ok(())
    }
}

/// Genetic strategy.
#[derive(Clone, Debug)]
pub struct Ga {
    config: GaConfig,
    pop: Vec<Circuit>,
    n_crossovers: usize,
    n_mutations: usize,
}

impl Ga {
    /// Create a new strategy; the population is drawn when the search starts.
    pub fn new(config: GaConfig) -> SearchResult<Self> {
        config.validate()?;
        Ok(Self { config, pop: Vec::new(), n_crossovers: 0, n_mutations: 0 })
    }

    /// Return the settings.
    pub fn config(&self) -> &GaConfig { &self.config }

    /// Return the current population.
    pub fn population(&self) -> &[Circuit] { &self.pop }

    /// Return the number of crossovers performed so far.
    pub fn n_crossovers(&self) -> usize { self.n_crossovers }

    /// Return the number of mutations performed so far.
    pub fn n_mutations(&self) -> usize { self.n_mutations }

    fn offer_best(&self, core: &mut Core) {
        if let Some(k) = argmin(&self.pop) { core.update_best(&self.pop[k]); }
    }

    fn fixing(&mut self, core: &mut Core) -> SearchResult<()> {
        for member in self.pop.iter_mut().filter(|c| c.is_empty()) {
            *member = core.random_scored_circuit()?;
        }
        Ok(())
    }

    fn new_generation(&mut self, core: &mut Core) -> SearchResult<()> {
        self.pop.shuffle(core.rng());
        for pair in self.pop.chunks_exact_mut(2) {
            let [p0, p1] = pair else { continue; };
            let mut c0 = p0.clone();
            let mut c1 = p1.clone();

            if core.rng().gen::<f64>() < self.config.cx_pb {
                mate(core, &mut c0, &mut c1)?;
                self.n_crossovers += 1;
            }
            if core.rng().gen::<f64>() < self.config.mut_pb {
                mutate(core, &mut c0)?;
                self.n_mutations += 1;
            }
            if core.rng().gen::<f64>() < self.config.mut_pb {
                mutate(core, &mut c1)?;
                self.n_mutations += 1;
            }

            core.evaluate(&mut c0)?;
            core.evaluate(&mut c1)?;
            replace_if_no_worse(p0, c0);
            replace_if_no_worse(p1, c1);
        }
        Ok(())
    }
}

/// Put a scored `child` in place of `parent` if it scores no worse. An
/// unscored parent is kept.
fn replace_if_no_worse(parent: &mut Circuit, child: Circuit) -> bool {
    let accept =
        parent.score().zip(child.score())
        .is_some_and(|(p, c)| c <= p);
    if accept { *parent = child; }
    accept
}

/// One-point crossover: swap prefixes at a cut drawn uniformly from
/// `0..=min(len a, len b)`.
fn mate(core: &mut Core, a: &mut Circuit, b: &mut Circuit) -> SearchResult<()> {
    let cut = core.rng().gen_range(0..=a.len().min(b.len()));
    a.swap_prefix(b, cut)?;
    Ok(())
}

/// Single-point mutation.
fn mutate(core: &mut Core, circuit: &mut Circuit) -> SearchResult<()> {
    let mode = core.rng().gen_range(0..3_u8);
    match mode {
        0 if !circuit.is_empty() => {
            let idx = core.rng().gen_range(0..circuit.len());
            circuit.remove(idx)?;
        },
        1 if !circuit.is_empty() => {
            let idx = core.rng().gen_range(0..circuit.len());
            let (arity, n_params) =
                circuit.get(idx)
                .map(|instr| (instr.gate().arity(), instr.n_params()))
                .unwrap_or_default();
            match core.rng().gen_range(0..3_u8) {
                0 => {
                    let instr = core.sample_instruction()?;
                    circuit.replace(idx, instr)?;
                },
                1 => {
                    let qubits = core.sample_qubits(arity)?;
                    circuit.set_qubits(idx, qubits)?;
                },
                _ => {
                    let params = core.sample_angles(n_params);
                    circuit.set_params(idx, params)?;
                },
            }
        },
        _ => {
            let idx = core.rng().gen_range(0..=circuit.len());
            let instr = core.sample_instruction()?;
            circuit.insert(idx, instr)?;
        },
    }
    Ok(())
}

impl Strategy for Ga {
    fn name(&self) -> &'static str { "ga" }

    fn init(&mut self, core: &mut Core) -> SearchResult<()> {
        self.pop =
            (0..self.config.pop_size)
            .map(|_| core.random_scored_circuit())
            .collect::<SearchResult<_>>()?;
        self.offer_best(core);
        Ok(())
    }

    fn step(&mut self, core: &mut Core) -> SearchResult<()> {
        self.offer_best(core);
        self.fixing(core)?;
        self.new_generation(core)?;
        // children accepted in this generation
        self.offer_best(core);
        Ok(())
    }

    fn stats(&self, core: &Core) -> BTreeMap<String, Option<f64>> {
        let mut stats = core.base_stats();
        stats.insert("mean_fit".to_string(), mean_score(&self.pop));
        stats.insert("n_crossovers".to_string(), Some(self.n_crossovers as f64));
        stats.insert("n_mutations".to_string(), Some(self.n_mutations as f64));
        stats
    }
}
