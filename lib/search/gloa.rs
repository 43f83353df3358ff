//! Group leader optimization.
//!
//! The population is split into `n_groups` groups of `group_size` circuits.
//! The *leader* of a group is its lowest-scoring member. Each generation has
//! two phases, after which the best leader is offered as the new best.
//!
//! **Mutation.** For each group, the leader is fixed at the start of the
//! group's turn. Every member is then recombined with the leader and a fresh
//! random circuit, position by position: if all three instructions apply the
//! same parametric gate, the candidate applies that gate with parameters
//! ```text
//! w_m p_member + w_l p_leader + w_r p_random
//! ```
//! on the qubits of one of the three, chosen with probabilities `(w_m, w_l,
//! w_r)`; otherwise the whole instruction is taken from one of the three with
//! the same probabilities. Positions past the end of the shortest of the three
//! are copied from the member. The candidate replaces the member if it scores
//! strictly lower.
//!
//! **Migration.** A count `t` is drawn uniformly from `0..=⌊3 group_size
//! circuit_size / 2⌋`. For every group, `t` times: a random member of the
//! group receives, at a random position, the instruction at the same position
//! of a random member of a random source group. The spliced copy replaces the
//! member if it scores strictly lower.
//!
//! Groups never change size.
//!
//! Reference:
//! - A. Daskin, S. Kais, "Decomposition of unitary matrices for finding
//! quantum circuits: Application to molecular Hamiltonians." [arXiv:1004.2242](https://arxiv.org/abs/1004.2242)

use std::collections::BTreeMap;
use itertools::izip;
use rand::{ Rng, distributions::{ Distribution, WeightedIndex } };
use serde::{ Deserialize, Serialize };
use crate::{ circuit::Circuit, instruction::Instruction };
use super::{
    Core,
    SearchError,
    SearchResult,
    Strategy,
    argmin,
    mean_score,
    score_of,
};

/// Settings for [`Gloa`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GloaConfig {
    /// Number of groups.
    pub n_groups: usize,
    /// Number of circuits per group.
    pub group_size: usize,
    /// Recombination weights of the member, the leader, and the random
    /// circuit.
    pub weights: [f64; 3],
}

impl Default for GloaConfig {
    fn default() -> Self {
        Self { n_groups: 5, group_size: 10, weights: [0.7, 0.15, 0.15] }
    }
}

impl GloaConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> SearchResult<()> {
        if self.n_groups == 0 {
            return Err(SearchError::InvalidConfig("n_groups must be > 0".into()));
        }
        if self.group_size == 0 {
            return Err(SearchError::InvalidConfig("group_size must be > 0".into()));
        }
        if self.weights.iter().any(|w| !w.is_finite() || *w < 0.0)
            || self.weights.iter().sum::<f64>() <= 0.0
        {
            return Err(SearchError::InvalidConfig(
                "weights must be non-negative and not all zero".into()));
        }
        Ok(())
    }
}

/// Group leader strategy.
#[derive(Clone, Debug)]
pub struct Gloa {
    config: GloaConfig,
    choice: WeightedIndex<f64>,
    groups: Vec<Vec<Circuit>>,
    n_migrations: usize,
}

impl Gloa {
    /// Create a new strategy; the groups are drawn when the search starts.
    pub fn new(config: GloaConfig) -> SearchResult<Self> {
        config.validate()?;
        let choice =
            WeightedIndex::new(config.weights)
            .map_err(|e| SearchError::InvalidConfig(e.to_string()))?;
        Ok(Self { config, choice, groups: Vec::new(), n_migrations: 0 })
    }

    /// Return the settings.
    pub fn config(&self) -> &GloaConfig { &self.config }

    /// Return the groups.
    pub fn groups(&self) -> &[Vec<Circuit>] { &self.groups }

    /// Return the number of accepted migrations so far.
    pub fn n_migrations(&self) -> usize { self.n_migrations }

    pub(super) fn groups_mut(&mut self) -> &mut [Vec<Circuit>] {
        &mut self.groups
    }

    /// Return the leader of each group.
    pub fn leaders(&self) -> impl Iterator<Item = &Circuit> + '_ {
        self.groups.iter()
            .filter_map(|group| argmin(group).map(|k| &group[k]))
    }

    /// Draw and score every group.
    pub(super) fn populate(&mut self, core: &mut Core) -> SearchResult<()> {
        self.groups =
            (0..self.config.n_groups)
            .map(|_| {
                (0..self.config.group_size)
                    .map(|_| core.random_scored_circuit())
                    .collect::<SearchResult<Vec<Circuit>>>()
            })
            .collect::<SearchResult<_>>()?;
        Ok(())
    }

    /// Offer the best leader as the new best.
    pub(super) fn offer_best(&self, core: &mut Core) {
        let best =
            self.leaders()
            .min_by(|l, r| score_of(l).total_cmp(&score_of(r)));
        if let Some(best) = best { core.update_best(best); }
    }

    /// Recombine every member with its group's leader and a random circuit.
    pub(super) fn mutation(&mut self, core: &mut Core) -> SearchResult<()> {
        for group in self.groups.iter_mut() {
            let Some(l) = argmin(group) else { continue; };
            let leader = group[l].clone();
            for member in group.iter_mut() {
                let random = core.random_circuit()?;
                let mut candidate =
                    combine(
                        core,
                        &self.choice,
                        &self.config.weights,
                        member,
                        &leader,
                        &random,
                    )?;
                let score = core.evaluate(&mut candidate)?;
                if score < score_of(member) { *member = candidate; }
            }
        }
        Ok(())
    }

    /// Splice instructions between groups. Source groups are uniform if
    /// `sources` is `None`.
    pub(super) fn migration(
        &mut self,
        core: &mut Core,
        sources: Option<&WeightedIndex<f64>>,
    ) -> SearchResult<()>
    {
        let n_groups = self.groups.len();
        let group_size = self.config.group_size;
        let max_t = 3 * group_size * core.circuit_size() / 2;
        let t = core.rng().gen_range(0..=max_t);
        for dest in 0..n_groups {
            for _ in 0..t {
                let k = core.rng().gen_range(0..group_size);
                let src =
                    match sources {
                        Some(dist) => dist.sample(core.rng()),
                        None => core.rng().gen_range(0..n_groups),
                    };
                let m = core.rng().gen_range(0..group_size);
                let len = self.groups[dest][k].len().min(self.groups[src][m].len());
                if len == 0 { continue; }
                let pos = core.rng().gen_range(0..len);
                let Some(instr) = self.groups[src][m].get(pos).cloned()
                    else { continue; };
                let mut candidate = self.groups[dest][k].clone();
                candidate.replace(pos, instr)?;
                let score = core.evaluate(&mut candidate)?;
                if score < score_of(&self.groups[dest][k]) {
                    self.groups[dest][k] = candidate;
                    self.n_migrations += 1;
                }
            }
        }
        Ok(())
    }

    pub(super) fn group_stats(&self, stats: &mut BTreeMap<String, Option<f64>>) {
        stats.insert("n_migrations".to_string(), Some(self.n_migrations as f64));
        for (g, group) in self.groups.iter().enumerate() {
            stats.insert(format!("mean_fit_{g}"), mean_score(group));
        }
    }
}

fn combine(
    core: &mut Core,
    choice: &WeightedIndex<f64>,
    weights: &[f64; 3],
    member: &Circuit,
    leader: &Circuit,
    random: &Circuit,
) -> SearchResult<Circuit>
{
    let mut instructions: Vec<Instruction> = Vec::with_capacity(member.len());
    let triples =
        izip!(member.instructions(), leader.instructions(), random.instructions());
    for (m, l, r) in triples {
        let pick = [m, l, r][choice.sample(core.rng())];
        if m.same_gate(l) && m.same_gate(r) && m.gate().is_parametric() {
            let params: Vec<f64> =
                izip!(m.params(), l.params(), r.params())
                .map(|(pm, pl, pr)| {
                    weights[0] * pm + weights[1] * pl + weights[2] * pr
                })
                .collect();
            let qubits = pick.qubits().to_vec();
            instructions.push(Instruction::new(m.gate(), qubits, params)?);
        } else {
            instructions.push(pick.clone());
        }
    }
    if instructions.len() < member.len() {
        instructions.extend_from_slice(&member.instructions()[instructions.len()..]);
    }
    Ok(Circuit::new(core.n_qubits(), instructions)?)
}

impl Strategy for Gloa {
    fn name(&self) -> &'static str { "gloa" }

    fn init(&mut self, core: &mut Core) -> SearchResult<()> {
        self.populate(core)?;
        self.offer_best(core);
        Ok(())
    }

    fn step(&mut self, core: &mut Core) -> SearchResult<()> {
        self.mutation(core)?;
        self.migration(core, None)?;
        self.offer_best(core);
        Ok(())
    }

    fn stats(&self, core: &Core) -> BTreeMap<String, Option<f64>> {
        let mut stats = core.base_stats();
        self.group_stats(&mut stats);
        stats
    }
}

#[cfg(test)]
mod tests {
    use ndarray as nd;
    use num_complex::Complex64 as C64;
    use super::*;
    use crate::{
        alphabet::Alphabet,
        distance::Metric,
        gate::Gate,
        search::{ Search, SearchConfig },
        target,
    };

    fn core(seed: u64) -> Core {
        let alphabet =
            Alphabet::with_gates(2, [Gate::H, Gate::CX, Gate::RZ, Gate::U3])
            .unwrap();
        let config = SearchConfig {
            circuit_size: 4,
            seed: Some(seed),
            ..Default::default()
        };
        Core::new(target::qft(2), alphabet, &config).unwrap()
    }

    fn instr(gate: Gate, qubits: &[usize], params: &[f64]) -> Instruction {
        Instruction::new(gate, qubits.iter().copied(), params.iter().copied())
            .unwrap()
    }

    #[test]
    fn config_validation() {
        assert!(Gloa::new(GloaConfig::default()).is_ok());
        let bad = GloaConfig { n_groups: 0, ..Default::default() };
        assert!(Gloa::new(bad).is_err());
        let bad = GloaConfig { weights: [0.0; 3], ..Default::default() };
        assert!(Gloa::new(bad).is_err());
        let bad = GloaConfig { weights: [1.0, -0.5, 0.5], ..Default::default() };
        assert!(Gloa::new(bad).is_err());
    }

    #[test]
    fn combine_blends_matching_parametric_gates() {
        let mut core = core(2);
        let choice = WeightedIndex::new([0.7, 0.15, 0.15]).unwrap();
        let weights = [0.7, 0.15, 0.15];
        let member = Circuit::new(2, vec![
            instr(Gate::RZ, &[0], &[1.0]),
            instr(Gate::H, &[1], &[]),
            instr(Gate::X, &[0], &[]),
        ]).unwrap();
        let leader = Circuit::new(2, vec![
            instr(Gate::RZ, &[1], &[2.0]),
            instr(Gate::H, &[0], &[]),
        ]).unwrap();
        let random = Circuit::new(2, vec![
            instr(Gate::RZ, &[0], &[3.0]),
            instr(Gate::CX, &[0, 1], &[]),
            instr(Gate::Y, &[1], &[]),
        ]).unwrap();
        for _ in 0..50 {
            let c = combine(&mut core, &choice, &weights, &member, &leader, &random)
                .unwrap();
            assert_eq!(c.len(), 3);
            let first = &c.instructions()[0];
            assert_eq!(first.gate(), Gate::RZ);
            assert!((first.params()[0] - (0.7 + 0.3 + 0.45)).abs() < 1e-12);
            // the tail comes from the member
            assert_eq!(c.instructions()[2], member.instructions()[2]);
            let second = &c.instructions()[1];
            assert!(
                *second == member.instructions()[1]
                || *second == leader.instructions()[1]
                || *second == random.instructions()[1]
            );
        }
    }

    #[test]
    fn groups_keep_their_size() {
        let config = GloaConfig { n_groups: 3, group_size: 4, ..Default::default() };
        let mut search = Search::new(core(8), Gloa::new(config).unwrap()).unwrap();
        assert_eq!(search.n_evals(), 12);
        let mut prev = search.core().best_score().unwrap();
        for _ in 0..10 {
            search.evolve().unwrap();
            let groups = search.strategy().groups();
            assert_eq!(groups.len(), 3);
            assert!(groups.iter().all(|g| g.len() == 4));
            assert!(groups.iter().flatten().all(|c| c.len() == 4 && c.score().is_some()));
            let best = search.core().best_score().unwrap();
            assert!(best <= prev);
            let leader_min =
                search.strategy().leaders()
                .map(score_of)
                .fold(f64::INFINITY, f64::min);
            assert!(best <= leader_min);
            prev = best;
        }
        let stats = search.stats();
        assert_eq!(
            stats.keys().collect::<Vec<_>>(),
            ["best_fit", "mean_fit_0", "mean_fit_1", "mean_fit_2", "n_evals", "n_migrations"],
        );
    }

    #[test]
    fn ties_are_rejected() {
        fn flat(_: &nd::Array2<C64>, _: &nd::Array2<C64>) -> f64 { 0.5 }
        let alphabet =
            Alphabet::with_gates(2, [Gate::H, Gate::CX, Gate::RZ, Gate::U3])
            .unwrap();
        let config = SearchConfig {
            circuit_size: 4,
            seed: Some(6),
            metric: Metric::Custom(flat),
        };
        let core = Core::new(target::qft(2), alphabet, &config).unwrap();
        let gloa =
            Gloa::new(GloaConfig { n_groups: 3, group_size: 4, ..Default::default() })
            .unwrap();
        let mut search = Search::new(core, gloa).unwrap();
        let snapshot = |gloa: &Gloa| -> Vec<Vec<Vec<Instruction>>> {
            gloa.groups().iter()
                .map(|g| g.iter().map(|c| c.instructions().to_vec()).collect())
                .collect()
        };
        let initial = snapshot(search.strategy());
        let evals = search.n_evals();
        for _ in 0..5 { search.evolve().unwrap(); }
        assert!(search.n_evals() > evals);
        assert_eq!(snapshot(search.strategy()), initial);
        assert_eq!(search.strategy().n_migrations(), 0);
    }
}
