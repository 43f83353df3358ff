//! Memetic group leader optimization.
//!
//! Extends [`Gloa`] in two ways. Migration sources are no longer uniform: a
//! group is chosen as a source with probability proportional to the inverse
//! of its mean score, so that fitter groups export more. And a third phase,
//! *refinement*, follows migration: in every group, `n_selections` random
//! members and then the group's leader each get `n_iters` attempts at a small
//! continuous improvement. An attempt copies the circuit and, independently
//! with probability `ref_pb` for each parametric instruction, shifts every
//! parameter of that instruction by a quarter of a fresh random angle
//! (wrapping into [0, 2π)). The copy is only rescored if something moved, and
//! replaces the original if it scores strictly lower.
//!
//! The best leader is offered as the new best after all three phases.

use std::{ collections::BTreeMap, f64::consts::TAU };
use rand::{ Rng, distributions::WeightedIndex, seq::index };
use serde::{ Deserialize, Serialize };
use crate::circuit::Circuit;
use super::{
    Core,
    SearchError,
    SearchResult,
    Strategy,
    argmin,
    gloa::{ Gloa, GloaConfig },
    mean_score,
    score_of,
};

/// Settings for [`Mloa`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MloaConfig {
    /// Group settings.
    #[serde(flatten)]
    pub gloa: GloaConfig,
    /// Probability of perturbing each parametric instruction in one
    /// refinement attempt.
    pub ref_pb: f64,
    /// Number of random members refined per group, besides the leader.
    pub n_selections: usize,
    /// Number of refinement attempts per refined circuit.
    pub n_iters: usize,
}

impl Default for MloaConfig {
    fn default() -> Self {
        Self {
            gloa: GloaConfig::default(),
            ref_pb: 0.25,
            n_selections: 1,
            n_iters: 10,
        }
    }
}

impl MloaConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> SearchResult<()> {
        self.gloa.validate()?;
        if !(0.0..=1.0).contains(&self.ref_pb) {
            return Err(SearchError::InvalidConfig("ref_pb must be in [0, 1]".into()));
        }
        Ok(())
    }
}

/// Memetic group leader strategy.
#[derive(Clone, Debug)]
pub struct Mloa {
    gloa: Gloa,
    ref_pb: f64,
    n_selections: usize,
    n_iters: usize,
    n_refinements: usize,
}

impl Mloa {
    /// Create a new strategy; the groups are drawn when the search starts.
    pub fn new(config: MloaConfig) -> SearchResult<Self> {
        config.validate()?;
        let MloaConfig { gloa, ref_pb, n_selections, n_iters } = config;
        Ok(Self {
            gloa: Gloa::new(gloa)?,
            ref_pb,
            n_selections,
            n_iters,
            n_refinements: 0,
        })
    }

    /// Return the groups.
    pub fn groups(&self) -> &[Vec<Circuit>] { self.gloa.groups() }

    /// Return the number of accepted refinements so far.
    pub fn n_refinements(&self) -> usize { self.n_refinements }

    /// Source distribution over groups, weighted by inverse mean score.
    ///
    /// Returns `None` (uniform sources) if the weights are degenerate.
    fn source_weights(&self) -> Option<WeightedIndex<f64>> {
        let weights: Vec<f64> =
            self.gloa.groups().iter()
            .map(|group| {
                let mean = mean_score(group).unwrap_or(f64::INFINITY);
                1.0 / mean.max(1e-12)
            })
            .collect();
        WeightedIndex::new(weights).ok()
    }

    fn refinement(&mut self, core: &mut Core) -> SearchResult<()> {
        let Self { gloa, ref_pb, n_selections, n_iters, n_refinements } = self;
        for group in gloa.groups_mut().iter_mut() {
            let n = (*n_selections).min(group.len());
            for k in index::sample(core.rng(), group.len(), n).into_iter() {
                *n_refinements += refine(core, &mut group[k], *ref_pb, *n_iters)?;
            }
        }
        for group in gloa.groups_mut().iter_mut() {
            if let Some(l) = argmin(group) {
                *n_refinements += refine(core, &mut group[l], *ref_pb, *n_iters)?;
            }
        }
        Ok(())
    }
}

/// Try `n_iters` random parameter shifts of `circuit`, keeping each one that
/// strictly lowers the score. Returns the number kept.
fn refine(core: &mut Core, circuit: &mut Circuit, ref_pb: f64, n_iters: usize)
    -> SearchResult<usize>
{
    let mut accepted: usize = 0;
    for _ in 0..n_iters {
        let mut candidate = circuit.clone();
        let mut moved = false;
        for idx in 0..candidate.len() {
            let Some(instr) = candidate.get(idx) else { break; };
            if !instr.gate().is_parametric() { continue; }
            if core.rng().gen::<f64>() >= ref_pb { continue; }
            let shifts = core.sample_angles(instr.n_params());
            let params: Vec<f64> =
                instr.params().iter().zip(shifts)
                .map(|(p, d)| (p + d / 4.0).rem_euclid(TAU))
                .collect();
            candidate.set_params(idx, params)?;
            moved = true;
        }
        if !moved { continue; }
        let score = core.evaluate(&mut candidate)?;
        if score < score_of(circuit) {
            *circuit = candidate;
            accepted += 1;
        }
    }
    Ok(accepted)
}

impl Strategy for Mloa {
    fn name(&self) -> &'static str { "mloa" }

    fn init(&mut self, core: &mut Core) -> SearchResult<()> {
        self.gloa.populate(core)?;
        self.gloa.offer_best(core);
        Ok(())
    }

    fn step(&mut self, core: &mut Core) -> SearchResult<()> {
        self.gloa.mutation(core)?;
        let sources = self.source_weights();
        self.gloa.migration(core, sources.as_ref())?;
        self.refinement(core)?;
        self.gloa.offer_best(core);
        Ok(())
    }

    fn stats(&self, core: &Core) -> BTreeMap<String, Option<f64>> {
        let mut stats = core.base_stats();
        self.gloa.group_stats(&mut stats);
        stats.insert("n_refinements".to_string(), Some(self.n_refinements as f64));
        stats
    }
}
