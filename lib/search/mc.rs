//! Pure random search.
//!
//! Each generation draws and scores one fresh random circuit. Nothing
//! persists between generations except the best circuit.

use std::collections::BTreeMap;
use super::{ Core, SearchResult, Strategy };

/// Monte Carlo strategy. Costs exactly one evaluation per generation.
#[derive(Copy, Clone, Debug, Default)]
pub struct MonteCarlo;

impl MonteCarlo {
    pub fn new() -> Self { Self }
}

impl Strategy for MonteCarlo {
    fn name(&self) -> &'static str { "mc" }

    fn init(&mut self, _core: &mut Core) -> SearchResult<()> { Ok(()) }

    fn step(&mut self, core: &mut Core) -> SearchResult<()> {
        let circuit = core.random_scored_circuit()?;
        core.update_best(&circuit);
        Ok(())
    }

    fn stats(&self, core: &Core) -> BTreeMap<String, Option<f64>> {
        core.base_stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        alphabet::Alphabet,
        gate::Gate,
        search::{ Search, SearchConfig },
        target,
    };

    #[test]
    fn one_eval_per_generation() {
        let alphabet = Alphabet::with_gates(2, [Gate::H, Gate::CX]).unwrap();
        let config = SearchConfig { circuit_size: 3, seed: Some(5), ..Default::default() };
        let core = Core::new(target::qft(2), alphabet, &config).unwrap();
        let mut search = Search::new(core, MonteCarlo::new()).unwrap();
        assert_eq!(search.n_evals(), 0);
        assert!(search.best().is_none());
        let mut prev = f64::INFINITY;
        for g in 1..=25 {
            search.evolve().unwrap();
            assert_eq!(search.gen(), g);
            assert_eq!(search.n_evals(), g);
            let best = search.best().and_then(|b| b.score()).unwrap();
            assert!(best <= prev);
            prev = best;
        }
        let stats = search.stats();
        assert_eq!(stats.keys().collect::<Vec<_>>(), ["best_fit", "n_evals"]);
        assert_eq!(stats["n_evals"], Some(25.0));
    }
}
