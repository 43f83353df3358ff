use std::time::Instant;
use tracing_subscriber::EnvFilter;
use qcd::{
    alphabet::Alphabet,
    gate::Gate,
    search::{
        Budget,
        Core,
        Search,
        SearchConfig,
        Strategy,
        ga::{ Ga, GaConfig },
        gloa::{ Gloa, GloaConfig },
        mc::MonteCarlo,
        mloa::{ Mloa, MloaConfig },
    },
};

// run every strategy on the same three-qubit Toffoli target with the same
// evaluation budget and report what each one reached
//
// set RUST_LOG=qcd=debug to follow new best circuits as they are found
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    const EVALS: usize = 20_000;
    const SEED: u64 = 10546;

    let target = Gate::CCX.matrix(&[])?;
    let gates = [Gate::H, Gate::T, Gate::Tdg, Gate::CX];
    let config = SearchConfig { circuit_size: 15, seed: Some(SEED), ..Default::default() };
    let budget = Budget { max_evals: Some(EVALS), ..Default::default() };

    let strategies: Vec<Box<dyn Strategy>> = vec![
        Box::new(MonteCarlo::new()),
        Box::new(Ga::new(GaConfig { pop_size: 50, ..Default::default() })?),
        Box::new(Gloa::new(GloaConfig::default())?),
        Box::new(Mloa::new(MloaConfig::default())?),
    ];

    println!("{:>6} {:>8} {:>8} {:>12} {:>10}", "algo", "gens", "evals", "best", "secs");
    for strategy in strategies.into_iter() {
        let alphabet = Alphabet::with_gates(3, gates)?;
        // penalize length slightly so that shorter exact circuits win
        let core =
            Core::new(target.clone(), alphabet, &config)?
            .with_cost(|c| 1e-4 * c.len() as f64);
        let t0 = Instant::now();
        let mut search = Search::new(core, strategy)?;
        search.run(&budget)?;
        let secs = (Instant::now() - t0).as_secs_f64();
        let best = search.core().best_score();
        println!(
            "{:>6} {:>8} {:>8} {:>12.4e} {:>10.3}",
            search.strategy().name(),
            search.gen(),
            search.n_evals(),
            best.unwrap_or(f64::NAN),
            secs,
        );
    }
    Ok(())
}
