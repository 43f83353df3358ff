use std::time::Instant;
use rand::{ SeedableRng, rngs::StdRng };
use tracing_subscriber::EnvFilter;
use qcd::{
    alphabet::Alphabet,
    gate::Gate,
    refine::{ BasinHoppingConfig, ContinuousOptimizer },
    search::{
        Budget,
        Core,
        Search,
        SearchConfig,
        gloa::GloaConfig,
        mloa::{ Mloa, MloaConfig },
        stats::StatsLog,
    },
    target,
};

fn timeit<F, T>(mut f: F) -> (T, f64)
where F: FnMut() -> T
{
    let t0 = Instant::now();
    let out: T = f();
    (out, (Instant::now() - t0).as_secs_f64())
}

// search for the two-qubit quantum Fourier transform with memetic group leader
// optimization, then polish the result's angles
//
// set RUST_LOG=qcd=debug to follow new best circuits as they are found
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let alphabet =
        Alphabet::with_gates(2, [Gate::H, Gate::CX, Gate::T, Gate::Tdg, Gate::U1])?;
    let config = SearchConfig { circuit_size: 8, seed: Some(10546), ..Default::default() };
    let target = target::qft(2);
    let core = Core::new(target.clone(), alphabet, &config)?;
    let mloa = Mloa::new(MloaConfig {
        gloa: GloaConfig { n_groups: 4, group_size: 12, ..Default::default() },
        ..Default::default()
    })?;
    let mut search = Search::new(core, mloa)?;

    // record statistics once per generation
    let mut log = StatsLog::from_snapshot(&search.stats())?;
    let budget = Budget {
        max_evals: Some(50_000),
        threshold: Some(1e-6),
        ..Default::default()
    };
    let (res, t) = timeit(|| -> anyhow::Result<()> {
        while !budget.is_exhausted(search.core()) {
            search.evolve()?;
            log.record(&search.stats())?;
        }
        Ok(())
    });
    res?;
    println!(
        "{} generations, {} evaluations in {:.3e} secs",
        search.gen(), search.n_evals(), t,
    );
    let best_fit = log.series("best_fit")?;
    if let (Some(first), Some(last)) = (best_fit.first(), best_fit.last()) {
        println!("best_fit: {:?} -> {:?}", first, last);
    }

    let Some(best) = search.finalize() else {
        anyhow::bail!("no circuit was evaluated");
    };
    println!("{}", best);

    let optimizer = ContinuousOptimizer::new(BasinHoppingConfig::default())?;
    let mut rng = StdRng::seed_from_u64(10546);
    let (refined, t) = timeit(|| optimizer.optimize(&best, &target, &mut rng));
    let refined = refined?;
    println!(
        "refined in {:.3e} secs ({} evaluations): {:?} -> {:?}",
        t, refined.n_evals, best.score(), refined.circuit.score(),
    );
    print!("{}", refined.circuit.to_qasm());
    Ok(())
}
