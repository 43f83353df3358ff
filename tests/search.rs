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
    target,
};

fn small_gloa() -> GloaConfig {
    GloaConfig { n_groups: 2, group_size: 5, ..Default::default() }
}

fn strategies() -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(MonteCarlo::new()),
        Box::new(Ga::new(GaConfig { pop_size: 20, ..Default::default() }).unwrap()),
        Box::new(Gloa::new(small_gloa()).unwrap()),
        Box::new(Mloa::new(MloaConfig { gloa: small_gloa(), ..Default::default() }).unwrap()),
    ]
}

#[test]
fn identity_is_found_immediately() {
    let alphabet = Alphabet::with_gates(1, [Gate::I]).unwrap();
    let config = SearchConfig { circuit_size: 3, seed: Some(0), ..Default::default() };
    let core = Core::new(target::identity(1), alphabet, &config).unwrap();
    let mut search = Search::new(core, MonteCarlo::new()).unwrap();
    search.evolve().unwrap();
    assert_eq!(search.n_evals(), 1);
    assert_eq!(search.best().and_then(|b| b.score()), Some(0.0));
}

#[test]
fn every_strategy_finds_cx() {
    let budget = Budget {
        max_evals: Some(200),
        threshold: Some(1e-12),
        ..Default::default()
    };
    for (seed, strategy) in strategies().into_iter().enumerate() {
        let alphabet = Alphabet::with_gates(2, [Gate::CX, Gate::I]).unwrap();
        let config = SearchConfig {
            circuit_size: 1,
            seed: Some(seed as u64),
            ..Default::default()
        };
        let core = Core::new(Gate::CX.matrix(&[]).unwrap(), alphabet, &config).unwrap();
        let mut search = Search::new(core, strategy).unwrap();
        let name = search.strategy().name();
        let best = search.run(&budget).unwrap().cloned().unwrap();
        assert!(best.score().unwrap() < 1e-12, "{name}");
        let qasm = best.to_qasm();
        assert!(qasm.starts_with("OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\n"));
        assert!(qasm.contains("cx q[0],q[1];"), "{name}: {qasm}");
    }
}

#[test]
fn best_never_regresses() {
    for (seed, strategy) in strategies().into_iter().enumerate() {
        let alphabet =
            Alphabet::with_gates(2, [Gate::H, Gate::CX, Gate::U3, Gate::T]).unwrap();
        let config = SearchConfig {
            circuit_size: 5,
            seed: Some(100 + seed as u64),
            ..Default::default()
        };
        let core = Core::new(target::qft(2), alphabet, &config).unwrap();
        let mut search = Search::new(core, strategy).unwrap();
        let keys: Vec<String> = search.stats().into_keys().collect();
        let mut prev = search.core().best_score();
        for g in 1..=15 {
            search.evolve().unwrap();
            assert_eq!(search.gen(), g);
            let best = search.core().best_score();
            assert!(best.is_some());
            if let (Some(p), Some(b)) = (prev, best) { assert!(b <= p); }
            prev = best;
            let now: Vec<String> = search.stats().into_keys().collect();
            assert_eq!(now, keys);
        }
    }
}

#[test]
fn seeded_runs_repeat() {
    let run = || {
        let alphabet =
            Alphabet::with_gates(2, [Gate::H, Gate::CX, Gate::RZ]).unwrap();
        let config = SearchConfig { circuit_size: 4, seed: Some(42), ..Default::default() };
        let core = Core::new(target::qft(2), alphabet, &config).unwrap();
        let mloa = Mloa::new(MloaConfig { gloa: small_gloa(), ..Default::default() }).unwrap();
        let mut search = Search::new(core, mloa).unwrap();
        search.run(&Budget { max_gens: Some(5), ..Default::default() }).unwrap();
        (search.n_evals(), search.stats(), search.finalize().map(|b| b.to_qasm()))
    };
    assert_eq!(run(), run());
}

#[test]
fn unbounded_run_is_rejected() {
    let alphabet = Alphabet::with_gates(1, [Gate::H]).unwrap();
    let core = Core::new(target::identity(1), alphabet, &SearchConfig::default()).unwrap();
    let mut search = Search::new(core, MonteCarlo::new()).unwrap();
    assert!(search.run(&Budget::default()).is_err());
}

#[test]
fn configs_from_json() {
    let search: SearchConfig =
        serde_json::from_str(r#"{ "circuit_size": 6, "seed": 3 }"#).unwrap();
    assert_eq!(search.circuit_size, 6);
    assert_eq!(search.seed, Some(3));

    let ga: GaConfig = serde_json::from_str(r#"{ "pop_size": 40 }"#).unwrap();
    assert_eq!(ga, GaConfig { pop_size: 40, ..Default::default() });

    let gloa: GloaConfig =
        serde_json::from_str(r#"{ "weights": [0.5, 0.25, 0.25] }"#).unwrap();
    assert_eq!(gloa.weights, [0.5, 0.25, 0.25]);
    assert_eq!(gloa.n_groups, GloaConfig::default().n_groups);

    let budget: Budget =
        serde_json::from_str(r#"{ "max_evals": 1000, "threshold": 1e-6 }"#).unwrap();
    assert_eq!(budget.max_evals, Some(1000));
    assert_eq!(budget.max_gens, None);
    assert_eq!(budget.threshold, Some(1e-6));

    let text = serde_json::to_string(&MloaConfig::default()).unwrap();
    let back: MloaConfig = serde_json::from_str(&text).unwrap();
    assert_eq!(back, MloaConfig::default());
}
