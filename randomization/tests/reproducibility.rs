use models::load_model;
use randomization::{Seed, SeedScope, constrain_pars, get_pars, randomize_pars};
use sas_core::ParameterSet;

fn random_set(model: &str, seed: u64) -> ParameterSet {
    let info = load_model(model).unwrap();
    let _scope = SeedScope::push(Seed::Value(seed));

    let mut pars = randomize_pars(&info, &get_pars(&info, true)).unwrap();
    constrain_pars(&info, &mut pars).unwrap();
    pars
}

#[test]
fn same_seed_gives_identical_sets() {
    for model in ["sphere", "parallelepiped", "polymer_micelle", "core_multi_shell", "guinier"] {
        let first = random_set(model, 24);
        let second = random_set(model, 24);

        assert_eq!(first, second, "{model}");
    }
}

#[test]
fn different_seeds_differ() {
    assert_ne!(random_set("sphere", 24), random_set("sphere", 25));
}

#[test]
fn random_sets_resolve_against_the_model() {
    for model in ["sphere*hardsphere", "parallelepiped", "core_multi_shell"] {
        let info = load_model(model).unwrap();
        for seed in 0..50 {
            let pars = random_set(model, seed);
            pars.validate(&info).unwrap();
            pars.records(&info).unwrap();
        }
    }
}

#[test]
fn non_magnetic_models_lose_moments() {
    let info = load_model("parallelepiped").unwrap();
    for seed in 0..20 {
        let pars = random_set("parallelepiped", seed);
        let moments = pars.iter().filter(|(k, _)| k.starts_with("M0:"));
        for (key, value) in moments {
            assert_eq!(value.as_number(), Some(0.), "{key}");
        }
    }
    assert!(!info.supports_magnetism());
}
