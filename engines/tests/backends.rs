use std::{cell::RefCell, sync::Arc};

use engines::{Capabilities, EngineFactory, EngineSpec, time_calculation};
use models::load_model;
use randomization::get_pars;
use sas_core::{Calculator, EvalGrid, Masked, ParameterSet, Result, SasErr};

fn build(model: &str, engine: &str, capabilities: Capabilities) -> Result<Box<dyn Calculator>> {
    let info = load_model(model)?;
    let grid = Arc::new(EvalGrid::log_1d(0.2, 32));
    let spec: EngineSpec = engine.parse()?;
    EngineFactory::new(capabilities).build(&info, &grid, spec, 0.)
}

#[test]
fn engine_tags_follow_backend_and_precision() {
    let all = Capabilities::all();
    let cases = [
        ("sphere", "default", "ACC32"),
        ("polymer_micelle", "default", "ACC64"),
        ("sphere", "half", "ACC16"),
        ("sphere", "fast", "ACCfast"),
        ("sphere", "double", "ACC64"),
        ("sphere", "single!", "SEQ32"),
        ("sphere", "!", "SEQ64"),
        ("sphere", "sasview", "legacy"),
    ];

    for (model, engine, tag) in cases {
        let calc = build(model, engine, all).unwrap();
        assert_eq!(calc.engine(), tag, "{model} with {engine}");
    }
}

#[test]
fn unsupported_requests_are_unavailable() {
    let all = Capabilities::all();
    for engine in ["quad", "quad!", "half!", "fast!"] {
        let err = build("sphere", engine, all).err().unwrap();
        assert!(err.is_unavailable(), "{engine}: {err}");
    }

    let no_gpu = Capabilities {
        accelerator: false,
        ..all
    };
    assert!(build("sphere", "single", no_gpu).err().unwrap().is_unavailable());
    assert!(build("sphere", "single!", no_gpu).is_ok());

    let no_legacy = Capabilities { legacy: false, ..all };
    assert!(build("sphere", "legacy", no_legacy).err().unwrap().is_unavailable());
}

#[test]
fn legacy_requires_a_catalog_entry() {
    let err = build("polymer_micelle", "legacy", Capabilities::all()).err().unwrap();
    assert!(matches!(err, SasErr::UnknownLegacyModel { .. }));

    let err = build("sphere+guinier", "legacy", Capabilities::all()).err().unwrap();
    assert!(matches!(err, SasErr::UnsupportedComposite { .. }));
}

#[test]
fn backends_agree_on_sphere() {
    let info = load_model("sphere").unwrap();
    let pars = get_pars(&info, true);
    let all = Capabilities::all();

    let reference = build("sphere", "double!", all).unwrap().evaluate(&pars).unwrap();
    let parallel = build("sphere", "double", all).unwrap().evaluate(&pars).unwrap();
    let legacy = build("sphere", "legacy", all).unwrap().evaluate(&pars).unwrap();
    let single = build("sphere", "single", all).unwrap().evaluate(&pars).unwrap();

    assert_eq!(reference, parallel);
    assert_eq!(reference, legacy);
    for (a, b) in single.values().iter().zip(reference.values()) {
        assert!(((a - b) / b).abs() < 1e-4, "{a} vs {b}");
    }
}

/// Records whether each evaluation it sees is polydisperse.
struct Recorder {
    seen: RefCell<Vec<bool>>,
}

impl Calculator for Recorder {
    fn engine(&self) -> &str {
        "recorder"
    }

    fn evaluate(&self, pars: &ParameterSet) -> Result<Masked> {
        let dispersed = pars.number_or("radius_pd_n", 0.) > 0.;
        self.seen.borrow_mut().push(dispersed);
        Ok(Masked::unmasked(ndarray::array![1.]))
    }
}

#[test]
fn timing_warms_up_monodisperse_before_repeated_runs() {
    let mut pars = ParameterSet::new();
    pars.set("radius_pd_n", 35.);
    let recorder = Recorder {
        seen: RefCell::new(Vec::new()),
    };

    let (value, ms) = time_calculation(&recorder, &pars, 3).unwrap();
    assert_eq!(value.sum(), 1.);
    assert!(ms >= 0.);
    assert_eq!(*recorder.seen.borrow(), vec![false, true, true, true]);

    recorder.seen.borrow_mut().clear();
    time_calculation(&recorder, &pars, 0).unwrap();
    assert_eq!(*recorder.seen.borrow(), vec![true]);
}
