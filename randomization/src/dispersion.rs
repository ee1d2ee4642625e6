use log::debug;
use rand::{Rng, rngs::StdRng, seq::index};
use sas_core::{ModelInfo, ParameterSet, Role};

use crate::seed::with_rng;

/// Point counts given to one, two or three dispersed size parameters.
const SIZE_POINTS: [f64; 3] = [25., 10., 5.];

/// Randomly switches on dispersion for a few parameters, using the global generator.
///
/// Usually one size parameter gets 35 points, sometimes two or three get fewer points
/// each, and 1% of the time none does. Oriented models always disperse `theta`, and
/// occasionally `phi` and `psi`.
pub fn select_dispersions(info: &ModelInfo, pars: &mut ParameterSet) {
    with_rng(|rng| select_dispersions_with(info, pars, rng));
}

/// Like `select_dispersions`, drawing from `rng`.
pub fn select_dispersions_with(info: &ModelInfo, pars: &mut ParameterSet, rng: &mut StdRng) {
    let mut sizes = Vec::new();
    let mut oriented = false;

    for par in info.parameters().iter().filter(|p| p.polydisperse) {
        if par.role == Role::Orientation {
            oriented = true;
        } else if let Some(control) = &par.length_control {
            let n = (pars.number_or(control, 1.) + 0.5).floor().clamp(0., par.length as f64);
            sizes.extend((1..=n as usize).map(|k| format!("{}{k}", par.name)));
        } else {
            sizes.extend(par.scalar_names());
        }
    }

    let u: f64 = rng.random();
    let n = sizes.len();
    let chosen = if u < 0.01 || n < 1 {
        0
    } else if u < 0.86 || n < 2 {
        1
    } else if u < 0.99 || n < 3 {
        2
    } else {
        3
    };

    match chosen {
        0 => {}
        1 => {
            let k = rng.random_range(0..n);
            pars.set(format!("{}_pd_n", sizes[k]), 35.);
        }
        _ => {
            let picks = index::sample(rng, n, chosen);
            for (k, npts) in picks.iter().zip(SIZE_POINTS) {
                pars.set(format!("{}_pd_n", sizes[k]), npts);
            }
        }
    }

    if oriented {
        if info.has_parameter("theta") {
            pars.set("theta_pd_n", 20.);
        }
        // Both draws are made whatever the model declares, so the stream stays aligned.
        if rng.random::<f64>() < 0.1 && info.has_parameter("phi") {
            pars.set("phi_pd_n", 5.);
        }
        if rng.random::<f64>() < 0.1 && info.has_parameter("psi") {
            pars.set("psi_pd_n", 5.);
        }
    }

    debug!(model = info.id(), candidates = n, dispersed = chosen; "selected dispersions");
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use sas_core::{FnKernel, KernelPars, Limits, Parameter};

    use super::*;

    fn shells(oriented: bool) -> ModelInfo {
        let mut builder = ModelInfo::builder("shells", FnKernel(|_: f64, _: &KernelPars| 1.))
            .parameter(Parameter::new("n", "", 2., Limits::range(0., 3.), Role::Other))
            .parameter(
                Parameter::new("thickness", "Ang", 10., Limits::non_negative(), Role::Volume)
                    .vector(3, Some("n")),
            )
            .parameter(Parameter::new("radius", "Ang", 50., Limits::non_negative(), Role::Volume));
        if oriented {
            builder = builder
                .parameter(Parameter::new("theta", "deg", 0., Limits::unbounded(), Role::Orientation))
                .parameter(Parameter::new("phi", "deg", 0., Limits::unbounded(), Role::Orientation));
        }
        builder.build()
    }

    fn dispersed(pars: &ParameterSet) -> Vec<(String, f64)> {
        pars.iter()
            .filter(|(k, _)| k.ends_with("_pd_n"))
            .map(|(k, v)| (k.to_string(), v.as_number().unwrap()))
            .collect()
    }

    #[test]
    fn picks_among_active_slots_only() {
        let info = shells(false);
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..2_000 {
            let mut pars = ParameterSet::new();
            pars.set("n", 2.);
            select_dispersions_with(&info, &mut pars, &mut rng);

            let picked = dispersed(&pars);
            assert!(picked.len() <= 3);
            for (key, npts) in &picked {
                assert!(
                    ["thickness1_pd_n", "thickness2_pd_n", "radius_pd_n"].contains(&key.as_str()),
                    "{key}"
                );
                assert!([35., 25., 10., 5.].contains(npts));
            }
        }
    }

    #[test]
    fn multiple_picks_are_distinct() {
        let info = shells(false);
        let mut rng = StdRng::seed_from_u64(4);
        let mut saw_many = false;

        for _ in 0..2_000 {
            let mut pars = ParameterSet::new();
            pars.set("n", 3.);
            select_dispersions_with(&info, &mut pars, &mut rng);

            let picked = dispersed(&pars);
            if picked.len() > 1 {
                saw_many = true;
                let mut counts: Vec<f64> = picked.iter().map(|(_, n)| *n).collect();
                counts.sort_by(|a, b| b.total_cmp(a));
                assert_eq!(counts, &SIZE_POINTS[..counts.len()]);
            }
        }
        assert!(saw_many);
    }

    #[test]
    fn oriented_models_disperse_theta() {
        let info = shells(true);
        let mut rng = StdRng::seed_from_u64(5);

        let mut pars = ParameterSet::new();
        select_dispersions_with(&info, &mut pars, &mut rng);

        assert_eq!(pars.number("theta_pd_n"), Some(20.));
        assert!(pars.get("psi_pd_n").is_none());
    }

    #[test]
    fn declared_psi_is_sometimes_dispersed() {
        let info = models::load_model("parallelepiped").unwrap();
        let mut rng = StdRng::seed_from_u64(6);
        let mut psi = 0;

        for _ in 0..500 {
            let mut pars = ParameterSet::new();
            select_dispersions_with(&info, &mut pars, &mut rng);

            assert_eq!(pars.number("theta_pd_n"), Some(20.));
            if let Some(n) = pars.number("psi_pd_n") {
                assert_eq!(n, 5.);
                psi += 1;
            }
        }
        // Roughly one round in ten.
        assert!((10..150).contains(&psi), "{psi}");
    }

    #[test]
    fn nothing_to_disperse() {
        let info = ModelInfo::builder("flat", FnKernel(|_: f64, _: &KernelPars| 1.)).build();
        let mut pars = ParameterSet::new();

        select_dispersions(&info, &mut pars);
        assert!(pars.is_empty());
    }
}
