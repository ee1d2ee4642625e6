use std::f64::consts::PI;

use rand::{Rng, rngs::StdRng};
use rand_distr::StandardNormal;
use sas_core::{Kernel, KernelPars, Limits, ModelInfo, ParValue, Parameter, Role};

use crate::special::{sinx_x, sph_j1c};

/// Micelle with a spherical core and Gaussian chains on its surface (Pedersen, 2000).
#[derive(Debug, Clone, Copy, Default)]
pub struct PolymerMicelle;

impl Kernel for PolymerMicelle {
    fn iq(&self, q: f64, pars: &KernelPars) -> f64 {
        let n = pars.get("n_aggreg");
        let rg = pars.get("rg");
        let radius_core = pars.get("radius_core");
        let solvent = pars.get("sld_solvent");
        let beta_core = pars.get("v_core") * (pars.get("sld_core") - solvent);
        let beta_corona = pars.get("v_corona") * (pars.get("sld_corona") - solvent);

        let bes_core = sph_j1c(q * radius_core);
        let qrg2 = (q * rg).powi(2);
        let (debye_chain, chain_ampl) = if qrg2 == 0. {
            (1., 1.)
        } else {
            (
                2. * ((-qrg2).exp() - 1. + qrg2) / (qrg2 * qrg2),
                -(-qrg2).exp_m1() / qrg2,
            )
        };
        let bes_corona = sinx_x(q * (radius_core + pars.get("d_penetration") * rg));

        let core = (n * beta_core * bes_core).powi(2);
        let chains = n * beta_corona * beta_corona * debye_chain;
        let cross = 2. * n * n * beta_core * beta_corona * bes_core * chain_ampl * bes_corona;
        let chain_chain = n * (n - 1.) * (beta_corona * chain_ampl * bes_corona).powi(2);

        pars.get("ndensity") * 1e-13 * (core + chains + cross + chain_chain)
    }
}

/// Draws a micelle whose volumes are consistent with its radii.
pub fn random(rng: &mut StdRng) -> Vec<(String, ParValue)> {
    let radius_core = 10f64.powf(rng.random_range(1.0..3.0));
    let rg = radius_core * 10f64.powf(rng.random_range(-2.0..-0.3));
    let normal: f64 = rng.sample(StandardNormal);
    let d_penetration = normal * 0.05 + 1.;
    let n_aggreg = rng.random_range(3..30) as f64;
    // Head groups fill the core with a packing fraction of 0.68.
    let v_core = 4. * PI / 3. * radius_core.powi(3) / n_aggreg * 0.68;
    let tail_segments = rng.random_range(6..30) as f64;
    let v_corona = PI * rg.powi(3) * (6. / tail_segments).sqrt();
    let volume = 4. * PI / 3. * (radius_core + rg).powi(3);

    [
        ("background", 0.),
        ("scale", 1e7 / volume),
        ("ndensity", 8.94),
        ("v_core", v_core),
        ("v_corona", v_corona),
        ("radius_core", radius_core),
        ("rg", rg),
        ("d_penetration", d_penetration),
        ("n_aggreg", n_aggreg),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), ParValue::Number(v)))
    .collect()
}

pub fn info() -> ModelInfo {
    let plain = |name: &str, units: &str, default: f64, limits: Limits, description: &str| {
        Parameter::new(name, units, default, limits, Role::Other).describe(description)
    };
    let sld = |name: &str, default: f64, description: &str| {
        Parameter::new(name, "1e-6/Ang^2", default, Limits::non_negative(), Role::Sld)
            .describe(description)
    };

    ModelInfo::builder("polymer_micelle", PolymerMicelle)
        .title("Polymer micelle model")
        .parameter(plain("ndensity", "1e15/cm^3", 8.94, Limits::non_negative(), "Number density of micelles"))
        .parameter(plain("v_core", "Ang^3", 62624., Limits::non_negative(), "Core volume"))
        .parameter(plain("v_corona", "Ang^3", 61940., Limits::non_negative(), "Corona volume"))
        .parameter(sld("sld_solvent", 6.4, "Solvent scattering length density"))
        .parameter(sld("sld_core", 0.34, "Core scattering length density"))
        .parameter(sld("sld_corona", 0.8, "Corona scattering length density"))
        .parameter(plain("radius_core", "Ang", 45., Limits::non_negative(), "Radius of core"))
        .parameter(plain("rg", "Ang", 20., Limits::non_negative(), "Radius of gyration of chains in corona"))
        .parameter(plain("d_penetration", "", 1., Limits::unbounded(), "Factor to mimic non-penetration of Gaussian chains"))
        .parameter(plain("n_aggreg", "", 6., Limits::unbounded(), "Aggregation number of the micelle"))
        .random(random)
        .double_only()
        .build()
}
