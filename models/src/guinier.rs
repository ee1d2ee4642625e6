use sas_core::{Kernel, KernelPars, Limits, ModelInfo, Parameter, Role};

/// Guinier approximation `exp(-rg^2 q^2 / 3)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Guinier;

impl Kernel for Guinier {
    fn iq(&self, q: f64, pars: &KernelPars) -> f64 {
        let rg = pars.get("rg");
        (-rg * rg * q * q / 3.).exp()
    }
}

pub fn info() -> ModelInfo {
    ModelInfo::builder("guinier", Guinier)
        .title("Guinier model")
        .parameter(
            Parameter::new("rg", "Ang", 60., Limits::unbounded(), Role::Volume)
                .describe("Radius of gyration"),
        )
        .demo([("scale", 1.), ("background", 0.001), ("rg", 60.)])
        .build()
}
