use sas_core::{Kernel, KernelPars, Limits, ModelInfo, Parameter, Role};

use crate::special::{sph_j1c, sphere_volume};

/// Uniform sphere.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sphere;

impl Kernel for Sphere {
    fn iq(&self, q: f64, pars: &KernelPars) -> f64 {
        let radius = pars.get("radius");
        let contrast = pars.get("sld") - pars.get("sld_solvent");
        let volume = sphere_volume(radius);
        let amplitude = contrast * sph_j1c(q * radius);

        1e-4 * volume * amplitude * amplitude
    }
}

pub fn info() -> ModelInfo {
    ModelInfo::builder("sphere", Sphere)
        .title("Spheres with uniform scattering length density")
        .parameter(Parameter::new("sld", "1e-6/Ang^2", 1., Limits::unbounded(), Role::Sld))
        .parameter(Parameter::new(
            "sld_solvent",
            "1e-6/Ang^2",
            6.,
            Limits::unbounded(),
            Role::Sld,
        ))
        .parameter(
            Parameter::new("radius", "Ang", 50., Limits::non_negative(), Role::Volume)
                .describe("Sphere radius"),
        )
        .demo([
            ("scale", 1.),
            ("background", 0.),
            ("sld", 6.),
            ("sld_solvent", 1.),
            ("radius", 120.),
            ("radius_pd", 0.2),
            ("radius_pd_n", 45.),
        ])
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_scattering_is_volume_times_contrast() {
        let mut pars = KernelPars::new();
        pars.set("radius", 10.);
        pars.set("sld", 2.);
        pars.set("sld_solvent", 1.);

        let expected = 1e-4 * sphere_volume(10.);
        assert!((Sphere.iq(0., &pars) - expected).abs() < 1e-12 * expected);
        assert!(Sphere.iq(0.1, &pars) < expected);
    }
}
