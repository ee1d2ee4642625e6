use sas_core::{Kernel, KernelPars, Limits, ModelInfo, Parameter, Role};

use crate::special::{sph_j1c, sphere_volume};

/// Maximum number of shells.
pub const MAX_SHELLS: usize = 4;

/// Sphere with a core and up to `MAX_SHELLS` concentric shells; `n` selects how many
/// shells are present.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreMultiShell;

impl Kernel for CoreMultiShell {
    fn iq(&self, q: f64, pars: &KernelPars) -> f64 {
        let shells = (pars.get("n") + 0.5).floor().clamp(0., MAX_SHELLS as f64) as usize;
        let solvent = pars.get("sld_solvent");

        let mut r = pars.get("radius");
        let mut inner_sld = pars.get("sld_core");
        let mut f = 0.;
        for k in 1..=shells {
            let sld = pars.get(&format!("sld{k}"));
            f += sphere_volume(r) * sph_j1c(q * r) * (inner_sld - sld);
            inner_sld = sld;
            r += pars.get(&format!("thickness{k}"));
        }
        f += sphere_volume(r) * sph_j1c(q * r) * (inner_sld - solvent);

        let volume = sphere_volume(r);
        if volume == 0. {
            return 0.;
        }
        1e-4 * f * f / volume
    }
}

pub fn info() -> ModelInfo {
    ModelInfo::builder("core_multi_shell", CoreMultiShell)
        .title("Spherical core with up to 4 concentric shells")
        .parameter(Parameter::new("sld_core", "1e-6/Ang^2", 1., Limits::unbounded(), Role::Sld))
        .parameter(Parameter::new("radius", "Ang", 200., Limits::non_negative(), Role::Volume))
        .parameter(Parameter::new(
            "sld_solvent",
            "1e-6/Ang^2",
            6.4,
            Limits::unbounded(),
            Role::Sld,
        ))
        .parameter(
            Parameter::new("n", "", 1., Limits::range(0., MAX_SHELLS as f64), Role::Other)
                .describe("Number of shells"),
        )
        .parameter(
            Parameter::new("sld", "1e-6/Ang^2", 1.7, Limits::unbounded(), Role::Sld)
                .vector(MAX_SHELLS, Some("n")),
        )
        .parameter(
            Parameter::new("thickness", "Ang", 40., Limits::non_negative(), Role::Volume)
                .vector(MAX_SHELLS, Some("n")),
        )
        .demo([
            ("sld_core", 6.4),
            ("radius", 60.),
            ("sld_solvent", 6.4),
            ("n", 2.),
            ("sld1", 1.),
            ("thickness1", 10.),
            ("sld2", 2.),
            ("thickness2", 20.),
        ])
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sphere::Sphere;

    #[test]
    fn without_shells_is_a_sphere() {
        let mut pars = KernelPars::new();
        pars.set("n", 0.);
        pars.set("radius", 40.);
        pars.set("sld_core", 3.);
        pars.set("sld_solvent", 1.);

        let mut sphere = KernelPars::new();
        sphere.set("radius", 40.);
        sphere.set("sld", 3.);
        sphere.set("sld_solvent", 1.);

        for q in [0., 0.01, 0.1] {
            let expected = Sphere.iq(q, &sphere);
            assert!((CoreMultiShell.iq(q, &pars) - expected).abs() <= 1e-9 * expected.abs());
        }
    }

    #[test]
    fn shell_slots_expand() {
        let info = info();
        let thickness = info.parameter("thickness").unwrap();

        assert_eq!(thickness.length_control.as_deref(), Some("n"));
        assert_eq!(thickness.scalar_names().len(), MAX_SHELLS);
    }
}
