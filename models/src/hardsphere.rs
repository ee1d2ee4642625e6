use sas_core::{Kernel, KernelPars, Limits, ModelInfo, Parameter, Role};

/// Percus-Yevick hard sphere structure factor.
#[derive(Debug, Clone, Copy, Default)]
pub struct HardSphere;

impl Kernel for HardSphere {
    fn iq(&self, q: f64, pars: &KernelPars) -> f64 {
        let radius = pars.get("radius_effective");
        let phi = pars.get("volfraction");
        percus_yevick(q, radius, phi)
    }
}

pub fn percus_yevick(q: f64, radius: f64, phi: f64) -> f64 {
    let denom = (1. - phi).powi(4);
    let x = 2. * q * radius;
    if x.abs() < 5e-2 {
        return denom / (1. + 2. * phi).powi(2);
    }

    let alpha = (1. + 2. * phi).powi(2) / denom;
    let beta = -6. * phi * (1. + 0.5 * phi).powi(2) / denom;
    let gamma = 0.5 * phi * alpha;

    let (s, c) = x.sin_cos();
    let x2 = x * x;
    let g = alpha * (s - x * c) / x2
        + beta * (2. * x * s + (2. - x2) * c - 2.) / (x2 * x)
        + gamma * (-x2 * x2 * c + 4. * ((3. * x2 - 6.) * c + (x2 * x - 6. * x) * s + 6.))
            / (x2 * x2 * x);

    1. / (1. + 24. * phi * g / x)
}

pub fn info() -> ModelInfo {
    ModelInfo::builder("hardsphere", HardSphere)
        .title("Hard sphere structure factor, with Percus-Yevick closure")
        .parameter(
            Parameter::new("radius_effective", "Ang", 50., Limits::non_negative(), Role::Other)
                .describe("Effective radius of hard sphere"),
        )
        .parameter(
            Parameter::new("volfraction", "", 0.2, Limits::range(0., 0.74), Role::Other)
                .describe("Volume fraction of hard spheres"),
        )
        .demo([("radius_effective", 50.), ("volfraction", 0.2)])
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dilute_limit_is_one() {
        assert!((percus_yevick(0.1, 50., 0.) - 1.).abs() < 1e-12);
    }

    #[test]
    fn compressibility_limit() {
        let expected = 0.8f64.powi(4) / 1.4f64.powi(2);
        assert!((percus_yevick(0., 50., 0.2) - expected).abs() < 1e-12);
        // Close to the limit the closed form must agree with it.
        assert!((percus_yevick(6e-4, 50., 0.2) - expected).abs() < 1e-2);
    }

    #[test]
    fn approaches_one_at_high_q() {
        assert!((percus_yevick(10., 50., 0.2) - 1.).abs() < 1e-2);
    }
}
