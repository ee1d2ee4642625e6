use sas_core::{Kernel, KernelPars, Limits, ModelInfo, Parameter, Role};

use crate::special::{gauss76, sinx_x};

/// Rectangular parallelepiped with sides `length_a`, `length_b` and `length_c`.
///
/// The 1-D form is the orientation average computed with a 76-point Gauss-Legendre
/// rule in each of the two angles; the 2-D form projects q onto the rotated axes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parallelepiped;

impl Parallelepiped {
    fn contrast_volume(pars: &KernelPars) -> (f64, f64, f64, f64) {
        let a = pars.get("length_a");
        let b = pars.get("length_b");
        let c = pars.get("length_c");
        let drho = pars.get("sld") - pars.get("sld_solvent");
        (a, b, c, drho * a * b * c)
    }
}

impl Kernel for Parallelepiped {
    fn iq(&self, q: f64, pars: &KernelPars) -> f64 {
        let (a, b, c, form) = Self::contrast_volume(pars);
        if b == 0. {
            return 0.;
        }

        let (z, w) = gauss76();
        let mu = 0.5 * q * b;
        let a_scaled = a / b;
        let c_scaled = c / b;

        let mut outer = 0.;
        for (zi, wi) in z.iter().zip(w) {
            let sigma = 0.5 * (zi + 1.);
            let mu_proj = mu * (1. - sigma * sigma).sqrt();

            let mut inner = 0.;
            for (zj, wj) in z.iter().zip(w) {
                let u = 0.5 * (zj + 1.);
                let (sin_u, cos_u) = (0.5 * std::f64::consts::PI * u).sin_cos();
                let si = sinx_x(mu_proj * sin_u * a_scaled) * sinx_x(mu_proj * cos_u);
                inner += wj * si * si;
            }

            let si = sinx_x(mu * c_scaled * sigma);
            outer += wi * 0.5 * inner * si * si;
        }

        let volume = a * b * c;
        if volume == 0. {
            return 0.;
        }
        1e-4 * form * form * 0.5 * outer / volume
    }

    fn iqxy(&self, qx: f64, qy: f64, pars: &KernelPars) -> f64 {
        let (a, b, c, form) = Self::contrast_volume(pars);
        let volume = a * b * c;
        if volume == 0. {
            return 0.;
        }

        let q = qx.hypot(qy);
        let (xhat, yhat, zhat) = project(qx, qy, pars);
        let si = sinx_x(0.5 * a * q * xhat) * sinx_x(0.5 * b * q * yhat) * sinx_x(0.5 * c * q * zhat);
        let amplitude = form * si;

        1e-4 * amplitude * amplitude / volume
    }
}

/// Direction cosines of q against the particle's a, b and c axes.
fn project(qx: f64, qy: f64, pars: &KernelPars) -> (f64, f64, f64) {
    let q = qx.hypot(qy);
    if q == 0. {
        return (0., 0., 0.);
    }
    let (ux, uy) = (qx / q, qy / q);

    let (st, ct) = pars.get("theta").to_radians().sin_cos();
    let (sp, cp) = pars.get("phi").to_radians().sin_cos();
    let (ss, cs) = pars.get("psi").to_radians().sin_cos();

    let c_axis = [st * cp, st * sp, ct];
    let a0 = [ct * cp, ct * sp, -st];
    let b0 = [-sp, cp, 0.];
    let a_axis: [f64; 3] = std::array::from_fn(|k| cs * a0[k] + ss * b0[k]);
    let b_axis: [f64; 3] = std::array::from_fn(|k| cs * b0[k] - ss * a0[k]);

    let dot = |v: [f64; 3]| v[0] * ux + v[1] * uy;
    (dot(a_axis), dot(b_axis), dot(c_axis))
}

pub fn info() -> ModelInfo {
    let side = |name: &str, default: f64, description: &str| {
        Parameter::new(name, "Ang", default, Limits::non_negative(), Role::Volume)
            .describe(description)
    };
    let angle = |name: &str, description: &str| {
        Parameter::new(name, "degrees", 60., Limits::range(-360., 360.), Role::Orientation)
            .describe(description)
    };

    ModelInfo::builder("parallelepiped", Parallelepiped)
        .title("Rectangular parallelepiped with uniform scattering length density")
        .parameter(Parameter::new("sld", "1e-6/Ang^2", 4., Limits::unbounded(), Role::Sld))
        .parameter(Parameter::new(
            "sld_solvent",
            "1e-6/Ang^2",
            1.,
            Limits::unbounded(),
            Role::Sld,
        ))
        .parameter(side("length_a", 35., "Shorter side of the parallelepiped"))
        .parameter(side("length_b", 75., "Second side of the parallelepiped"))
        .parameter(side("length_c", 400., "Larger side of the parallelepiped"))
        .parameter(angle("theta", "c axis to beam angle"))
        .parameter(angle("phi", "rotation about beam"))
        .parameter(angle("psi", "rotation about c axis"))
        .demo([
            ("scale", 1.),
            ("background", 0.),
            ("sld", 6.3),
            ("sld_solvent", 1.),
            ("length_a", 35.),
            ("length_b", 75.),
            ("length_c", 400.),
            ("theta", 45.),
            ("phi", 30.),
            ("psi", 15.),
            ("length_a_pd", 0.1),
            ("length_a_pd_n", 10.),
            ("length_b_pd", 0.1),
            ("length_b_pd_n", 1.),
            ("length_c_pd", 0.1),
            ("length_c_pd_n", 1.),
            ("theta_pd", 10.),
            ("theta_pd_n", 1.),
            ("phi_pd", 10.),
            ("phi_pd_n", 1.),
            ("psi_pd", 10.),
            ("psi_pd_n", 10.),
        ])
        .non_magnetic()
        .build()
}
