use std::collections::BTreeMap;

/// Scalar parameter values handed to a kernel for a single evaluation point of the
/// dispersion mesh. Vector parameters appear under their expanded names (`sld1`, `sld2`...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KernelPars {
    values: BTreeMap<String, f64>,
}

impl KernelPars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    /// Returns the value of `name`, or `0.0` when the kernel asks for something
    /// the descriptor did not declare.
    pub fn get(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or_default()
    }

    /// Overwrites the value of a name already present; unknown names are ignored.
    pub fn replace(&mut self, name: &str, value: f64) {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
        }
    }

    pub fn try_get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Applies `f` to every value, e.g. to round inputs to an engine's precision.
    pub fn map_values<F>(&self, f: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        let values = self.values.iter().map(|(k, v)| (k.clone(), f(*v))).collect();
        Self { values }
    }
}

/// The mathematical form of a model, evaluated at one coordinate for one set of
/// scalar parameter values. Scale and background are applied by the engine.
pub trait Kernel: Send + Sync {
    /// The 1-D intensity at `|q| = q`.
    fn iq(&self, q: f64, pars: &KernelPars) -> f64;

    /// The 2-D intensity at `(qx, qy)`; orientation-free models use the magnitude.
    fn iqxy(&self, qx: f64, qy: f64, pars: &KernelPars) -> f64 {
        self.iq(qx.hypot(qy), pars)
    }
}

/// Adapts a plain function into a `Kernel`.
pub struct FnKernel<F>(pub F);

impl<F> Kernel for FnKernel<F>
where
    F: Fn(f64, &KernelPars) -> f64 + Send + Sync,
{
    fn iq(&self, q: f64, pars: &KernelPars) -> f64 {
        (self.0)(q, pars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_values_read_as_zero() {
        let mut pars = KernelPars::new();
        pars.set("radius", 50.);

        assert_eq!(pars.get("radius"), 50.);
        assert_eq!(pars.get("length"), 0.);
        assert!(pars.try_get("length").is_none());
    }

    #[test]
    fn replace_only_touches_known_values() {
        let mut pars = KernelPars::new();
        pars.set("radius", 50.);
        pars.replace("radius", 20.);
        pars.replace("length", 1.);

        assert_eq!(pars.try_get("radius"), Some(20.));
        assert!(pars.try_get("length").is_none());
        assert_eq!(pars.map_values(|v| v / 2.).get("radius"), 10.);
    }

    #[test]
    fn fn_kernel_uses_magnitude_in_2d() {
        let kernel = FnKernel(|q: f64, _: &KernelPars| q);
        let pars = KernelPars::new();

        assert!((kernel.iqxy(3., 4., &pars) - 5.).abs() < 1e-12);
    }
}
