use std::{f64::consts::PI, sync::OnceLock};

/// `sin(x) / x`, continuous at the origin.
pub fn sinx_x(x: f64) -> f64 {
    if x.abs() < 1e-8 { 1. } else { x.sin() / x }
}

/// `3 j1(x) / x`, the normalized sphere amplitude, continuous at the origin.
pub fn sph_j1c(x: f64) -> f64 {
    if x.abs() < 1e-2 {
        // Series to x^4; the closed form cancels badly here.
        let x2 = x * x;
        1. - x2 / 10. + x2 * x2 / 280.
    } else {
        let (s, c) = x.sin_cos();
        3. * (s - x * c) / (x * x * x)
    }
}

pub fn sphere_volume(r: f64) -> f64 {
    4. / 3. * PI * r * r * r
}

/// Nodes and weights of the 76-point Gauss-Legendre rule on `[-1, 1]`.
pub fn gauss76() -> &'static (Vec<f64>, Vec<f64>) {
    static RULE: OnceLock<(Vec<f64>, Vec<f64>)> = OnceLock::new();
    RULE.get_or_init(|| gauss_legendre(76))
}

/// Computes an `n`-point Gauss-Legendre rule by Newton iteration on `P_n`.
pub fn gauss_legendre(n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut nodes = vec![0.; n];
    let mut weights = vec![0.; n];

    for i in 0..n.div_ceil(2) {
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        for _ in 0..100 {
            let (p, dp) = legendre(n, x);
            let dx = p / dp;
            x -= dx;
            if dx.abs() < 1e-15 {
                break;
            }
        }

        let (_, dp) = legendre(n, x);
        let w = 2. / ((1. - x * x) * dp * dp);
        nodes[i] = -x;
        nodes[n - 1 - i] = x;
        weights[i] = w;
        weights[n - 1 - i] = w;
    }

    (nodes, weights)
}

/// `P_n(x)` and its derivative.
fn legendre(n: usize, x: f64) -> (f64, f64) {
    let (mut p0, mut p1) = (1., x);
    for k in 2..=n {
        let k = k as f64;
        let p2 = ((2. * k - 1.) * x * p1 - (k - 1.) * p0) / k;
        p0 = p1;
        p1 = p2;
    }
    let dp = n as f64 * (x * p1 - p0) / (x * x - 1.);
    (p1, dp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauss76_integrates_polynomials() {
        let (z, w) = gauss76();

        let total: f64 = w.iter().sum();
        let second: f64 = z.iter().zip(w).map(|(z, w)| w * z * z).sum();
        let odd: f64 = z.iter().zip(w).map(|(z, w)| w * z.powi(7)).sum();

        assert_eq!(z.len(), 76);
        assert!((total - 2.).abs() < 1e-12);
        assert!((second - 2. / 3.).abs() < 1e-12);
        assert!(odd.abs() < 1e-12);
    }

    #[test]
    fn amplitudes_are_continuous_at_zero() {
        assert_eq!(sinx_x(0.), 1.);
        assert!((sph_j1c(1e-2 - 1e-12) - sph_j1c(1e-2 + 1e-12)).abs() < 1e-9);
        assert!((sph_j1c(0.) - 1.).abs() < 1e-15);
    }
}
