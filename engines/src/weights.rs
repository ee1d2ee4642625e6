use sas_core::DispersionShape;

/// Quadrature points and weights of a dispersion around `center`.
///
/// # Arguments
/// * `shape` - The distribution shape.
/// * `center` - The nominal value.
/// * `sigma` - The absolute width.
/// * `npts` - The number of points.
/// * `nsigma` - How many widths the points span on each side.
/// * `limits` - The parameter's valid range; points outside are dropped.
///
/// # Returns
/// The `(value, weight)` pairs, never empty: a degenerate distribution collapses to
/// `(center, 1)`.
pub fn dispersion_points(
    shape: DispersionShape,
    center: f64,
    sigma: f64,
    npts: usize,
    nsigma: f64,
    limits: (f64, f64),
) -> Vec<(f64, f64)> {
    if npts <= 1 || sigma <= 0. {
        return vec![(center, 1.)];
    }

    let half_width = match shape {
        DispersionShape::Rectangle => 3f64.sqrt() * sigma,
        DispersionShape::Uniform => sigma,
        _ => nsigma * sigma,
    };

    let step = 2. * half_width / (npts - 1) as f64;
    let (low, high) = limits;
    let points: Vec<(f64, f64)> = (0..npts)
        .map(|k| center - half_width + k as f64 * step)
        .filter(|x| (low..=high).contains(x))
        .map(|x| (x, weight(shape, center, sigma, x)))
        .filter(|(_, w)| w.is_finite() && *w > 0.)
        .collect();

    if points.is_empty() {
        vec![(center, 1.)]
    } else {
        points
    }
}

fn weight(shape: DispersionShape, center: f64, sigma: f64, x: f64) -> f64 {
    match shape {
        DispersionShape::Gaussian => {
            let z = (x - center) / sigma;
            (-0.5 * z * z).exp()
        }
        DispersionShape::Rectangle | DispersionShape::Uniform => 1.,
        DispersionShape::Lognormal => {
            if x <= 0. || center <= 0. {
                return 0.;
            }
            let s = sigma / center;
            let z = (x.ln() - center.ln()) / s;
            (-0.5 * z * z).exp() / x
        }
        DispersionShape::Schulz => {
            if x <= 0. || center <= 0. {
                return 0.;
            }
            let z = (center / sigma).powi(2) - 1.;
            let r = x / center;
            // Relative to the peak at `x = center` to keep the power finite.
            (z * r.ln() - (z + 1.) * (r - 1.)).exp()
        }
    }
}
