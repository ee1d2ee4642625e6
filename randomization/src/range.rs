use sas_core::{Part, Result, SasErr};

const ANGLES: [&str; 3] = ["theta", "phi", "psi"];

/// Guesses a sampling interval for a parameter from its key and current value.
///
/// # Arguments
/// * `name` - The flattened parameter key.
/// * `value` - The current value, used when nothing in the name decides.
///
/// # Errors
/// `SasErr::CategoricalRange` for dispersion shape keys.
pub fn parameter_range(name: &str, value: f64) -> Result<(f64, f64)> {
    let (part, _) = Part::split(name);
    let range = match part {
        Part::PdN => (0., 100.),
        Part::PdNsigma => (0., 5.),
        Part::PdType => return Err(SasErr::CategoricalRange { name: name.into() }),
        _ if ANGLES.iter().any(|a| name.contains(a)) => {
            if part == Part::PdWidth {
                (0., 45.)
            } else {
                (-180., 180.)
            }
        }
        Part::PdWidth => (0., 1.),
        _ if name.contains("sld") => (-0.5, 10.),
        _ if name == "background" => (0., 10.),
        _ if name == "scale" => (0., 1e3),
        _ if value < 0. => (2. * value, -2. * value),
        _ if value > 0. => (0., 2. * value),
        _ => (0., 1.),
    };
    Ok(range)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispersion_keys_come_first() {
        for value in [-3., 0., 7.] {
            assert_eq!(parameter_range("foo_pd_n", value).unwrap(), (0., 100.));
            assert_eq!(parameter_range("theta_pd_n", value).unwrap(), (0., 100.));
            assert_eq!(parameter_range("sld_pd_nsigma", value).unwrap(), (0., 5.));
        }
    }

    #[test]
    fn shape_keys_have_no_range() {
        assert_eq!(
            parameter_range("radius_pd_type", 0.),
            Err(SasErr::CategoricalRange {
                name: "radius_pd_type".into()
            })
        );
    }

    #[test]
    fn angles_and_widths() {
        assert_eq!(parameter_range("theta_pd", 1.).unwrap(), (0., 45.));
        assert_eq!(parameter_range("theta", 1.).unwrap(), (-180., 180.));
        assert_eq!(parameter_range("mphi:sld", 1.).unwrap(), (-180., 180.));
        assert_eq!(parameter_range("radius_pd", 1.).unwrap(), (0., 1.));
    }

    #[test]
    fn names_then_values() {
        assert_eq!(parameter_range("sld_solvent", 1.).unwrap(), (-0.5, 10.));
        assert_eq!(parameter_range("background", 1.).unwrap(), (0., 10.));
        assert_eq!(parameter_range("scale", 1.).unwrap(), (0., 1000.));
        assert_eq!(parameter_range("anything", -5.).unwrap(), (-10., 10.));
        assert_eq!(parameter_range("anything", 5.).unwrap(), (0., 10.));
        assert_eq!(parameter_range("anything", 0.).unwrap(), (0., 1.));
    }
}
