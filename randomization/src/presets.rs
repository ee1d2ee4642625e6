use sas_core::{MagneticPart, ModelInfo, ParValue, ParameterSet, Result, Role, format::general};

/// Builds the starting parameter set of a model: every declared value at its default,
/// plus dispersion keys for polydisperse parameters and magnetic keys for slds, all
/// switched off.
///
/// # Arguments
/// * `info` - The model.
/// * `use_demo` - Whether to overlay the model's demo values.
pub fn get_pars(info: &ModelInfo, use_demo: bool) -> ParameterSet {
    let mut pars = ParameterSet::new();

    for par in info.parameters() {
        for name in par.scalar_names() {
            pars.set(name.clone(), par.default);
            if par.polydisperse {
                pars.set(format!("{name}_pd"), 0.);
                pars.set(format!("{name}_pd_n"), 0.);
                pars.set(format!("{name}_pd_nsigma"), 3.);
                pars.set(format!("{name}_pd_type"), "gaussian");
            }
            if par.role == Role::Sld {
                for part in MagneticPart::ALL {
                    pars.set(format!("{}{name}", part.prefix()), 0.);
                }
            }
        }
    }

    if use_demo {
        pars.extend(info.demo().iter().cloned());
    }
    pars
}

/// Formats the parameters for display, one per line, e.g.
/// `radius: 50 +/- 7.5  (35 points in [-3,3] sigma gaussian)`.
///
/// Orientation parameters are only listed for 2-D grids, and vector parameters only up
/// to the slot count set by their control parameter.
pub fn parlist(info: &ModelInfo, pars: &ParameterSet, is2d: bool) -> Result<String> {
    let records = pars.records(info)?;
    let mut lines = Vec::new();

    for par in info.parameters() {
        if par.role == Role::Orientation && !is2d {
            continue;
        }

        let active = match &par.length_control {
            Some(control) => {
                let n = pars.number(control).unwrap_or(par.length as f64);
                (n + 0.5).floor().clamp(0., par.length as f64) as usize
            }
            None => par.length,
        };

        for name in par.scalar_names().into_iter().take(active) {
            let Some(record) = records.iter().find(|r| r.name == name) else {
                continue;
            };

            let mut line = format!("{name}: {}", general(record.value));
            if let Some(pd) = record.dispersion.as_ref().filter(|d| d.is_active()) {
                let width = if record.relative_pd {
                    pd.width * record.value
                } else {
                    pd.width
                };
                let nsigma = general(pd.nsigma);
                line.push_str(&format!(
                    " +/- {}  ({} points in [-{nsigma},{nsigma}] sigma {})",
                    general(width),
                    pd.npts,
                    pd.shape
                ));
            }
            if let Some(m) = record.magnetism.as_ref().filter(|m| m.is_active()) {
                line.push_str(&format!(
                    "  M0:{:.3}  mphi:{:.1}  mtheta:{:.1}",
                    m.m0, m.mphi, m.mtheta
                ));
            }
            lines.push(line);
        }
    }

    Ok(lines.join("\n"))
}

/// Copies into `target` the values of `source` for every key both sets share.
pub fn share_values(source: &ParameterSet, target: &mut ParameterSet) {
    let shared: Vec<(String, ParValue)> = source
        .iter()
        .filter(|(k, _)| target.contains_key(k))
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    target.extend(shared);
}

#[cfg(test)]
mod tests {
    use sas_core::{FnKernel, KernelPars, Limits, Parameter};

    use super::*;

    fn model() -> ModelInfo {
        ModelInfo::builder("demo", FnKernel(|_: f64, _: &KernelPars| 1.))
            .parameter(Parameter::new("sld", "", 1., Limits::unbounded(), Role::Sld))
            .parameter(Parameter::new("radius", "Ang", 50., Limits::non_negative(), Role::Volume))
            .parameter(Parameter::new("n", "", 1., Limits::range(0., 2.), Role::Other))
            .parameter(
                Parameter::new("thickness", "Ang", 10., Limits::non_negative(), Role::Volume)
                    .vector(2, Some("n")),
            )
            .parameter(Parameter::new("theta", "deg", 60., Limits::unbounded(), Role::Orientation))
            .demo([("radius", 20.)])
            .build()
    }

    #[test]
    fn defaults_cover_every_key() {
        let info = model();
        let pars = get_pars(&info, false);

        assert_eq!(pars.number("radius"), Some(50.));
        assert_eq!(pars.number("radius_pd_n"), Some(0.));
        assert_eq!(pars.get("thickness2_pd_type"), Some(&ParValue::Text("gaussian".into())));
        assert_eq!(pars.number("theta_pd_nsigma"), Some(3.));
        assert!(pars.get("sld_pd").is_none());
        assert!(pars.get("n_pd_n").is_none());
        assert_eq!(pars.number("mtheta:sld"), Some(0.));
        assert!(pars.get("M0:radius").is_none());
        assert!(pars.validate(&info).is_ok());
    }

    #[test]
    fn demo_overrides_defaults() {
        let pars = get_pars(&model(), true);
        assert_eq!(pars.number("radius"), Some(20.));
    }

    #[test]
    fn parlist_formats_dispersion_and_magnetism() {
        let info = model();
        let mut pars = get_pars(&info, false);
        pars.set("radius_pd", 0.15);
        pars.set("radius_pd_n", 35.);
        pars.set("M0:sld", 2.5);

        let text = parlist(&info, &pars, false).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines,
            [
                "scale: 1",
                "background: 0.001",
                "sld: 1  M0:2.500  mphi:0.0  mtheta:0.0",
                "radius: 50 +/- 7.5  (35 points in [-3,3] sigma gaussian)",
                "n: 1",
                "thickness1: 10",
            ]
        );
    }

    #[test]
    fn parlist_shows_orientation_in_2d() {
        let info = model();
        let pars = get_pars(&info, false);

        assert!(parlist(&info, &pars, true).unwrap().contains("theta: 60"));
    }

    #[test]
    fn shared_values_only() {
        let mut source = ParameterSet::new();
        source.set("radius", 7.);
        source.set("length", 9.);
        let mut target = ParameterSet::new();
        target.set("radius", 1.);

        share_values(&source, &mut target);
        assert_eq!(target.number("radius"), Some(7.));
        assert!(!target.contains_key("length"));
    }
}
