use engines::time_calculation;
use log::warn;
use sas_core::{Calculator, EvalGrid, Masked, ParameterSet};

use crate::{
    error::Result,
    stats::{Summary, summarize},
};

/// One side of a comparison that ran.
#[derive(Debug, Clone, PartialEq)]
pub struct SideResult {
    pub engine: String,
    /// The output with non-finite values masked.
    pub value: Masked,
    /// Mean wall time per evaluation, in milliseconds.
    pub time_ms: f64,
    /// Non-finite outputs, described with their coordinates.
    pub invalid: Vec<String>,
}

impl SideResult {
    pub fn timing_line(&self) -> String {
        format!(
            "{} t={:.2} ms, intensity={:.0}",
            self.engine,
            self.time_ms,
            self.value.sum()
        )
    }
}

/// What one comparison round produced. A side is `None` when its backend was
/// unavailable or, for the comparison side, not requested.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub base: Option<SideResult>,
    pub comp: Option<SideResult>,
    pub resid: Option<Masked>,
    pub relerr: Option<Masked>,
}

impl RunResult {
    pub fn resid_summary(&self) -> Option<Summary> {
        self.resid.as_ref().map(summarize)
    }

    pub fn relerr_summary(&self) -> Option<Summary> {
        self.relerr.as_ref().map(summarize)
    }

    /// The report lines: per-side timings, then residual and relative error statistics.
    pub fn report(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for side in [&self.base, &self.comp].into_iter().flatten() {
            lines.push(side.timing_line());
            if !side.invalid.is_empty() {
                lines.push(format!("   ***  {}", side.invalid.join(", ")));
            }
        }

        if let (Some(base), Some(comp), Some(resid), Some(relerr)) =
            (&self.base, &self.comp, self.resid_summary(), self.relerr_summary())
        {
            let (b, c) = (&base.engine, &comp.engine);
            let pad = " ".repeat(3 + c.len());
            lines.push(resid.line(&format!("|{b}-{c}|{pad}")));
            lines.push(relerr.line(&format!("|({b}-{c})/{c}|")));
        }
        lines
    }
}

/// Runs whichever calculators are given and compares their outputs when both ran.
///
/// # Arguments
/// * `grid` - The grid both calculators were built on, used to describe bad points.
/// * `base` - The reference calculator, if it could be built.
/// * `comp` - The calculator under test, if any.
/// * `pars` - The `(base, comp)` parameter sets.
/// * `evals` - The `(base, comp)` evaluation counts.
///
/// # Errors
/// Any evaluation error except backend unavailability, which leaves that side `None`.
pub fn run_models(
    grid: &EvalGrid,
    base: Option<&dyn Calculator>,
    comp: Option<&dyn Calculator>,
    pars: (&ParameterSet, &ParameterSet),
    evals: (u32, u32),
) -> Result<RunResult> {
    let base = match base {
        Some(calc) => run_side(grid, calc, pars.0, evals.0)?,
        None => None,
    };
    let comp = match comp {
        Some(calc) => run_side(grid, calc, pars.1, evals.1)?,
        None => None,
    };

    let (resid, relerr) = match (&base, &comp) {
        (Some(b), Some(c)) => {
            let resid = b.value.zip_with(&c.value, |b, c| b - c)?;
            let relerr = b.value.zip_with(&c.value, relative_error)?;
            (Some(resid), Some(relerr))
        }
        _ => (None, None),
    };

    Ok(RunResult {
        base,
        comp,
        resid,
        relerr,
    })
}

/// `(base - comp) / |comp|`, dividing by 1 where `comp` is zero.
pub fn relative_error(base: f64, comp: f64) -> f64 {
    let scale = if comp != 0. { comp.abs() } else { 1. };
    (base - comp) / scale
}

fn run_side(
    grid: &EvalGrid,
    calc: &dyn Calculator,
    pars: &ParameterSet,
    evals: u32,
) -> Result<Option<SideResult>> {
    let (raw, time_ms) = match time_calculation(calc, pars, evals) {
        Ok(out) => out,
        Err(e) if e.is_unavailable() => {
            warn!(engine = calc.engine(); "skipping calculation: {e}");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let value = raw.masked_invalid();
    let invalid: Vec<String> = value
        .invalid_points()
        .into_iter()
        .map(|i| grid.describe_point(i, value.values()[i]))
        .collect();
    if !invalid.is_empty() {
        warn!(engine = calc.engine(), count = invalid.len(); "non-finite intensities: {}", invalid.join(", "));
    }

    Ok(Some(SideResult {
        engine: calc.engine().to_string(),
        value,
        time_ms,
        invalid,
    }))
}
