use std::time::Instant;

use log::debug;
use sas_core::{Calculator, Masked, ParameterSet, Result};

/// Evaluates `pars` `evals` times and reports the mean wall time.
///
/// With more than one evaluation, a monodisperse warm-up run comes first and is not
/// timed, so one-off setup costs stay out of the average.
///
/// # Returns
/// The result of the last evaluation and the mean time per evaluation in milliseconds.
pub fn time_calculation(
    calculator: &dyn Calculator,
    pars: &ParameterSet,
    evals: u32,
) -> Result<(Masked, f64)> {
    if evals > 1 {
        calculator.evaluate(&pars.suppress_pd(true))?;
    }

    let evals = evals.max(1);
    let start = Instant::now();
    let mut value = calculator.evaluate(pars)?;
    for _ in 1..evals {
        value = calculator.evaluate(pars)?;
    }
    let average_ms = start.elapsed().as_secs_f64() * 1e3 / evals as f64;

    debug!(engine = calculator.engine(), evals = evals, ms = average_ms; "timed calculation");
    Ok((value, average_ms))
}
