use crate::{error::Result, masked::Masked, pars::ParameterSet};

/// A model bound to a grid and an engine, evaluated for one parameter set at a time.
pub trait Calculator {
    /// The engine tag used in reports, e.g. `ACC32`.
    fn engine(&self) -> &str;

    /// Evaluates the model over the grid. Points excluded by the grid come back masked.
    ///
    /// # Arguments
    /// * `pars` - The full parameter set; it is never modified.
    ///
    /// # Returns
    /// The intensity at every grid point, or an error if the set does not fit the model
    /// or the backend cannot run.
    fn evaluate(&self, pars: &ParameterSet) -> Result<Masked>;
}
