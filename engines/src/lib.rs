mod direct;
mod factory;
mod legacy;
mod precision;
mod spec;
mod timing;
mod weights;

pub use direct::DirectModel;
pub use factory::{Capabilities, EngineFactory, build_engine};
pub use legacy::{LegacyCalculator, LegacyCatalog, LegacyName};
pub use precision::Precision;
pub use spec::{EngineSpec, PrecisionRequest};
pub use timing::time_calculation;
pub use weights::dispersion_points;
