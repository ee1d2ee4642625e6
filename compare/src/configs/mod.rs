mod adapter;
mod compare;

pub use adapter::{Adapter, Plan, Preset};
pub use compare::{CapabilitiesConfig, CompareConfig, GridConfig, Paired, SeedConfig, View};
