//! Scenario setup: city configuration, tunables and world construction.

mod build;
mod city;
mod params;

pub use build::build_simulation;
pub use city::{AmbulanceConfig, CityConfig, HospitalConfig, RoadConfig};
pub use params::DispatchParams;
