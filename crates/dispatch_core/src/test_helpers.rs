//! Test helpers for common test setup and utilities.
//!
//! Shared fixtures for unit tests, integration tests and benchmarks.

use bevy_ecs::prelude::{Entity, World};

use crate::fleet::{Ambulance, AmbulanceId};
use crate::network::Minutes;
use crate::priority::FixedServiceTime;
use crate::scenario::{CityConfig, DispatchParams};
use crate::simulation::DispatchSimulation;

/// A straight road: stops `S0..=Sn` where leg `i` joins `Si` and `S(i+1)`.
/// No hospitals or ambulances; add them with the [`CityConfig`] builders.
pub fn corridor_city(legs: &[Minutes]) -> CityConfig {
    let mut city = CityConfig::new();
    for stop in 0..=legs.len() {
        city = city.with_location(format!("S{stop}"), stop as i32, 0);
    }
    for (i, minutes) in legs.iter().enumerate() {
        city = city.with_road(i, i + 1, *minutes);
    }
    city
}

/// Build a simulation whose base service time is always `service_minutes`.
///
/// # Panics
///
/// Panics if `city` is not a valid configuration.
pub fn fixed_service_simulation(
    city: CityConfig,
    params: DispatchParams,
    service_minutes: Minutes,
) -> DispatchSimulation {
    DispatchSimulation::new(city, params)
        .expect("test city should be valid")
        .with_service_time_source(Box::new(FixedServiceTime(service_minutes)))
}

/// The ten-location sample city with a seeded service-time source.
///
/// # Panics
///
/// Panics if the sample city fails validation (should never happen).
pub fn sample_simulation(seed: u64) -> DispatchSimulation {
    DispatchSimulation::new(CityConfig::sample(), DispatchParams::default().with_seed(seed))
        .expect("sample city should be valid")
}

/// Entity of the ambulance with the given id.
pub fn ambulance_entity(world: &mut World, id: u32) -> Option<Entity> {
    world
        .query::<(Entity, &Ambulance)>()
        .iter(world)
        .find(|(_, ambulance)| ambulance.id == AmbulanceId(id))
        .map(|(entity, _)| entity)
}
