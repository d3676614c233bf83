use bevy_ecs::prelude::World;
use tracing::info;

use crate::clock::SimulationClock;
use crate::emergency::{ActiveEmergencies, EmergencyIdGenerator};
use crate::error::ConfigError;
use crate::fleet::{Ambulance, AmbulanceId};
use crate::hospital::{Hospital, HospitalIndex, HospitalRegistry};
use crate::network::RoadNetwork;
use crate::priority::ServiceTimeModel;
use crate::queue::EmergencyQueue;
use crate::routing::RoutingEngine;
use crate::scenario::city::CityConfig;
use crate::scenario::params::DispatchParams;
use crate::telemetry::{ActivityLog, DispatchStats};

/// Validate `city` and `params`, then insert every resource and spawn the fleet.
///
/// Nothing is written to `world` unless the whole configuration is valid.
pub fn build_simulation(
    world: &mut World,
    city: CityConfig,
    params: DispatchParams,
) -> Result<(), ConfigError> {
    params.validate()?;

    let CityConfig {
        locations,
        roads,
        hospitals,
        ambulances,
    } = city;
    let network = RoadNetwork::new(
        locations,
        roads.iter().map(|road| (road.from, road.to, road.minutes)),
    )?;

    let mut registry = Vec::with_capacity(hospitals.len());
    for hospital in hospitals {
        let Some(location) = network.location_id(hospital.location) else {
            return Err(ConfigError::UnknownHospitalLocation {
                name: hospital.name,
                location: hospital.location,
            });
        };
        if hospital.capacity == 0 {
            return Err(ConfigError::ZeroBedCapacity {
                name: hospital.name,
            });
        }
        registry.push(Hospital::new(
            hospital.name,
            location,
            hospital.capacity,
            hospital.specialty,
        ));
    }

    let mut fleet = Vec::with_capacity(ambulances.len());
    for (index, ambulance) in ambulances.iter().enumerate() {
        let Some(location) = network.location_id(ambulance.location) else {
            return Err(ConfigError::UnknownAmbulanceLocation {
                index,
                location: ambulance.location,
            });
        };
        if ambulance.base_hospital >= registry.len() {
            return Err(ConfigError::UnknownBaseHospital {
                index,
                hospital: ambulance.base_hospital,
            });
        }
        let id = u32::try_from(index + 1).map_err(|_| {
            ConfigError::InvalidParams(format!("too many ambulances ({})", ambulances.len()))
        })?;
        fleet.push(Ambulance::new(
            AmbulanceId(id),
            location,
            HospitalIndex(ambulance.base_hospital),
        ));
    }

    info!(
        locations = network.location_count(),
        hospitals = registry.len(),
        ambulances = fleet.len(),
        "building dispatch simulation"
    );

    world.insert_resource(SimulationClock::default());
    world.insert_resource(RoutingEngine::with_cache_capacity(
        network,
        params.route_cache_capacity,
    ));
    world.insert_resource(ServiceTimeModel::seeded(
        params.seed,
        params.min_service_minutes,
        params.max_service_minutes,
    ));
    world.insert_resource(HospitalRegistry::new(registry));
    world.insert_resource(EmergencyQueue::with_capacity(params.queue_capacity));
    world.insert_resource(ActiveEmergencies::with_capacity(params.active_capacity));
    world.insert_resource(EmergencyIdGenerator::default());
    world.insert_resource(DispatchStats::default());
    world.insert_resource(ActivityLog::with_capacity(params.activity_log_capacity));
    world.insert_resource(params);
    world.spawn_batch(fleet);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::LocationId;
    use crate::priority::Disease;

    fn small_city() -> CityConfig {
        CityConfig::new()
            .with_location("A", 0, 0)
            .with_location("B", 1, 0)
            .with_road(0, 1, 3)
            .with_hospital("General", 0, 2, Disease::General)
            .with_ambulance(1, 0)
    }

    #[test]
    fn builds_resources_and_fleet() {
        let mut world = World::new();
        build_simulation(&mut world, small_city(), DispatchParams::default().with_seed(1))
            .expect("build");

        assert_eq!(world.resource::<SimulationClock>().now(), 0);
        assert_eq!(world.resource::<HospitalRegistry>().total_beds(), 2);
        assert_eq!(world.resource::<EmergencyQueue>().capacity(), 20);
        let ambulances: Vec<_> = world.query::<&Ambulance>().iter(&world).cloned().collect();
        assert_eq!(ambulances.len(), 1);
        assert_eq!(ambulances[0].id, AmbulanceId(1));
        assert_eq!(ambulances[0].location(), LocationId(1));
        assert_eq!(ambulances[0].base_hospital, HospitalIndex(0));
    }

    #[test]
    fn rejects_bad_references_without_touching_the_world() {
        let cases = [
            (
                small_city().with_hospital("Ghost", 9, 1, Disease::General),
                ConfigError::UnknownHospitalLocation {
                    name: "Ghost".into(),
                    location: 9,
                },
            ),
            (
                small_city().with_hospital("Empty", 1, 0, Disease::General),
                ConfigError::ZeroBedCapacity {
                    name: "Empty".into(),
                },
            ),
            (
                small_city().with_ambulance(5, 0),
                ConfigError::UnknownAmbulanceLocation {
                    index: 1,
                    location: 5,
                },
            ),
            (
                small_city().with_ambulance(0, 3),
                ConfigError::UnknownBaseHospital {
                    index: 1,
                    hospital: 3,
                },
            ),
            (small_city().with_road(1, 1, 2), ConfigError::SelfLoop(1)),
        ];
        for (city, expected) in cases {
            let mut world = World::new();
            assert_eq!(
                build_simulation(&mut world, city, DispatchParams::default()),
                Err(expected)
            );
            assert!(world.get_resource::<SimulationClock>().is_none());
        }
    }
}
