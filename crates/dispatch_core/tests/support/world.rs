use bevy_ecs::prelude::World;
use dispatch_core::network::Minutes;
use dispatch_core::priority::{FixedServiceTime, ServiceTimeModel};
use dispatch_core::scenario::{build_simulation, CityConfig, DispatchParams};
use dispatch_core::test_helpers::fixed_service_simulation;
use dispatch_core::DispatchSimulation;

/// Builder configuration for reproducible test cities.
#[derive(Clone, Debug)]
pub struct TestCityConfig {
    pub city: CityConfig,
    pub params: DispatchParams,
    pub service_minutes: Minutes,
}

/// Helper that turns a city plus overrides into a ready-to-run simulation or world.
#[derive(Debug)]
pub struct TestCityBuilder {
    config: TestCityConfig,
}

impl TestCityBuilder {
    /// Start from `city` with default parameters, seed 42 and a 3 minute base service time.
    pub fn new(city: CityConfig) -> Self {
        Self {
            config: TestCityConfig {
                city,
                params: DispatchParams::default().with_seed(42),
                service_minutes: 3,
            },
        }
    }

    /// Fix the base on-scene time (modifiers still apply).
    pub fn with_service_minutes(mut self, minutes: Minutes) -> Self {
        self.config.service_minutes = minutes;
        self
    }

    /// Override the dispatch parameters.
    pub fn with_params(mut self, params: DispatchParams) -> Self {
        self.config.params = params;
        self
    }

    /// Build the public simulation facade.
    pub fn build(self) -> DispatchSimulation {
        let TestCityConfig {
            city,
            params,
            service_minutes,
        } = self.config;
        fixed_service_simulation(city, params, service_minutes)
    }

    /// Build a bare world for tests that drive systems directly.
    pub fn build_world(self) -> World {
        let TestCityConfig {
            city,
            params,
            service_minutes,
        } = self.config;
        let (min, max) = (params.min_service_minutes, params.max_service_minutes);
        let mut world = World::new();
        build_simulation(&mut world, city, params).expect("test city should be valid");
        world.insert_resource(ServiceTimeModel::new(
            Box::new(FixedServiceTime(service_minutes)),
            min,
            max,
        ));
        world
    }
}
