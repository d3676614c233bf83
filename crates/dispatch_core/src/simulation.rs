//! [`DispatchSimulation`]: the public face of the engine.
//!
//! Owns the ECS world and the tick schedule. Callers report emergencies,
//! advance time and read snapshots; nothing else touches the world.

use bevy_ecs::prelude::{Schedule, World};
use bevy_ecs::system::SystemState;

use crate::clock::SimulationClock;
use crate::emergency::{EmergencyId, EmergencyReport};
use crate::error::{ConfigError, DispatchError};
use crate::intake::Intake;
use crate::network::{Location, LocationId, Minutes};
use crate::priority::{Disease, ServiceTimeModel, ServiceTimeSource};
use crate::routing::RoutingEngine;
use crate::runner::{advance_time, advance_time_with_hook, tick_schedule};
use crate::scenario::{build_simulation, CityConfig, DispatchParams};
use crate::telemetry::{
    active_snapshot, fleet_snapshot, hospital_snapshot, pending_snapshot, statistics,
    ActivityEntry, ActivityLog, AmbulanceSnapshot, EmergencySnapshot, HospitalSnapshot,
    SimStatistics,
};

pub struct DispatchSimulation {
    world: World,
    schedule: Schedule,
}

impl DispatchSimulation {
    pub fn new(city: CityConfig, params: DispatchParams) -> Result<Self, ConfigError> {
        let mut world = World::new();
        build_simulation(&mut world, city, params)?;
        Ok(Self {
            world,
            schedule: tick_schedule(),
        })
    }

    /// Replace the random source for on-scene service times. The configured
    /// range is kept.
    pub fn with_service_time_source(mut self, source: Box<dyn ServiceTimeSource>) -> Self {
        let (min, max) = self.world.resource::<ServiceTimeModel>().range();
        self.world
            .insert_resource(ServiceTimeModel::new(source, min, max));
        self
    }

    pub fn report_emergency(
        &mut self,
        caller: impl Into<String>,
        location_index: usize,
        disease: Disease,
        age: u32,
    ) -> Result<EmergencyId, DispatchError> {
        self.report(EmergencyReport::new(caller, location_index, disease, age))
    }

    pub fn report(&mut self, report: EmergencyReport) -> Result<EmergencyId, DispatchError> {
        let mut state = SystemState::<Intake>::new(&mut self.world);
        let mut intake = state.get_mut(&mut self.world);
        intake.report(report)
    }

    pub fn advance_time(&mut self, minutes: u64) {
        advance_time(&mut self.world, &mut self.schedule, minutes);
    }

    /// Like [`Self::advance_time`], calling `hook` with the world after every tick.
    pub fn advance_time_with_hook<F>(&mut self, minutes: u64, hook: F)
    where
        F: FnMut(&World, u64),
    {
        advance_time_with_hook(&mut self.world, &mut self.schedule, minutes, hook);
    }

    pub fn now(&self) -> u64 {
        self.world.resource::<SimulationClock>().now()
    }

    pub fn fleet_snapshot(&self) -> Vec<AmbulanceSnapshot> {
        fleet_snapshot(&self.world)
    }

    pub fn active_emergencies(&self) -> Vec<EmergencySnapshot> {
        active_snapshot(&self.world)
    }

    /// Pending cases in heap order.
    pub fn pending_queue(&self) -> Vec<EmergencySnapshot> {
        pending_snapshot(&self.world)
    }

    pub fn hospital_occupancy(&self) -> Vec<HospitalSnapshot> {
        hospital_snapshot(&self.world)
    }

    pub fn statistics(&self) -> SimStatistics {
        statistics(&self.world)
    }

    /// Recent activity, newest first.
    pub fn activity_log(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.world.resource::<ActivityLog>().iter()
    }

    pub fn locations(&self) -> &[Location] {
        self.routing().network().locations()
    }

    /// Each road once, as `(from, to, minutes)`.
    pub fn roads(&self) -> Vec<(LocationId, LocationId, Minutes)> {
        self.routing().network().roads().collect()
    }

    /// Shortest route between two location indices, with its cost.
    pub fn route(&self, from: usize, to: usize) -> Option<(Vec<LocationId>, Minutes)> {
        let network = self.routing().network();
        let (from, to) = (network.location_id(from)?, network.location_id(to)?);
        self.routing().shortest_path(from, to)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    fn routing(&self) -> &RoutingEngine {
        self.world.resource::<RoutingEngine>()
    }
}

impl std::fmt::Debug for DispatchSimulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchSimulation")
            .field("now", &self.now())
            .finish_non_exhaustive()
    }
}
