//! Call intake: validate a report, score it and put it on the pending queue.

use bevy_ecs::prelude::{Res, ResMut};
use bevy_ecs::system::SystemParam;
use tracing::info;

use crate::clock::SimulationClock;
use crate::emergency::{Emergency, EmergencyId, EmergencyIdGenerator, EmergencyReport};
use crate::error::DispatchError;
use crate::priority::{criticality_priority, priority, ServiceTimeModel};
use crate::queue::EmergencyQueue;
use crate::routing::RoutingEngine;
use crate::telemetry::{ActivityKind, ActivityLog};

#[derive(SystemParam)]
pub struct Intake<'w> {
    clock: Res<'w, SimulationClock>,
    routing: Res<'w, RoutingEngine>,
    ids: ResMut<'w, EmergencyIdGenerator>,
    service_time: ResMut<'w, ServiceTimeModel>,
    queue: ResMut<'w, EmergencyQueue>,
    log: ResMut<'w, ActivityLog>,
}

impl Intake<'_> {
    /// Queue a new emergency. The id, priority and on-scene service time are
    /// fixed here; a full queue or unknown location rejects the call without
    /// consuming an id.
    pub fn report(&mut self, report: EmergencyReport) -> Result<EmergencyId, DispatchError> {
        let network = self.routing.network();
        let Some(location) = network.location_id(report.location) else {
            return Err(DispatchError::InvalidLocationIndex {
                index: report.location,
                count: network.location_count(),
            });
        };
        if self.queue.is_full() {
            return Err(DispatchError::QueueFull {
                capacity: self.queue.capacity(),
            });
        }

        let now = self.clock.now();
        let priority = match report.criticality {
            Some(criticality) => criticality_priority(criticality, report.disease, report.age),
            None => priority(report.disease, report.age),
        };
        let id = self.ids.next_id();
        let emergency = Emergency {
            id,
            caller: report.caller,
            location,
            disease: report.disease,
            age: report.age,
            criticality: report.criticality,
            priority,
            assigned_ambulance: None,
            reassignable: true,
            reported_at: now,
            service_minutes: self.service_time.sample(report.disease, report.age),
            response_minutes: None,
        };
        self.queue.enqueue(emergency)?;

        info!(
            emergency = %id,
            location = %location,
            disease = %report.disease,
            priority,
            "emergency reported"
        );
        self.log.push(
            now,
            ActivityKind::Reported {
                emergency: id,
                location,
                priority,
            },
        );
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use bevy_ecs::prelude::World;
    use bevy_ecs::system::SystemState;

    use super::*;
    use crate::priority::{Criticality, Disease, FixedServiceTime};
    use crate::scenario::{build_simulation, CityConfig, DispatchParams};

    fn world(queue_capacity: usize) -> World {
        let mut world = World::new();
        let city = CityConfig::new()
            .with_location("A", 0, 0)
            .with_location("B", 1, 0)
            .with_road(0, 1, 2);
        build_simulation(
            &mut world,
            city,
            DispatchParams::default().with_queue_capacity(queue_capacity),
        )
        .expect("build");
        world.insert_resource(ServiceTimeModel::new(Box::new(FixedServiceTime(4)), 3, 8));
        world
    }

    fn report(world: &mut World, report: EmergencyReport) -> Result<EmergencyId, DispatchError> {
        let mut state = SystemState::<Intake>::new(world);
        let mut intake = state.get_mut(world);
        intake.report(report)
    }

    #[test]
    fn scores_and_queues_reports() {
        let mut world = world(5);
        let first = report(&mut world, EmergencyReport::new("Ana", 1, Disease::Cardiac, 65));
        let second = report(
            &mut world,
            EmergencyReport::new("Ben", 0, Disease::General, 30)
                .with_criticality(Criticality::Critical),
        );
        assert_eq!(first, Ok(EmergencyId(1)));
        assert_eq!(second, Ok(EmergencyId(2)));

        let queue = world.resource::<EmergencyQueue>();
        let top = queue.peek().expect("top");
        assert_eq!(top.id, EmergencyId(2));
        assert_eq!(top.priority, 82);
        let cardiac = queue.iter().find(|e| e.id == EmergencyId(1)).expect("cardiac");
        assert_eq!(cardiac.priority, 18);
        assert_eq!(cardiac.service_minutes, 5);
        assert_eq!(world.resource::<ActivityLog>().len(), 2);
    }

    #[test]
    fn rejects_unknown_location_and_full_queue() {
        let mut world = world(1);
        assert_eq!(
            report(&mut world, EmergencyReport::new("X", 7, Disease::Trauma, 20)),
            Err(DispatchError::InvalidLocationIndex { index: 7, count: 2 })
        );
        report(&mut world, EmergencyReport::new("Y", 0, Disease::Trauma, 20)).expect("queued");
        assert_eq!(
            report(&mut world, EmergencyReport::new("Z", 0, Disease::Trauma, 20)),
            Err(DispatchError::QueueFull { capacity: 1 })
        );
        // Rejected calls do not burn ids.
        assert_eq!(world.resource_mut::<EmergencyIdGenerator>().next_id(), EmergencyId(2));
    }
}
