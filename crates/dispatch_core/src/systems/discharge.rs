use bevy_ecs::prelude::{Res, ResMut};
use tracing::info;

use crate::clock::SimulationClock;
use crate::hospital::HospitalRegistry;
use crate::scenario::DispatchParams;
use crate::telemetry::{ActivityKind, ActivityLog};

/// Condition: the current tick is a discharge tick.
pub fn is_discharge_tick(clock: Res<SimulationClock>, params: Res<DispatchParams>) -> bool {
    clock.is_multiple_of(params.discharge_interval)
}

/// Every occupied hospital discharges one patient.
pub fn discharge_system(
    clock: Res<SimulationClock>,
    mut hospitals: ResMut<HospitalRegistry>,
    mut log: ResMut<ActivityLog>,
) {
    let now = clock.now();
    for index in hospitals.discharge_one_each() {
        if let Some(hospital) = hospitals.get(index) {
            info!(hospital = %hospital.name, occupied = hospital.occupied(), "patient discharged");
        }
        log.push(now, ActivityKind::Discharged { hospital: index });
    }
}

#[cfg(test)]
mod tests {
    use bevy_ecs::prelude::{IntoSystemConfigs, Schedule, World};

    use super::*;
    use crate::hospital::{Hospital, HospitalIndex};
    use crate::network::LocationId;
    use crate::priority::Disease;

    #[test]
    fn discharges_only_on_interval_ticks() {
        let mut world = World::new();
        world.insert_resource(SimulationClock::default());
        world.insert_resource(DispatchParams::default().with_discharge_interval(3));
        world.insert_resource(ActivityLog::default());
        let mut registry = HospitalRegistry::new(vec![
            Hospital::new("A", LocationId(0), 4, Disease::General),
            Hospital::new("B", LocationId(0), 4, Disease::Trauma),
        ]);
        for _ in 0..2 {
            registry.reserve_bed(HospitalIndex(0));
        }
        world.insert_resource(registry);

        let mut schedule = Schedule::default();
        schedule.add_systems(discharge_system.run_if(is_discharge_tick));

        let mut occupied = Vec::new();
        for _ in 0..6 {
            world.resource_mut::<SimulationClock>().tick();
            schedule.run(&mut world);
            occupied.push(world.resource::<HospitalRegistry>().used_beds());
        }
        assert_eq!(occupied, vec![2, 2, 1, 1, 1, 0]);
        assert_eq!(world.resource::<ActivityLog>().len(), 2);
    }
}
