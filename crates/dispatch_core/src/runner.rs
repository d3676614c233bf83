//! Simulation runner: advances the clock and runs the per-tick schedule.
//!
//! Clock progression happens here, outside systems. Each tick increments
//! [SimulationClock], then runs the schedule: fleet transitions, one dispatch
//! attempt, and hospital discharge on interval ticks.

use bevy_ecs::prelude::{Schedule, World};
use bevy_ecs::schedule::{ExecutorKind, IntoSystemConfigs};

use crate::clock::SimulationClock;
use crate::systems::{
    discharge::{discharge_system, is_discharge_tick},
    fleet_update::fleet_update_system,
    queue_service::queue_service_system,
};

/// Builds the per-tick schedule. Systems run single-threaded in a fixed order.
pub fn tick_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (
            fleet_update_system,
            queue_service_system,
            discharge_system.run_if(is_discharge_tick),
        )
            .chain(),
    );
    schedule
}

/// Advances the clock by one tick and runs the schedule. Returns the new time.
pub fn run_tick(world: &mut World, schedule: &mut Schedule) -> u64 {
    let now = world.resource_mut::<SimulationClock>().tick();
    schedule.run(world);
    now
}

/// Runs `minutes` ticks.
pub fn advance_time(world: &mut World, schedule: &mut Schedule, minutes: u64) {
    for _ in 0..minutes {
        run_tick(world, schedule);
    }
}

/// Runs `minutes` ticks and invokes `hook` after each one.
pub fn advance_time_with_hook<F>(
    world: &mut World,
    schedule: &mut Schedule,
    minutes: u64,
    mut hook: F,
) where
    F: FnMut(&World, u64),
{
    for _ in 0..minutes {
        let now = run_tick(world, schedule);
        hook(world, now);
    }
}
