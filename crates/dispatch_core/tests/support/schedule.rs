use bevy_ecs::prelude::World;
use bevy_ecs::schedule::Schedule;
use dispatch_core::runner::{advance_time, run_tick, tick_schedule};

/// Helper that owns a reusable `Schedule` so tests can step a bare world tick by tick.
pub struct TickRunner {
    schedule: Schedule,
}

impl Default for TickRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TickRunner {
    /// Create a runner with the default tick schedule.
    pub fn new() -> Self {
        Self {
            schedule: tick_schedule(),
        }
    }

    /// Run a single tick, returning the new time.
    pub fn run_one(&mut self, world: &mut World) -> u64 {
        run_tick(world, &mut self.schedule)
    }

    /// Run `ticks` ticks.
    pub fn run(&mut self, world: &mut World, ticks: u64) {
        advance_time(world, &mut self.schedule, ticks);
    }

    /// Tick until `done` holds or `max_ticks` pass. Returns the tick it first held at.
    pub fn run_until<F>(&mut self, world: &mut World, max_ticks: u64, mut done: F) -> Option<u64>
    where
        F: FnMut(&World) -> bool,
    {
        for _ in 0..max_ticks {
            let now = self.run_one(world);
            if done(world) {
                return Some(now);
            }
        }
        None
    }
}
