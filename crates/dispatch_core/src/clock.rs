use bevy_ecs::prelude::Resource;

/// Simulated time in whole-minute ticks. Only the runner advances it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Resource)]
pub struct SimulationClock {
    now: u64,
}

impl SimulationClock {
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Advance one tick and return the new time.
    pub fn tick(&mut self) -> u64 {
        self.now += 1;
        self.now
    }

    /// `now` falls on a multiple of `interval` (never for tick 0 or a zero interval).
    pub fn is_multiple_of(&self, interval: u64) -> bool {
        interval > 0 && self.now > 0 && self.now % interval == 0
    }
}
