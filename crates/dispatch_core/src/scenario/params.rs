use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::network::Minutes;
use crate::priority::{MAX_SERVICE_MINUTES, MIN_SERVICE_MINUTES};
use crate::routing::DEFAULT_ROUTE_CACHE_CAPACITY;
use crate::telemetry::DEFAULT_ACTIVITY_LOG_CAPACITY;

/// Default bound on pending and on active emergencies.
const DEFAULT_EMERGENCY_CAPACITY: usize = 20;
/// A closer unit must beat the incumbent's ETA by at least this many minutes.
const DEFAULT_REASSIGN_THRESHOLD: Minutes = 5;
/// Every hospital discharges one patient on ticks that are multiples of this.
const DEFAULT_DISCHARGE_INTERVAL: u64 = 15;

/// Tunables for one dispatch simulation. Inserted into the world as a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct DispatchParams {
    pub queue_capacity: usize,
    pub active_capacity: usize,
    pub min_service_minutes: Minutes,
    pub max_service_minutes: Minutes,
    pub reassign_threshold: Minutes,
    pub discharge_interval: u64,
    pub route_cache_capacity: usize,
    pub activity_log_capacity: usize,
    /// Seed for service-time draws; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for DispatchParams {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_EMERGENCY_CAPACITY,
            active_capacity: DEFAULT_EMERGENCY_CAPACITY,
            min_service_minutes: MIN_SERVICE_MINUTES,
            max_service_minutes: MAX_SERVICE_MINUTES,
            reassign_threshold: DEFAULT_REASSIGN_THRESHOLD,
            discharge_interval: DEFAULT_DISCHARGE_INTERVAL,
            route_cache_capacity: DEFAULT_ROUTE_CACHE_CAPACITY,
            activity_log_capacity: DEFAULT_ACTIVITY_LOG_CAPACITY,
            seed: None,
        }
    }
}

impl DispatchParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_active_capacity(mut self, capacity: usize) -> Self {
        self.active_capacity = capacity;
        self
    }

    pub fn with_service_range(mut self, min: Minutes, max: Minutes) -> Self {
        self.min_service_minutes = min;
        self.max_service_minutes = max;
        self
    }

    pub fn with_reassign_threshold(mut self, minutes: Minutes) -> Self {
        self.reassign_threshold = minutes;
        self
    }

    pub fn with_discharge_interval(mut self, ticks: u64) -> Self {
        self.discharge_interval = ticks;
        self
    }

    pub fn with_route_cache_capacity(mut self, entries: usize) -> Self {
        self.route_cache_capacity = entries;
        self
    }

    pub fn with_activity_log_capacity(mut self, entries: usize) -> Self {
        self.activity_log_capacity = entries;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidParams("queue capacity must be positive".into()));
        }
        if self.active_capacity == 0 {
            return Err(ConfigError::InvalidParams("active capacity must be positive".into()));
        }
        if self.min_service_minutes > self.max_service_minutes {
            return Err(ConfigError::InvalidParams(format!(
                "service range {}..={} is empty",
                self.min_service_minutes, self.max_service_minutes
            )));
        }
        if self.discharge_interval == 0 {
            return Err(ConfigError::InvalidParams(
                "discharge interval must be positive".into(),
            ));
        }
        Ok(())
    }
}
