pub mod discharge;
pub mod fleet_update;
pub mod queue_service;
