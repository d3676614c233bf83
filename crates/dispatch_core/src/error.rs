//! Error types for the dispatch core.
//!
//! [`DispatchError`] covers everything that can go wrong while the simulation
//! is running; all of it is recoverable and surfaced to the caller. Malformed
//! city or parameter configuration is reported through [`ConfigError`] when a
//! simulation is built, and is the only class treated as fatal.

use crate::emergency::EmergencyId;
use crate::network::LocationId;

/// Recoverable errors raised by reporting and dispatch operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// A report named a location outside the road network.
    #[error("location index {index} is out of range (network has {count} locations)")]
    InvalidLocationIndex { index: usize, count: usize },

    /// The pending queue is at capacity.
    #[error("pending emergency queue is full ({capacity} entries)")]
    QueueFull { capacity: usize },

    /// The active emergency roster is at capacity; the case stays pending.
    #[error("active emergency roster is full ({capacity} entries)")]
    ActiveSetFull { capacity: usize },

    /// Every hospital was at capacity; the case was returned to the queue.
    #[error("no hospital has a free bed for emergency {0}, case re-queued")]
    NoHospitalAvailable(EmergencyId),

    /// `dequeue` was called on an empty queue.
    #[error("cannot dequeue from an empty emergency queue")]
    EmptyQueue,

    /// The ambulance handed to dispatch does not exist or is not idle.
    #[error("ambulance is not available for dispatch")]
    AmbulanceUnavailable,

    /// No road path connects the ambulance to the scene.
    #[error("no route from {from} to {to}")]
    Unreachable { from: LocationId, to: LocationId },
}

/// Startup-time configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("city has no locations")]
    NoLocations,

    #[error("road {from} <-> {to} references an unknown location")]
    UnknownRoadEndpoint { from: usize, to: usize },

    #[error("road {from} <-> {to} must have a positive cost")]
    NonPositiveRoadCost { from: usize, to: usize },

    #[error("road at location {0} loops back onto itself")]
    SelfLoop(usize),

    #[error("hospital '{name}' references unknown location {location}")]
    UnknownHospitalLocation { name: String, location: usize },

    #[error("hospital '{name}' has no beds")]
    ZeroBedCapacity { name: String },

    #[error("ambulance {index} starts at unknown location {location}")]
    UnknownAmbulanceLocation { index: usize, location: usize },

    #[error("ambulance {index} references unknown base hospital {hospital}")]
    UnknownBaseHospital { index: usize, hospital: usize },

    #[error("invalid dispatch parameters: {0}")]
    InvalidParams(String),
}
