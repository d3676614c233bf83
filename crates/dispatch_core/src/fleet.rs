//! Ambulance component and its lifecycle state machine.
//!
//! Each ambulance cycles through
//! `Idle -> EnRouteToEmergency -> AtScene -> EnRouteToHospital -> Returning -> Idle`.
//! The state is a tagged variant carrying the assignment, and every edge has
//! exactly one transition method here. A transition method only fires from
//! its own source state; called from any other state it leaves the ambulance
//! untouched and returns `None`.

use std::fmt;

use bevy_ecs::prelude::Component;
use serde::{Deserialize, Serialize};

use crate::emergency::EmergencyId;
use crate::hospital::HospitalIndex;
use crate::network::LocationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AmbulanceId(pub u32);

impl fmt::Display for AmbulanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unit-{}", self.0)
    }
}

/// The case an ambulance is working and where the patient will be taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub emergency: EmergencyId,
    pub hospital: HospitalIndex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbulanceState {
    Idle,
    /// `estimated_arrival` is frozen at dispatch and used for reassignment.
    EnRouteToEmergency {
        assignment: Assignment,
        estimated_arrival: u64,
    },
    AtScene(Assignment),
    EnRouteToHospital(Assignment),
    Returning,
}

/// Payload-free view of [`AmbulanceState`], for snapshots and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmbulanceStateKind {
    Idle,
    EnRouteToEmergency,
    AtScene,
    EnRouteToHospital,
    Returning,
}

impl AmbulanceStateKind {
    pub fn label(self) -> &'static str {
        match self {
            AmbulanceStateKind::Idle => "Available",
            AmbulanceStateKind::EnRouteToEmergency => "Going to scene",
            AmbulanceStateKind::AtScene => "On scene",
            AmbulanceStateKind::EnRouteToHospital => "To hospital",
            AmbulanceStateKind::Returning => "Returning to base",
        }
    }
}

impl AmbulanceState {
    pub fn kind(&self) -> AmbulanceStateKind {
        match self {
            AmbulanceState::Idle => AmbulanceStateKind::Idle,
            AmbulanceState::EnRouteToEmergency { .. } => AmbulanceStateKind::EnRouteToEmergency,
            AmbulanceState::AtScene(_) => AmbulanceStateKind::AtScene,
            AmbulanceState::EnRouteToHospital(_) => AmbulanceStateKind::EnRouteToHospital,
            AmbulanceState::Returning => AmbulanceStateKind::Returning,
        }
    }

    pub fn assignment(&self) -> Option<Assignment> {
        match *self {
            AmbulanceState::EnRouteToEmergency { assignment, .. }
            | AmbulanceState::AtScene(assignment)
            | AmbulanceState::EnRouteToHospital(assignment) => Some(assignment),
            AmbulanceState::Idle | AmbulanceState::Returning => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Component)]
pub struct Ambulance {
    pub id: AmbulanceId,
    pub base_hospital: HospitalIndex,
    state: AmbulanceState,
    location: LocationId,
    /// Tick at which the current (non-idle) state ends.
    available_at: u64,
}

impl Ambulance {
    pub fn new(id: AmbulanceId, location: LocationId, base_hospital: HospitalIndex) -> Self {
        Self {
            id,
            base_hospital,
            state: AmbulanceState::Idle,
            location,
            available_at: 0,
        }
    }

    pub fn state(&self) -> AmbulanceState {
        self.state
    }

    pub fn location(&self) -> LocationId {
        self.location
    }

    pub fn is_idle(&self) -> bool {
        self.state == AmbulanceState::Idle
    }

    /// End of the current state; `None` while idle.
    pub fn available_at(&self) -> Option<u64> {
        (!self.is_idle()).then_some(self.available_at)
    }

    /// The current state has run its course at tick `now`.
    pub fn is_due(&self, now: u64) -> bool {
        !self.is_idle() && now >= self.available_at
    }

    pub fn estimated_arrival(&self) -> Option<u64> {
        match self.state {
            AmbulanceState::EnRouteToEmergency {
                estimated_arrival, ..
            } => Some(estimated_arrival),
            _ => None,
        }
    }

    pub fn assignment(&self) -> Option<Assignment> {
        self.state.assignment()
    }

    /// Idle -> EnRouteToEmergency, arriving at `arrival`.
    pub fn dispatch(&mut self, assignment: Assignment, arrival: u64) -> Option<()> {
        if !self.is_idle() {
            return None;
        }
        self.state = AmbulanceState::EnRouteToEmergency {
            assignment,
            estimated_arrival: arrival,
        };
        self.available_at = arrival;
        Some(())
    }

    /// EnRouteToEmergency -> AtScene, staying on scene until `ready_at`.
    pub fn arrive_at_scene(&mut self, scene: LocationId, ready_at: u64) -> Option<Assignment> {
        let AmbulanceState::EnRouteToEmergency { assignment, .. } = self.state else {
            return None;
        };
        self.location = scene;
        self.state = AmbulanceState::AtScene(assignment);
        self.available_at = ready_at;
        Some(assignment)
    }

    /// AtScene -> EnRouteToHospital, reaching the hospital at `arrival`.
    pub fn depart_scene(&mut self, arrival: u64) -> Option<Assignment> {
        let AmbulanceState::AtScene(assignment) = self.state else {
            return None;
        };
        self.state = AmbulanceState::EnRouteToHospital(assignment);
        self.available_at = arrival;
        Some(assignment)
    }

    /// EnRouteToHospital -> Returning, back at base by `back_at`.
    pub fn deliver_patient(&mut self, hospital: LocationId, back_at: u64) -> Option<Assignment> {
        let AmbulanceState::EnRouteToHospital(assignment) = self.state else {
            return None;
        };
        self.location = hospital;
        self.state = AmbulanceState::Returning;
        self.available_at = back_at;
        Some(assignment)
    }

    /// Returning -> Idle at the base hospital.
    pub fn return_to_base(&mut self, base: LocationId) -> Option<()> {
        if self.state != AmbulanceState::Returning {
            return None;
        }
        self.location = base;
        self.state = AmbulanceState::Idle;
        Some(())
    }

    /// EnRouteToEmergency -> Idle when a closer unit takes over the case.
    /// The ambulance stays where it was dispatched from.
    pub fn stand_down(&mut self) -> Option<Assignment> {
        let AmbulanceState::EnRouteToEmergency { assignment, .. } = self.state else {
            return None;
        };
        self.state = AmbulanceState::Idle;
        Some(assignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment() -> Assignment {
        Assignment {
            emergency: EmergencyId(1),
            hospital: HospitalIndex(0),
        }
    }

    fn unit() -> Ambulance {
        Ambulance::new(AmbulanceId(1), LocationId(0), HospitalIndex(0))
    }

    #[test]
    fn full_cycle_moves_through_every_state() {
        let mut ambulance = unit();
        assert_eq!(ambulance.available_at(), None);

        ambulance.dispatch(assignment(), 4).expect("dispatch");
        assert_eq!(ambulance.estimated_arrival(), Some(4));
        assert!(!ambulance.is_due(3));
        assert!(ambulance.is_due(4));

        ambulance.arrive_at_scene(LocationId(2), 9).expect("arrive");
        assert_eq!(ambulance.location(), LocationId(2));
        assert_eq!(ambulance.state().kind(), AmbulanceStateKind::AtScene);
        assert_eq!(ambulance.estimated_arrival(), None);

        ambulance.depart_scene(12).expect("depart");
        assert_eq!(ambulance.available_at(), Some(12));

        ambulance.deliver_patient(LocationId(3), 15).expect("deliver");
        assert_eq!(ambulance.location(), LocationId(3));
        assert_eq!(ambulance.assignment(), None);

        ambulance.return_to_base(LocationId(0)).expect("return");
        assert!(ambulance.is_idle());
        assert_eq!(ambulance.location(), LocationId(0));
    }

    #[test]
    fn transitions_from_the_wrong_state_are_ignored() {
        let mut ambulance = unit();
        assert!(ambulance.arrive_at_scene(LocationId(1), 3).is_none());
        assert!(ambulance.depart_scene(3).is_none());
        assert!(ambulance.deliver_patient(LocationId(1), 3).is_none());
        assert!(ambulance.return_to_base(LocationId(1)).is_none());
        assert!(ambulance.stand_down().is_none());
        assert!(ambulance.is_idle());

        ambulance.dispatch(assignment(), 2).expect("dispatch");
        assert!(ambulance.dispatch(assignment(), 5).is_none());
        assert_eq!(ambulance.available_at(), Some(2));
    }

    #[test]
    fn stand_down_keeps_position() {
        let mut ambulance = unit();
        ambulance.dispatch(assignment(), 10).expect("dispatch");
        assert_eq!(ambulance.stand_down(), Some(assignment()));
        assert!(ambulance.is_idle());
        assert_eq!(ambulance.location(), LocationId(0));
    }
}
