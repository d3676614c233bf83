//! Telemetry / KPIs: dispatch counters, the activity log and read-only
//! snapshots of world state.

use std::collections::VecDeque;
use std::fmt;

use bevy_ecs::prelude::{Resource, World};
use serde::Serialize;

use crate::clock::SimulationClock;
use crate::emergency::{ActiveEmergencies, Emergency, EmergencyId};
use crate::fleet::{Ambulance, AmbulanceId, AmbulanceStateKind};
use crate::hospital::{HospitalIndex, HospitalRegistry};
use crate::network::{LocationId, Minutes};
use crate::priority::{Criticality, Disease, Priority};
use crate::queue::EmergencyQueue;

/// Default number of activity entries retained.
pub const DEFAULT_ACTIVITY_LOG_CAPACITY: usize = 50;

/// Running totals, reset only when a simulation is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Resource)]
pub struct DispatchStats {
    /// Patients delivered to a hospital.
    pub handled: u64,
    /// Sum of dispatch travel minutes over every assignment still counted.
    pub total_response_minutes: u64,
    pub dispatches: u64,
    pub reassignments: u64,
}

impl DispatchStats {
    pub fn record_dispatch(&mut self, travel: Minutes) {
        self.dispatches += 1;
        self.total_response_minutes += u64::from(travel);
    }

    pub fn record_delivery(&mut self) {
        self.handled += 1;
    }

    pub fn record_reassignment(&mut self) {
        self.reassignments += 1;
    }

    /// Cumulative response minutes per handled patient.
    pub fn average_response_minutes(&self) -> Option<f64> {
        (self.handled > 0).then(|| self.total_response_minutes as f64 / self.handled as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivityKind {
    Reported {
        emergency: EmergencyId,
        location: LocationId,
        priority: Priority,
    },
    Dispatched {
        emergency: EmergencyId,
        ambulance: AmbulanceId,
        hospital: HospitalIndex,
        eta_minutes: Minutes,
    },
    Requeued {
        emergency: EmergencyId,
    },
    ArrivedAtScene {
        emergency: EmergencyId,
        ambulance: AmbulanceId,
    },
    Transporting {
        emergency: EmergencyId,
        ambulance: AmbulanceId,
        hospital: HospitalIndex,
    },
    Delivered {
        emergency: EmergencyId,
        ambulance: AmbulanceId,
        hospital: HospitalIndex,
    },
    BackAtBase {
        ambulance: AmbulanceId,
    },
    Reassigned {
        emergency: EmergencyId,
        from: AmbulanceId,
        to: AmbulanceId,
        minutes_saved: u64,
    },
    Discharged {
        hospital: HospitalIndex,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityEntry {
    pub at: u64,
    #[serde(flatten)]
    pub kind: ActivityKind,
}

impl fmt::Display for ActivityEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[t={:>4}] ", self.at)?;
        match &self.kind {
            ActivityKind::Reported {
                emergency,
                location,
                priority,
            } => write!(f, "emergency {emergency} reported at {location} (priority {priority})"),
            ActivityKind::Dispatched {
                emergency,
                ambulance,
                hospital,
                eta_minutes,
            } => write!(
                f,
                "{ambulance} dispatched to {emergency}, ETA {eta_minutes} min, destination {hospital}"
            ),
            ActivityKind::Requeued { emergency } => {
                write!(f, "no hospital capacity, emergency {emergency} re-queued")
            }
            ActivityKind::ArrivedAtScene {
                emergency,
                ambulance,
            } => write!(f, "{ambulance} arrived at scene of {emergency}"),
            ActivityKind::Transporting {
                emergency,
                ambulance,
                hospital,
            } => write!(f, "{ambulance} transporting {emergency} to {hospital}"),
            ActivityKind::Delivered {
                emergency,
                ambulance,
                hospital,
            } => write!(f, "{ambulance} delivered {emergency} to {hospital}"),
            ActivityKind::BackAtBase { ambulance } => write!(f, "{ambulance} back at base"),
            ActivityKind::Reassigned {
                emergency,
                from,
                to,
                minutes_saved,
            } => write!(
                f,
                "emergency {emergency} reassigned from {from} to {to}, saving {minutes_saved} min"
            ),
            ActivityKind::Discharged { hospital } => write!(f, "{hospital} discharged a patient"),
        }
    }
}

/// Bounded log of recent activity, newest first.
#[derive(Debug, Clone, Resource)]
pub struct ActivityLog {
    entries: VecDeque<ActivityEntry>,
    capacity: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_ACTIVITY_LOG_CAPACITY)
    }
}

impl ActivityLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, at: u64, kind: ActivityKind) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front(ActivityEntry { at, kind });
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Snapshot of one ambulance for display/export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmbulanceSnapshot {
    pub id: AmbulanceId,
    pub state: AmbulanceStateKind,
    pub location: LocationId,
    pub available_at: Option<u64>,
    pub emergency: Option<EmergencyId>,
    pub hospital: Option<HospitalIndex>,
    pub estimated_arrival: Option<u64>,
}

/// Snapshot of one pending or active emergency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmergencySnapshot {
    pub id: EmergencyId,
    pub caller: String,
    pub location: LocationId,
    pub disease: Disease,
    pub age: u32,
    pub criticality: Option<Criticality>,
    pub priority: Priority,
    pub assigned_ambulance: Option<AmbulanceId>,
    pub reassignable: bool,
    pub reported_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HospitalSnapshot {
    pub index: HospitalIndex,
    pub name: String,
    pub location: LocationId,
    pub specialty: Disease,
    pub capacity: u32,
    pub occupied: u32,
}

/// Aggregated counts at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimStatistics {
    pub now: u64,
    pub handled: u64,
    pub average_response_minutes: Option<f64>,
    pub dispatches: u64,
    pub reassignments: u64,
    pub total_ambulances: usize,
    pub idle_ambulances: usize,
    pub pending: usize,
    pub active: usize,
    pub total_beds: u32,
    pub used_beds: u32,
}

/// Every ambulance, ordered by id.
pub fn fleet_snapshot(world: &World) -> Vec<AmbulanceSnapshot> {
    let mut fleet: Vec<_> = world
        .iter_entities()
        .filter_map(|entity| entity.get::<Ambulance>())
        .map(|ambulance| {
            let assignment = ambulance.assignment();
            AmbulanceSnapshot {
                id: ambulance.id,
                state: ambulance.state().kind(),
                location: ambulance.location(),
                available_at: ambulance.available_at(),
                emergency: assignment.map(|a| a.emergency),
                hospital: assignment.map(|a| a.hospital),
                estimated_arrival: ambulance.estimated_arrival(),
            }
        })
        .collect();
    fleet.sort_by_key(|snapshot| snapshot.id);
    fleet
}

fn emergency_snapshot(world: &World, emergency: &Emergency) -> EmergencySnapshot {
    EmergencySnapshot {
        id: emergency.id,
        caller: emergency.caller.clone(),
        location: emergency.location,
        disease: emergency.disease,
        age: emergency.age,
        criticality: emergency.criticality,
        priority: emergency.priority,
        assigned_ambulance: emergency
            .assigned_ambulance
            .and_then(|entity| world.get::<Ambulance>(entity))
            .map(|ambulance| ambulance.id),
        reassignable: emergency.reassignable,
        reported_at: emergency.reported_at,
    }
}

/// Dispatched cases in dispatch order.
pub fn active_snapshot(world: &World) -> Vec<EmergencySnapshot> {
    world
        .get_resource::<ActiveEmergencies>()
        .map(|active| active.iter().map(|e| emergency_snapshot(world, e)).collect())
        .unwrap_or_default()
}

/// Pending cases in heap order.
pub fn pending_snapshot(world: &World) -> Vec<EmergencySnapshot> {
    world
        .get_resource::<EmergencyQueue>()
        .map(|queue| queue.iter().map(|e| emergency_snapshot(world, e)).collect())
        .unwrap_or_default()
}

pub fn hospital_snapshot(world: &World) -> Vec<HospitalSnapshot> {
    world
        .get_resource::<HospitalRegistry>()
        .map(|registry| {
            registry
                .iter()
                .map(|(index, hospital)| HospitalSnapshot {
                    index,
                    name: hospital.name.clone(),
                    location: hospital.location,
                    specialty: hospital.specialty,
                    capacity: hospital.capacity(),
                    occupied: hospital.occupied(),
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn statistics(world: &World) -> SimStatistics {
    let stats = world
        .get_resource::<DispatchStats>()
        .copied()
        .unwrap_or_default();
    let (total_ambulances, idle_ambulances) = world
        .iter_entities()
        .filter_map(|entity| entity.get::<Ambulance>())
        .fold((0, 0), |(total, idle), ambulance| {
            (total + 1, idle + usize::from(ambulance.is_idle()))
        });
    let (total_beds, used_beds) = world
        .get_resource::<HospitalRegistry>()
        .map(|registry| (registry.total_beds(), registry.used_beds()))
        .unwrap_or_default();

    SimStatistics {
        now: world
            .get_resource::<SimulationClock>()
            .map(SimulationClock::now)
            .unwrap_or_default(),
        handled: stats.handled,
        average_response_minutes: stats.average_response_minutes(),
        dispatches: stats.dispatches,
        reassignments: stats.reassignments,
        total_ambulances,
        idle_ambulances,
        pending: world.get_resource::<EmergencyQueue>().map_or(0, EmergencyQueue::len),
        active: world
            .get_resource::<ActiveEmergencies>()
            .map_or(0, ActiveEmergencies::len),
        total_beds,
        used_beds,
    }
}
