use dispatch_core::fleet::{AmbulanceId, AmbulanceStateKind};
use dispatch_core::hospital::HospitalIndex;
use dispatch_core::telemetry::{AmbulanceSnapshot, HospitalSnapshot};
use dispatch_core::DispatchSimulation;

/// Snapshot of one ambulance by id.
pub fn ambulance(sim: &DispatchSimulation, id: u32) -> AmbulanceSnapshot {
    sim.fleet_snapshot()
        .into_iter()
        .find(|snapshot| snapshot.id == AmbulanceId(id))
        .expect("ambulance should exist")
}

/// Current state of one ambulance.
pub fn state_of(sim: &DispatchSimulation, id: u32) -> AmbulanceStateKind {
    ambulance(sim, id).state
}

/// Occupancy of one hospital.
pub fn hospital(sim: &DispatchSimulation, index: usize) -> HospitalSnapshot {
    sim.hospital_occupancy()
        .into_iter()
        .find(|snapshot| snapshot.index == HospitalIndex(index))
        .expect("hospital should exist")
}

/// Step one tick at a time until `id` reaches `state`, returning that tick.
pub fn tick_until_state(
    sim: &mut DispatchSimulation,
    id: u32,
    state: AmbulanceStateKind,
    max_ticks: u64,
) -> Option<u64> {
    for _ in 0..max_ticks {
        sim.advance_time(1);
        if state_of(sim, id) == state {
            return Some(sim.now());
        }
    }
    None
}
