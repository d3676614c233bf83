//! Dispatch engine: pairs pending emergencies with idle ambulances and
//! hospitals, drives the ambulance lifecycle each tick and reassigns cases
//! when a closer unit frees up.
//!
//! Everything here runs through [`Dispatcher`], a system parameter bundling
//! the resources and the ambulance query the engine mutates. Systems in
//! [`crate::systems`] are thin wrappers over it.

use bevy_ecs::prelude::{Entity, Query, Res, ResMut};
use bevy_ecs::system::SystemParam;
use tracing::{debug, info, warn};

use crate::clock::SimulationClock;
use crate::emergency::{ActiveEmergencies, Emergency, EmergencyId};
use crate::error::DispatchError;
use crate::fleet::{Ambulance, AmbulanceId, AmbulanceState, Assignment};
use crate::hospital::{select_best_hospital, HospitalIndex, HospitalRegistry};
use crate::network::{LocationId, Minutes};
use crate::queue::EmergencyQueue;
use crate::routing::RoutingEngine;
use crate::scenario::DispatchParams;
use crate::telemetry::{ActivityKind, ActivityLog, DispatchStats};

/// A successful dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub emergency: EmergencyId,
    pub ambulance: AmbulanceId,
    pub hospital: HospitalIndex,
    /// Minutes from the ambulance's position to the scene.
    pub travel: Minutes,
}

/// A case handed from a distant unit to a closer idle one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reassignment {
    pub emergency: EmergencyId,
    pub from: AmbulanceId,
    pub to: AmbulanceId,
    pub minutes_saved: u64,
}

#[derive(SystemParam)]
pub struct Dispatcher<'w, 's> {
    clock: Res<'w, SimulationClock>,
    params: Res<'w, DispatchParams>,
    routing: Res<'w, RoutingEngine>,
    hospitals: ResMut<'w, HospitalRegistry>,
    queue: ResMut<'w, EmergencyQueue>,
    active: ResMut<'w, ActiveEmergencies>,
    stats: ResMut<'w, DispatchStats>,
    log: ResMut<'w, ActivityLog>,
    ambulances: Query<'w, 's, (Entity, &'static mut Ambulance)>,
}

impl Dispatcher<'_, '_> {
    /// Idle ambulance with the shortest route to `location`, and that route's
    /// length. Ties go to the lowest ambulance id; unreachable units are skipped.
    pub fn nearest_idle_ambulance(&self, location: LocationId) -> Option<(Entity, Minutes)> {
        self.ambulances
            .iter()
            .filter(|(_, ambulance)| ambulance.is_idle())
            .filter_map(|(entity, ambulance)| {
                self.routing
                    .shortest_distance(ambulance.location(), location)
                    .map(|distance| (distance, ambulance.id, entity))
            })
            .min_by_key(|(distance, id, _)| (*distance, *id))
            .map(|(distance, _, entity)| (entity, distance))
    }

    /// Send `entity` to `emergency`.
    ///
    /// Every precondition is checked before anything changes. On failure the
    /// emergency goes back on the pending queue with its id unchanged.
    pub fn attempt_dispatch(
        &mut self,
        entity: Entity,
        mut emergency: Emergency,
    ) -> Result<DispatchOutcome, DispatchError> {
        let now = self.clock.now();
        emergency.assigned_ambulance = None;
        emergency.reassignable = true;
        emergency.response_minutes = None;

        let Some(hospital) = select_best_hospital(
            &self.hospitals,
            &self.routing,
            emergency.location,
            emergency.disease,
        ) else {
            let id = emergency.id;
            warn!(emergency = %id, "no hospital has a free bed, re-queueing");
            self.log.push(now, ActivityKind::Requeued { emergency: id });
            self.requeue(emergency);
            return Err(DispatchError::NoHospitalAvailable(id));
        };

        let source = self
            .ambulances
            .get(entity)
            .ok()
            .filter(|(_, ambulance)| ambulance.is_idle())
            .map(|(_, ambulance)| (ambulance.id, ambulance.location()));
        let Some((ambulance_id, from)) = source else {
            self.requeue(emergency);
            return Err(DispatchError::AmbulanceUnavailable);
        };
        let Some(travel) = self.routing.shortest_distance(from, emergency.location) else {
            let to = emergency.location;
            self.requeue(emergency);
            return Err(DispatchError::Unreachable { from, to });
        };
        if self.active.is_full() {
            let capacity = self.active.capacity();
            self.requeue(emergency);
            return Err(DispatchError::ActiveSetFull { capacity });
        }

        let id = emergency.id;
        if let Ok((_, mut ambulance)) = self.ambulances.get_mut(entity) {
            ambulance.dispatch(
                Assignment {
                    emergency: id,
                    hospital,
                },
                now + u64::from(travel),
            );
        }
        emergency.assigned_ambulance = Some(entity);
        emergency.response_minutes = Some(travel);
        self.active.insert(emergency)?;
        self.hospitals.reserve_bed(hospital);
        self.stats.record_dispatch(travel);

        info!(
            emergency = %id,
            ambulance = %ambulance_id,
            hospital = %hospital,
            eta = travel,
            "ambulance dispatched"
        );
        self.log.push(
            now,
            ActivityKind::Dispatched {
                emergency: id,
                ambulance: ambulance_id,
                hospital,
                eta_minutes: travel,
            },
        );
        Ok(DispatchOutcome {
            emergency: id,
            ambulance: ambulance_id,
            hospital,
            travel,
        })
    }

    /// Dispatch the most urgent pending case to its nearest idle ambulance.
    ///
    /// `None` when the queue is empty or no idle ambulance can reach the top
    /// case; the case then stays queued.
    pub fn service_nearest_pending(&mut self) -> Option<Result<DispatchOutcome, DispatchError>> {
        let location = self.queue.peek()?.location;
        let (entity, _) = self.nearest_idle_ambulance(location)?;
        Some(
            self.queue
                .dequeue()
                .and_then(|emergency| self.attempt_dispatch(entity, emergency)),
        )
    }

    /// Advance every busy ambulance whose current state has run out, in
    /// ascending id order, one transition each.
    ///
    /// The busy set is taken before any transition fires, so a unit dispatched
    /// by a reassignment during this pass waits for the next tick.
    pub fn update_fleet(&mut self) -> Vec<Reassignment> {
        let now = self.clock.now();
        let mut busy: Vec<(AmbulanceId, Entity)> = self
            .ambulances
            .iter()
            .filter(|(_, ambulance)| !ambulance.is_idle())
            .map(|(entity, ambulance)| (ambulance.id, entity))
            .collect();
        busy.sort_unstable_by_key(|(id, _)| *id);

        busy.into_iter()
            .filter_map(|(_, entity)| self.advance_ambulance(entity, now))
            .collect()
    }

    fn advance_ambulance(&mut self, entity: Entity, now: u64) -> Option<Reassignment> {
        let (_, ambulance) = self.ambulances.get(entity).ok()?;
        if !ambulance.is_due(now) {
            return None;
        }
        match ambulance.state() {
            AmbulanceState::Idle => None,
            AmbulanceState::EnRouteToEmergency { assignment, .. } => {
                self.arrive_at_scene(entity, assignment, now);
                None
            }
            AmbulanceState::AtScene(assignment) => {
                self.depart_scene(entity, assignment, now);
                None
            }
            AmbulanceState::EnRouteToHospital(assignment) => {
                self.deliver_patient(entity, assignment, now);
                None
            }
            AmbulanceState::Returning => {
                self.return_to_base(entity, now);
                self.run_reassignment_pass()
            }
        }
    }

    fn arrive_at_scene(&mut self, entity: Entity, assignment: Assignment, now: u64) {
        let case = self.active.get_mut(assignment.emergency).map(|emergency| {
            emergency.reassignable = false;
            (emergency.location, emergency.service_minutes)
        });
        let Ok((_, mut ambulance)) = self.ambulances.get_mut(entity) else {
            return;
        };
        let (scene, service) = case.unwrap_or_else(|| {
            warn!(
                emergency = %assignment.emergency,
                ambulance = %ambulance.id,
                "assigned emergency is no longer active"
            );
            (ambulance.location(), 0)
        });
        ambulance.arrive_at_scene(scene, now + u64::from(service));

        debug!(ambulance = %ambulance.id, emergency = %assignment.emergency, service, "arrived at scene");
        let ambulance_id = ambulance.id;
        self.log.push(
            now,
            ActivityKind::ArrivedAtScene {
                emergency: assignment.emergency,
                ambulance: ambulance_id,
            },
        );
    }

    fn depart_scene(&mut self, entity: Entity, assignment: Assignment, now: u64) {
        let Ok((_, mut ambulance)) = self.ambulances.get_mut(entity) else {
            return;
        };
        let scene = ambulance.location();
        let hospital = self
            .hospitals
            .get(assignment.hospital)
            .map_or(scene, |hospital| hospital.location);
        let travel = travel_or_zero(&self.routing, scene, hospital);
        ambulance.depart_scene(now + u64::from(travel));

        debug!(ambulance = %ambulance.id, hospital = %assignment.hospital, eta = travel, "transporting");
        let ambulance_id = ambulance.id;
        self.log.push(
            now,
            ActivityKind::Transporting {
                emergency: assignment.emergency,
                ambulance: ambulance_id,
                hospital: assignment.hospital,
            },
        );
    }

    fn deliver_patient(&mut self, entity: Entity, assignment: Assignment, now: u64) {
        let Ok((_, mut ambulance)) = self.ambulances.get_mut(entity) else {
            return;
        };
        let hospital = self
            .hospitals
            .get(assignment.hospital)
            .map_or(ambulance.location(), |hospital| hospital.location);
        let base = self
            .hospitals
            .get(ambulance.base_hospital)
            .map_or(hospital, |hospital| hospital.location);
        let back = travel_or_zero(&self.routing, hospital, base);
        ambulance.deliver_patient(hospital, now + u64::from(back));
        let ambulance_id = ambulance.id;

        if self.active.remove(assignment.emergency).is_some() {
            self.stats.record_delivery();
        }
        info!(
            ambulance = %ambulance_id,
            emergency = %assignment.emergency,
            hospital = %assignment.hospital,
            return_minutes = back,
            "patient delivered"
        );
        self.log.push(
            now,
            ActivityKind::Delivered {
                emergency: assignment.emergency,
                ambulance: ambulance_id,
                hospital: assignment.hospital,
            },
        );
    }

    fn return_to_base(&mut self, entity: Entity, now: u64) {
        let Ok((_, mut ambulance)) = self.ambulances.get_mut(entity) else {
            return;
        };
        let base = self
            .hospitals
            .get(ambulance.base_hospital)
            .map_or(ambulance.location(), |hospital| hospital.location);
        ambulance.return_to_base(base);

        debug!(ambulance = %ambulance.id, "back at base");
        let ambulance_id = ambulance.id;
        self.log.push(
            now,
            ActivityKind::BackAtBase {
                ambulance: ambulance_id,
            },
        );
    }

    /// Scan active cases in dispatch order and hand the first one whose
    /// nearest idle ambulance beats the incumbent's frozen ETA by at least the
    /// reassign threshold over to that ambulance. At most one swap per pass.
    pub fn run_reassignment_pass(&mut self) -> Option<Reassignment> {
        let now = self.clock.now();
        let threshold = i64::from(self.params.reassign_threshold);

        let (emergency_id, incumbent, from, candidate, minutes_saved) =
            self.active.iter().filter(|e| e.reassignable).find_map(|emergency| {
                let incumbent = emergency.assigned_ambulance?;
                let (_, current) = self.ambulances.get(incumbent).ok()?;
                let incumbent_eta = current.estimated_arrival()?;
                let (candidate, travel) = self.nearest_idle_ambulance(emergency.location)?;
                if candidate == incumbent {
                    return None;
                }
                let candidate_eta = now + u64::from(travel);
                let saved = incumbent_eta as i64 - candidate_eta as i64;
                (saved >= threshold).then_some((
                    emergency.id,
                    incumbent,
                    current.id,
                    candidate,
                    saved as u64,
                ))
            })?;

        let released = match self.ambulances.get_mut(incumbent) {
            Ok((_, mut current)) => current.stand_down(),
            Err(_) => None,
        };
        let mut emergency = self.active.remove(emergency_id)?;
        if let Some(assignment) = released {
            self.hospitals.release_bed(assignment.hospital);
        }
        emergency.assigned_ambulance = None;

        match self.attempt_dispatch(candidate, emergency) {
            Ok(outcome) => {
                self.stats.record_reassignment();
                info!(
                    emergency = %emergency_id,
                    from = %from,
                    to = %outcome.ambulance,
                    minutes_saved,
                    "emergency reassigned"
                );
                self.log.push(
                    now,
                    ActivityKind::Reassigned {
                        emergency: emergency_id,
                        from,
                        to: outcome.ambulance,
                        minutes_saved,
                    },
                );
                Some(Reassignment {
                    emergency: emergency_id,
                    from,
                    to: outcome.ambulance,
                    minutes_saved,
                })
            }
            Err(err) => {
                warn!(emergency = %emergency_id, error = %err, "reassignment failed");
                None
            }
        }
    }

    fn requeue(&mut self, mut emergency: Emergency) {
        emergency.assigned_ambulance = None;
        emergency.reassignable = true;
        emergency.response_minutes = None;
        let id = emergency.id;
        if let Err(err) = self.queue.enqueue(emergency) {
            warn!(emergency = %id, error = %err, "could not return emergency to the queue, dropping it");
        }
    }
}

/// Road minutes between two points, or zero when no route exists.
fn travel_or_zero(routing: &RoutingEngine, from: LocationId, to: LocationId) -> Minutes {
    routing.shortest_distance(from, to).unwrap_or_else(|| {
        warn!(from = %from, to = %to, "no route, treating leg as instantaneous");
        0
    })
}

#[cfg(test)]
mod tests {
    use bevy_ecs::prelude::World;
    use bevy_ecs::system::SystemState;

    use super::*;
    use crate::emergency::sample_emergency;
    use crate::priority::Disease;
    use crate::scenario::{build_simulation, CityConfig};

    /// Star around a hub (L0): the scene is L1, units wait at L2 and L3.
    ///
    /// L0 -1- L1, L0 -9- L2, L1 -4- L3.
    fn star_world(params: DispatchParams) -> World {
        let city = CityConfig::new()
            .with_location("Hub", 0, 0)
            .with_location("Scene", 1, 0)
            .with_location("Far", 0, 9)
            .with_location("Near", 1, 4)
            .with_road(0, 1, 1)
            .with_road(0, 2, 9)
            .with_road(1, 3, 4)
            .with_hospital("Hub General", 0, 2, Disease::General)
            .with_ambulance(2, 0)
            .with_ambulance(3, 0);
        let mut world = World::new();
        build_simulation(&mut world, city, params).expect("build");
        world
    }

    fn entity_of(world: &mut World, id: u32) -> Entity {
        world
            .query::<(Entity, &Ambulance)>()
            .iter(world)
            .find(|(_, ambulance)| ambulance.id == AmbulanceId(id))
            .map(|(entity, _)| entity)
            .expect("ambulance")
    }

    fn case_at(id: u64, location: usize) -> Emergency {
        let mut emergency = sample_emergency(id, 3);
        emergency.location = LocationId(location);
        emergency
    }

    #[test]
    fn nearest_idle_prefers_shortest_route() {
        let mut world = star_world(DispatchParams::default());
        let near = entity_of(&mut world, 2);
        let mut state = SystemState::<Dispatcher>::new(&mut world);
        let dispatcher = state.get_mut(&mut world);
        assert_eq!(dispatcher.nearest_idle_ambulance(LocationId(1)), Some((near, 4)));
    }

    #[test]
    fn dispatch_reserves_bed_and_credits_response() {
        let mut world = star_world(DispatchParams::default());
        let far = entity_of(&mut world, 1);
        let mut state = SystemState::<Dispatcher>::new(&mut world);
        let mut dispatcher = state.get_mut(&mut world);
        let outcome = dispatcher
            .attempt_dispatch(far, case_at(1, 1))
            .expect("dispatch");
        assert_eq!(outcome.travel, 10);
        assert_eq!(outcome.hospital, HospitalIndex(0));

        let ambulance = world.get::<Ambulance>(far).expect("ambulance");
        assert_eq!(ambulance.estimated_arrival(), Some(10));
        assert_eq!(world.resource::<HospitalRegistry>().used_beds(), 1);
        assert_eq!(world.resource::<DispatchStats>().total_response_minutes, 10);
        let active = world.resource::<ActiveEmergencies>();
        let case = active.get(EmergencyId(1)).expect("active");
        assert_eq!(case.assigned_ambulance, Some(far));
        assert!(case.reassignable);
    }

    #[test]
    fn busy_ambulance_is_refused_and_case_requeued() {
        let mut world = star_world(DispatchParams::default());
        let far = entity_of(&mut world, 1);
        let mut state = SystemState::<Dispatcher>::new(&mut world);
        let mut dispatcher = state.get_mut(&mut world);
        dispatcher.attempt_dispatch(far, case_at(1, 1)).expect("first");
        assert_eq!(
            dispatcher.attempt_dispatch(far, case_at(2, 1)),
            Err(DispatchError::AmbulanceUnavailable)
        );
        let queue = world.resource::<EmergencyQueue>();
        assert_eq!(queue.peek().map(|e| e.id), Some(EmergencyId(2)));
    }

    #[test]
    fn closer_unit_takes_over_when_gain_meets_threshold() {
        // Incumbent ETA 10, candidate 4: saves 6 >= 5.
        let mut world = star_world(DispatchParams::default());
        let far = entity_of(&mut world, 1);
        let near = entity_of(&mut world, 2);
        let mut state = SystemState::<Dispatcher>::new(&mut world);
        let mut dispatcher = state.get_mut(&mut world);
        dispatcher.attempt_dispatch(far, case_at(1, 1)).expect("dispatch");
        let swap = dispatcher.run_reassignment_pass().expect("swap");
        assert_eq!(swap.from, AmbulanceId(1));
        assert_eq!(swap.to, AmbulanceId(2));
        assert_eq!(swap.minutes_saved, 6);

        assert!(world.get::<Ambulance>(far).expect("far").is_idle());
        assert_eq!(world.get::<Ambulance>(far).expect("far").location(), LocationId(2));
        assert_eq!(
            world.get::<Ambulance>(near).expect("near").estimated_arrival(),
            Some(4)
        );
        assert_eq!(world.resource::<HospitalRegistry>().used_beds(), 1);
        let stats = world.resource::<DispatchStats>();
        assert_eq!(stats.total_response_minutes, 14);
        assert_eq!(stats.dispatches, 2);
        assert_eq!(stats.reassignments, 1);
        let active = world.resource::<ActiveEmergencies>();
        assert_eq!(active.get(EmergencyId(1)).and_then(|e| e.assigned_ambulance), Some(near));
    }

    #[test]
    fn no_swap_below_threshold() {
        // Same layout with the candidate 6 minutes out: saves 4 < 5.
        let city = CityConfig::new()
            .with_location("Hub", 0, 0)
            .with_location("Scene", 1, 0)
            .with_location("Far", 0, 9)
            .with_location("Near", 1, 6)
            .with_road(0, 1, 1)
            .with_road(0, 2, 9)
            .with_road(1, 3, 6)
            .with_hospital("Hub General", 0, 2, Disease::General)
            .with_ambulance(2, 0)
            .with_ambulance(3, 0);
        let mut world = World::new();
        build_simulation(&mut world, city, DispatchParams::default()).expect("build");
        let far = entity_of(&mut world, 1);

        let mut state = SystemState::<Dispatcher>::new(&mut world);
        let mut dispatcher = state.get_mut(&mut world);
        dispatcher.attempt_dispatch(far, case_at(1, 1)).expect("dispatch");
        assert_eq!(dispatcher.run_reassignment_pass(), None);
        assert_eq!(world.resource::<DispatchStats>().reassignments, 0);
    }

    #[test]
    fn locked_case_is_never_reassigned() {
        let mut world = star_world(DispatchParams::default());
        let far = entity_of(&mut world, 1);
        let mut state = SystemState::<Dispatcher>::new(&mut world);
        let mut dispatcher = state.get_mut(&mut world);
        dispatcher.attempt_dispatch(far, case_at(1, 1)).expect("dispatch");
        world
            .resource_mut::<ActiveEmergencies>()
            .get_mut(EmergencyId(1))
            .expect("active")
            .reassignable = false;
        let mut dispatcher = state.get_mut(&mut world);
        assert_eq!(dispatcher.run_reassignment_pass(), None);
    }
}
