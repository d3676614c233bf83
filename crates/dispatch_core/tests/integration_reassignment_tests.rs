mod support;

use dispatch_core::emergency::EmergencyId;
use dispatch_core::fleet::{AmbulanceId, AmbulanceStateKind};
use dispatch_core::network::LocationId;
use dispatch_core::priority::Disease;
use dispatch_core::scenario::{CityConfig, DispatchParams};
use dispatch_core::telemetry::ActivityKind;

use support::entities::{ambulance, hospital, state_of};
use support::world::TestCityBuilder;

/// Hospital at L0, scene at L1 (1 minute away), second unit parked at L2,
/// 20 minutes from the scene.
fn outpost_city() -> CityConfig {
    CityConfig::new()
        .with_location("Hospital", 0, 0)
        .with_location("Scene", 1, 0)
        .with_location("Outpost", 21, 0)
        .with_road(0, 1, 1)
        .with_road(2, 1, 20)
        .with_hospital("General", 0, 5, Disease::General)
        .with_ambulance(0, 0)
        .with_ambulance(2, 0)
}

#[test]
fn returning_unit_takes_over_distant_assignment() {
    let mut sim = TestCityBuilder::new(outpost_city()).build();
    sim.report_emergency("First", 1, Disease::General, 40)
        .expect("report");
    sim.advance_time(1);
    assert_eq!(ambulance(&sim, 1).emergency, Some(EmergencyId(1)));

    sim.report_emergency("Second", 1, Disease::General, 40)
        .expect("report");
    sim.advance_time(1);
    let outpost = ambulance(&sim, 2);
    assert_eq!(outpost.emergency, Some(EmergencyId(2)));
    assert_eq!(outpost.estimated_arrival, Some(22));
    assert_eq!(hospital(&sim, 0).occupied, 2);

    // Unit 1: scene at 2, leaves at 5, delivers at 6, idle at 7.
    sim.advance_time(4);
    assert_eq!(state_of(&sim, 1), AmbulanceStateKind::Returning);
    assert_eq!(state_of(&sim, 2), AmbulanceStateKind::EnRouteToEmergency);

    sim.advance_time(1);
    assert_eq!(sim.now(), 7);
    let unit1 = ambulance(&sim, 1);
    assert_eq!(unit1.state, AmbulanceStateKind::EnRouteToEmergency);
    assert_eq!(unit1.emergency, Some(EmergencyId(2)));
    assert_eq!(unit1.estimated_arrival, Some(8));

    let unit2 = ambulance(&sim, 2);
    assert_eq!(unit2.state, AmbulanceStateKind::Idle);
    assert_eq!(unit2.location, LocationId(2), "stood-down unit stays put");

    assert_eq!(hospital(&sim, 0).occupied, 2, "old reservation released, new one taken");
    let active = sim.active_emergencies();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].assigned_ambulance, Some(AmbulanceId(1)));
    assert!(active[0].reassignable);

    let stats = sim.statistics();
    assert_eq!(stats.reassignments, 1);
    assert_eq!(stats.dispatches, 3);
    assert!(sim.activity_log().any(|entry| entry.kind
        == ActivityKind::Reassigned {
            emergency: EmergencyId(2),
            from: AmbulanceId(2),
            to: AmbulanceId(1),
            minutes_saved: 14,
        }));

    // Every dispatch counts towards response time, the handed-over one included.
    sim.advance_time(6);
    let stats = sim.statistics();
    assert_eq!(stats.handled, 2);
    assert_eq!(stats.average_response_minutes, Some(11.0));
    assert_eq!(
        sim.world()
            .resource::<dispatch_core::telemetry::DispatchStats>()
            .total_response_minutes,
        22
    );
}

#[test]
fn high_threshold_keeps_the_incumbent() {
    let mut sim = TestCityBuilder::new(outpost_city())
        .with_params(DispatchParams::default().with_seed(1).with_reassign_threshold(15))
        .build();
    sim.report_emergency("First", 1, Disease::General, 40)
        .expect("report");
    sim.advance_time(1);
    sim.report_emergency("Second", 1, Disease::General, 40)
        .expect("report");
    sim.advance_time(6);

    assert_eq!(ambulance(&sim, 2).emergency, Some(EmergencyId(2)));
    assert_eq!(state_of(&sim, 1), AmbulanceStateKind::Idle);
    assert_eq!(sim.statistics().reassignments, 0);
}

#[test]
fn case_locked_once_crew_is_on_scene() {
    let mut sim = TestCityBuilder::new(outpost_city()).build();
    sim.report_emergency("Only", 1, Disease::General, 40)
        .expect("report");
    sim.advance_time(2);

    let active = sim.active_emergencies();
    assert_eq!(active.len(), 1);
    assert!(!active[0].reassignable);
    assert_eq!(state_of(&sim, 1), AmbulanceStateKind::AtScene);
}
