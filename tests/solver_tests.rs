//! Greedy solver tests.

mod fixtures;

use fixtures::*;
use route_planner::solver::{GreedySolver, SolveOptions};
use route_planner::state::OptimizationStatus;
use route_planner::traits::Solver;

fn assigned_count(state: &route_planner::state::OptimizationState) -> usize {
    state.routes().iter().map(|route| route.appointment_count()).sum()
}

// ============================================================================
// Assignment
// ============================================================================

#[test]
fn test_capacity_is_respected() {
    let state = TestState::new()
        .route(TestRoute::new(1).max_capacity(2).build())
        .unassigned(TestAppointment::new(1).build())
        .unassigned(TestAppointment::new(2).build())
        .unassigned(TestAppointment::new(3).build())
        .build();

    let result = GreedySolver::default().optimize(state).unwrap();

    assert_eq!(result.routes()[0].appointment_count(), 2);
    assert_eq!(result.unassigned_count(), 1);
    assert_eq!(
        result.unassigned_appointments()[0].id,
        3,
        "appointments are placed in expected-arrival order, then by id"
    );
}

#[test]
fn test_skills_decide_the_route() {
    let state = TestState::new()
        .route(TestRoute::new(1).build())
        .route(TestRoute::new(2).skill("termite").build())
        .unassigned(TestAppointment::new(1).skill("termite").build())
        .build();

    let result = GreedySolver::default().optimize(state).unwrap();

    assert!(result.routes()[0].appointment_count() == 0);
    assert_eq!(appointment_ids(&result.routes()[1]), vec![1]);
}

#[test]
fn test_appointment_without_capable_service_pro_stays_unassigned() {
    let state = TestState::new()
        .route(TestRoute::new(1).build())
        .unassigned(TestAppointment::new(1).skill("pool").build())
        .build();

    let result = GreedySolver::default().optimize(state).unwrap();

    assert_eq!(result.unassigned_count(), 1);
    assert_eq!(assigned_count(&result), 0);
}

#[test]
fn test_load_is_balanced_across_routes() {
    let mut builder = TestState::new()
        .route(TestRoute::new(1).build())
        .route(TestRoute::new(2).build());
    for id in 1..=4 {
        builder = builder.unassigned(TestAppointment::new(id).build());
    }

    let result = GreedySolver::default().optimize(builder.build()).unwrap();

    assert_eq!(result.routes()[0].appointment_count(), 2);
    assert_eq!(result.routes()[1].appointment_count(), 2);
}

#[test]
fn test_reassignment_penalty_keeps_appointment_on_its_route() {
    let state = TestState::new()
        .route(TestRoute::new(1).build())
        .route(TestRoute::new(2).appointment(TestAppointment::new(1).build()).build())
        .build();
    let solver = GreedySolver::new(SolveOptions {
        balance_load: false,
        ..SolveOptions::default()
    });

    let result = solver.optimize(state).unwrap();

    assert_eq!(appointment_ids(&result.routes()[1]), vec![1]);
}

// ============================================================================
// Scheduling
// ============================================================================

#[test]
fn test_planned_window_respects_expected_arrival() {
    let state = TestState::new()
        .route(TestRoute::new(1).build())
        .unassigned(TestAppointment::new(1).arrival((10, 0), (11, 0)).build())
        .unassigned(TestAppointment::new(2).arrival((8, 0), (9, 0)).duration(60).build())
        .build();

    let result = GreedySolver::default().optimize(state).unwrap();

    let route = &result.routes()[0];
    assert_eq!(appointment_ids(route), vec![2, 1]);
    for appointment in route.appointments() {
        let planned = appointment.time_window.expect("planned window set");
        assert!(planned.start() >= appointment.expected_arrival.start());
        assert!(planned.start() <= appointment.expected_arrival.end());
        assert_eq!(planned.duration(), appointment.duration);
    }
}

#[test]
fn test_meetings_are_avoided() {
    let state = TestState::new()
        .route(TestRoute::new(1).meeting(50, (8, 0), (9, 0)).build())
        .unassigned(TestAppointment::new(1).arrival((8, 0), (12, 0)).build())
        .build();

    let result = GreedySolver::default().optimize(state).unwrap();

    let route = &result.routes()[0];
    let appointment = route.first_appointment().expect("appointment placed");
    assert_eq!(appointment.time_window, Some(window((9, 0), (9, 30))));
    assert_eq!(route.fixed_events().count(), 1, "the meeting stays on the route");
}

#[test]
fn test_appointment_past_route_end_is_unassigned() {
    let state = TestState::new()
        .route(TestRoute::new(1).build())
        .unassigned(TestAppointment::new(1).arrival((16, 30), (17, 0)).duration(60).build())
        .build();

    let result = GreedySolver::default().optimize(state).unwrap();

    assert_eq!(result.unassigned_count(), 1);
}

// ============================================================================
// Locked Appointments
// ============================================================================

#[test]
fn test_locked_appointment_stays_on_its_route() {
    let state = TestState::new()
        .route(
            TestRoute::new(1)
                .appointment(TestAppointment::new(1).arrival((8, 0), (9, 0)).locked().build())
                .build(),
        )
        .route(TestRoute::new(2).build())
        .unassigned(TestAppointment::new(2).build())
        .unassigned(TestAppointment::new(3).build())
        .build();

    let result = GreedySolver::default().optimize(state).unwrap();

    assert!(appointment_ids(&result.routes()[0]).contains(&1));
    assert_eq!(assigned_count(&result), 3);
}

#[test]
fn test_infeasible_locked_appointment_is_unassigned() {
    let state = TestState::new()
        .route(
            TestRoute::new(1)
                .meeting(50, (8, 0), (10, 0))
                .appointment(TestAppointment::new(1).arrival((8, 0), (8, 30)).locked().build())
                .build(),
        )
        .build();

    let result = GreedySolver::default().optimize(state).unwrap();

    assert_eq!(result.routes()[0].appointment_count(), 0);
    assert_eq!(result.unassigned_count(), 1);
    assert!(result.unassigned_appointments()[0].is_locked());
}

// ============================================================================
// Result Snapshot
// ============================================================================

#[test]
fn test_result_is_a_new_snapshot() {
    let state = TestState::new()
        .route(TestRoute::new(1).build())
        .unassigned(TestAppointment::new(1).build())
        .build();
    let source_id = state.id();

    let result = GreedySolver::default().optimize(state).unwrap();

    assert_ne!(result.id(), source_id);
    assert_eq!(result.status(), OptimizationStatus::Pre, "the pipeline marks results post");
}

#[test]
fn test_plan_keeps_assigned_appointments() {
    let state = TestState::new()
        .route(
            TestRoute::new(1)
                .appointment(TestAppointment::new(1).arrival((8, 0), (9, 0)).build())
                .appointment(TestAppointment::new(2).arrival((9, 0), (10, 0)).build())
                .build(),
        )
        .route(TestRoute::new(2).build())
        .unassigned(TestAppointment::new(3).build())
        .build();

    let result = GreedySolver::default().plan(state).unwrap();

    assert_eq!(result.status(), OptimizationStatus::Plan);
    assert_eq!(appointment_ids(&result.routes()[0]), vec![1, 2]);
    assert_eq!(appointment_ids(&result.routes()[1]), vec![3]);
}
