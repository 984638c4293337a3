//! Routing solver (baseline implementation).
//!
//! Greedy insertion over expected-arrival order. Travel time is not modelled:
//! appointments are packed back to back inside the route window, around
//! fixed events, breaks and extra work.

use tracing::{debug, info};

use crate::error::SolverError;
use crate::route::Route;
use crate::state::{OptimizationState, OptimizationStatus};
use crate::time::TimeWindow;
use crate::traits::Solver;
use crate::work_event::{Appointment, WorkEvent};

#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Cost added when an appointment moves to a route other than the one it
    /// came from (stability penalty, minutes).
    pub reassignment_penalty_minutes: i64,
    /// Fill the least loaded route first instead of the cheapest one.
    pub balance_load: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            reassignment_penalty_minutes: 30,
            balance_load: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GreedySolver {
    options: SolveOptions,
}

/// Appointments being placed on one route, with the intervals they must
/// avoid.
struct RouteState {
    blocked: Vec<TimeWindow>,
    appointments: Vec<Appointment>,
    schedule: Vec<TimeWindow>,
}

/// An appointment together with the route it was taken from.
struct Candidate {
    appointment: Appointment,
    origin: Option<usize>,
}

impl GreedySolver {
    pub fn new(options: SolveOptions) -> Self {
        Self { options }
    }

    fn solve(&self, mut state: OptimizationState, keep_assigned: bool) -> Result<OptimizationState, SolverError> {
        state.validate().map_err(|err| SolverError(err.to_string()))?;
        state.assign_new_id();

        let mut unassigned: Vec<Appointment> = Vec::new();
        let mut pool: Vec<Candidate> = state
            .take_unassigned_appointments()
            .into_iter()
            .map(|appointment| Candidate {
                appointment,
                origin: None,
            })
            .collect();

        let mut routes: Vec<RouteState> = Vec::with_capacity(state.routes().len());
        for (route_index, route) in state.routes_mut().iter_mut().enumerate() {
            let mut route_state = RouteState {
                blocked: blocked_intervals(route),
                appointments: Vec::new(),
                schedule: Vec::new(),
            };

            let mut kept: Vec<Appointment> = Vec::new();
            for event in route.work_events() {
                let Some(appointment) = event.as_appointment() else {
                    continue;
                };
                if keep_assigned || appointment.is_locked() {
                    kept.push(appointment.clone());
                } else {
                    pool.push(Candidate {
                        appointment: appointment.clone(),
                        origin: Some(route_index),
                    });
                }
            }
            route.remove_work_events(|event| event.as_appointment().is_some());

            // Pinned appointments stay on their route while the schedule is
            // feasible; the rest are reported unassigned.
            for appointment in kept {
                if route_state.appointments.len() as u32 >= route.capacity() {
                    unassigned.push(appointment);
                    continue;
                }
                match try_insert(route, &route_state, &appointment) {
                    Some((appointments, schedule)) => {
                        route_state.appointments = appointments;
                        route_state.schedule = schedule;
                    }
                    None => {
                        debug!(route_id = route.id, appointment_id = appointment.id, "pinned appointment does not fit");
                        unassigned.push(appointment);
                    }
                }
            }

            routes.push(route_state);
        }

        pool.sort_by_key(|candidate| (candidate.appointment.expected_arrival.start(), candidate.appointment.id));

        for candidate in pool {
            let mut best: Option<(usize, (usize, i64), Vec<Appointment>, Vec<TimeWindow>)> = None;

            for (route_index, route) in state.routes().iter().enumerate() {
                let route_state = &routes[route_index];
                if route_state.appointments.len() as u32 >= route.capacity() {
                    continue;
                }
                if !visitor_can_do(&candidate.appointment, route) {
                    continue;
                }
                let Some((appointments, schedule)) = try_insert(route, route_state, &candidate.appointment) else {
                    continue;
                };

                let cost = self.insertion_cost(route, &schedule, route_index, candidate.origin);
                let load = if self.options.balance_load {
                    route_state.appointments.len()
                } else {
                    0
                };
                let rank = (load, cost);
                if best.as_ref().is_none_or(|(_, best_rank, _, _)| rank < *best_rank) {
                    best = Some((route_index, rank, appointments, schedule));
                }
            }

            match best {
                Some((route_index, _, appointments, schedule)) => {
                    routes[route_index].appointments = appointments;
                    routes[route_index].schedule = schedule;
                }
                None => {
                    debug!(appointment_id = candidate.appointment.id, "appointment left unassigned");
                    unassigned.push(candidate.appointment);
                }
            }
        }

        for (route, route_state) in state.routes_mut().iter_mut().zip(routes) {
            for (mut appointment, window) in route_state.appointments.into_iter().zip(route_state.schedule) {
                appointment.time_window = Some(window);
                route.add_work_event(WorkEvent::Appointment(appointment));
            }
        }
        for appointment in unassigned {
            state.add_unassigned_appointment(appointment);
        }

        info!(
            state_id = %state.id(),
            assigned = state.total_appointments() - state.unassigned_count(),
            unassigned = state.unassigned_count(),
            "solver finished"
        );
        Ok(state)
    }

    /// Minutes from the route start to the end of its last appointment, plus
    /// the stability penalty when the appointment changes route.
    fn insertion_cost(&self, route: &Route, schedule: &[TimeWindow], route_index: usize, origin: Option<usize>) -> i64 {
        let finish = schedule.last().map_or(route.time_window.start(), TimeWindow::end);
        let mut cost = (finish - route.time_window.start()).num_minutes();
        if origin.is_some_and(|origin| origin != route_index) {
            cost += self.options.reassignment_penalty_minutes;
        }
        cost
    }
}

impl Solver for GreedySolver {
    fn optimize(&self, state: OptimizationState) -> Result<OptimizationState, SolverError> {
        self.solve(state, false)
    }

    fn plan(&self, state: OptimizationState) -> Result<OptimizationState, SolverError> {
        let mut planned = self.solve(state, true)?;
        planned.set_status(OptimizationStatus::Plan);
        Ok(planned)
    }
}

/// Check if the service pro has all skills the appointment requires.
fn visitor_can_do(appointment: &Appointment, route: &Route) -> bool {
    appointment
        .skills
        .iter()
        .all(|skill| route.service_pro.has_skill(skill))
}

/// Intervals appointments cannot overlap: fixed events at their window,
/// breaks and extra work at their expected arrival start.
fn blocked_intervals(route: &Route) -> Vec<TimeWindow> {
    let mut blocked: Vec<TimeWindow> = route
        .work_events()
        .iter()
        .filter(|event| event.as_appointment().is_none())
        .map(|event| match event.time_window() {
            Some(window) => window,
            None => TimeWindow::starting_at(event.expected_arrival().start(), event.duration()),
        })
        .collect();
    blocked.sort_by_key(TimeWindow::start);
    blocked
}

/// Inserts the appointment in expected-arrival order and reschedules the
/// route. `None` if the result is infeasible.
fn try_insert(
    route: &Route,
    route_state: &RouteState,
    appointment: &Appointment,
) -> Option<(Vec<Appointment>, Vec<TimeWindow>)> {
    let start = appointment.expected_arrival.start();
    let position = route_state
        .appointments
        .iter()
        .position(|existing| existing.expected_arrival.start() > start)
        .unwrap_or(route_state.appointments.len());

    let mut appointments = route_state.appointments.clone();
    appointments.insert(position, appointment.clone());
    let schedule = compute_schedule(route, &route_state.blocked, &appointments)?;
    Some((appointments, schedule))
}

fn compute_schedule(route: &Route, blocked: &[TimeWindow], appointments: &[Appointment]) -> Option<Vec<TimeWindow>> {
    let mut time = route.time_window.start();
    let mut schedule = Vec::with_capacity(appointments.len());

    for appointment in appointments {
        let earliest = time.max(appointment.expected_arrival.start());
        let slot = find_fitting_window(earliest, appointment, blocked);

        if slot.start() > appointment.expected_arrival.end() || slot.end() > route.time_window.end() {
            return None;
        }

        time = slot.end();
        schedule.push(slot);
    }

    Some(schedule)
}

/// Earliest slot at or after `earliest_start` that overlaps no blocked
/// interval. `blocked` must be sorted by start.
fn find_fitting_window(
    earliest_start: chrono::NaiveDateTime,
    appointment: &Appointment,
    blocked: &[TimeWindow],
) -> TimeWindow {
    let mut slot = TimeWindow::starting_at(earliest_start, appointment.duration);
    for interval in blocked {
        if slot.overlaps(interval) || (slot.start() == interval.start() && !interval.is_empty()) {
            slot = TimeWindow::starting_at(interval.end(), appointment.duration);
        }
    }
    slot
}
