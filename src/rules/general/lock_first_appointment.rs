use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, warn};

use crate::error::RuleError;
use crate::result::{RuleId, RuleOutcome};
use crate::route::Route;
use crate::rules::GeneralRule;
use crate::state::OptimizationState;
use crate::traits::BusinessDaysService;

/// Locks the first appointment of every route on days the business calendar
/// asks for it, and pushes overlapping appointments past it.
pub struct LockFirstAppointment {
    business_days: Arc<dyn BusinessDaysService>,
}

impl LockFirstAppointment {
    pub fn new(business_days: Arc<dyn BusinessDaysService>) -> Self {
        Self { business_days }
    }
}

/// Locks the route's first appointment unless another appointment must be
/// reached before it ends. Returns true if the route changed.
fn lock_first(route: &mut Route) -> bool {
    let Some(first) = route.first_appointment() else {
        return false;
    };
    let first_id = first.id;
    let first_window = first.planned_window();

    // Only the first conflict is reported.
    let conflict = route
        .appointments()
        .find(|other| other.id != first_id && other.expected_arrival.end() < first_window.end());
    if let Some(conflicting) = conflict {
        warn!(
            route_id = route.id,
            appointment_id = first_id,
            time_window = %first_window,
            conflicting_appointment_id = conflicting.id,
            conflicting_expected_arrival = %conflicting.expected_arrival,
            "cannot lock first appointment"
        );
        return false;
    }

    let mut changed = false;
    let Some(first) = route.first_appointment_mut() else {
        return false;
    };
    if !first.is_locked() {
        first.lock();
        changed = true;
    }
    let locked_arrival_end = first.expected_arrival.end();
    let shifted_start = locked_arrival_end + Duration::minutes(1);

    for appointment in route.appointments_mut() {
        if appointment.id == first_id || appointment.is_locked() {
            continue;
        }
        if appointment.expected_arrival.start() > locked_arrival_end {
            continue;
        }
        if shifted_start >= appointment.expected_arrival.end() {
            // Shifting would leave nothing of the window.
            warn!(
                appointment_id = appointment.id,
                locked_appointment_id = first_id,
                expected_arrival = %appointment.expected_arrival,
                "expected arrival ends with the locked appointment, not shifting"
            );
            continue;
        }
        debug!(
            appointment_id = appointment.id,
            locked_appointment_id = first_id,
            "shifting expected arrival after locked appointment"
        );
        appointment.expected_arrival = appointment.expected_arrival.with_start(shifted_start);
        changed = true;
    }

    if changed {
        route.sort_work_events();
    }
    changed
}

impl GeneralRule for LockFirstAppointment {
    fn id(&self) -> RuleId {
        RuleId::LockFirstAppointment
    }

    fn apply(&self, state: &mut OptimizationState) -> Result<RuleOutcome, RuleError> {
        if !self.business_days.needs_first_appointment_lock(state.date()) {
            return Ok(RuleOutcome::NotTriggered);
        }

        let mut changed = false;
        for route in state.routes_mut() {
            changed |= lock_first(route);
        }

        Ok(RuleOutcome::applied_if(changed))
    }
}
