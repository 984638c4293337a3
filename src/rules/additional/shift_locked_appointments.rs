use std::collections::HashSet;

use chrono::Duration;
use tracing::debug;

use crate::config::RuleSettings;
use crate::error::RuleError;
use crate::result::{RuleId, RuleOutcome};
use crate::rules::AdditionalRule;
use crate::state::OptimizationState;

/// Widens the expected arrival of locked first appointments the solver could
/// not place.
pub struct ShiftLockedAppointmentsTimeWindow {
    shift: Duration,
}

impl ShiftLockedAppointmentsTimeWindow {
    pub fn new(settings: &RuleSettings) -> Self {
        Self {
            shift: Duration::minutes(settings.locked_appointment_shift_minutes),
        }
    }
}

impl AdditionalRule for ShiftLockedAppointmentsTimeWindow {
    fn id(&self) -> RuleId {
        RuleId::ShiftLockedAppointmentsTimeWindow
    }

    fn apply(
        &self,
        source: &mut OptimizationState,
        result: &OptimizationState,
    ) -> Result<RuleOutcome, RuleError> {
        let locked_unassigned: HashSet<i64> = result
            .unassigned_appointments()
            .iter()
            .filter(|appointment| appointment.is_locked())
            .map(|appointment| appointment.id)
            .collect();
        if locked_unassigned.is_empty() {
            return Ok(RuleOutcome::NotTriggered);
        }

        let mut shifted = false;
        for route in source.routes_mut() {
            let route_id = route.id;
            let Some(first) = route.first_appointment_mut() else {
                continue;
            };
            if !locked_unassigned.contains(&first.id) {
                continue;
            }

            first.expected_arrival = first.expected_arrival.extend_end(self.shift);
            debug!(
                route_id,
                appointment_id = first.id,
                expected_arrival = %first.expected_arrival,
                "locked appointment window shifted"
            );
            shifted = true;
        }

        Ok(RuleOutcome::applied_if(shifted))
    }
}
