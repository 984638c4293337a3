use std::sync::Arc;

use tracing::debug;

use crate::error::CasterError;
use crate::post::Caster;
use crate::state::OptimizationState;
use crate::traits::CrmClient;

const ESTIMATED_DURATION_PREFIX: &str = "Estimated Duration:";

/// Returns `notes` with exactly one estimated-duration line, replacing any
/// previous one in place.
pub fn with_estimated_duration(notes: &str, minutes: i64) -> String {
    let line = format!("{ESTIMATED_DURATION_PREFIX} {minutes} min");
    let mut replaced = false;

    let mut lines: Vec<String> = Vec::new();
    for existing in notes.lines() {
        if existing.trim_start().starts_with(ESTIMATED_DURATION_PREFIX) {
            if !replaced {
                lines.push(line.clone());
                replaced = true;
            }
            continue;
        }
        lines.push(existing.to_string());
    }
    if !replaced {
        lines.push(line);
    }

    lines.join("\n")
}

/// Rewrites each routed appointment's CRM notes with its estimated duration.
pub struct SetAppointmentEstimatedDurationCaster {
    crm: Arc<dyn CrmClient>,
}

impl SetAppointmentEstimatedDurationCaster {
    pub fn new(crm: Arc<dyn CrmClient>) -> Self {
        Self { crm }
    }
}

impl Caster for SetAppointmentEstimatedDurationCaster {
    fn cast(&self, state: &OptimizationState) -> Result<usize, CasterError> {
        let mut updated = 0;

        for appointment in state.routes().iter().flat_map(|route| route.appointments()) {
            let Some(crm_appointment) = self.crm.find_appointment(appointment.id)? else {
                debug!(appointment_id = appointment.id, "appointment not in crm, skipping");
                continue;
            };

            let notes = with_estimated_duration(&crm_appointment.notes, appointment.duration.num_minutes());
            if notes == crm_appointment.notes {
                continue;
            }
            self.crm.update_appointment_notes(appointment.id, &notes)?;
            updated += 1;
        }

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_to_empty_notes() {
        assert_eq!(with_estimated_duration("", 45), "Estimated Duration: 45 min");
    }

    #[test]
    fn test_appends_after_existing_notes() {
        assert_eq!(
            with_estimated_duration("Gate code 1234", 30),
            "Gate code 1234\nEstimated Duration: 30 min"
        );
    }

    #[test]
    fn test_replaces_previous_estimate() {
        let notes = "Estimated Duration: 20 min\nDog in yard";
        assert_eq!(
            with_estimated_duration(notes, 35),
            "Estimated Duration: 35 min\nDog in yard"
        );
    }

    #[test]
    fn test_repeated_application_is_stable() {
        let once = with_estimated_duration("Dog in yard", 40);
        let twice = with_estimated_duration(&once, 40);
        assert_eq!(once, twice);
        assert_eq!(twice.matches(ESTIMATED_DURATION_PREFIX).count(), 1);
    }

    #[test]
    fn test_collapses_duplicate_estimates() {
        let notes = "Estimated Duration: 20 min\nEstimated Duration: 25 min";
        assert_eq!(with_estimated_duration(notes, 30), "Estimated Duration: 30 min");
    }
}
