use std::sync::Arc;

use tracing::warn;

use crate::error::CasterError;
use crate::post::Caster;
use crate::state::OptimizationState;
use crate::traits::CrmClient;

/// Reports appointments the customer already confirmed whose route or start
/// the optimizer changed.
pub struct DetectRescheduledConfirmedAppointmentsCaster {
    crm: Arc<dyn CrmClient>,
}

impl DetectRescheduledConfirmedAppointmentsCaster {
    pub fn new(crm: Arc<dyn CrmClient>) -> Self {
        Self { crm }
    }
}

impl Caster for DetectRescheduledConfirmedAppointmentsCaster {
    fn cast(&self, state: &OptimizationState) -> Result<usize, CasterError> {
        let planned = state.routes().iter().flat_map(|route| {
            route
                .appointments()
                .map(move |appointment| (appointment, Some(route.id)))
        });
        let unassigned = state
            .unassigned_appointments()
            .iter()
            .map(|appointment| (appointment, None));

        let mut detected = 0;
        for (appointment, route_id) in planned.chain(unassigned) {
            let Some(crm_appointment) = self.crm.find_appointment(appointment.id)? else {
                continue;
            };
            if !crm_appointment.confirmed {
                continue;
            }

            let start = appointment.time_window.map(|window| window.start());
            let moved = crm_appointment.route_id != route_id;
            let retimed = crm_appointment.start.is_some() && crm_appointment.start != start;
            if moved || retimed {
                warn!(
                    appointment_id = appointment.id,
                    crm_route_id = ?crm_appointment.route_id,
                    route_id = ?route_id,
                    crm_start = ?crm_appointment.start,
                    start = ?start,
                    "confirmed appointment was rescheduled"
                );
                detected += 1;
            }
        }

        Ok(detected)
    }
}
