use std::sync::Arc;

use chrono::Duration;
use tracing::debug;

use crate::error::CasterError;
use crate::post::Caster;
use crate::route::Route;
use crate::state::OptimizationState;
use crate::time::TimeWindow;
use crate::traits::CrmClient;

/// Length of the spot blocked for the summary at the end of the route.
const SUMMARY_SPOT_MINUTES: i64 = 30;

/// Summary text stored on the blocked spot.
pub fn route_summary(route: &Route) -> String {
    let appointments = route.appointment_count();
    let first = route
        .appointments()
        .filter_map(|appointment| appointment.time_window)
        .map(|window| window.start())
        .min();
    let last = route
        .appointments()
        .filter_map(|appointment| appointment.time_window)
        .map(|window| window.end())
        .max();

    match (first, last) {
        (Some(first), Some(last)) => format!(
            "Route summary: {appointments} appointments, {} min service, {} - {}",
            route.service_minutes(),
            first.format("%H:%M"),
            last.format("%H:%M"),
        ),
        _ => format!("Route summary: {appointments} appointments"),
    }
}

/// Writes a summary into a blocked spot at the end of every summary-enabled
/// route.
pub struct MustUpdateRouteSummaryCaster {
    crm: Arc<dyn CrmClient>,
}

impl MustUpdateRouteSummaryCaster {
    pub fn new(crm: Arc<dyn CrmClient>) -> Self {
        Self { crm }
    }
}

impl Caster for MustUpdateRouteSummaryCaster {
    fn cast(&self, state: &OptimizationState) -> Result<usize, CasterError> {
        let mut written = 0;

        for route in state.routes().iter().filter(|route| route.summary_enabled) {
            let end = route.time_window.end();
            let spot = TimeWindow::new(end - Duration::minutes(SUMMARY_SPOT_MINUTES), end);
            let summary = route_summary(route);

            debug!(route_id = route.id, %spot, "writing route summary");
            self.crm.block_spot(route.id, &spot, &summary)?;
            written += 1;
        }

        Ok(written)
    }
}
