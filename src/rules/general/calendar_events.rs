use std::sync::Arc;

use tracing::debug;

use crate::error::RuleError;
use crate::result::{RuleId, RuleOutcome};
use crate::rules::GeneralRule;
use crate::state::OptimizationState;
use crate::traits::CalendarService;
use crate::work_event::{FixedEvent, WorkEvent};

/// Puts office calendar events on the routes of their participants so the
/// service pro travels to the event location.
pub struct VisitCalendarEventLocation {
    calendar: Arc<dyn CalendarService>,
}

impl VisitCalendarEventLocation {
    pub fn new(calendar: Arc<dyn CalendarService>) -> Self {
        Self { calendar }
    }
}

impl GeneralRule for VisitCalendarEventLocation {
    fn id(&self) -> RuleId {
        RuleId::VisitCalendarEventLocation
    }

    fn apply(&self, state: &mut OptimizationState) -> Result<RuleOutcome, RuleError> {
        let events = self.calendar.events(state.office().id, state.date())?;
        if events.is_empty() {
            return Ok(RuleOutcome::NotTriggered);
        }

        let mut added = 0;
        for event in &events {
            for route in state.routes_mut() {
                if !event.participant_ids.contains(&route.service_pro.id) {
                    continue;
                }
                let present = route
                    .work_events()
                    .iter()
                    .any(|existing| matches!(existing, WorkEvent::Meeting(meeting) if meeting.id == event.id));
                if present {
                    continue;
                }

                debug!(route_id = route.id, event_id = event.id, "adding calendar event");
                route.add_work_event(WorkEvent::Meeting(FixedEvent {
                    id: event.id,
                    title: event.title.clone(),
                    time_window: event.time_window,
                    location: event.location,
                }));
                added += 1;
            }
        }

        Ok(RuleOutcome::applied_if(added > 0))
    }
}
