use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use crate::config::RuleSettings;
use crate::error::RuleError;
use crate::result::{RuleId, RuleOutcome};
use crate::route::Route;
use crate::rules::GeneralRule;
use crate::state::OptimizationState;
use crate::time::TimeWindow;
use crate::work_event::{Break, WorkEvent};

const FIRST_BREAK_MIN_CAPACITY: u32 = 4;
const LUNCH_MIN_CAPACITY: u32 = 6;
const SECOND_BREAK_MIN_CAPACITY: u32 = 8;

/// Regenerates the paid breaks and lunch of every route.
///
/// The number of breaks depends on the route capacity. A break whose
/// expected arrival overlaps a meeting or reserved time, or falls outside
/// the route window, is dropped.
pub struct MustHaveWorkBreaks {
    first_break_offset: Duration,
    lunch_offset: Duration,
    second_break_offset: Duration,
    window: Duration,
    break_duration: Duration,
    lunch_duration: Duration,
}

impl MustHaveWorkBreaks {
    pub fn new(settings: &RuleSettings) -> Self {
        Self {
            first_break_offset: Duration::minutes(settings.first_break_offset_minutes),
            lunch_offset: Duration::minutes(settings.lunch_offset_minutes),
            second_break_offset: Duration::minutes(settings.second_break_offset_minutes),
            window: Duration::minutes(settings.break_window_minutes),
            break_duration: Duration::minutes(settings.break_duration_minutes),
            lunch_duration: Duration::minutes(settings.lunch_duration_minutes),
        }
    }

    fn candidates(&self, capacity: u32, day_start: NaiveDateTime) -> Vec<WorkEvent> {
        let make = |id: i64, description: &str, offset: Duration, duration: Duration| Break {
            id,
            description: description.to_string(),
            expected_arrival: TimeWindow::starting_at(day_start + offset, self.window),
            duration,
        };

        let mut breaks = Vec::new();
        if capacity >= FIRST_BREAK_MIN_CAPACITY {
            breaks.push(WorkEvent::WorkBreak(make(
                1,
                "First break",
                self.first_break_offset,
                self.break_duration,
            )));
        }
        if capacity >= LUNCH_MIN_CAPACITY {
            breaks.push(WorkEvent::Lunch(make(
                2,
                "Lunch",
                self.lunch_offset,
                self.lunch_duration,
            )));
        }
        if capacity >= SECOND_BREAK_MIN_CAPACITY {
            breaks.push(WorkEvent::WorkBreak(make(
                3,
                "Second break",
                self.second_break_offset,
                self.break_duration,
            )));
        }
        breaks
    }

    fn regenerate(&self, route: &mut Route, day_start: NaiveDateTime) -> bool {
        let previous: Vec<WorkEvent> = route.breaks().cloned().collect();
        route.remove_work_events(WorkEvent::is_break);

        for candidate in self.candidates(route.capacity(), day_start) {
            let window = candidate.expected_arrival();
            if !route.time_window.contains_window(&window) {
                debug!(
                    route_id = route.id,
                    break_id = candidate.id(),
                    "break falls outside the route window, skipping"
                );
                continue;
            }
            let blocked_by = route
                .fixed_events()
                .find(|fixed| fixed.expected_arrival().overlaps(&window))
                .map(WorkEvent::id);

            if let Some(fixed_id) = blocked_by {
                debug!(
                    route_id = route.id,
                    break_id = candidate.id(),
                    fixed_event_id = fixed_id,
                    "break overlaps a fixed event, skipping"
                );
                continue;
            }
            route.add_work_event(candidate);
        }

        let current: Vec<&WorkEvent> = route.breaks().collect();
        current.len() != previous.len() || current.iter().zip(&previous).any(|(a, b)| *a != b)
    }
}

impl GeneralRule for MustHaveWorkBreaks {
    fn id(&self) -> RuleId {
        RuleId::MustHaveWorkBreaks
    }

    fn apply(&self, state: &mut OptimizationState) -> Result<RuleOutcome, RuleError> {
        let date = state.date();
        let mut changed = false;

        for route in state.routes_mut() {
            let day_start = route.service_pro.day_start(date);
            changed |= self.regenerate(route, day_start);
        }

        Ok(RuleOutcome::applied_if(changed))
    }
}
