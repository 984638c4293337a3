//! Rules that shape each route's working window.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, info};

use crate::config::RuleSettings;
use crate::error::RuleError;
use crate::feature_flags::{FeatureFlag, FeatureGate};
use crate::labor::{Season, WorkTimeLimits};
use crate::result::{RuleId, RuleOutcome};
use crate::route::{Route, WindowAdjustments};
use crate::rules::GeneralRule;
use crate::state::OptimizationState;
use crate::time::TimeWindow;

/// Latest end of the working window: the route type's longest shift from
/// the window start, plus the travel allowance added on both ends.
fn latest_shift_end(route: &Route, season: Season) -> NaiveDateTime {
    let limits = WorkTimeLimits::for_route(route.route_type, season);
    let allowance = Duration::minutes(route.adjustments.travel_allowance_minutes);
    route.time_window.start() + limits.max_shift_time() + allowance + allowance
}

/// Moves the route's end later by `extension`. When that would pass the
/// longest shift, the end is pulled back to the shift end instead, which
/// shortens a window that was already too long. Returns true if the window
/// changed.
pub(crate) fn extend_within_shift(route: &mut Route, extension: Duration, season: Season) -> bool {
    let window = route.time_window;
    let end = (window.end() + extension).min(latest_shift_end(route, season));

    if end == window.end() {
        return false;
    }
    route.time_window = window.with_end(end);
    true
}

/// Working window: service pro start plus maximum work time and breaks.
pub struct MustNotExceedMaxWorkingHours;

impl GeneralRule for MustNotExceedMaxWorkingHours {
    fn id(&self) -> RuleId {
        RuleId::MustNotExceedMaxWorkingHours
    }

    fn apply(&self, state: &mut OptimizationState) -> Result<RuleOutcome, RuleError> {
        let date = state.date();
        let season = Season::for_date(date);
        let mut changed = false;

        for route in state.routes_mut() {
            let limits = WorkTimeLimits::for_route(route.route_type, season);
            let start = route.service_pro.day_start(date);
            let window = TimeWindow::new(start, start + limits.max_shift_time());

            if route.time_window != window {
                debug!(route_id = route.id, %window, "limiting working hours");
                route.time_window = window;
                // The window is rebuilt from scratch, later adjustments apply again.
                route.adjustments = WindowAdjustments::default();
                changed = true;
            }
        }

        Ok(RuleOutcome::applied_if(changed))
    }
}

fn office_hour(date: NaiveDate, hour: u32) -> Result<NaiveDateTime, RuleError> {
    NaiveTime::from_hms_opt(hour, 0, 0)
        .map(|time| date.and_time(time))
        .ok_or_else(|| RuleError::InvalidSetting(format!("{hour} is not a valid hour")))
}

/// Clamps availability to office hours when the office restricts it.
pub struct RestrictTimeWindow {
    features: Arc<FeatureGate>,
    start_hour: u32,
    end_hour: u32,
}

impl RestrictTimeWindow {
    pub fn new(features: Arc<FeatureGate>, settings: &RuleSettings) -> Self {
        Self {
            features,
            start_hour: settings.restricted_start_hour,
            end_hour: settings.restricted_end_hour,
        }
    }
}

impl GeneralRule for RestrictTimeWindow {
    fn id(&self) -> RuleId {
        RuleId::RestrictTimeWindow
    }

    fn apply(&self, state: &mut OptimizationState) -> Result<RuleOutcome, RuleError> {
        let office_id = state.office().id;
        if !self
            .features
            .is_enabled(office_id, FeatureFlag::RestrictServiceProTimeAvailability)?
        {
            debug!(office_id, "availability not restricted, working time is extended instead");
            return Ok(RuleOutcome::Triggered);
        }

        let date = state.date();
        let earliest = office_hour(date, self.start_hour)?;
        let latest = office_hour(date, self.end_hour)?;

        for route in state.routes_mut() {
            let window = route.time_window;
            route.time_window = TimeWindow::new(window.start().max(earliest), window.end().min(latest));
        }

        info!(office_id, "service pro availability restricted to office hours");
        Ok(RuleOutcome::Applied)
    }
}

/// Extends the working day unless the office restricts availability.
pub struct ExtendWorkingTime {
    features: Arc<FeatureGate>,
    extension: Duration,
}

impl ExtendWorkingTime {
    pub fn new(features: Arc<FeatureGate>, settings: &RuleSettings) -> Self {
        Self {
            features,
            extension: Duration::minutes(settings.extend_working_time_minutes),
        }
    }
}

impl GeneralRule for ExtendWorkingTime {
    fn id(&self) -> RuleId {
        RuleId::ExtendWorkingTime
    }

    fn apply(&self, state: &mut OptimizationState) -> Result<RuleOutcome, RuleError> {
        let office_id = state.office().id;
        if self
            .features
            .is_enabled(office_id, FeatureFlag::RestrictServiceProTimeAvailability)?
        {
            debug!(office_id, "availability restricted, not extending working time");
            return Ok(RuleOutcome::Triggered);
        }

        let season = Season::for_date(state.date());
        let mut changed = false;

        for route in state.routes_mut() {
            if route.adjustments.working_time_extended {
                continue;
            }
            route.adjustments.working_time_extended = true;
            if extend_within_shift(route, self.extension, season) {
                debug!(route_id = route.id, window = %route.time_window, "working time extended");
                changed = true;
            }
        }

        Ok(RuleOutcome::applied_if(changed))
    }
}

/// Gives the service pro time to drive from home to the first stop and back
/// from the last one.
pub struct AddExtraTimeToGetToFirstLocation {
    allowance_minutes: i64,
}

impl AddExtraTimeToGetToFirstLocation {
    pub fn new(settings: &RuleSettings) -> Self {
        Self {
            allowance_minutes: settings.extra_time_to_first_location_minutes,
        }
    }
}

impl GeneralRule for AddExtraTimeToGetToFirstLocation {
    fn id(&self) -> RuleId {
        RuleId::AddExtraTimeToGetToFirstLocation
    }

    fn apply(&self, state: &mut OptimizationState) -> Result<RuleOutcome, RuleError> {
        let mut changed = false;

        for route in state.routes_mut() {
            let missing = self.allowance_minutes - route.adjustments.travel_allowance_minutes;
            if missing == 0 {
                continue;
            }
            let extra = Duration::minutes(missing);
            route.time_window = route.time_window.widen(extra, extra);
            route.adjustments.travel_allowance_minutes = self.allowance_minutes;
            changed = true;
        }

        Ok(RuleOutcome::applied_if(changed))
    }
}
