use std::sync::Arc;

use chrono::Duration;
use tracing::debug;

use crate::config::RuleSettings;
use crate::error::RuleError;
use crate::feature_flags::{FeatureFlag, FeatureGate};
use crate::labor::Season;
use crate::result::{RuleId, RuleOutcome};
use crate::rules::general::extend_within_shift;
use crate::rules::AdditionalRule;
use crate::state::OptimizationState;

/// Gives every route more time at the end of the day when the solver left
/// appointments unassigned, within the route type's longest shift.
pub struct ExtendRouteWorkingTime {
    features: Arc<FeatureGate>,
    extension: Duration,
}

impl ExtendRouteWorkingTime {
    pub fn new(features: Arc<FeatureGate>, settings: &RuleSettings) -> Self {
        Self {
            features,
            extension: Duration::minutes(settings.additional_working_time_minutes),
        }
    }
}

impl AdditionalRule for ExtendRouteWorkingTime {
    fn id(&self) -> RuleId {
        RuleId::ExtendRouteWorkingTime
    }

    fn apply(
        &self,
        source: &mut OptimizationState,
        result: &OptimizationState,
    ) -> Result<RuleOutcome, RuleError> {
        if result.unassigned_count() == 0 {
            return Ok(RuleOutcome::NotTriggered);
        }
        let office_id = source.office().id;
        if self
            .features
            .is_enabled(office_id, FeatureFlag::RestrictServiceProTimeAvailability)?
        {
            return Ok(RuleOutcome::Triggered);
        }

        let season = Season::for_date(source.date());
        let mut extended = false;
        for route in source.routes_mut() {
            if extend_within_shift(route, self.extension, season) {
                debug!(route_id = route.id, window = %route.time_window, "route working time extended");
                extended = true;
            }
        }

        Ok(RuleOutcome::applied_if(extended))
    }
}
