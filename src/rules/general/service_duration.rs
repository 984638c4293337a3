//! Service-duration estimation rules.

use std::sync::Arc;

use chrono::Duration;
use tracing::debug;

use crate::config::RuleSettings;
use crate::error::RuleError;
use crate::feature_flags::{FeatureFlag, FeatureGate};
use crate::result::{RuleId, RuleOutcome};
use crate::rules::GeneralRule;
use crate::state::OptimizationState;
use crate::traits::{AppointmentHistoryService, ServiceDurationPredictor};
use crate::work_event::Appointment;

#[derive(Debug, Clone, Copy)]
struct DurationBounds {
    min: Duration,
    max: Duration,
}

impl DurationBounds {
    fn from_settings(settings: &RuleSettings) -> Self {
        Self {
            min: Duration::minutes(settings.min_service_duration_minutes),
            max: Duration::minutes(settings.max_service_duration_minutes),
        }
    }

    fn clamp(&self, duration: Duration) -> Duration {
        duration.max(self.min).min(self.max)
    }
}

/// Historical average for follow-up services. Initial services keep their
/// booked duration.
fn average_duration(
    history: &dyn AppointmentHistoryService,
    appointment: &Appointment,
    bounds: DurationBounds,
) -> Result<Option<Duration>, RuleError> {
    if appointment.is_initial() {
        return Ok(None);
    }
    Ok(history
        .average_duration(appointment.customer_id)?
        .map(|average| bounds.clamp(average)))
}

fn set_duration(appointment: &mut Appointment, duration: Duration) -> bool {
    if appointment.duration == duration {
        return false;
    }
    debug!(
        appointment_id = appointment.id,
        from = appointment.duration.num_minutes(),
        to = duration.num_minutes(),
        "service duration updated"
    );
    appointment.duration = duration;
    true
}

pub struct SetServiceDurationToAverage {
    history: Arc<dyn AppointmentHistoryService>,
    bounds: DurationBounds,
}

impl SetServiceDurationToAverage {
    pub fn new(history: Arc<dyn AppointmentHistoryService>, settings: &RuleSettings) -> Self {
        Self {
            history,
            bounds: DurationBounds::from_settings(settings),
        }
    }
}

impl GeneralRule for SetServiceDurationToAverage {
    fn id(&self) -> RuleId {
        RuleId::SetServiceDurationToAverage
    }

    fn apply(&self, state: &mut OptimizationState) -> Result<RuleOutcome, RuleError> {
        let mut changed = false;
        for appointment in state.all_appointments_mut() {
            if let Some(average) = average_duration(self.history.as_ref(), appointment, self.bounds)? {
                changed |= set_duration(appointment, average);
            }
        }
        Ok(RuleOutcome::applied_if(changed))
    }
}

/// Uses the predictive model where it has data, the historical average
/// otherwise.
pub struct SetServiceDurationWithPredictiveModel {
    features: Arc<FeatureGate>,
    predictor: Arc<dyn ServiceDurationPredictor>,
    history: Arc<dyn AppointmentHistoryService>,
    bounds: DurationBounds,
}

impl SetServiceDurationWithPredictiveModel {
    pub fn new(
        features: Arc<FeatureGate>,
        predictor: Arc<dyn ServiceDurationPredictor>,
        history: Arc<dyn AppointmentHistoryService>,
        settings: &RuleSettings,
    ) -> Self {
        Self {
            features,
            predictor,
            history,
            bounds: DurationBounds::from_settings(settings),
        }
    }
}

impl GeneralRule for SetServiceDurationWithPredictiveModel {
    fn id(&self) -> RuleId {
        RuleId::SetServiceDurationWithPredictiveModel
    }

    fn apply(&self, state: &mut OptimizationState) -> Result<RuleOutcome, RuleError> {
        if !self
            .features
            .is_enabled(state.office().id, FeatureFlag::PredictiveServiceDuration)?
        {
            return Ok(RuleOutcome::NotTriggered);
        }

        let mut changed = false;
        for appointment in state.all_appointments_mut() {
            let duration = match self.predictor.predict(appointment)? {
                Some(predicted) => Some(self.bounds.clamp(predicted)),
                None => average_duration(self.history.as_ref(), appointment, self.bounds)?,
            };
            if let Some(duration) = duration {
                changed |= set_duration(appointment, duration);
            }
        }
        Ok(RuleOutcome::applied_if(changed))
    }
}
