//! Business rules applied around the solver.
//!
//! General rules shape a single state before the solver runs. Additional
//! rules compare the solver's result with the state it was given and correct
//! the source for another solver run.

pub mod additional;
pub mod general;

use std::sync::Arc;

use tracing::debug;

use crate::config::RuleSettings;
use crate::error::RuleError;
use crate::feature_flags::FeatureGate;
use crate::result::{RuleExecutionResult, RuleId, RuleOutcome};
use crate::state::OptimizationState;
use crate::traits::{
    AppointmentHistoryService, BusinessDaysService, CalendarService, ServiceDurationPredictor,
};

/// Pre-solve rule over a single state.
pub trait GeneralRule: Send + Sync {
    fn id(&self) -> RuleId;

    /// Rule body; only called when the rule is enabled.
    fn apply(&self, state: &mut OptimizationState) -> Result<RuleOutcome, RuleError>;

    fn process(&self, state: &mut OptimizationState) -> Result<RuleExecutionResult, RuleError> {
        if state.is_rule_disabled(self.id()) {
            debug!(rule = %self.id(), "rule disabled, skipping");
            return Ok(RuleExecutionResult::skipped(self.id()));
        }

        let outcome = self.apply(state)?;
        Ok(RuleExecutionResult::from_outcome(self.id(), outcome))
    }
}

/// Post-solve rule correcting `source` from what the solver made of it.
pub trait AdditionalRule: Send + Sync {
    fn id(&self) -> RuleId;

    fn apply(
        &self,
        source: &mut OptimizationState,
        result: &OptimizationState,
    ) -> Result<RuleOutcome, RuleError>;

    fn is_skipped(&self, source: &OptimizationState) -> bool {
        source.is_rule_disabled(self.id())
    }

    /// Mutates `source` and appends this rule's result to it.
    fn process(
        &self,
        source: &mut OptimizationState,
        result: &OptimizationState,
    ) -> Result<(), RuleError> {
        let record = if self.is_skipped(source) {
            debug!(rule = %self.id(), "rule disabled, skipping");
            RuleExecutionResult::skipped(self.id())
        } else {
            let outcome = self.apply(source, result)?;
            RuleExecutionResult::from_outcome(self.id(), outcome)
        };

        source.add_rule_execution_result(record);
        Ok(())
    }
}

/// Collaborators shared by the rule catalog.
#[derive(Clone)]
pub struct RuleServices {
    pub features: Arc<FeatureGate>,
    pub business_days: Arc<dyn BusinessDaysService>,
    pub history: Arc<dyn AppointmentHistoryService>,
    pub predictor: Arc<dyn ServiceDurationPredictor>,
    pub calendar: Arc<dyn CalendarService>,
}

/// General rules in their declared order.
pub fn general_rules(services: &RuleServices, settings: &RuleSettings) -> Vec<Box<dyn GeneralRule>> {
    use general::*;

    vec![
        Box::new(SetServiceDurationToAverage::new(services.history.clone(), settings)),
        Box::new(SetServiceDurationWithPredictiveModel::new(
            services.features.clone(),
            services.predictor.clone(),
            services.history.clone(),
            settings,
        )),
        Box::new(VisitCalendarEventLocation::new(services.calendar.clone())),
        Box::new(MustNotExceedMaxWorkingHours),
        Box::new(RestrictTimeWindow::new(services.features.clone(), settings)),
        Box::new(ExtendWorkingTime::new(services.features.clone(), settings)),
        Box::new(AddExtraTimeToGetToFirstLocation::new(settings)),
        Box::new(MustStartAtServiceProHomeLocation),
        Box::new(MustEndAtServiceProHomeLocation),
        Box::new(MustHaveBalancedWorkload),
        Box::new(MustHaveWorkBreaks::new(settings)),
        Box::new(MustHaveInsideSales::new(services.features.clone(), settings)),
        Box::new(MustHaveRouteSummary::new(services.features.clone())),
        Box::new(MustConsiderRoadTraffic),
        Box::new(SetPreferredServicePro),
        Box::new(LockFirstAppointment::new(services.business_days.clone())),
    ]
}

/// Additional rules in their declared order.
pub fn additional_rules(services: &RuleServices, settings: &RuleSettings) -> Vec<Box<dyn AdditionalRule>> {
    use additional::*;

    vec![
        Box::new(IncreaseRouteCapacity),
        Box::new(ShiftLockedAppointmentsTimeWindow::new(settings)),
        Box::new(ExtendRouteWorkingTime::new(services.features.clone(), settings)),
    ]
}
