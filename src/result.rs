//! Rule identities and the audit records each rule run produces.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Every rule the pipeline can register. The identity is fixed here rather
/// than derived from the implementing type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RuleId {
    // General rules
    SetServiceDurationToAverage,
    SetServiceDurationWithPredictiveModel,
    VisitCalendarEventLocation,
    MustNotExceedMaxWorkingHours,
    RestrictTimeWindow,
    ExtendWorkingTime,
    AddExtraTimeToGetToFirstLocation,
    MustStartAtServiceProHomeLocation,
    MustEndAtServiceProHomeLocation,
    MustHaveBalancedWorkload,
    MustHaveWorkBreaks,
    MustHaveInsideSales,
    MustHaveRouteSummary,
    MustConsiderRoadTraffic,
    SetPreferredServicePro,
    LockFirstAppointment,
    // Additional rules
    IncreaseRouteCapacity,
    ShiftLockedAppointmentsTimeWindow,
    ExtendRouteWorkingTime,
}

impl RuleId {
    pub const ALL: [RuleId; 19] = [
        RuleId::SetServiceDurationToAverage,
        RuleId::SetServiceDurationWithPredictiveModel,
        RuleId::VisitCalendarEventLocation,
        RuleId::MustNotExceedMaxWorkingHours,
        RuleId::RestrictTimeWindow,
        RuleId::ExtendWorkingTime,
        RuleId::AddExtraTimeToGetToFirstLocation,
        RuleId::MustStartAtServiceProHomeLocation,
        RuleId::MustEndAtServiceProHomeLocation,
        RuleId::MustHaveBalancedWorkload,
        RuleId::MustHaveWorkBreaks,
        RuleId::MustHaveInsideSales,
        RuleId::MustHaveRouteSummary,
        RuleId::MustConsiderRoadTraffic,
        RuleId::SetPreferredServicePro,
        RuleId::LockFirstAppointment,
        RuleId::IncreaseRouteCapacity,
        RuleId::ShiftLockedAppointmentsTimeWindow,
        RuleId::ExtendRouteWorkingTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::SetServiceDurationToAverage => "SetServiceDurationToAverage",
            RuleId::SetServiceDurationWithPredictiveModel => "SetServiceDurationWithPredictiveModel",
            RuleId::VisitCalendarEventLocation => "VisitCalendarEventLocation",
            RuleId::MustNotExceedMaxWorkingHours => "MustNotExceedMaxWorkingHours",
            RuleId::RestrictTimeWindow => "RestrictTimeWindow",
            RuleId::ExtendWorkingTime => "ExtendWorkingTime",
            RuleId::AddExtraTimeToGetToFirstLocation => "AddExtraTimeToGetToFirstLocation",
            RuleId::MustStartAtServiceProHomeLocation => "MustStartAtServiceProHomeLocation",
            RuleId::MustEndAtServiceProHomeLocation => "MustEndAtServiceProHomeLocation",
            RuleId::MustHaveBalancedWorkload => "MustHaveBalancedWorkload",
            RuleId::MustHaveWorkBreaks => "MustHaveWorkBreaks",
            RuleId::MustHaveInsideSales => "MustHaveInsideSales",
            RuleId::MustHaveRouteSummary => "MustHaveRouteSummary",
            RuleId::MustConsiderRoadTraffic => "MustConsiderRoadTraffic",
            RuleId::SetPreferredServicePro => "SetPreferredServicePro",
            RuleId::LockFirstAppointment => "LockFirstAppointment",
            RuleId::IncreaseRouteCapacity => "IncreaseRouteCapacity",
            RuleId::ShiftLockedAppointmentsTimeWindow => "ShiftLockedAppointmentsTimeWindow",
            RuleId::ExtendRouteWorkingTime => "ExtendRouteWorkingTime",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RuleId::SetServiceDurationToAverage => "Set Service Duration To Average",
            RuleId::SetServiceDurationWithPredictiveModel => "Set Service Duration With Predictive Model",
            RuleId::VisitCalendarEventLocation => "Visit Calendar Event Location",
            RuleId::MustNotExceedMaxWorkingHours => "Must Not Exceed Max Working Hours",
            RuleId::RestrictTimeWindow => "Restrict Time Window",
            RuleId::ExtendWorkingTime => "Extend Working Time",
            RuleId::AddExtraTimeToGetToFirstLocation => "Add Extra Time To Get To First Location",
            RuleId::MustStartAtServiceProHomeLocation => "Must Start At Service Pro Home Location",
            RuleId::MustEndAtServiceProHomeLocation => "Must End At Service Pro Home Location",
            RuleId::MustHaveBalancedWorkload => "Must Have Balanced Workload",
            RuleId::MustHaveWorkBreaks => "Must Have Work Breaks",
            RuleId::MustHaveInsideSales => "Must Have Inside Sales",
            RuleId::MustHaveRouteSummary => "Must Have Route Summary",
            RuleId::MustConsiderRoadTraffic => "Must Consider Road Traffic",
            RuleId::SetPreferredServicePro => "Set Preferred Service Pro",
            RuleId::LockFirstAppointment => "Lock First Appointment",
            RuleId::IncreaseRouteCapacity => "Increase Route Capacity",
            RuleId::ShiftLockedAppointmentsTimeWindow => "Shift Locked Appointments Time Window",
            RuleId::ExtendRouteWorkingTime => "Extend Route Working Time",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RuleId::SetServiceDurationToAverage => {
                "Sets follow-up service durations to the customer's historical average."
            }
            RuleId::SetServiceDurationWithPredictiveModel => {
                "Sets service durations from the predictive model, falling back to the historical average."
            }
            RuleId::VisitCalendarEventLocation => {
                "Adds office calendar events to the routes of their participants."
            }
            RuleId::MustNotExceedMaxWorkingHours => {
                "Limits the working day to the maximum work time plus breaks for the route type and season."
            }
            RuleId::RestrictTimeWindow => {
                "Restricts service pro availability to the office working hours."
            }
            RuleId::ExtendWorkingTime => {
                "Extends the working day without exceeding the maximum shift length."
            }
            RuleId::AddExtraTimeToGetToFirstLocation => {
                "Adds travel time from home to the first and from the last stop."
            }
            RuleId::MustStartAtServiceProHomeLocation => "Routes start at the service pro's home.",
            RuleId::MustEndAtServiceProHomeLocation => "Routes end at the service pro's home.",
            RuleId::MustHaveBalancedWorkload => {
                "Distributes appointments across routes proportionally to their capacity."
            }
            RuleId::MustHaveWorkBreaks => "Adds mandatory work breaks and lunch.",
            RuleId::MustHaveInsideSales => "Reserves time for inside sales at the end of the day.",
            RuleId::MustHaveRouteSummary => "Requests a route summary after optimization.",
            RuleId::MustConsiderRoadTraffic => "Road traffic is not considered yet.",
            RuleId::SetPreferredServicePro => {
                "Makes appointments prefer the customer's preferred service pro."
            }
            RuleId::LockFirstAppointment => "Locks the first appointment of each route.",
            RuleId::IncreaseRouteCapacity => {
                "Increases the capacity of the least loaded routes to place unassigned appointments."
            }
            RuleId::ShiftLockedAppointmentsTimeWindow => {
                "Widens the expected arrival of locked appointments the solver could not place."
            }
            RuleId::ExtendRouteWorkingTime => {
                "Extends working time when appointments remain unassigned."
            }
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRuleId(pub String);

impl fmt::Display for UnknownRuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown rule id: {}", self.0)
    }
}

impl std::error::Error for UnknownRuleId {}

impl FromStr for RuleId {
    type Err = UnknownRuleId;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        RuleId::ALL
            .into_iter()
            .find(|rule_id| rule_id.as_str() == value)
            .ok_or_else(|| UnknownRuleId(value.to_string()))
    }
}

/// What a rule did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    /// Precondition did not match.
    NotTriggered,
    /// Precondition matched but nothing changed.
    Triggered,
    Applied,
}

impl RuleOutcome {
    pub fn applied_if(changed: bool) -> Self {
        if changed {
            RuleOutcome::Applied
        } else {
            RuleOutcome::Triggered
        }
    }
}

/// Immutable audit record of one rule invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleExecutionResult {
    rule_id: RuleId,
    name: String,
    description: String,
    triggered: bool,
    applied: bool,
}

impl RuleExecutionResult {
    pub fn new(rule_id: RuleId, triggered: bool, applied: bool) -> Self {
        Self {
            rule_id,
            name: rule_id.name().to_string(),
            description: rule_id.description().to_string(),
            triggered,
            applied,
        }
    }

    pub fn from_outcome(rule_id: RuleId, outcome: RuleOutcome) -> Self {
        match outcome {
            RuleOutcome::NotTriggered => Self::new(rule_id, false, false),
            RuleOutcome::Triggered => Self::new(rule_id, true, false),
            RuleOutcome::Applied => Self::new(rule_id, true, true),
        }
    }

    /// Result of an administratively disabled rule.
    pub fn skipped(rule_id: RuleId) -> Self {
        Self::new(rule_id, false, false)
    }

    pub fn rule_id(&self) -> RuleId {
        self.rule_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    pub fn is_applied(&self) -> bool {
        self.applied
    }
}
