//! Per-route switches for the solver.

use std::sync::Arc;

use chrono::Duration;

use crate::config::RuleSettings;
use crate::error::RuleError;
use crate::feature_flags::{FeatureFlag, FeatureGate};
use crate::result::{RuleId, RuleOutcome};
use crate::rules::GeneralRule;
use crate::state::OptimizationState;
use crate::time::TimeWindow;
use crate::work_event::{ExtraWork, ExtraWorkKind, WorkEvent};

pub struct MustStartAtServiceProHomeLocation;

impl GeneralRule for MustStartAtServiceProHomeLocation {
    fn id(&self) -> RuleId {
        RuleId::MustStartAtServiceProHomeLocation
    }

    fn apply(&self, state: &mut OptimizationState) -> Result<RuleOutcome, RuleError> {
        let mut changed = false;
        for route in state.routes_mut() {
            let home = Some(route.service_pro.home_location);
            if route.start_location != home {
                route.start_location = home;
                changed = true;
            }
        }
        Ok(RuleOutcome::applied_if(changed))
    }
}

pub struct MustEndAtServiceProHomeLocation;

impl GeneralRule for MustEndAtServiceProHomeLocation {
    fn id(&self) -> RuleId {
        RuleId::MustEndAtServiceProHomeLocation
    }

    fn apply(&self, state: &mut OptimizationState) -> Result<RuleOutcome, RuleError> {
        let mut changed = false;
        for route in state.routes_mut() {
            let home = Some(route.service_pro.home_location);
            if route.end_location != home {
                route.end_location = home;
                changed = true;
            }
        }
        Ok(RuleOutcome::applied_if(changed))
    }
}

/// Reserves inside-sales time in the last hour of each route.
pub struct MustHaveInsideSales {
    features: Arc<FeatureGate>,
    duration: Duration,
}

impl MustHaveInsideSales {
    pub fn new(features: Arc<FeatureGate>, settings: &RuleSettings) -> Self {
        Self {
            features,
            duration: Duration::minutes(settings.inside_sales_duration_minutes),
        }
    }
}

fn is_inside_sales(event: &WorkEvent) -> bool {
    matches!(event, WorkEvent::ExtraWork(extra) if extra.kind == ExtraWorkKind::InsideSales)
}

impl GeneralRule for MustHaveInsideSales {
    fn id(&self) -> RuleId {
        RuleId::MustHaveInsideSales
    }

    fn apply(&self, state: &mut OptimizationState) -> Result<RuleOutcome, RuleError> {
        if !self.features.is_enabled(state.office().id, FeatureFlag::InsideSales)? {
            return Ok(RuleOutcome::NotTriggered);
        }

        let mut changed = false;
        for route in state.routes_mut() {
            let end = route.time_window.end();
            let inside_sales = WorkEvent::ExtraWork(ExtraWork {
                id: route.id,
                kind: ExtraWorkKind::InsideSales,
                expected_arrival: TimeWindow::new(end - Duration::hours(1), end),
                duration: self.duration,
            });

            let previous = route.work_events().iter().find(|event| is_inside_sales(event)).cloned();
            if previous.as_ref() == Some(&inside_sales) {
                continue;
            }
            route.remove_work_events(is_inside_sales);
            route.add_work_event(inside_sales);
            changed = true;
        }

        Ok(RuleOutcome::applied_if(changed))
    }
}

/// Marks routes whose summary is written back to the CRM after optimization.
pub struct MustHaveRouteSummary {
    features: Arc<FeatureGate>,
}

impl MustHaveRouteSummary {
    pub fn new(features: Arc<FeatureGate>) -> Self {
        Self { features }
    }
}

impl GeneralRule for MustHaveRouteSummary {
    fn id(&self) -> RuleId {
        RuleId::MustHaveRouteSummary
    }

    fn apply(&self, state: &mut OptimizationState) -> Result<RuleOutcome, RuleError> {
        if !self.features.is_enabled(state.office().id, FeatureFlag::RouteSummary)? {
            return Ok(RuleOutcome::NotTriggered);
        }

        let mut changed = false;
        for route in state.routes_mut().iter_mut().filter(|route| !route.summary_enabled) {
            route.summary_enabled = true;
            changed = true;
        }
        Ok(RuleOutcome::applied_if(changed))
    }
}

/// Placeholder until traffic data is available to the solver.
pub struct MustConsiderRoadTraffic;

impl GeneralRule for MustConsiderRoadTraffic {
    fn id(&self) -> RuleId {
        RuleId::MustConsiderRoadTraffic
    }

    fn apply(&self, _state: &mut OptimizationState) -> Result<RuleOutcome, RuleError> {
        Ok(RuleOutcome::Triggered)
    }
}
