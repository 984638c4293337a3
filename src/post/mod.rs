//! Post-optimization rules and the casters that write their effect to the
//! CRM.

mod confirmed_appointments;
mod estimated_duration;
mod route_summary;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CasterError, PipelineError};
use crate::state::OptimizationState;
use crate::traits::CrmClient;

pub use confirmed_appointments::DetectRescheduledConfirmedAppointmentsCaster;
pub use estimated_duration::{with_estimated_duration, SetAppointmentEstimatedDurationCaster};
pub use route_summary::{route_summary, MustUpdateRouteSummaryCaster};

/// Closed set of post-optimization rule kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostOptimizationRule {
    MustUpdateRouteSummary,
    SetAppointmentEstimatedDuration,
    DetectRescheduledConfirmedAppointments,
}

impl PostOptimizationRule {
    pub const ALL: [PostOptimizationRule; 3] = [
        PostOptimizationRule::MustUpdateRouteSummary,
        PostOptimizationRule::SetAppointmentEstimatedDuration,
        PostOptimizationRule::DetectRescheduledConfirmedAppointments,
    ];
}

/// Translates one post rule into CRM calls. Returns how many records it
/// touched (or, for detectors, found).
pub trait Caster: Send + Sync {
    fn cast(&self, state: &OptimizationState) -> Result<usize, CasterError>;
}

/// Rule kind to caster table, fixed at construction.
#[derive(Default)]
pub struct PostOptimizationDispatcher {
    casters: HashMap<PostOptimizationRule, Box<dyn Caster>>,
}

impl PostOptimizationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_casters(crm: Arc<dyn CrmClient>) -> Self {
        Self::new()
            .register(
                PostOptimizationRule::MustUpdateRouteSummary,
                MustUpdateRouteSummaryCaster::new(crm.clone()),
            )
            .register(
                PostOptimizationRule::SetAppointmentEstimatedDuration,
                SetAppointmentEstimatedDurationCaster::new(crm.clone()),
            )
            .register(
                PostOptimizationRule::DetectRescheduledConfirmedAppointments,
                DetectRescheduledConfirmedAppointmentsCaster::new(crm),
            )
    }

    pub fn register(mut self, rule: PostOptimizationRule, caster: impl Caster + 'static) -> Self {
        self.casters.insert(rule, Box::new(caster));
        self
    }

    pub fn has_caster(&self, rule: PostOptimizationRule) -> bool {
        self.casters.contains_key(&rule)
    }

    /// Runs the caster of each rule in order. Rules without a caster are
    /// skipped.
    pub fn dispatch(&self, state: &OptimizationState, rules: &[PostOptimizationRule]) -> Result<usize, PipelineError> {
        let mut total = 0;

        for &rule in rules {
            let Some(caster) = self.casters.get(&rule) else {
                debug!(?rule, "no caster registered, skipping");
                continue;
            };
            let count = caster
                .cast(state)
                .map_err(|source| PipelineError::Caster { rule, source })?;
            info!(?rule, count, state_id = %state.id(), "post-optimization rule cast");
            total += count;
        }

        Ok(total)
    }
}
