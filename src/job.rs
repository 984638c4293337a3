//! Job boundary: one office and date per run.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::PipelineError;
use crate::feature_flags::FeatureGate;
use crate::params::OptimizationParams;
use crate::pipeline::{OptimizationPipeline, PipelineOutput};
use crate::post::{PostOptimizationDispatcher, PostOptimizationRule};
use crate::traits::{DataResolver, Solver, StateRepository};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed {
        state_id: Uuid,
        assigned: usize,
        unassigned: usize,
        solver_runs: usize,
    },
    /// Nothing to optimize for this office and date.
    Skipped { reason: String },
}

pub struct OptimizationJob {
    resolver: Arc<dyn DataResolver>,
    solver: Arc<dyn Solver>,
    repository: Arc<dyn StateRepository>,
    features: Arc<FeatureGate>,
    pipeline: OptimizationPipeline,
    dispatcher: PostOptimizationDispatcher,
    post_rules: Vec<PostOptimizationRule>,
}

impl OptimizationJob {
    pub fn new(
        resolver: Arc<dyn DataResolver>,
        solver: Arc<dyn Solver>,
        repository: Arc<dyn StateRepository>,
        features: Arc<FeatureGate>,
        pipeline: OptimizationPipeline,
        dispatcher: PostOptimizationDispatcher,
    ) -> Self {
        Self {
            resolver,
            solver,
            repository,
            features,
            pipeline,
            dispatcher,
            post_rules: PostOptimizationRule::ALL.to_vec(),
        }
    }

    pub fn with_post_rules(mut self, post_rules: Vec<PostOptimizationRule>) -> Self {
        self.post_rules = post_rules;
        self
    }

    /// Data-availability faults end the run as `Skipped`. Any other failure
    /// is logged and returned; nothing is saved in that case.
    pub fn run(
        &self,
        office_id: i64,
        date: NaiveDate,
        params: OptimizationParams,
    ) -> Result<JobOutcome, PipelineError> {
        self.execute(office_id, date, params).inspect_err(|err| {
            error!(office_id, %date, error = %err, "optimization failed");
        })
    }

    fn execute(
        &self,
        office_id: i64,
        date: NaiveDate,
        params: OptimizationParams,
    ) -> Result<JobOutcome, PipelineError> {
        self.features.clear();
        let params = params.with_disabled_rules(self.features.disabled_rules(office_id)?);
        let simulation = params.simulation_run;

        let state = match self.resolver.resolve(date, office_id, &params) {
            Ok(state) => state,
            Err(err) if err.is_data_availability() => {
                info!(office_id, %date, reason = %err, "nothing to optimize");
                return Ok(JobOutcome::Skipped {
                    reason: err.to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        };

        if state.total_max_capacity() == 0 {
            let reason = format!("routes of office {office_id} on {date} have no capacity");
            info!(office_id, %date, "nothing to optimize, no capacity");
            return Ok(JobOutcome::Skipped { reason });
        }

        let PipelineOutput {
            source,
            result,
            solver_runs,
        } = self.pipeline.run(state, self.solver.as_ref())?;

        if simulation {
            info!(office_id, %date, state_id = %result.id(), "simulation finished, not persisting");
        } else {
            self.repository.save_run(&source, &result)?;
            self.dispatcher.dispatch(&result, &self.post_rules)?;
        }

        let unassigned = result.unassigned_count();
        let outcome = JobOutcome::Completed {
            state_id: result.id(),
            assigned: result.total_appointments() - unassigned,
            unassigned,
            solver_runs,
        };
        info!(office_id, %date, ?outcome, "optimization completed");
        Ok(outcome)
    }
}
