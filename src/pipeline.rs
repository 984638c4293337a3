//! Pipeline orchestrator: General rules, solver, Additional rules.

use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::rules::{additional_rules, general_rules, AdditionalRule, GeneralRule, RuleServices};
use crate::state::OptimizationState;
use crate::traits::Solver;

/// Output of a full run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// The solver input after every correction.
    pub source: OptimizationState,
    /// The last solver result, marked `Post`, carrying the source's audit
    /// trail.
    pub result: OptimizationState,
    pub solver_runs: usize,
}

pub struct OptimizationPipeline {
    general: Vec<Box<dyn GeneralRule>>,
    additional: Vec<Box<dyn AdditionalRule>>,
    max_solver_runs: usize,
}

impl OptimizationPipeline {
    /// Rules run in the order given.
    pub fn new(
        general: Vec<Box<dyn GeneralRule>>,
        additional: Vec<Box<dyn AdditionalRule>>,
        max_solver_runs: usize,
    ) -> Self {
        Self {
            general,
            additional,
            max_solver_runs: max_solver_runs.max(1),
        }
    }

    /// The full rule catalog in its declared order.
    pub fn with_defaults(services: &RuleServices, config: &PipelineConfig) -> Self {
        Self::new(
            general_rules(services, &config.rules),
            additional_rules(services, &config.rules),
            config.max_solver_runs,
        )
    }

    pub fn general_rules(&self) -> &[Box<dyn GeneralRule>] {
        &self.general
    }

    pub fn additional_rules(&self) -> &[Box<dyn AdditionalRule>] {
        &self.additional
    }

    /// Runs every General rule against `state`, appending one result per rule.
    /// The first failing rule aborts the phase.
    pub fn run_general_phase(&self, state: &mut OptimizationState) -> Result<(), PipelineError> {
        for rule in &self.general {
            let result = rule
                .process(state)
                .map_err(|source| PipelineError::Rule { rule: rule.id(), source })?;
            debug!(
                rule = %rule.id(),
                triggered = result.is_triggered(),
                applied = result.is_applied(),
                "general rule processed"
            );
            state.add_rule_execution_result(result);
        }
        Ok(())
    }

    /// Runs every Additional rule against `source`. Returns true if any of
    /// them changed it.
    pub fn run_additional_phase(
        &self,
        source: &mut OptimizationState,
        result: &OptimizationState,
    ) -> Result<bool, PipelineError> {
        let recorded = source.rule_execution_results().len();

        for rule in &self.additional {
            rule.process(source, result)
                .map_err(|err| PipelineError::Rule { rule: rule.id(), source: err })?;
        }

        let applied = source.rule_execution_results()[recorded..]
            .iter()
            .any(|record| record.is_applied());
        Ok(applied)
    }

    pub fn run(&self, mut state: OptimizationState, solver: &dyn Solver) -> Result<PipelineOutput, PipelineError> {
        info!(
            state_id = %state.id(),
            office_id = state.office().id,
            date = %state.date(),
            routes = state.routes().len(),
            appointments = state.total_appointments(),
            "starting optimization pipeline"
        );

        self.run_general_phase(&mut state)?;
        state.validate()?;

        let mut source = state;
        let mut result = solver.optimize(source.clone())?;
        let mut solver_runs = 1;

        while result.unassigned_count() > 0 && solver_runs < self.max_solver_runs {
            debug!(unassigned = result.unassigned_count(), solver_runs, "running additional rules");
            if !self.run_additional_phase(&mut source, &result)? {
                break;
            }
            result = solver.optimize(source.clone())?;
            solver_runs += 1;
        }

        if result.unassigned_count() > 0 {
            warn!(
                state_id = %source.id(),
                unassigned = result.unassigned_count(),
                solver_runs,
                "appointments left unassigned"
            );
        }

        result.set_rule_execution_results(source.rule_execution_results().to_vec());
        result.mark_post();

        info!(
            state_id = %result.id(),
            unassigned = result.unassigned_count(),
            solver_runs,
            "optimization pipeline finished"
        );

        Ok(PipelineOutput {
            source,
            result,
            solver_runs,
        })
    }
}
