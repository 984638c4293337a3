//! Per-run optimization parameters.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::result::RuleId;

/// Read-only during a pipeline pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationParams {
    pub disabled_rules: BTreeSet<RuleId>,
    /// Simulations are never persisted nor cast to the CRM.
    pub simulation_run: bool,
}

impl OptimizationParams {
    pub fn is_rule_disabled(&self, rule_id: RuleId) -> bool {
        self.disabled_rules.contains(&rule_id)
    }

    pub fn disable_rule(&mut self, rule_id: RuleId) {
        self.disabled_rules.insert(rule_id);
    }

    pub fn with_disabled_rules<I>(mut self, rule_ids: I) -> Self
    where
        I: IntoIterator<Item = RuleId>,
    {
        self.disabled_rules.extend(rule_ids);
        self
    }
}
