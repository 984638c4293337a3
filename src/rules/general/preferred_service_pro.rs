use std::collections::HashSet;

use tracing::debug;

use crate::error::RuleError;
use crate::result::{RuleId, RuleOutcome};
use crate::route::preferred_service_pro_skill;
use crate::rules::GeneralRule;
use crate::state::OptimizationState;

/// Ties appointments to the customer's preferred service pro through a skill
/// only that service pro carries.
pub struct SetPreferredServicePro;

impl GeneralRule for SetPreferredServicePro {
    fn id(&self) -> RuleId {
        RuleId::SetPreferredServicePro
    }

    fn apply(&self, state: &mut OptimizationState) -> Result<RuleOutcome, RuleError> {
        let routed: HashSet<i64> = state
            .routes()
            .iter()
            .map(|route| route.service_pro.id)
            .collect();

        let mut preferred = HashSet::new();
        let mut updated = 0;
        for appointment in state.all_appointments_mut() {
            let Some(preferred_id) = appointment.preferred_service_pro_id else {
                continue;
            };
            if !routed.contains(&preferred_id) {
                continue;
            }
            preferred.insert(preferred_id);
            if appointment.add_skill(&preferred_service_pro_skill(preferred_id)) {
                updated += 1;
            }
        }

        for route in state.routes_mut() {
            let skill = route.service_pro.personal_skill();
            if preferred.contains(&route.service_pro.id) && !route.service_pro.has_skill(&skill) {
                route.service_pro.skills.push(skill);
            }
        }

        if updated == 0 {
            return Ok(RuleOutcome::Triggered);
        }

        debug!(updated, "preferred service pro skills set");
        Ok(RuleOutcome::Applied)
    }
}
