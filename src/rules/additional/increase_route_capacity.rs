use tracing::debug;

use crate::error::RuleError;
use crate::result::{RuleId, RuleOutcome};
use crate::route::Route;
use crate::rules::AdditionalRule;
use crate::state::OptimizationState;

/// Opens one more slot per pass on the least loaded routes until every
/// unassigned appointment has a slot or no route has room left.
pub struct IncreaseRouteCapacity;

/// Returns the total capacity granted.
pub(crate) fn grant_capacity(routes: &mut [Route], mut requested: u32) -> u32 {
    let mut granted = 0;

    while requested > 0 {
        let mut eligible: Vec<usize> = (0..routes.len())
            .filter(|&index| routes[index].spare_capacity() > 0)
            .collect();
        if eligible.is_empty() {
            break;
        }
        eligible.sort_by_key(|&index| routes[index].capacity());

        for index in eligible {
            if requested == 0 {
                break;
            }
            if routes[index].increase_capacity() {
                debug!(route_id = routes[index].id, capacity = routes[index].capacity(), "capacity increased");
                requested -= 1;
                granted += 1;
            }
        }
    }

    granted
}

impl AdditionalRule for IncreaseRouteCapacity {
    fn id(&self) -> RuleId {
        RuleId::IncreaseRouteCapacity
    }

    fn apply(
        &self,
        source: &mut OptimizationState,
        result: &OptimizationState,
    ) -> Result<RuleOutcome, RuleError> {
        let unassigned = result.unassigned_count() as u32;
        if unassigned == 0 {
            return Ok(RuleOutcome::NotTriggered);
        }

        let granted = grant_capacity(source.routes_mut(), unassigned);
        Ok(RuleOutcome::applied_if(granted > 0))
    }
}
