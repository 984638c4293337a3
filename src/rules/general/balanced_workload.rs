use tracing::debug;

use crate::error::RuleError;
use crate::result::{RuleId, RuleOutcome};
use crate::rules::GeneralRule;
use crate::state::OptimizationState;

/// Spreads the day's appointments over the routes in proportion to their
/// maximum capacity.
pub struct MustHaveBalancedWorkload;

/// Proportional floor allocation followed by a round-robin distribution of
/// the remainder. `max_capacities` are visited in order.
pub(crate) fn balance_capacities(max_capacities: &[u32], total_appointments: u64) -> Vec<u32> {
    let total_capacity: u64 = max_capacities.iter().map(|&max| u64::from(max)).sum();
    if total_capacity == 0 {
        return vec![0; max_capacities.len()];
    }

    let mut capacities: Vec<u32> = max_capacities
        .iter()
        .map(|&max| {
            let share = u64::from(max) * total_appointments / total_capacity;
            share.min(u64::from(max)) as u32
        })
        .collect();

    let allocated: u64 = capacities.iter().map(|&capacity| u64::from(capacity)).sum();
    let mut remaining = total_appointments.saturating_sub(allocated);

    let mut eligible: Vec<usize> = (0..capacities.len())
        .filter(|&index| capacities[index] < max_capacities[index])
        .collect();

    while remaining > 0 && !eligible.is_empty() {
        eligible.retain(|&index| {
            if remaining == 0 {
                return true;
            }
            capacities[index] += 1;
            remaining -= 1;
            capacities[index] < max_capacities[index]
        });
    }

    capacities
}

impl GeneralRule for MustHaveBalancedWorkload {
    fn id(&self) -> RuleId {
        RuleId::MustHaveBalancedWorkload
    }

    fn apply(&self, state: &mut OptimizationState) -> Result<RuleOutcome, RuleError> {
        let total_appointments = state.total_appointments() as u64;
        let max_capacities: Vec<u32> = state.routes().iter().map(|route| route.max_capacity()).collect();
        let capacities = balance_capacities(&max_capacities, total_appointments);

        let mut changed = false;
        for (route, capacity) in state.routes_mut().iter_mut().zip(capacities) {
            if route.capacity() != capacity {
                debug!(route_id = route.id, from = route.capacity(), to = capacity, "balancing capacity");
                route.set_capacity(capacity);
                changed = true;
            }
        }

        Ok(RuleOutcome::applied_if(changed))
    }
}
