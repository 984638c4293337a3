//! Post-solve corrections fed into the next solver run.

mod extend_working_time;
mod increase_route_capacity;
mod shift_locked_appointments;

pub use extend_working_time::ExtendRouteWorkingTime;
pub use increase_route_capacity::IncreaseRouteCapacity;
pub use shift_locked_appointments::ShiftLockedAppointmentsTimeWindow;
