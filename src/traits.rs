//! Collaborator interfaces consumed by the planner.
//!
//! These are intentionally minimal. Concrete deployments implement them over
//! the CRM, the routing solver and the storage they use.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::error::{CrmError, RepositoryError, ResolveError, RuleError, SolverError};
use crate::params::OptimizationParams;
use crate::state::OptimizationState;
use crate::time::TimeWindow;
use crate::work_event::Appointment;

/// Builds the snapshot of an office's day from the CRM.
pub trait DataResolver: Send + Sync {
    fn resolve(
        &self,
        date: NaiveDate,
        office_id: i64,
        params: &OptimizationParams,
    ) -> Result<OptimizationState, ResolveError>;
}

/// The vehicle-routing solver. Input routes, appointments and capacities go
/// in; the output may leave some appointments unassigned.
pub trait Solver: Send + Sync {
    fn optimize(&self, state: OptimizationState) -> Result<OptimizationState, SolverError>;

    /// Planning mode: assign without reordering already planned appointments.
    fn plan(&self, state: OptimizationState) -> Result<OptimizationState, SolverError>;
}

/// Business calendar.
pub trait BusinessDaysService: Send + Sync {
    fn needs_first_appointment_lock(&self, date: NaiveDate) -> bool;
}

/// Historical service durations.
pub trait AppointmentHistoryService: Send + Sync {
    fn average_duration(&self, customer_id: i64) -> Result<Option<Duration>, RuleError>;
}

/// Predictive service-duration model.
pub trait ServiceDurationPredictor: Send + Sync {
    /// `None` when the customer has no usable property or history data.
    fn predict(&self, appointment: &Appointment) -> Result<Option<Duration>, RuleError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub id: i64,
    pub title: String,
    pub time_window: TimeWindow,
    pub location: Option<(f64, f64)>,
    pub participant_ids: Vec<i64>,
}

/// Office calendar (meetings, trainings).
pub trait CalendarService: Send + Sync {
    fn events(&self, office_id: i64, date: NaiveDate) -> Result<Vec<CalendarEvent>, RuleError>;
}

/// Snapshot storage.
pub trait StateRepository: Send + Sync {
    fn save(&self, state: &OptimizationState) -> Result<(), RepositoryError>;

    /// Saves a run's source and result together: both are stored or neither is.
    fn save_run(&self, source: &OptimizationState, result: &OptimizationState) -> Result<(), RepositoryError>;

    fn find_by_id(&self, id: Uuid) -> Result<OptimizationState, RepositoryError>;
}

/// Appointment as the CRM currently knows it.
#[derive(Debug, Clone, PartialEq)]
pub struct CrmAppointment {
    pub id: i64,
    pub route_id: Option<i64>,
    pub start: Option<NaiveDateTime>,
    pub confirmed: bool,
    pub notes: String,
}

/// Writes made by post-optimization casters.
pub trait CrmClient: Send + Sync {
    fn find_appointment(&self, appointment_id: i64) -> Result<Option<CrmAppointment>, CrmError>;

    fn update_appointment_notes(&self, appointment_id: i64, notes: &str) -> Result<(), CrmError>;

    /// Blocks a spot on the route, storing `reason` as its label.
    fn block_spot(&self, route_id: i64, window: &TimeWindow, reason: &str) -> Result<(), CrmError>;
}
