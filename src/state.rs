//! The optimization snapshot every rule operates on.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PipelineError;
use crate::params::OptimizationParams;
use crate::result::{RuleExecutionResult, RuleId};
use crate::route::Route;
use crate::time::TimeWindow;
use crate::work_event::{Appointment, WorkEvent};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Office {
    pub id: i64,
    pub name: String,
    pub timezone: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationStatus {
    /// Resolved from the CRM, rules may still be running.
    Pre,
    /// Produced by a successful solve.
    Post,
    /// Produced by the solver's planning mode.
    Plan,
}

/// Owns its routes and unassigned appointments for the whole pipeline run.
///
/// Every appointment lives either on exactly one route or in the unassigned
/// set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationState {
    id: Uuid,
    office: Office,
    date: NaiveDate,
    time_frame: TimeWindow,
    status: OptimizationStatus,
    routes: Vec<Route>,
    unassigned_appointments: Vec<Appointment>,
    params: OptimizationParams,
    rule_execution_results: Vec<RuleExecutionResult>,
}

impl OptimizationState {
    pub fn new(
        office: Office,
        date: NaiveDate,
        time_frame: TimeWindow,
        params: OptimizationParams,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            office,
            date,
            time_frame,
            status: OptimizationStatus::Pre,
            routes: Vec::new(),
            unassigned_appointments: Vec::new(),
            params,
            rule_execution_results: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Gives a derived snapshot (for example a solver result) its own identity.
    pub fn assign_new_id(&mut self) {
        self.id = Uuid::new_v4();
    }

    pub fn office(&self) -> &Office {
        &self.office
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn time_frame(&self) -> TimeWindow {
        self.time_frame
    }

    pub fn status(&self) -> OptimizationStatus {
        self.status
    }

    pub fn set_status(&mut self, status: OptimizationStatus) {
        self.status = status;
    }

    pub fn mark_post(&mut self) {
        self.status = OptimizationStatus::Post;
    }

    pub fn params(&self) -> &OptimizationParams {
        &self.params
    }

    pub fn is_rule_disabled(&self, rule_id: RuleId) -> bool {
        self.params.is_rule_disabled(rule_id)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn routes_mut(&mut self) -> &mut [Route] {
        &mut self.routes
    }

    pub fn route(&self, route_id: i64) -> Option<&Route> {
        self.routes.iter().find(|route| route.id == route_id)
    }

    pub fn route_mut(&mut self, route_id: i64) -> Option<&mut Route> {
        self.routes.iter_mut().find(|route| route.id == route_id)
    }

    pub fn add_route(&mut self, route: Route) {
        self.routes.push(route);
    }

    pub fn unassigned_appointments(&self) -> &[Appointment] {
        &self.unassigned_appointments
    }

    pub fn unassigned_count(&self) -> usize {
        self.unassigned_appointments.len()
    }

    pub fn add_unassigned_appointment(&mut self, appointment: Appointment) {
        self.unassigned_appointments.push(appointment);
    }

    /// Removes and returns every unassigned appointment.
    pub fn take_unassigned_appointments(&mut self) -> Vec<Appointment> {
        std::mem::take(&mut self.unassigned_appointments)
    }

    /// Moves an unassigned appointment onto a route.
    pub fn assign_appointment(&mut self, route_id: i64, appointment_id: i64) -> Result<(), PipelineError> {
        let route_index = self
            .routes
            .iter()
            .position(|route| route.id == route_id)
            .ok_or_else(|| PipelineError::InvalidState(format!("route {route_id} does not exist")))?;
        let appointment_index = self
            .unassigned_appointments
            .iter()
            .position(|appointment| appointment.id == appointment_id)
            .ok_or_else(|| {
                PipelineError::InvalidState(format!("appointment {appointment_id} is not unassigned"))
            })?;

        let appointment = self.unassigned_appointments.remove(appointment_index);
        self.routes[route_index].add_work_event(WorkEvent::Appointment(appointment));
        Ok(())
    }

    /// Moves an appointment from a route into the unassigned set.
    pub fn unassign_appointment(&mut self, route_id: i64, appointment_id: i64) -> Result<(), PipelineError> {
        let route = self
            .route_mut(route_id)
            .ok_or_else(|| PipelineError::InvalidState(format!("route {route_id} does not exist")))?;
        let appointment = route.remove_appointment(appointment_id).ok_or_else(|| {
            PipelineError::InvalidState(format!(
                "appointment {appointment_id} is not on route {route_id}"
            ))
        })?;
        self.unassigned_appointments.push(appointment);
        Ok(())
    }

    /// Appointments on routes followed by unassigned ones.
    pub fn all_appointments(&self) -> impl Iterator<Item = &Appointment> {
        self.routes
            .iter()
            .flat_map(|route| route.appointments())
            .chain(self.unassigned_appointments.iter())
    }

    pub fn all_appointments_mut(&mut self) -> impl Iterator<Item = &mut Appointment> {
        self.routes
            .iter_mut()
            .flat_map(|route| route.appointments_mut())
            .chain(self.unassigned_appointments.iter_mut())
    }

    pub fn total_appointments(&self) -> usize {
        self.all_appointments().count()
    }

    pub fn total_max_capacity(&self) -> u32 {
        self.routes.iter().map(Route::max_capacity).sum()
    }

    pub fn rule_execution_results(&self) -> &[RuleExecutionResult] {
        &self.rule_execution_results
    }

    pub fn add_rule_execution_result(&mut self, result: RuleExecutionResult) {
        self.rule_execution_results.push(result);
    }

    pub fn set_rule_execution_results(&mut self, results: Vec<RuleExecutionResult>) {
        self.rule_execution_results = results;
    }

    /// Latest result recorded for a rule.
    pub fn rule_result(&self, rule_id: RuleId) -> Option<&RuleExecutionResult> {
        self.rule_execution_results
            .iter()
            .rev()
            .find(|result| result.rule_id() == rule_id)
    }

    /// Checks that no appointment appears twice across routes and the
    /// unassigned set, and that no route runs above its maximum capacity.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if let Some(route) = self.routes.iter().find(|route| route.capacity() > route.max_capacity()) {
            return Err(PipelineError::InvalidState(format!(
                "route {} capacity {} exceeds its maximum {}",
                route.id,
                route.capacity(),
                route.max_capacity()
            )));
        }
        let mut seen = HashSet::new();
        for appointment in self.all_appointments() {
            if !seen.insert(appointment.id) {
                return Err(PipelineError::InvalidState(format!(
                    "appointment {} is held more than once",
                    appointment.id
                )));
            }
        }
        Ok(())
    }
}
