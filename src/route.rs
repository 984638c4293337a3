//! Routes and the service pros that drive them.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::time::TimeWindow;
use crate::work_event::{Appointment, WorkEvent};

/// Route classification; drives the labor-rule constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteType {
    RegularRoute,
    ShortRoute,
    ExtendedRoute,
}

/// The technician assigned to a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicePro {
    pub id: i64,
    pub name: String,
    pub skills: Vec<String>,
    /// Home location (lat, lng).
    pub home_location: (f64, f64),
    pub working_hours: (NaiveTime, NaiveTime),
}

impl ServicePro {
    /// Skill that only this service pro carries. Appointments that require it
    /// can only be served by them.
    pub fn personal_skill(&self) -> String {
        preferred_service_pro_skill(self.id)
    }

    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.iter().any(|existing| existing == skill)
    }

    pub fn day_start(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.working_hours.0)
    }
}

pub fn preferred_service_pro_skill(service_pro_id: i64) -> String {
    format!("PREFERRED_SP_{service_pro_id}")
}

/// Markers for one-shot window adjustments, so re-running a rule does not
/// stack its effect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowAdjustments {
    pub travel_allowance_minutes: i64,
    pub working_time_extended: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: i64,
    pub service_pro: ServicePro,
    pub route_type: RouteType,
    pub time_window: TimeWindow,
    pub start_location: Option<(f64, f64)>,
    pub end_location: Option<(f64, f64)>,
    pub summary_enabled: bool,
    pub adjustments: WindowAdjustments,
    capacity: u32,
    max_capacity: u32,
    work_events: Vec<WorkEvent>,
}

impl Route {
    pub fn new(
        id: i64,
        service_pro: ServicePro,
        route_type: RouteType,
        time_window: TimeWindow,
        max_capacity: u32,
    ) -> Self {
        Self {
            id,
            service_pro,
            route_type,
            time_window,
            start_location: None,
            end_location: None,
            summary_enabled: false,
            adjustments: WindowAdjustments::default(),
            capacity: max_capacity,
            max_capacity,
            work_events: Vec::new(),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn max_capacity(&self) -> u32 {
        self.max_capacity
    }

    pub fn spare_capacity(&self) -> u32 {
        self.max_capacity.saturating_sub(self.capacity)
    }

    /// Sets the capacity clamped to `[0, max_capacity]` and returns the value
    /// actually stored.
    pub fn set_capacity(&mut self, capacity: u32) -> u32 {
        self.capacity = capacity.min(self.max_capacity);
        self.capacity
    }

    /// Returns true if the capacity was below its maximum.
    pub fn increase_capacity(&mut self) -> bool {
        if self.capacity >= self.max_capacity {
            return false;
        }
        self.capacity += 1;
        true
    }

    pub fn work_events(&self) -> &[WorkEvent] {
        &self.work_events
    }

    /// Inserts the event after every event with an earlier or equal
    /// expected-arrival start.
    pub fn add_work_event(&mut self, event: WorkEvent) {
        let start = event.expected_arrival().start();
        let position = self
            .work_events
            .iter()
            .position(|existing| existing.expected_arrival().start() > start)
            .unwrap_or(self.work_events.len());
        self.work_events.insert(position, event);
    }

    /// Removes every event matching `predicate`, returning how many were removed.
    pub fn remove_work_events<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&WorkEvent) -> bool,
    {
        let before = self.work_events.len();
        self.work_events.retain(|event| !predicate(event));
        before - self.work_events.len()
    }

    /// Re-sorts events after expected-arrival windows were edited in place.
    pub fn sort_work_events(&mut self) {
        self.work_events
            .sort_by_key(|event| event.expected_arrival().start());
    }

    pub fn appointments(&self) -> impl Iterator<Item = &Appointment> {
        self.work_events.iter().filter_map(WorkEvent::as_appointment)
    }

    pub fn appointments_mut(&mut self) -> impl Iterator<Item = &mut Appointment> {
        self.work_events.iter_mut().filter_map(WorkEvent::as_appointment_mut)
    }

    pub fn appointment_count(&self) -> usize {
        self.appointments().count()
    }

    pub fn first_appointment(&self) -> Option<&Appointment> {
        self.appointments().next()
    }

    pub fn first_appointment_mut(&mut self) -> Option<&mut Appointment> {
        self.appointments_mut().next()
    }

    pub fn has_appointment(&self, appointment_id: i64) -> bool {
        self.appointments().any(|appointment| appointment.id == appointment_id)
    }

    pub fn remove_appointment(&mut self, appointment_id: i64) -> Option<Appointment> {
        let position = self
            .work_events
            .iter()
            .position(|event| matches!(event, WorkEvent::Appointment(a) if a.id == appointment_id))?;
        match self.work_events.remove(position) {
            WorkEvent::Appointment(appointment) => Some(appointment),
            _ => None,
        }
    }

    /// Meetings and reserved time.
    pub fn fixed_events(&self) -> impl Iterator<Item = &WorkEvent> {
        self.work_events.iter().filter(|event| event.is_fixed())
    }

    pub fn breaks(&self) -> impl Iterator<Item = &WorkEvent> {
        self.work_events.iter().filter(|event| event.is_break())
    }

    /// Total planned service time of the route's appointments.
    pub fn service_minutes(&self) -> i64 {
        self.appointments()
            .map(|appointment| appointment.duration.num_minutes())
            .sum()
    }
}
