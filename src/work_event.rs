//! Work events: everything that can occupy time on a route.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::time::{serde_minutes, TimeWindow};

/// Initial services take longer and are never averaged from history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceKind {
    Initial,
    FollowUp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub customer_id: i64,
    pub preferred_service_pro_id: Option<i64>,
    pub service_kind: ServiceKind,
    /// Window in which the service pro is expected to arrive.
    pub expected_arrival: TimeWindow,
    /// Planned window, set by the CRM or by the solver.
    pub time_window: Option<TimeWindow>,
    #[serde(with = "serde_minutes")]
    pub duration: Duration,
    /// Location coordinates (lat, lng).
    pub location: (f64, f64),
    pub skills: Vec<String>,
    pub notes: String,
    locked: bool,
}

impl Appointment {
    pub fn new(id: i64, customer_id: i64, expected_arrival: TimeWindow, duration: Duration) -> Self {
        Self {
            id,
            customer_id,
            preferred_service_pro_id: None,
            service_kind: ServiceKind::FollowUp,
            expected_arrival,
            time_window: None,
            duration,
            location: (0.0, 0.0),
            skills: Vec::new(),
            notes: String::new(),
            locked: false,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn is_initial(&self) -> bool {
        self.service_kind == ServiceKind::Initial
    }

    /// Returns true when the skill was not present yet.
    pub fn add_skill(&mut self, skill: &str) -> bool {
        if self.skills.iter().any(|existing| existing == skill) {
            return false;
        }
        self.skills.push(skill.to_string());
        true
    }

    /// The planned window, or the expected arrival start plus duration when
    /// nothing has been planned yet.
    pub fn planned_window(&self) -> TimeWindow {
        self.time_window
            .unwrap_or_else(|| TimeWindow::starting_at(self.expected_arrival.start(), self.duration))
    }
}

/// A paid break or a lunch generated for the service pro.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Break {
    pub id: i64,
    pub description: String,
    pub expected_arrival: TimeWindow,
    #[serde(with = "serde_minutes")]
    pub duration: Duration,
}

/// Immovable calendar entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedEvent {
    pub id: i64,
    pub title: String,
    pub time_window: TimeWindow,
    pub location: Option<(f64, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtraWorkKind {
    InsideSales,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraWork {
    pub id: i64,
    pub kind: ExtraWorkKind,
    pub expected_arrival: TimeWindow,
    #[serde(with = "serde_minutes")]
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkEvent {
    Appointment(Appointment),
    WorkBreak(Break),
    Lunch(Break),
    Meeting(FixedEvent),
    ReservedTime(FixedEvent),
    ExtraWork(ExtraWork),
}

impl WorkEvent {
    pub fn id(&self) -> i64 {
        match self {
            WorkEvent::Appointment(appointment) => appointment.id,
            WorkEvent::WorkBreak(work_break) | WorkEvent::Lunch(work_break) => work_break.id,
            WorkEvent::Meeting(event) | WorkEvent::ReservedTime(event) => event.id,
            WorkEvent::ExtraWork(extra) => extra.id,
        }
    }

    /// Fixed events are expected exactly at their time window.
    pub fn expected_arrival(&self) -> TimeWindow {
        match self {
            WorkEvent::Appointment(appointment) => appointment.expected_arrival,
            WorkEvent::WorkBreak(work_break) | WorkEvent::Lunch(work_break) => work_break.expected_arrival,
            WorkEvent::Meeting(event) | WorkEvent::ReservedTime(event) => event.time_window,
            WorkEvent::ExtraWork(extra) => extra.expected_arrival,
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            WorkEvent::Appointment(appointment) => appointment.duration,
            WorkEvent::WorkBreak(work_break) | WorkEvent::Lunch(work_break) => work_break.duration,
            WorkEvent::Meeting(event) | WorkEvent::ReservedTime(event) => event.time_window.duration(),
            WorkEvent::ExtraWork(extra) => extra.duration,
        }
    }

    pub fn time_window(&self) -> Option<TimeWindow> {
        match self {
            WorkEvent::Appointment(appointment) => appointment.time_window,
            WorkEvent::Meeting(event) | WorkEvent::ReservedTime(event) => Some(event.time_window),
            _ => None,
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, WorkEvent::Appointment(appointment) if appointment.is_locked())
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, WorkEvent::Meeting(_) | WorkEvent::ReservedTime(_))
    }

    pub fn is_break(&self) -> bool {
        matches!(self, WorkEvent::WorkBreak(_) | WorkEvent::Lunch(_))
    }

    pub fn as_appointment(&self) -> Option<&Appointment> {
        match self {
            WorkEvent::Appointment(appointment) => Some(appointment),
            _ => None,
        }
    }

    pub fn as_appointment_mut(&mut self) -> Option<&mut Appointment> {
        match self {
            WorkEvent::Appointment(appointment) => Some(appointment),
            _ => None,
        }
    }
}
