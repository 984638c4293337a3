//! Test fixtures for route-planner.
//!
//! Builders for routes, appointments and states on a fixed summer Monday,
//! plus in-memory collaborators.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use route_planner::error::{CrmError, ResolveError, RuleError};
use route_planner::feature_flags::{FeatureGate, InMemoryFeatureFlags};
use route_planner::params::OptimizationParams;
use route_planner::route::{Route, RouteType, ServicePro};
use route_planner::rules::RuleServices;
use route_planner::state::{Office, OptimizationState};
use route_planner::time::TimeWindow;
use route_planner::traits::{
    AppointmentHistoryService, BusinessDaysService, CalendarEvent, CalendarService, CrmAppointment, CrmClient,
    DataResolver, ServiceDurationPredictor,
};
use route_planner::work_event::{Appointment, FixedEvent, ServiceKind, WorkEvent};

pub const OFFICE_ID: i64 = 7;

/// Monday 2024-05-06 (summer season).
pub fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
}

/// Monday 2024-01-08 (winter season).
pub fn winter_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()
}

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub fn at(hour: u32, minute: u32) -> NaiveDateTime {
    date().and_time(time(hour, minute))
}

pub fn window(start: (u32, u32), end: (u32, u32)) -> TimeWindow {
    TimeWindow::new(at(start.0, start.1), at(end.0, end.1))
}

pub fn office() -> Office {
    Office {
        id: OFFICE_ID,
        name: "Test Office".to_string(),
        timezone: "America/Los_Angeles".to_string(),
    }
}

// ============================================================================
// Appointments
// ============================================================================

/// Builder for test appointments with sensible defaults.
#[derive(Clone, Debug)]
pub struct TestAppointment {
    appointment: Appointment,
    lock: bool,
}

impl TestAppointment {
    /// 30 minutes, expected between 08:00 and 17:00, customer = id.
    pub fn new(id: i64) -> Self {
        Self {
            appointment: Appointment::new(id, id, window((8, 0), (17, 0)), Duration::minutes(30)),
            lock: false,
        }
    }

    pub fn arrival(mut self, start: (u32, u32), end: (u32, u32)) -> Self {
        self.appointment.expected_arrival = window(start, end);
        self
    }

    pub fn planned(mut self, start: (u32, u32), end: (u32, u32)) -> Self {
        self.appointment.time_window = Some(window(start, end));
        self
    }

    pub fn duration(mut self, minutes: i64) -> Self {
        self.appointment.duration = Duration::minutes(minutes);
        self
    }

    pub fn customer(mut self, customer_id: i64) -> Self {
        self.appointment.customer_id = customer_id;
        self
    }

    pub fn preferred(mut self, service_pro_id: i64) -> Self {
        self.appointment.preferred_service_pro_id = Some(service_pro_id);
        self
    }

    pub fn initial(mut self) -> Self {
        self.appointment.service_kind = ServiceKind::Initial;
        self
    }

    pub fn skill(mut self, skill: &str) -> Self {
        self.appointment.skills.push(skill.to_string());
        self
    }

    pub fn notes(mut self, notes: &str) -> Self {
        self.appointment.notes = notes.to_string();
        self
    }

    pub fn locked(mut self) -> Self {
        self.lock = true;
        self
    }

    pub fn build(self) -> Appointment {
        let mut appointment = self.appointment;
        if self.lock {
            appointment.lock();
        }
        appointment
    }
}

// ============================================================================
// Routes
// ============================================================================

/// Builder for test routes. The service pro shares the route's id.
#[derive(Clone, Debug)]
pub struct TestRoute {
    id: i64,
    service_pro_id: i64,
    route_type: RouteType,
    working_hours: (NaiveTime, NaiveTime),
    time_window: Option<TimeWindow>,
    max_capacity: u32,
    capacity: Option<u32>,
    skills: Vec<String>,
    events: Vec<WorkEvent>,
}

impl TestRoute {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            service_pro_id: id,
            route_type: RouteType::RegularRoute,
            working_hours: (time(8, 0), time(17, 0)),
            time_window: None,
            max_capacity: 8,
            capacity: None,
            skills: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn service_pro(mut self, service_pro_id: i64) -> Self {
        self.service_pro_id = service_pro_id;
        self
    }

    pub fn route_type(mut self, route_type: RouteType) -> Self {
        self.route_type = route_type;
        self
    }

    pub fn working_hours(mut self, start: (u32, u32), end: (u32, u32)) -> Self {
        self.working_hours = (time(start.0, start.1), time(end.0, end.1));
        self
    }

    pub fn window(mut self, start: (u32, u32), end: (u32, u32)) -> Self {
        self.time_window = Some(window(start, end));
        self
    }

    pub fn max_capacity(mut self, max_capacity: u32) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    pub fn capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn skill(mut self, skill: &str) -> Self {
        self.skills.push(skill.to_string());
        self
    }

    pub fn appointment(mut self, appointment: Appointment) -> Self {
        self.events.push(WorkEvent::Appointment(appointment));
        self
    }

    pub fn meeting(mut self, id: i64, start: (u32, u32), end: (u32, u32)) -> Self {
        self.events.push(WorkEvent::Meeting(FixedEvent {
            id,
            title: format!("Meeting {id}"),
            time_window: window(start, end),
            location: None,
        }));
        self
    }

    pub fn reserved(mut self, id: i64, start: (u32, u32), end: (u32, u32)) -> Self {
        self.events.push(WorkEvent::ReservedTime(FixedEvent {
            id,
            title: format!("Reserved {id}"),
            time_window: window(start, end),
            location: None,
        }));
        self
    }

    pub fn build(self) -> Route {
        let service_pro = ServicePro {
            id: self.service_pro_id,
            name: format!("Service Pro {}", self.service_pro_id),
            skills: self.skills,
            home_location: (36.1 + self.service_pro_id as f64 / 100.0, -115.1),
            working_hours: self.working_hours,
        };
        let time_window = self
            .time_window
            .unwrap_or_else(|| TimeWindow::on_date(date(), self.working_hours.0, self.working_hours.1));

        let mut route = Route::new(self.id, service_pro, self.route_type, time_window, self.max_capacity);
        if let Some(capacity) = self.capacity {
            route.set_capacity(capacity);
        }
        for event in self.events {
            route.add_work_event(event);
        }
        route
    }
}

// ============================================================================
// States
// ============================================================================

#[derive(Clone, Debug)]
pub struct TestState {
    date: NaiveDate,
    routes: Vec<Route>,
    unassigned: Vec<Appointment>,
    params: OptimizationParams,
}

impl TestState {
    pub fn new() -> Self {
        Self {
            date: date(),
            routes: Vec::new(),
            unassigned: Vec::new(),
            params: OptimizationParams::default(),
        }
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    pub fn unassigned(mut self, appointment: Appointment) -> Self {
        self.unassigned.push(appointment);
        self
    }

    pub fn params(mut self, params: OptimizationParams) -> Self {
        self.params = params;
        self
    }

    pub fn build(self) -> OptimizationState {
        let time_frame = TimeWindow::on_date(self.date, time(0, 0), time(23, 59));
        let mut state = OptimizationState::new(office(), self.date, time_frame, self.params);
        for route in self.routes {
            state.add_route(route);
        }
        for appointment in self.unassigned {
            state.add_unassigned_appointment(appointment);
        }
        state
    }
}

/// Appointment ids held by the route, in event order.
pub fn appointment_ids(route: &Route) -> Vec<i64> {
    route.appointments().map(|appointment| appointment.id).collect()
}

// ============================================================================
// Collaborators
// ============================================================================

pub struct FixedBusinessDays(pub bool);

impl BusinessDaysService for FixedBusinessDays {
    fn needs_first_appointment_lock(&self, _date: NaiveDate) -> bool {
        self.0
    }
}

/// Average durations per customer, in minutes.
#[derive(Default)]
pub struct StubHistory {
    averages: HashMap<i64, i64>,
}

impl StubHistory {
    pub fn with_average(mut self, customer_id: i64, minutes: i64) -> Self {
        self.averages.insert(customer_id, minutes);
        self
    }
}

impl AppointmentHistoryService for StubHistory {
    fn average_duration(&self, customer_id: i64) -> Result<Option<Duration>, RuleError> {
        Ok(self.averages.get(&customer_id).map(|&minutes| Duration::minutes(minutes)))
    }
}

/// Predicted durations per appointment, in minutes.
#[derive(Default)]
pub struct StubPredictor {
    predictions: HashMap<i64, i64>,
}

impl StubPredictor {
    pub fn with_prediction(mut self, appointment_id: i64, minutes: i64) -> Self {
        self.predictions.insert(appointment_id, minutes);
        self
    }
}

impl ServiceDurationPredictor for StubPredictor {
    fn predict(&self, appointment: &Appointment) -> Result<Option<Duration>, RuleError> {
        Ok(self.predictions.get(&appointment.id).map(|&minutes| Duration::minutes(minutes)))
    }
}

#[derive(Default)]
pub struct StubCalendar {
    events: Vec<CalendarEvent>,
    fail: bool,
}

impl StubCalendar {
    pub fn with_event(mut self, id: i64, start: (u32, u32), end: (u32, u32), participants: &[i64]) -> Self {
        self.events.push(CalendarEvent {
            id,
            title: format!("Office event {id}"),
            time_window: window(start, end),
            location: Some((36.17, -115.14)),
            participant_ids: participants.to_vec(),
        });
        self
    }

    pub fn failing() -> Self {
        Self {
            events: Vec::new(),
            fail: true,
        }
    }
}

impl CalendarService for StubCalendar {
    fn events(&self, _office_id: i64, _date: NaiveDate) -> Result<Vec<CalendarEvent>, RuleError> {
        if self.fail {
            return Err(RuleError::collaborator("calendar", "connection refused"));
        }
        Ok(self.events.clone())
    }
}

/// Builder for the rule collaborators.
pub struct TestServices {
    flags: InMemoryFeatureFlags,
    lock_first_appointment: bool,
    history: StubHistory,
    predictor: StubPredictor,
    calendar: StubCalendar,
}

impl TestServices {
    pub fn new() -> Self {
        Self {
            flags: InMemoryFeatureFlags::new(),
            lock_first_appointment: false,
            history: StubHistory::default(),
            predictor: StubPredictor::default(),
            calendar: StubCalendar::default(),
        }
    }

    pub fn flags(mut self, flags: InMemoryFeatureFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn lock_first_appointment(mut self) -> Self {
        self.lock_first_appointment = true;
        self
    }

    pub fn history(mut self, history: StubHistory) -> Self {
        self.history = history;
        self
    }

    pub fn predictor(mut self, predictor: StubPredictor) -> Self {
        self.predictor = predictor;
        self
    }

    pub fn calendar(mut self, calendar: StubCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn build(self) -> RuleServices {
        RuleServices {
            features: Arc::new(FeatureGate::new(Arc::new(self.flags))),
            business_days: Arc::new(FixedBusinessDays(self.lock_first_appointment)),
            history: Arc::new(self.history),
            predictor: Arc::new(self.predictor),
            calendar: Arc::new(self.calendar),
        }
    }
}

/// CRM double recording every write.
#[derive(Default)]
pub struct InMemoryCrm {
    appointments: Mutex<HashMap<i64, CrmAppointment>>,
    blocked_spots: Mutex<Vec<(i64, TimeWindow, String)>>,
    note_updates: Mutex<usize>,
}

impl InMemoryCrm {
    pub fn with_appointment(self, appointment: CrmAppointment) -> Self {
        self.appointments.lock().unwrap().insert(appointment.id, appointment);
        self
    }

    pub fn notes(&self, appointment_id: i64) -> Option<String> {
        self.appointments
            .lock()
            .unwrap()
            .get(&appointment_id)
            .map(|appointment| appointment.notes.clone())
    }

    pub fn blocked_spots(&self) -> Vec<(i64, TimeWindow, String)> {
        self.blocked_spots.lock().unwrap().clone()
    }

    pub fn note_updates(&self) -> usize {
        *self.note_updates.lock().unwrap()
    }
}

pub fn crm_appointment(id: i64) -> CrmAppointment {
    CrmAppointment {
        id,
        route_id: None,
        start: None,
        confirmed: false,
        notes: String::new(),
    }
}

impl CrmClient for InMemoryCrm {
    fn find_appointment(&self, appointment_id: i64) -> Result<Option<CrmAppointment>, CrmError> {
        Ok(self.appointments.lock().unwrap().get(&appointment_id).cloned())
    }

    fn update_appointment_notes(&self, appointment_id: i64, notes: &str) -> Result<(), CrmError> {
        let mut appointments = self.appointments.lock().unwrap();
        let appointment = appointments
            .get_mut(&appointment_id)
            .ok_or(CrmError::NotFound(appointment_id))?;
        appointment.notes = notes.to_string();
        *self.note_updates.lock().unwrap() += 1;
        Ok(())
    }

    fn block_spot(&self, route_id: i64, window: &TimeWindow, reason: &str) -> Result<(), CrmError> {
        self.blocked_spots
            .lock()
            .unwrap()
            .push((route_id, *window, reason.to_string()));
        Ok(())
    }
}

/// Resolver returning a prepared state, or a prepared failure.
pub struct StubResolver {
    respond: Box<dyn Fn() -> Result<OptimizationState, ResolveError> + Send + Sync>,
    last_params: Mutex<Option<OptimizationParams>>,
}

impl StubResolver {
    pub fn with_state(state: OptimizationState) -> Self {
        Self {
            respond: Box::new(move || Ok(state.clone())),
            last_params: Mutex::new(None),
        }
    }

    pub fn failing(make_error: impl Fn() -> ResolveError + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(move || Err(make_error())),
            last_params: Mutex::new(None),
        }
    }

    pub fn last_params(&self) -> Option<OptimizationParams> {
        self.last_params.lock().unwrap().clone()
    }
}

impl DataResolver for StubResolver {
    fn resolve(
        &self,
        _date: NaiveDate,
        _office_id: i64,
        params: &OptimizationParams,
    ) -> Result<OptimizationState, ResolveError> {
        *self.last_params.lock().unwrap() = Some(params.clone());
        // The resolver builds the state with the params it was given.
        let state = (self.respond)()?;
        let mut rebuilt = OptimizationState::new(state.office().clone(), state.date(), state.time_frame(), params.clone());
        for route in state.routes() {
            rebuilt.add_route(route.clone());
        }
        for appointment in state.unassigned_appointments() {
            rebuilt.add_unassigned_appointment(appointment.clone());
        }
        Ok(rebuilt)
    }
}
