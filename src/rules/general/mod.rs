//! Pre-solve rules.

mod balanced_workload;
mod calendar_events;
mod lock_first_appointment;
mod preferred_service_pro;
mod route_settings;
mod service_duration;
mod work_breaks;
mod working_time;

pub use balanced_workload::MustHaveBalancedWorkload;
pub use calendar_events::VisitCalendarEventLocation;
pub use lock_first_appointment::LockFirstAppointment;
pub use preferred_service_pro::SetPreferredServicePro;
pub use route_settings::{
    MustConsiderRoadTraffic, MustEndAtServiceProHomeLocation, MustHaveInsideSales, MustHaveRouteSummary,
    MustStartAtServiceProHomeLocation,
};
pub use service_duration::{SetServiceDurationToAverage, SetServiceDurationWithPredictiveModel};
pub use work_breaks::MustHaveWorkBreaks;
pub use working_time::{
    AddExtraTimeToGetToFirstLocation, ExtendWorkingTime, MustNotExceedMaxWorkingHours, RestrictTimeWindow,
};

pub(crate) use working_time::extend_within_shift;
