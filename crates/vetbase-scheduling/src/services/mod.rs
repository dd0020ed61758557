//! Scheduling services.

pub mod appointment;
pub mod calendar;

pub use appointment::{
    AnnotatedAppointment, AppointmentService, CompleteAppointment, NewAppointment,
};
pub use calendar::CalendarService;
