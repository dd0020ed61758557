//! Scheduling core for the vetbase back office.
//!
//! Two pure engines and the services that feed them:
//!
//! - [`conflict`]: per-collaborator, per-role time-overlap detection over
//!   half-open intervals. Advisory only; nothing is persisted and booking is
//!   never blocked.
//! - [`calendar`]: day/week/month range resolution and shift-based
//!   bookable-slot capacity.
//! - [`services`]: appointment lifecycle (book, confirm, reschedule,
//!   complete into an attendance with invoice derivation, delete) and
//!   calendar queries, both attaching the engines' output for the HTTP
//!   layer to serialize.

pub mod calendar;
pub mod conflict;
pub mod error;
pub mod services;

pub use calendar::{CalendarSummary, CalendarView, CapacitySummary};
pub use conflict::{detect_conflicts, ConflictCandidate, ConflictFlags};
pub use error::{Result, SchedulingError};
pub use services::{
    AnnotatedAppointment, AppointmentService, CalendarService, CompleteAppointment, NewAppointment,
};
