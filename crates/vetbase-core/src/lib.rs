//! vetbase Core Library
//!
//! Shared types for the vetbase veterinary back office.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed identifiers (`AppointmentId`, `CollaboratorId`, ...)
//! - [`time`] - Half-open time intervals and calendar range computation
//! - [`access`] - Capability alias expansion for role-based access
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use vetbase_core::{CollaboratorId, TimeRange};
//!
//! let vet = CollaboratorId::new();
//! let visit = TimeRange::new(
//!     Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap(),
//!     Utc.with_ymd_and_hms(2025, 3, 10, 9, 30, 0).unwrap(),
//! )
//! .unwrap();
//!
//! assert_eq!(visit.duration().num_minutes(), 30);
//! let _ = vet;
//! ```

pub mod access;
pub mod ids;
pub mod time;

// Re-export main types for convenient access
pub use access::expand_capabilities;
pub use ids::{
    AnimalId, AppointmentId, AttendanceId, CollaboratorId, InstallmentId, InvoiceId, ProductId,
    TutorId,
};
pub use time::{day_bounds, month_bounds, week_bounds, InvalidTimeRange, TimeRange};
