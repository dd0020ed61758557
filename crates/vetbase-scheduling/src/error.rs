//! Error types for the scheduling core.

use thiserror::Error;
use uuid::Uuid;

use vetbase_core::InvalidTimeRange;

/// Result alias for scheduling operations.
pub type Result<T> = std::result::Result<T, SchedulingError>;

/// Errors raised by the scheduling services.
#[derive(Debug, Error)]
pub enum SchedulingError {
    /// Input rejected before any write happened.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The appointment interval is empty or inverted.
    #[error(transparent)]
    InvalidInterval(#[from] InvalidTimeRange),

    /// Referenced appointment does not exist.
    #[error("Appointment {0} not found")]
    AppointmentNotFound(Uuid),

    /// Referenced collaborator does not exist.
    #[error("Collaborator {0} not found")]
    CollaboratorNotFound(Uuid),

    /// Referenced animal does not exist.
    #[error("Animal {0} not found")]
    AnimalNotFound(Uuid),

    /// The appointment is completed; completion happens exactly once and
    /// completed appointments cannot be rescheduled.
    #[error("Appointment {0} is already completed")]
    AlreadyCompleted(Uuid),

    /// The requested status transition is not allowed from the current state.
    #[error("Invalid transition for appointment {appointment_id}: {reason}")]
    InvalidTransition {
        /// The appointment in the wrong state.
        appointment_id: Uuid,
        /// Why the transition was refused.
        reason: &'static str,
    },

    /// The appointment is linked to an attendance and cannot be deleted.
    #[error("Appointment {0} is linked to an attendance and cannot be deleted")]
    AttendanceLinked(Uuid),

    /// A billing step (attendance/invoice derivation on completion) failed.
    #[error(transparent)]
    Billing(#[from] vetbase_billing::BillingError),

    /// Underlying database failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
