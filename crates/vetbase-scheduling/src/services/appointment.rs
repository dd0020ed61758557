//! Appointment lifecycle and conflict annotation.
//!
//! Conflict flags are computed on read, never persisted: booking is not
//! prevented, double-bookings are surfaced to staff after the fact. Writes
//! that touch billing state (completion) run in one transaction together
//! with attendance creation and invoice derivation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use vetbase_billing::money::round_money;
use vetbase_billing::services::invoice_sync::{sync_within, SyncOptions};
use vetbase_core::{day_bounds, AppointmentId, CollaboratorId, TimeRange};
use vetbase_db::models::{
    Animal, Appointment, AppointmentStatus, Attendance, AttendanceKind, Collaborator,
    CreateAppointment, CreateAttendance, Invoice,
};

use crate::calendar::{view_range, CalendarView};
use crate::conflict::{detect_conflicts, ConflictCandidate};
use crate::error::{Result, SchedulingError};

/// Input for booking an appointment. The out-of-scope validation layer has
/// already checked the payload shape; the interval ordering is re-checked
/// here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    /// The animal to be seen.
    pub animal_id: Uuid,
    /// The tutor bringing the animal.
    pub tutor_id: Uuid,
    /// Primary collaborator.
    pub veterinarian_id: Uuid,
    /// Optional secondary collaborator.
    pub assistant_id: Option<Uuid>,
    /// Interval start.
    pub scheduled_start: DateTime<Utc>,
    /// Interval end.
    pub scheduled_end: DateTime<Utc>,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// Input for completing an appointment into an attendance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteAppointment {
    /// Kind of the derived attendance.
    pub kind: AttendanceKind,
    /// Explicit attendance price; defaults to zero until items are added.
    pub price: Option<Decimal>,
    /// Clinical notes for the attendance.
    pub notes: Option<String>,
}

/// An appointment with its availability flags attached, ready for the HTTP
/// layer to serialize.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotatedAppointment {
    /// The appointment row.
    #[serde(flatten)]
    pub appointment: Appointment,
    /// The primary collaborator is double-booked.
    pub veterinarian_conflict: bool,
    /// The assistant is double-booked.
    pub assistant_conflict: bool,
}

/// Service for appointment lifecycle operations.
pub struct AppointmentService {
    pool: PgPool,
}

impl AppointmentService {
    /// Create a new appointment service.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Book an appointment in the `scheduled` state.
    pub async fn create(&self, input: NewAppointment) -> Result<Appointment> {
        TimeRange::new(input.scheduled_start, input.scheduled_end)?;

        Animal::find_by_id(&self.pool, input.animal_id)
            .await?
            .ok_or(SchedulingError::AnimalNotFound(input.animal_id))?;
        Collaborator::find_by_id(&self.pool, input.veterinarian_id)
            .await?
            .ok_or(SchedulingError::CollaboratorNotFound(input.veterinarian_id))?;
        if let Some(assistant_id) = input.assistant_id {
            Collaborator::find_by_id(&self.pool, assistant_id)
                .await?
                .ok_or(SchedulingError::CollaboratorNotFound(assistant_id))?;
        }

        let appointment = Appointment::insert(
            &self.pool,
            &CreateAppointment {
                animal_id: input.animal_id,
                tutor_id: input.tutor_id,
                veterinarian_id: input.veterinarian_id,
                assistant_id: input.assistant_id,
                scheduled_start: input.scheduled_start,
                scheduled_end: input.scheduled_end,
                notes: input.notes,
            },
        )
        .await?;

        tracing::info!(appointment_id = %appointment.id, "Appointment booked");
        Ok(appointment)
    }

    /// Fetch one appointment with conflict flags computed against the other
    /// appointments of its day.
    pub async fn get(&self, id: Uuid) -> Result<AnnotatedAppointment> {
        let appointment = Appointment::find_by_id(&self.pool, id)
            .await?
            .ok_or(SchedulingError::AppointmentNotFound(id))?;

        let (start, end) = day_bounds(appointment.scheduled_start.date_naive());
        let neighbors = Appointment::list_between(&self.pool, start, end, None).await?;
        let annotated = annotate(neighbors)?;

        annotated
            .into_iter()
            .find(|a| a.appointment.id == id)
            .ok_or(SchedulingError::AppointmentNotFound(id))
    }

    /// List a calendar view's appointments with conflict flags, optionally
    /// restricted to one collaborator (in either role).
    pub async fn list_in_view(
        &self,
        view: CalendarView,
        reference: chrono::NaiveDate,
        collaborator_id: Option<Uuid>,
    ) -> Result<Vec<AnnotatedAppointment>> {
        let range = view_range(view, reference);
        let appointments =
            Appointment::list_between(&self.pool, range.start(), range.end(), collaborator_id)
                .await?;
        annotate(appointments)
    }

    /// Confirm a scheduled appointment, stamping the confirmation time.
    pub async fn confirm(&self, id: Uuid) -> Result<Appointment> {
        match Appointment::confirm(&self.pool, id, Utc::now()).await? {
            Some(appointment) => Ok(appointment),
            None => match Appointment::find_by_id(&self.pool, id).await? {
                Some(_) => Err(SchedulingError::InvalidTransition {
                    appointment_id: id,
                    reason: "only scheduled appointments can be confirmed",
                }),
                None => Err(SchedulingError::AppointmentNotFound(id)),
            },
        }
    }

    /// Move an appointment to a new interval. The status falls back to
    /// `scheduled` and the confirmation is cleared; completed appointments
    /// cannot move.
    pub async fn reschedule(
        &self,
        id: Uuid,
        scheduled_start: DateTime<Utc>,
        scheduled_end: DateTime<Utc>,
    ) -> Result<Appointment> {
        TimeRange::new(scheduled_start, scheduled_end)?;

        match Appointment::reschedule(&self.pool, id, scheduled_start, scheduled_end).await? {
            Some(appointment) => {
                tracing::info!(appointment_id = %id, "Appointment rescheduled");
                Ok(appointment)
            }
            None => match Appointment::find_by_id(&self.pool, id).await? {
                Some(_) => Err(SchedulingError::AlreadyCompleted(id)),
                None => Err(SchedulingError::AppointmentNotFound(id)),
            },
        }
    }

    /// Complete an appointment: create (or reuse) its attendance, mark the
    /// appointment completed, and derive the invoice, all in one
    /// transaction. Completion happens exactly once.
    pub async fn complete(
        &self,
        id: Uuid,
        input: CompleteAppointment,
    ) -> Result<(Appointment, Invoice)> {
        let mut tx = self.pool.begin().await?;

        let appointment = Appointment::find_by_id(&mut *tx, id)
            .await?
            .ok_or(SchedulingError::AppointmentNotFound(id))?;
        if appointment.status == AppointmentStatus::Completed {
            return Err(SchedulingError::AlreadyCompleted(id));
        }

        let attendance_id = match appointment.attendance_id {
            Some(attendance_id) => attendance_id,
            None => {
                let attendance = Attendance::insert(
                    &mut *tx,
                    &CreateAttendance {
                        animal_id: appointment.animal_id,
                        kind: input.kind,
                        date: appointment.scheduled_start.date_naive(),
                        price: round_money(input.price.unwrap_or(Decimal::ZERO)),
                        notes: input.notes,
                    },
                )
                .await?;
                attendance.id
            }
        };

        if !Appointment::mark_completed(&mut *tx, id, attendance_id).await? {
            return Err(SchedulingError::AlreadyCompleted(id));
        }

        let invoice = sync_within(
            &mut tx,
            attendance_id,
            &SyncOptions {
                due_date: None,
                tutor_id: Some(appointment.tutor_id),
            },
        )
        .await?;

        let appointment = Appointment::find_by_id(&mut *tx, id)
            .await?
            .ok_or(SchedulingError::AppointmentNotFound(id))?;

        tx.commit().await?;

        tracing::info!(
            appointment_id = %id,
            %attendance_id,
            invoice_id = %invoice.id,
            "Appointment completed"
        );

        Ok((appointment, invoice))
    }

    /// Delete an appointment that has not produced an attendance.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let appointment = Appointment::find_by_id(&self.pool, id)
            .await?
            .ok_or(SchedulingError::AppointmentNotFound(id))?;

        if appointment.attendance_id.is_some() {
            return Err(SchedulingError::AttendanceLinked(id));
        }

        Appointment::delete(&self.pool, id).await?;
        tracing::info!(appointment_id = %id, "Appointment deleted");
        Ok(())
    }
}

/// Run the conflict engine over a batch of appointments and attach flags.
fn annotate(appointments: Vec<Appointment>) -> Result<Vec<AnnotatedAppointment>> {
    let candidates = appointments
        .iter()
        .map(|a| {
            Ok(ConflictCandidate {
                id: AppointmentId::from_uuid(a.id),
                veterinarian_id: CollaboratorId::from_uuid(a.veterinarian_id),
                assistant_id: a.assistant_id.map(CollaboratorId::from_uuid),
                range: TimeRange::new(a.scheduled_start, a.scheduled_end)?,
                completed: a.status == AppointmentStatus::Completed,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let flags = detect_conflicts(&candidates);

    Ok(appointments
        .into_iter()
        .map(|appointment| {
            let f = flags
                .get(&AppointmentId::from_uuid(appointment.id))
                .copied()
                .unwrap_or_default();
            AnnotatedAppointment {
                appointment,
                veterinarian_conflict: f.veterinarian_conflict,
                assistant_conflict: f.assistant_conflict,
            }
        })
        .collect())
}
