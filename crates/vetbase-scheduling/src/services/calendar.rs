//! Calendar capacity queries.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use vetbase_db::models::{Appointment, Collaborator};

use crate::calendar::{
    capacity_summary, slots_per_day, view_range, CalendarSummary, CalendarView,
};
use crate::error::{Result, SchedulingError};

/// Service resolving calendar views to ranges and capacity summaries.
pub struct CalendarService {
    pool: PgPool,
}

impl CalendarService {
    /// Create a new calendar service.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolve a view for an optional collaborator.
    ///
    /// With a collaborator, the slot ceiling is their shifts' slots per day
    /// times the days the range spans; without one the summary is only the
    /// booked count.
    pub async fn summary(
        &self,
        view: CalendarView,
        reference: NaiveDate,
        collaborator_id: Option<Uuid>,
    ) -> Result<CalendarSummary> {
        let range = view_range(view, reference);

        let total_slots = match collaborator_id {
            Some(collaborator_id) => {
                let collaborator = Collaborator::find_by_id(&self.pool, collaborator_id)
                    .await?
                    .ok_or(SchedulingError::CollaboratorNotFound(collaborator_id))?;
                Some(slots_per_day(&collaborator.shifts) * range.days_spanned())
            }
            None => None,
        };

        let booked_slots = Appointment::count_non_completed_between(
            &self.pool,
            range.start(),
            range.end(),
            collaborator_id,
        )
        .await?;

        Ok(CalendarSummary {
            view,
            start: range.start(),
            end: range.end(),
            capacity: capacity_summary(total_slots, booked_slots),
        })
    }
}
