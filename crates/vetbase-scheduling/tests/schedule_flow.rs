//! Integration tests for the scheduling core.
//!
//! These tests require a running PostgreSQL instance.
//! Run with: `cargo test -p vetbase-scheduling --features integration`

#![cfg(feature = "integration")]

mod common;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;

use common::TestContext;
use vetbase_db::models::{AppointmentStatus, AttendanceKind};
use vetbase_scheduling::{
    AppointmentService, CalendarService, CalendarView, CompleteAppointment, NewAppointment,
    SchedulingError,
};

// Each test books on its own day so windowed queries stay isolated even on
// a shared database; the collaborators are per-context anyway.
fn at(day: u32, h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2031, 3, day, h, m, 0).unwrap()
}

fn booking(ctx: &TestContext, start: DateTime<Utc>, end: DateTime<Utc>) -> NewAppointment {
    NewAppointment {
        animal_id: ctx.animal.id,
        tutor_id: ctx.tutor.id,
        veterinarian_id: ctx.veterinarian.id,
        assistant_id: None,
        scheduled_start: start,
        scheduled_end: end,
        notes: None,
    }
}

#[tokio::test]
async fn test_overlapping_appointments_are_flagged_for_both() {
    let ctx = TestContext::new().await;
    let service = AppointmentService::new(ctx.pool.clone());

    let first = service.create(booking(&ctx, at(3, 9, 0), at(3, 9, 30))).await.unwrap();
    let second = service.create(booking(&ctx, at(3, 9, 15), at(3, 9, 45))).await.unwrap();

    let day = NaiveDate::from_ymd_opt(2031, 3, 3).unwrap();
    let listed = service
        .list_in_view(CalendarView::Day, day, Some(ctx.veterinarian.id))
        .await
        .unwrap();

    let flag_of = |id| {
        listed
            .iter()
            .find(|a| a.appointment.id == id)
            .unwrap()
            .veterinarian_conflict
    };
    assert!(flag_of(first.id));
    assert!(flag_of(second.id));

    // The single-appointment fetch annotates against the same day window.
    let fetched = service.get(first.id).await.unwrap();
    assert!(fetched.veterinarian_conflict);
    assert!(!fetched.assistant_conflict);
}

#[tokio::test]
async fn test_back_to_back_appointments_are_not_flagged() {
    let ctx = TestContext::new().await;
    let service = AppointmentService::new(ctx.pool.clone());

    service.create(booking(&ctx, at(4, 9, 0), at(4, 9, 30))).await.unwrap();
    service.create(booking(&ctx, at(4, 9, 30), at(4, 10, 0))).await.unwrap();

    let day = NaiveDate::from_ymd_opt(2031, 3, 4).unwrap();
    let listed = service
        .list_in_view(CalendarView::Day, day, Some(ctx.veterinarian.id))
        .await
        .unwrap();

    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|a| !a.veterinarian_conflict));
    assert!(listed.iter().all(|a| !a.assistant_conflict));
}

#[tokio::test]
async fn test_completed_appointment_stops_conflicting() {
    let ctx = TestContext::new().await;
    let service = AppointmentService::new(ctx.pool.clone());

    let first = service.create(booking(&ctx, at(5, 9, 0), at(5, 9, 30))).await.unwrap();
    let second = service.create(booking(&ctx, at(5, 9, 15), at(5, 9, 45))).await.unwrap();

    service
        .complete(
            first.id,
            CompleteAppointment {
                kind: AttendanceKind::Consultation,
                price: Some(dec!(80.00)),
                notes: None,
            },
        )
        .await
        .unwrap();

    let day = NaiveDate::from_ymd_opt(2031, 3, 5).unwrap();
    let listed = service
        .list_in_view(CalendarView::Day, day, Some(ctx.veterinarian.id))
        .await
        .unwrap();

    let entry_of = |id| listed.iter().find(|a| a.appointment.id == id).unwrap();
    assert!(!entry_of(first.id).veterinarian_conflict);
    assert!(!entry_of(second.id).veterinarian_conflict);
}

#[tokio::test]
async fn test_completion_creates_attendance_and_invoice_once() {
    let ctx = TestContext::new().await;
    let service = AppointmentService::new(ctx.pool.clone());

    let appointment = service.create(booking(&ctx, at(6, 10, 0), at(6, 10, 30))).await.unwrap();
    assert_eq!(appointment.status, AppointmentStatus::Scheduled);

    let (completed, invoice) = service
        .complete(
            appointment.id,
            CompleteAppointment {
                kind: AttendanceKind::Consultation,
                price: Some(dec!(90.00)),
                notes: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(completed.status, AppointmentStatus::Completed);
    assert!(completed.attendance_id.is_some());
    assert_eq!(invoice.total, dec!(90.00));
    assert_eq!(invoice.tutor_id, ctx.tutor.id);

    // Completion is exactly-once.
    let err = service
        .complete(
            appointment.id,
            CompleteAppointment {
                kind: AttendanceKind::Consultation,
                price: None,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::AlreadyCompleted(_)));

    // And the appointment can no longer be deleted.
    let err = service.delete(appointment.id).await.unwrap_err();
    assert!(matches!(err, SchedulingError::AttendanceLinked(_)));
}

#[tokio::test]
async fn test_confirm_and_reschedule_transitions() {
    let ctx = TestContext::new().await;
    let service = AppointmentService::new(ctx.pool.clone());

    let appointment = service.create(booking(&ctx, at(7, 11, 0), at(7, 11, 30))).await.unwrap();

    let confirmed = service.confirm(appointment.id).await.unwrap();
    assert_eq!(confirmed.status, AppointmentStatus::Confirmed);
    assert!(confirmed.confirmed_at.is_some());

    // Confirming twice is an invalid transition.
    let err = service.confirm(appointment.id).await.unwrap_err();
    assert!(matches!(err, SchedulingError::InvalidTransition { .. }));

    // Rescheduling resets the lifecycle.
    let moved = service
        .reschedule(appointment.id, at(7, 14, 0), at(7, 14, 30))
        .await
        .unwrap();
    assert_eq!(moved.status, AppointmentStatus::Scheduled);
    assert!(moved.confirmed_at.is_none());
    assert_eq!(moved.scheduled_start, at(7, 14, 0));
}

#[tokio::test]
async fn test_inverted_interval_is_rejected() {
    let ctx = TestContext::new().await;
    let service = AppointmentService::new(ctx.pool.clone());

    let err = service
        .create(booking(&ctx, at(8, 10, 0), at(8, 9, 0)))
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::InvalidInterval(_)));
}

#[tokio::test]
async fn test_calendar_capacity_for_collaborator_week() {
    let ctx = TestContext::new().await;
    let appointments = AppointmentService::new(ctx.pool.clone());
    let calendar = CalendarService::new(ctx.pool.clone());

    // Two bookings in the week of 2031-03-10 (Monday).
    appointments.create(booking(&ctx, at(10, 9, 0), at(10, 9, 30))).await.unwrap();
    appointments.create(booking(&ctx, at(12, 9, 0), at(12, 9, 30))).await.unwrap();

    let summary = calendar
        .summary(
            CalendarView::Week,
            NaiveDate::from_ymd_opt(2031, 3, 12).unwrap(),
            Some(ctx.veterinarian.id),
        )
        .await
        .unwrap();

    // morning + afternoon = 8 slots/day over 7 days.
    assert_eq!(summary.capacity.total_slots, Some(56));
    assert_eq!(summary.capacity.booked_slots, 2);
    assert_eq!(summary.capacity.available_slots, Some(54));
}

#[tokio::test]
async fn test_calendar_without_collaborator_has_no_ceiling() {
    let ctx = TestContext::new().await;
    let appointments = AppointmentService::new(ctx.pool.clone());
    let calendar = CalendarService::new(ctx.pool.clone());

    appointments.create(booking(&ctx, at(20, 9, 0), at(20, 9, 30))).await.unwrap();

    let summary = calendar
        .summary(
            CalendarView::Day,
            NaiveDate::from_ymd_opt(2031, 3, 20).unwrap(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(summary.capacity.total_slots, None);
    assert_eq!(summary.capacity.available_slots, None);
    assert!(summary.capacity.booked_slots >= 1);
}
