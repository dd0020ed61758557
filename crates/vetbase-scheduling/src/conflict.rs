//! Schedule conflict detection.
//!
//! Given the appointments of a window, flag every pair that double-books a
//! collaborator. The two roles are independent sweeps: the same person
//! booked as veterinarian on one appointment and assistant on another
//! carries independent flags. Completed appointments never conflict with
//! anything. The engine is read-only; callers attach the flags to whatever
//! they serialize.
//!
//! Per collaborator the candidates are sorted by start and swept adjacently:
//! each appointment is compared against later ones only until the first
//! `next.start >= current.end`, at which point no later appointment can
//! overlap either (O(n log n) sort plus a near-linear scan).

use std::collections::HashMap;

use serde::Serialize;

use vetbase_core::{AppointmentId, CollaboratorId, TimeRange};

/// One appointment as the conflict engine sees it.
#[derive(Debug, Clone)]
pub struct ConflictCandidate {
    /// The appointment.
    pub id: AppointmentId,
    /// Primary collaborator.
    pub veterinarian_id: CollaboratorId,
    /// Secondary collaborator, when one is assigned.
    pub assistant_id: Option<CollaboratorId>,
    /// The half-open interval the appointment occupies.
    pub range: TimeRange,
    /// Completed appointments are excluded from conflict consideration.
    pub completed: bool,
}

/// Availability flags for one appointment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConflictFlags {
    /// The primary collaborator is double-booked during this appointment.
    pub veterinarian_conflict: bool,
    /// The assistant is double-booked during this appointment.
    pub assistant_conflict: bool,
}

/// Compute per-appointment conflict flags for a set of candidates.
///
/// Every candidate appears in the result, completed ones with both flags
/// clear.
#[must_use]
pub fn detect_conflicts(
    candidates: &[ConflictCandidate],
) -> HashMap<AppointmentId, ConflictFlags> {
    let mut flags: HashMap<AppointmentId, ConflictFlags> = candidates
        .iter()
        .map(|c| (c.id, ConflictFlags::default()))
        .collect();

    sweep_role(
        candidates,
        &mut flags,
        |c| Some(c.veterinarian_id),
        |f| f.veterinarian_conflict = true,
    );
    sweep_role(
        candidates,
        &mut flags,
        |c| c.assistant_id,
        |f| f.assistant_conflict = true,
    );

    flags
}

/// One role's sweep: group by the role's collaborator, sort by start, and
/// flag every overlapping pair. Candidates the key function maps to `None`
/// (no assistant assigned) neither contribute nor receive flags.
fn sweep_role<K, S>(
    candidates: &[ConflictCandidate],
    flags: &mut HashMap<AppointmentId, ConflictFlags>,
    key: K,
    set: S,
) where
    K: Fn(&ConflictCandidate) -> Option<CollaboratorId>,
    S: Fn(&mut ConflictFlags),
{
    let mut groups: HashMap<CollaboratorId, Vec<&ConflictCandidate>> = HashMap::new();
    for candidate in candidates.iter().filter(|c| !c.completed) {
        if let Some(collaborator) = key(candidate) {
            groups.entry(collaborator).or_default().push(candidate);
        }
    }

    for group in groups.values_mut() {
        group.sort_by_key(|c| c.range.start());

        for i in 0..group.len() {
            for j in (i + 1)..group.len() {
                // Sorted by start: the first non-overlapping start ends the
                // inner scan for this candidate.
                if group[j].range.start() >= group[i].range.end() {
                    break;
                }
                if let Some(f) = flags.get_mut(&group[i].id) {
                    set(f);
                }
                if let Some(f) = flags.get_mut(&group[j].id) {
                    set(f);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, h, m, 0).unwrap()
    }

    fn candidate(
        vet: CollaboratorId,
        assistant: Option<CollaboratorId>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ConflictCandidate {
        ConflictCandidate {
            id: AppointmentId::new(),
            veterinarian_id: vet,
            assistant_id: assistant,
            range: TimeRange::new(start, end).unwrap(),
            completed: false,
        }
    }

    #[test]
    fn test_overlapping_appointments_flag_both() {
        let vet = CollaboratorId::new();
        let a = candidate(vet, None, ts(9, 0), ts(9, 30));
        let b = candidate(vet, None, ts(9, 15), ts(9, 45));
        let (a_id, b_id) = (a.id, b.id);

        let flags = detect_conflicts(&[a, b]);

        assert!(flags[&a_id].veterinarian_conflict);
        assert!(flags[&b_id].veterinarian_conflict);
        assert!(!flags[&a_id].assistant_conflict);
    }

    #[test]
    fn test_back_to_back_appointments_do_not_conflict() {
        let vet = CollaboratorId::new();
        let a = candidate(vet, None, ts(9, 0), ts(9, 30));
        let b = candidate(vet, None, ts(9, 30), ts(10, 0));
        let (a_id, b_id) = (a.id, b.id);

        let flags = detect_conflicts(&[a, b]);

        assert!(!flags[&a_id].veterinarian_conflict);
        assert!(!flags[&b_id].veterinarian_conflict);
    }

    #[test]
    fn test_different_collaborators_never_conflict() {
        let a = candidate(CollaboratorId::new(), None, ts(9, 0), ts(10, 0));
        let b = candidate(CollaboratorId::new(), None, ts(9, 0), ts(10, 0));
        let (a_id, b_id) = (a.id, b.id);

        let flags = detect_conflicts(&[a, b]);

        assert!(!flags[&a_id].veterinarian_conflict);
        assert!(!flags[&b_id].veterinarian_conflict);
    }

    #[test]
    fn test_completed_appointments_are_excluded() {
        let vet = CollaboratorId::new();
        let mut a = candidate(vet, None, ts(9, 0), ts(9, 30));
        a.completed = true;
        let b = candidate(vet, None, ts(9, 15), ts(9, 45));
        let (a_id, b_id) = (a.id, b.id);

        let flags = detect_conflicts(&[a, b]);

        // The finished visit neither receives nor causes a conflict.
        assert!(!flags[&a_id].veterinarian_conflict);
        assert!(!flags[&b_id].veterinarian_conflict);
    }

    #[test]
    fn test_assistant_role_is_swept_independently() {
        let vet_a = CollaboratorId::new();
        let vet_b = CollaboratorId::new();
        let assistant = CollaboratorId::new();

        // Different veterinarians, same assistant, overlapping times.
        let a = candidate(vet_a, Some(assistant), ts(9, 0), ts(9, 30));
        let b = candidate(vet_b, Some(assistant), ts(9, 15), ts(9, 45));
        let (a_id, b_id) = (a.id, b.id);

        let flags = detect_conflicts(&[a, b]);

        assert!(!flags[&a_id].veterinarian_conflict);
        assert!(!flags[&b_id].veterinarian_conflict);
        assert!(flags[&a_id].assistant_conflict);
        assert!(flags[&b_id].assistant_conflict);
    }

    #[test]
    fn test_no_assistant_means_no_assistant_flag() {
        let vet = CollaboratorId::new();
        let a = candidate(vet, None, ts(9, 0), ts(9, 30));
        let b = candidate(vet, None, ts(9, 15), ts(9, 45));
        let (a_id, b_id) = (a.id, b.id);

        let flags = detect_conflicts(&[a, b]);

        assert!(!flags[&a_id].assistant_conflict);
        assert!(!flags[&b_id].assistant_conflict);
    }

    #[test]
    fn test_same_person_in_both_roles_carries_independent_flags() {
        let person = CollaboratorId::new();
        let other_vet = CollaboratorId::new();

        // As veterinarian on one appointment, as assistant on an overlapping
        // other. The sweeps are per role, so neither flag is raised.
        let as_vet = candidate(person, None, ts(9, 0), ts(9, 30));
        let as_assistant = candidate(other_vet, Some(person), ts(9, 15), ts(9, 45));
        let (vet_id, assistant_id) = (as_vet.id, as_assistant.id);

        let flags = detect_conflicts(&[as_vet, as_assistant]);

        assert!(!flags[&vet_id].veterinarian_conflict);
        assert!(!flags[&assistant_id].veterinarian_conflict);
        assert!(!flags[&vet_id].assistant_conflict);
        assert!(!flags[&assistant_id].assistant_conflict);
    }

    #[test]
    fn test_chain_of_overlaps_flags_every_member() {
        let vet = CollaboratorId::new();
        let a = candidate(vet, None, ts(9, 0), ts(10, 0));
        let b = candidate(vet, None, ts(9, 30), ts(10, 30));
        let c = candidate(vet, None, ts(10, 15), ts(11, 0));
        let (a_id, b_id, c_id) = (a.id, b.id, c.id);

        let flags = detect_conflicts(&[a, b, c]);

        // a overlaps b, b overlaps c; a does not overlap c but is still
        // flagged through its pair with b.
        assert!(flags[&a_id].veterinarian_conflict);
        assert!(flags[&b_id].veterinarian_conflict);
        assert!(flags[&c_id].veterinarian_conflict);
    }

    #[test]
    fn test_long_appointment_overlapping_several_later_ones() {
        let vet = CollaboratorId::new();
        let long = candidate(vet, None, ts(9, 0), ts(12, 0));
        let first = candidate(vet, None, ts(9, 30), ts(10, 0));
        let second = candidate(vet, None, ts(11, 0), ts(11, 30));
        let ids = [long.id, first.id, second.id];

        let flags = detect_conflicts(&[long, first, second]);

        for id in ids {
            assert!(flags[&id].veterinarian_conflict);
        }
    }

    #[test]
    fn test_unsorted_input_is_handled() {
        let vet = CollaboratorId::new();
        let later = candidate(vet, None, ts(9, 15), ts(9, 45));
        let earlier = candidate(vet, None, ts(9, 0), ts(9, 30));
        let (later_id, earlier_id) = (later.id, earlier.id);

        let flags = detect_conflicts(&[later, earlier]);

        assert!(flags[&later_id].veterinarian_conflict);
        assert!(flags[&earlier_id].veterinarian_conflict);
    }

    #[test]
    fn test_empty_input() {
        assert!(detect_conflicts(&[]).is_empty());
    }

    #[test]
    fn test_flags_serialize_with_stable_field_names() {
        let flags = ConflictFlags {
            veterinarian_conflict: true,
            assistant_conflict: false,
        };
        let json = serde_json::to_value(&flags).unwrap();
        assert_eq!(json["veterinarian_conflict"], true);
        assert_eq!(json["assistant_conflict"], false);
    }
}
