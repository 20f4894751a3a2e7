//! Input and output validation.
//!
//! Checks structural integrity before scheduling:
//! - Duplicate room, surgeon and patient IDs
//! - Surgeons with no specialty
//! - Patients with an empty specialty or an ASA score outside 1..=6
//! - Patient references to surgeons or equipment the registry lacks
//!
//! And after scheduling, `check_conflicts` verifies that no two
//! assignments sharing a room or a surgeon overlap and that every patient
//! is assigned at most once.

use std::collections::HashSet;

use crate::models::{Patient, ResourceRegistry, Schedule, Violation};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A surgeon or patient has no specialty.
    MissingSpecialty,
    /// ASA score outside 1..=6.
    InvalidAsaScore,
    /// A patient references a surgeon or equipment that doesn't exist.
    InvalidResourceReference,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a resource registry.
///
/// Checks:
/// 1. No duplicate room IDs
/// 2. No duplicate surgeon IDs
/// 3. Every surgeon practices at least one specialty
pub fn validate_registry(registry: &ResourceRegistry) -> ValidationResult {
    let mut errors = Vec::new();

    let mut room_ids = HashSet::new();
    for room in &registry.rooms {
        if !room_ids.insert(room.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate room ID: {}", room.id),
            ));
        }
    }

    let mut surgeon_ids = HashSet::new();
    for surgeon in &registry.surgeons {
        if !surgeon_ids.insert(surgeon.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate surgeon ID: {}", surgeon.id),
            ));
        }
        if surgeon.specialties.iter().all(|s| s.trim().is_empty()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingSpecialty,
                format!("Surgeon '{}' has no specialty", surgeon.id),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a patient batch against a registry.
///
/// Checks:
/// 1. No duplicate patient IDs
/// 2. Non-empty specialty
/// 3. ASA score in 1..=6
/// 4. Requested surgeons and required equipment exist in the registry
pub fn validate_patients(patients: &[Patient], registry: &ResourceRegistry) -> ValidationResult {
    let mut errors = Vec::new();
    let mut ids = HashSet::new();

    for p in patients {
        if !ids.insert(p.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate patient ID: {}", p.id),
            ));
        }

        if p.specialty.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingSpecialty,
                format!("Patient '{}' has no specialty", p.id),
            ));
        }

        if !(1..=6).contains(&p.asa_score) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidAsaScore,
                format!("Patient '{}' has ASA score {}", p.id, p.asa_score),
            ));
        }

        if let Some(surgeon) = &p.requested_surgeon {
            if registry.surgeon(surgeon).is_none() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidResourceReference,
                    format!("Patient '{}' requests unknown surgeon '{}'", p.id, surgeon),
                ));
            }
        }

        for item in &p.equipment {
            if !registry.equipment.contains_key(item) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidResourceReference,
                    format!("Patient '{}' requires unknown equipment '{}'", p.id, item),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Finds room overlaps, surgeon overlaps and repeated patients.
///
/// Overlap is judged on surgical intervals `[start, start + duration)`.
/// An empty result means the schedule satisfies the assignment invariant.
pub fn check_conflicts(schedule: &Schedule) -> Vec<Violation> {
    let mut violations = Vec::new();
    let a = &schedule.assignments;

    let mut patients = HashSet::new();
    for x in a {
        if !patients.insert(x.patient_id.as_str()) {
            violations.push(Violation::duplicate_patient(
                &x.patient_id,
                format!("Patient '{}' is assigned more than once", x.patient_id),
            ));
        }
    }

    for i in 0..a.len() {
        for j in (i + 1)..a.len() {
            let (x, y) = (&a[i], &a[j]);
            if !x.window().overlaps(&y.window()) {
                continue;
            }
            if x.room_id == y.room_id {
                violations.push(Violation::room_overlap(
                    &x.room_id,
                    format!(
                        "'{}' and '{}' overlap in room '{}'",
                        x.patient_id, y.patient_id, x.room_id
                    ),
                ));
            }
            if x.surgeon_id == y.surgeon_id {
                violations.push(Violation::surgeon_overlap(
                    &x.surgeon_id,
                    format!(
                        "'{}' and '{}' overlap for surgeon '{}'",
                        x.patient_id, y.patient_id, x.surgeon_id
                    ),
                ));
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assignment, Room, Surgeon, ViolationType};

    fn sample_registry() -> ResourceRegistry {
        ResourceRegistry::new()
            .with_room(Room::new("OR-1"))
            .with_room(Room::new("OR-2"))
            .with_surgeon(Surgeon::new("Dr. House", "General"))
            .with_surgeon(Surgeon::new("Dr. Yang", "Cardiovascular"))
            .with_equipment("C-Arm", 4)
    }

    #[test]
    fn test_valid_registry() {
        assert!(validate_registry(&sample_registry()).is_ok());
    }

    #[test]
    fn test_duplicate_room_and_surgeon() {
        let registry = sample_registry()
            .with_room(Room::new("OR-1"))
            .with_surgeon(Surgeon::new("Dr. Yang", "Cardiovascular"));
        let errors = validate_registry(&registry).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.kind == ValidationErrorKind::DuplicateId));
        assert!(errors.iter().any(|e| e.message.contains("room")));
    }

    #[test]
    fn test_surgeon_without_specialty() {
        let mut surgeon = Surgeon::new("Dr. Nobody", "General");
        surgeon.specialties.clear();
        let errors = validate_registry(&sample_registry().with_surgeon(surgeon)).unwrap_err();
        assert_eq!(errors[0].kind, ValidationErrorKind::MissingSpecialty);
    }

    #[test]
    fn test_valid_patients() {
        let patients = vec![
            Patient::new("P1", "General").with_asa(2).with_equipment("C-Arm"),
            Patient::new("P2", "Cardiovascular").with_surgeon("Dr. Yang"),
        ];
        assert!(validate_patients(&patients, &sample_registry()).is_ok());
    }

    #[test]
    fn test_patient_errors() {
        let patients = vec![
            Patient::new("P1", "General"),
            Patient::new("P1", "General"),
            Patient::new("P2", " "),
            Patient::new("P3", "General").with_asa(7),
            Patient::new("P4", "General").with_surgeon("Dr. Who"),
            Patient::new("P5", "General").with_equipment("Robot"),
        ];
        let errors = validate_patients(&patients, &sample_registry()).unwrap_err();
        let kinds: Vec<&ValidationErrorKind> = errors.iter().map(|e| &e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                &ValidationErrorKind::DuplicateId,
                &ValidationErrorKind::MissingSpecialty,
                &ValidationErrorKind::InvalidAsaScore,
                &ValidationErrorKind::InvalidResourceReference,
                &ValidationErrorKind::InvalidResourceReference,
            ]
        );
    }

    #[test]
    fn test_conflict_free_schedule() {
        let schedule = Schedule::from_assignments(vec![
            Assignment::regular("P1", "OR-1", "Dr. House", 480, 60),
            Assignment::regular("P2", "OR-1", "Dr. House", 540, 60),
            Assignment::emergency("E1", "OR-11", "Dr. Burke", 500, 90),
        ]);
        assert!(check_conflicts(&schedule).is_empty());
    }

    #[test]
    fn test_conflicts_detected() {
        let schedule = Schedule::from_assignments(vec![
            Assignment::regular("P1", "OR-1", "Dr. House", 480, 60),
            Assignment::regular("P2", "OR-1", "Dr. Yang", 500, 60),
            Assignment::regular("P3", "OR-2", "Dr. House", 520, 60),
            Assignment::regular("P1", "OR-3", "Dr. Kim", 900, 60),
        ]);
        let violations = check_conflicts(&schedule);
        let types: Vec<&ViolationType> = violations.iter().map(|v| &v.violation_type).collect();
        assert_eq!(types.len(), 3);
        assert!(types.contains(&&ViolationType::DuplicatePatient));
        assert!(types.contains(&&ViolationType::RoomOverlap));
        assert!(types.contains(&&ViolationType::SurgeonOverlap));
    }
}
