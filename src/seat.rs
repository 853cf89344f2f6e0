//! Seat codes and seat numbers
//!
//! Two independent rules share this module:
//!
//! - **Seat codes** are the 4-digit suffix of an identifier. An identifier is
//!   valid when it is well formed, belongs to the school, and its seat code is
//!   not already used by a stored account.
//! - **Seat numbers** are sequential integers the store hands out at creation
//!   time (`max + 1`, starting at 1).
//!
//! The two are never cross-checked against each other.
//!
//! # Allocation and concurrency
//!
//! Reading the current maximum and inserting the next record are two store
//! calls. [`SeatAllocator`] holds a single writer lock across both so that
//! creations going through one allocator can never hand out the same number.
//! Writers that bypass it (another process on the same repository, or a
//! caller using [`next_seat_number`] directly) can still collide, which
//! [`duplicate_seat_numbers`] detects.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::identifier::{self, StudentId, MIN_IDENTIFIER_LEN};
use crate::model::{Student, StudentField, StudentProfile};
use crate::storage::{Filter, Sort, StudentStore};

/// The only school code the roster accepts
pub const SCHOOL_CODE: &str = "tku";

/// Result of checking an identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationOutcome {
    Valid,
    InvalidFormat,
    WrongSchool,
    InvalidSeatFormat,
    DuplicateSeat,
}

impl ValidationOutcome {
    pub fn is_valid(self) -> bool {
        self == ValidationOutcome::Valid
    }

    /// Human-readable explanation
    pub fn message(self) -> &'static str {
        match self {
            ValidationOutcome::Valid => "identifier is valid",
            ValidationOutcome::InvalidFormat => {
                "identifier must be tku + department code + four-digit seat code, e.g. tkubm1760"
            }
            ValidationOutcome::WrongSchool => "school code must be tku",
            ValidationOutcome::InvalidSeatFormat => "seat code must be exactly four digits",
            ValidationOutcome::DuplicateSeat => "seat code already exists",
        }
    }
}

fn seat_code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{4}$").expect("seat code pattern is valid"))
}

/// The store-independent checks, in order: length, school, seat code format.
///
/// Returns the parsed identifier when all of them pass.
pub fn check_format(identifier: &str) -> std::result::Result<StudentId<'_>, ValidationOutcome> {
    if identifier.chars().count() < MIN_IDENTIFIER_LEN {
        return Err(ValidationOutcome::InvalidFormat);
    }

    let parsed = identifier::parse(identifier);

    if parsed.school_code != SCHOOL_CODE {
        return Err(ValidationOutcome::WrongSchool);
    }

    if !seat_code_pattern().is_match(parsed.seat_code) {
        return Err(ValidationOutcome::InvalidSeatFormat);
    }

    Ok(parsed)
}

/// Check an identifier against the format rules and every stored account.
///
/// The duplicate check loads the whole collection and compares seat codes as
/// strings. Stored accounts are split with the same clamped parse, so a short
/// legacy account still contributes whatever its last four characters are.
pub async fn validate_identifier(
    store: &dyn StudentStore,
    identifier: &str,
) -> Result<ValidationOutcome> {
    let parsed = match check_format(identifier) {
        Ok(parsed) => parsed,
        Err(outcome) => return Ok(outcome),
    };

    if seat_code_taken(store, parsed.seat_code).await? {
        return Ok(ValidationOutcome::DuplicateSeat);
    }

    Ok(ValidationOutcome::Valid)
}

/// Whether any stored account carries this seat code
pub async fn seat_code_taken(store: &dyn StudentStore, seat_code: &str) -> Result<bool> {
    let students = store.find(&Filter::All).await?;
    Ok(students
        .iter()
        .any(|student| identifier::parse(&student.profile.account).seat_code == seat_code))
}

/// The seat number the next record should get: highest stored + 1, or 1.
///
/// A stored seat of `u32::MAX` leaves no next number and is reported as a
/// store failure. This reads without locking; use [`SeatAllocator`] when the
/// number is going to be written.
pub async fn next_seat_number(store: &dyn StudentStore) -> Result<u32> {
    let top = store
        .find_one_sorted(&Filter::All, Sort::desc(StudentField::SeatNumber))
        .await?;
    match top {
        None => Ok(1),
        Some(student) => student
            .seat_number
            .checked_add(1)
            .ok_or(Error::SeatNumbersExhausted {
                highest: student.seat_number,
            }),
    }
}

/// Single-writer seat assignment
#[derive(Debug, Default)]
pub struct SeatAllocator {
    writer: Mutex<()>,
}

impl SeatAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick the next seat number and insert the record under one lock
    pub async fn assign(&self, store: &dyn StudentStore, profile: StudentProfile) -> Result<Student> {
        let _writer = self.writer.lock().await;

        let seat_number = next_seat_number(store).await?;
        tracing::debug!("Assigned seat number {} to {}", seat_number, profile.account);

        let student = store.insert(seat_number, profile).await?;
        tracing::debug!("Persisted student {} with seat number {}", student.id, seat_number);

        Ok(student)
    }
}

/// A seat number held by more than one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatConflict {
    pub seat_number: u32,
    pub ids: Vec<String>,
}

/// Every seat number that appears more than once, lowest first
pub fn duplicate_seat_numbers(students: &[Student]) -> Vec<SeatConflict> {
    let mut by_seat: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    for student in students {
        by_seat
            .entry(student.seat_number)
            .or_default()
            .push(student.id.clone());
    }

    by_seat
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(seat_number, mut ids)| {
            ids.sort();
            SeatConflict { seat_number, ids }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::sample_profile;
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    fn seeded(accounts: &[(&str, u32)]) -> MemoryStore {
        MemoryStore::with_records(accounts.iter().enumerate().map(|(i, (account, seat))| {
            Student::new(format!("id{}", i), *seat, sample_profile(account, "Someone"))
        }))
    }

    #[test]
    fn test_short_identifiers_are_invalid_format() {
        for id in ["", "t", "tku", "tku123", "tkubm1"] {
            assert_eq!(check_format(id).unwrap_err(), ValidationOutcome::InvalidFormat, "{id}");
        }
    }

    #[test]
    fn test_wrong_school() {
        for id in ["ntubm1760", "TKUbm1760", "tk1bm1760", "xyz0000"] {
            assert_eq!(check_format(id).unwrap_err(), ValidationOutcome::WrongSchool, "{id}");
        }
    }

    #[test]
    fn test_invalid_seat_format() {
        for id in ["tkubm17a0", "tkubmabcd", "tkubm 176", "tkubm١٢٣٤"] {
            assert_eq!(
                check_format(id).unwrap_err(),
                ValidationOutcome::InvalidSeatFormat,
                "{id}"
            );
        }
    }

    #[test]
    fn test_well_formed() {
        let parsed = check_format("tkubm1760").unwrap();
        assert_eq!(parsed.seat_code, "1760");
        assert!(check_format("tku0787").is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_seat_code() {
        let store = seeded(&[("tkuee0787", 1), ("tkubm1760", 2)]);

        let outcome = validate_identifier(&store, "tkucs0787").await.unwrap();
        assert_eq!(outcome, ValidationOutcome::DuplicateSeat);

        let outcome = validate_identifier(&store, "tkucs0788").await.unwrap();
        assert_eq!(outcome, ValidationOutcome::Valid);
    }

    #[tokio::test]
    async fn test_short_stored_accounts_still_collide() {
        let store = seeded(&[("ab1234", 1)]);
        let outcome = validate_identifier(&store, "tkubm1234").await.unwrap();
        assert_eq!(outcome, ValidationOutcome::DuplicateSeat);
    }

    #[tokio::test]
    async fn test_format_checks_run_before_store_scan() {
        let store = seeded(&[("tkuee0787", 1)]);
        let outcome = validate_identifier(&store, "ntuee0787").await.unwrap();
        assert_eq!(outcome, ValidationOutcome::WrongSchool);
    }

    #[tokio::test]
    async fn test_next_seat_number() {
        let store = MemoryStore::new();
        assert_eq!(next_seat_number(&store).await.unwrap(), 1);

        store
            .insert(5, sample_profile("tkubm0001", "Lin"))
            .await
            .unwrap();
        assert_eq!(next_seat_number(&store).await.unwrap(), 6);

        store
            .insert(2, sample_profile("tkubm9999", "Chen"))
            .await
            .unwrap();
        assert_eq!(next_seat_number(&store).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_highest_seat_leaves_no_next_number() {
        let store = seeded(&[("tkubm0001", u32::MAX)]);

        let err = next_seat_number(&store).await.unwrap_err();
        assert!(matches!(err, Error::SeatNumbersExhausted { highest: u32::MAX }));

        let allocator = SeatAllocator::new();
        assert!(allocator
            .assign(&store, sample_profile("tkubm0002", "Chen"))
            .await
            .is_err());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_at_highest_seat_is_500() {
        let store = Arc::new(seeded(&[("tkubm0001", u32::MAX)]));
        let service = crate::service::StudentService::new(store.clone());

        let input = crate::model::NewStudent {
            account: Some("tkubm0002".into()),
            name: Some("Chen".into()),
            department: Some("Banking".into()),
            grade_year: Some("2".into()),
            class_name: Some("A".into()),
            email: Some("chen@example.com".into()),
        };

        let envelope = service.create(input).await;
        assert_eq!(envelope.code, 500);
        assert_eq!(envelope.message, crate::error::SERVER_ERROR_MESSAGE);
        assert!(envelope.body.is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_allocator_serializes_concurrent_writers() {
        let store: Arc<dyn StudentStore> = Arc::new(MemoryStore::new());
        let allocator = Arc::new(SeatAllocator::new());

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = Arc::clone(&store);
            let allocator = Arc::clone(&allocator);
            handles.push(tokio::spawn(async move {
                allocator
                    .assign(store.as_ref(), sample_profile(&format!("tkubm{:04}", i), "X"))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let students = store.find(&Filter::All).await.unwrap();
        assert_eq!(students.len(), 16);
        assert!(duplicate_seat_numbers(&students).is_empty());

        let mut seats: Vec<u32> = students.iter().map(|s| s.seat_number).collect();
        seats.sort_unstable();
        assert_eq!(seats, (1..=16).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_unserialized_allocation_is_detected() {
        let store = MemoryStore::new();

        // Two writers read the same maximum before either inserts
        let first = next_seat_number(&store).await.unwrap();
        let second = next_seat_number(&store).await.unwrap();
        store
            .insert(first, sample_profile("tkubm0001", "A"))
            .await
            .unwrap();
        store
            .insert(second, sample_profile("tkubm0002", "B"))
            .await
            .unwrap();

        let students = store.find(&Filter::All).await.unwrap();
        let conflicts = duplicate_seat_numbers(&students);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].seat_number, 1);
        assert_eq!(conflicts[0].ids.len(), 2);
    }
}
