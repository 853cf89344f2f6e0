//! Student record service
//!
//! One method per use case. Each returns an [`Envelope`]; no error escapes.
//!
//! Creation runs through these stages:
//!
//! ```text
//! Received -> FieldsValidated -> SeatAssigned -> Persisted -> Returned
//!                  |                  |              |
//!             Rejected(400)       Failed(500)    Failed(500)
//! ```
//!
//! A store failure is reported once; nothing is retried.

use std::sync::Arc;

use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::model::{NewStudent, Student, StudentField, StudentPatch};
use crate::seat::{self, SeatAllocator, SeatConflict, ValidationOutcome};
use crate::storage::{Filter, StudentStore};
use crate::validation;

/// Orchestrates roster use cases over an injected store
pub struct StudentService {
    store: Arc<dyn StudentStore>,
    seats: SeatAllocator,
}

impl std::fmt::Debug for StudentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudentService")
            .field("connected", &self.store.is_connected())
            .finish()
    }
}

impl StudentService {
    pub fn new(store: Arc<dyn StudentStore>) -> Self {
        Self {
            store,
            seats: SeatAllocator::new(),
        }
    }

    /// The underlying store
    pub fn store(&self) -> &dyn StudentStore {
        self.store.as_ref()
    }

    /// Connection status of the underlying store
    pub fn is_connected(&self) -> bool {
        self.store.is_connected()
    }

    /// Every record
    pub async fn list_all(&self) -> Envelope<Vec<Student>> {
        let result = self.store.find(&Filter::All).await;
        if let Ok(students) = &result {
            tracing::debug!("Listed {} students", students.len());
        }
        Envelope::from_result("list all", "find success", result)
    }

    /// Create a record after checking required fields and assigning a seat number
    pub async fn create(&self, input: NewStudent) -> Envelope<Student> {
        let result = self.try_create(input).await;
        Envelope::from_result("create", "insert success", result)
    }

    async fn try_create(&self, input: NewStudent) -> Result<Student> {
        let profile = validation::require_fields(&input)?;
        tracing::debug!("Fields validated for {}", profile.account);

        let student = self.seats.assign(self.store.as_ref(), profile).await?;
        tracing::info!(
            "Created student {} ({}) with seat number {}",
            student.id,
            student.profile.account,
            student.seat_number
        );
        Ok(student)
    }

    /// Update the record whose account equals `account`.
    ///
    /// Accounts are not unique in the store; when more than one record
    /// carries the account nothing is changed and the call is rejected.
    pub async fn update_by_key(&self, account: &str, patch: StudentPatch) -> Envelope<Student> {
        let result: Result<Student> = async {
            validation::check_patch(&patch)?;
            let id = self.resolve_account(account).await?;
            self.apply_patch(Filter::id(id), &patch).await
        }
        .await;
        Envelope::from_result("update by key", "update success", result)
    }

    /// Store id of the single record holding `account`
    async fn resolve_account(&self, account: &str) -> Result<String> {
        let mut matches = self
            .store
            .find(&Filter::eq(StudentField::Account, account))
            .await?;
        match matches.len() {
            0 => Err(Error::StudentNotFound {
                key: account.to_string(),
            }),
            1 => Ok(matches.remove(0).id),
            count => Err(Error::AmbiguousKey {
                key: account.to_string(),
                count,
            }),
        }
    }

    /// Update the record with store id `id`
    pub async fn update_by_id(&self, id: &str, patch: StudentPatch) -> Envelope<Student> {
        let result: Result<Student> = async {
            validation::check_patch(&patch)?;
            self.apply_patch(Filter::id(id), &patch).await
        }
        .await;
        Envelope::from_result("update by id", "student updated successfully", result)
    }

    async fn apply_patch(&self, filter: Filter, patch: &StudentPatch) -> Result<Student> {
        let updated = self.store.find_and_update(&filter, patch).await?;
        let student = updated.ok_or_else(|| Error::StudentNotFound {
            key: filter_key(&filter),
        })?;
        tracing::info!("Updated student {}", student.id);
        Ok(student)
    }

    /// Equality query on a named field. Zero matches yields a 404 with no body.
    pub async fn find_by_field(&self, field: &str, value: &str) -> Envelope<Vec<Student>> {
        let result: Result<Vec<Student>> = async {
            let field: StudentField = field.parse()?;
            self.students_by_field(field, value)
                .await?
                .ok_or_else(|| Error::NoMatches {
                    field,
                    value: value.to_string(),
                })
        }
        .await;
        Envelope::from_result("find by field", "students found", result)
    }

    /// Matching records, or `None` when nothing matches (never an empty list)
    pub async fn students_by_field(
        &self,
        field: StudentField,
        value: &str,
    ) -> Result<Option<Vec<Student>>> {
        let students = self.store.find(&Filter::eq(field, value)).await?;
        tracing::debug!("{} = {:?} matched {} students", field, value, students.len());
        Ok((!students.is_empty()).then_some(students))
    }

    /// Remove a record and return it
    pub async fn delete_by_id(&self, id: &str) -> Envelope<Student> {
        let result: Result<Student> = async {
            let deleted = self.store.find_and_delete(&Filter::id(id)).await?;
            deleted.ok_or_else(|| Error::StudentNotFound { key: id.to_string() })
        }
        .await;
        if let Ok(student) = &result {
            tracing::info!("Deleted student {}", student.id);
        }
        Envelope::from_result("delete by id", "student deleted successfully", result)
    }

    /// Check an identifier. Anything but `Valid` is a 400 carrying the outcome.
    pub async fn validate_identifier(&self, account: &str) -> Envelope<ValidationOutcome> {
        match seat::validate_identifier(self.store.as_ref(), account).await {
            Ok(outcome) if outcome.is_valid() => Envelope::ok(outcome.message(), outcome),
            Ok(outcome) => {
                tracing::debug!("Identifier {:?} rejected: {:?}", account, outcome);
                let err = Error::InvalidIdentifier(outcome);
                Envelope {
                    code: err.status_code(),
                    message: err.public_message(),
                    body: Some(outcome),
                }
            }
            Err(err) => Envelope::from_error("validate identifier", &err),
        }
    }

    /// Seat numbers held by more than one record
    pub async fn audit_seats(&self) -> Envelope<Vec<SeatConflict>> {
        let result = self
            .store
            .find(&Filter::All)
            .await
            .map(|students| seat::duplicate_seat_numbers(&students));
        if let Ok(conflicts) = &result {
            for conflict in conflicts {
                tracing::warn!(
                    "Seat number {} is shared by {:?}",
                    conflict.seat_number,
                    conflict.ids
                );
            }
        }
        Envelope::from_result("seat audit", "seat audit complete", result)
    }
}

fn filter_key(filter: &Filter) -> String {
    match filter {
        Filter::All => String::new(),
        Filter::Eq(_, value) => value.clone(),
    }
}
