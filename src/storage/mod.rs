//! Storage layer for the roster
//!
//! The service only ever talks to a [`StudentStore`]. Two backends exist:
//! - [`MarkdownStore`]: one markdown file per record, committed to git
//! - [`MemoryStore`]: a map behind a lock, for tests and throwaway servers

pub mod frontmatter;
pub mod markdown;
pub mod memory;

pub use markdown::MarkdownStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use std::cmp::Ordering;

use crate::error::Result;
use crate::model::{Student, StudentField, StudentPatch, StudentProfile};

/// Name of the single collection the roster keeps
pub const STUDENTS_COLLECTION: &str = "students";

/// Document store operations over the students collection
#[async_trait]
pub trait StudentStore: Send + Sync {
    /// All records matching the filter
    async fn find(&self, filter: &Filter) -> Result<Vec<Student>>;

    /// The first matching record under the given ordering
    async fn find_one_sorted(&self, filter: &Filter, sort: Sort) -> Result<Option<Student>>;

    /// Persist a new record; the store assigns its id
    async fn insert(&self, seat_number: u32, profile: StudentProfile) -> Result<Student>;

    /// Apply a patch to the first matching record and return the updated record
    async fn find_and_update(&self, filter: &Filter, patch: &StudentPatch)
        -> Result<Option<Student>>;

    /// Remove the first matching record and return it
    async fn find_and_delete(&self, filter: &Filter) -> Result<Option<Student>>;

    /// Whether the backing store is reachable
    fn is_connected(&self) -> bool;
}

/// Record selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    All,
    Eq(StudentField, String),
}

impl Filter {
    /// Select by store id
    pub fn id(id: impl Into<String>) -> Self {
        Filter::Eq(StudentField::Id, id.into())
    }

    /// Select by field equality
    pub fn eq(field: StudentField, value: impl Into<String>) -> Self {
        Filter::Eq(field, value.into())
    }

    pub fn matches(&self, student: &Student) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, value) => student.field_equals(*field, value),
        }
    }

    /// The id this filter pins down, if it selects by id
    pub fn as_id(&self) -> Option<&str> {
        match self {
            Filter::Eq(StudentField::Id, id) => Some(id),
            _ => None,
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Single-field ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: StudentField,
    pub direction: Direction,
}

impl Sort {
    pub fn asc(field: StudentField) -> Self {
        Self {
            field,
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: StudentField) -> Self {
        Self {
            field,
            direction: Direction::Desc,
        }
    }

    pub fn compare(&self, a: &Student, b: &Student) -> Ordering {
        let cmp = a.field(self.field).cmp(&b.field(self.field));
        match self.direction {
            Direction::Asc => cmp,
            Direction::Desc => cmp.reverse(),
        }
    }

    /// The first record under this ordering
    pub fn first<'a>(&self, students: impl IntoIterator<Item = &'a Student>) -> Option<&'a Student> {
        students
            .into_iter()
            .min_by(|a, b| self.compare(a, b))
    }
}

/// Mint a new store id
pub(crate) fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
