//! In-memory student store

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{new_document_id, Filter, Sort, StudentStore};
use crate::error::Result;
use crate::model::{Student, StudentPatch, StudentProfile};

/// Records keyed by id. Always connected.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, Student>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing records, keeping their ids and seat numbers
    pub fn with_records(records: impl IntoIterator<Item = Student>) -> Self {
        let records = records
            .into_iter()
            .map(|student| (student.id.clone(), student))
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

/// Id of the first record matching the filter
fn first_match(records: &BTreeMap<String, Student>, filter: &Filter) -> Option<String> {
    if let Some(id) = filter.as_id() {
        return records.contains_key(id).then(|| id.to_string());
    }
    records
        .values()
        .find(|student| filter.matches(student))
        .map(|student| student.id.clone())
}

#[async_trait]
impl StudentStore for MemoryStore {
    async fn find(&self, filter: &Filter) -> Result<Vec<Student>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|student| filter.matches(student))
            .cloned()
            .collect())
    }

    async fn find_one_sorted(&self, filter: &Filter, sort: Sort) -> Result<Option<Student>> {
        let records = self.records.read().await;
        let matching = records.values().filter(|student| filter.matches(student));
        Ok(sort.first(matching).cloned())
    }

    async fn insert(&self, seat_number: u32, profile: StudentProfile) -> Result<Student> {
        let student = Student::new(new_document_id(), seat_number, profile);
        self.records
            .write()
            .await
            .insert(student.id.clone(), student.clone());
        Ok(student)
    }

    async fn find_and_update(
        &self,
        filter: &Filter,
        patch: &StudentPatch,
    ) -> Result<Option<Student>> {
        let mut records = self.records.write().await;
        let Some(id) = first_match(&records, filter) else {
            return Ok(None);
        };
        Ok(records.get_mut(&id).map(|student| {
            student.apply(patch);
            student.clone()
        }))
    }

    async fn find_and_delete(&self, filter: &Filter) -> Result<Option<Student>> {
        let mut records = self.records.write().await;
        let Some(id) = first_match(&records, filter) else {
            return Ok(None);
        };
        Ok(records.remove(&id))
    }

    fn is_connected(&self) -> bool {
        true
    }
}
