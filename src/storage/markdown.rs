//! Markdown store - one file per student, versioned with git
//!
//! Directory structure:
//! ```text
//! <root>/
//!   .git/
//!   collections/
//!     students/
//!       4f1c2a9e0b7d4e58a1c3b2d4e5f60718.md
//!       9b0e77c1d2a84f3c8e61f0a5b4c3d2e1.md
//! ```
//!
//! The file stem is the record id. Writes are serialized behind the git
//! handle and each one is committed before it is reported as done.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use walkdir::WalkDir;

use super::{frontmatter, new_document_id, Filter, Sort, StudentStore, STUDENTS_COLLECTION};
use crate::error::{Error, Result};
use crate::git;
use crate::model::{Student, StudentPatch, StudentProfile};
use crate::validation::validate_document_id;

/// Student records stored as markdown files in a git repository
#[derive(Debug)]
pub struct MarkdownStore {
    /// Root of the repository
    pub root: PathBuf,
    /// Directory holding the record files
    pub path: PathBuf,
    /// Git handle; holding the lock is what makes a writer
    git: Mutex<git::Repository>,
}

impl MarkdownStore {
    /// Open the store at `root`, creating the repository and collection if needed
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|source| Error::FileWrite {
                path: root.clone(),
                source,
            })?;

        let git = git::Repository::open_or_init(&root)?;
        let path = root.join("collections").join(STUDENTS_COLLECTION);
        fs::create_dir_all(&path)
            .await
            .map_err(|source| Error::FileWrite {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            root,
            path,
            git: Mutex::new(git),
        })
    }

    /// Number of commits in the backing repository
    pub async fn commit_count(&self) -> Result<usize> {
        self.git.lock().await.commit_count()
    }

    /// Summary of the latest commit
    pub async fn last_commit_message(&self) -> Result<String> {
        self.git.lock().await.head_message()
    }

    /// Whether the working tree has changes no write has committed
    pub async fn has_uncommitted_changes(&self) -> Result<bool> {
        self.git.lock().await.has_changes()
    }

    /// Path of the file backing `id`
    fn document_path(&self, id: &str) -> PathBuf {
        self.path.join(format!("{}.md", id))
    }

    /// Every readable record in the collection. Unreadable files are logged and skipped.
    async fn list(&self) -> Result<Vec<Student>> {
        self.scan(false).await
    }

    /// Walk the collection directory. With `strict`, the first unreadable
    /// file fails the scan instead of being skipped.
    async fn scan(&self, strict: bool) -> Result<Vec<Student>> {
        let mut students = Vec::new();

        if !self.path.exists() {
            return Ok(students);
        }

        for entry in WalkDir::new(&self.path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.extension().map(|e| e == "md").unwrap_or(false) {
                match self.read_document(path).await {
                    Ok(student) => students.push(student),
                    Err(e) if strict => {
                        return Err(Error::UnreadableRecord {
                            path: path.to_path_buf(),
                            message: e.to_string(),
                        })
                    }
                    Err(e) => tracing::error!("Skipping unreadable record {:?}: {}", path, e),
                }
            }
        }

        Ok(students)
    }

    /// Read a single record by id. Ids that could never have been assigned
    /// are reported as absent rather than touching the filesystem.
    async fn get(&self, id: &str) -> Result<Option<Student>> {
        if validate_document_id(id).is_err() {
            return Ok(None);
        }
        let path = self.document_path(id);
        if !path.exists() {
            return Ok(None);
        }
        self.read_document(&path).await.map(Some)
    }

    /// Read a record from a path; the file stem wins over any stored id
    async fn read_document(&self, path: &Path) -> Result<Student> {
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::Other(format!("Invalid document path {:?}", path)))?;

        let content = fs::read_to_string(path)
            .await
            .map_err(|source| Error::FileRead {
                path: path.to_path_buf(),
                source,
            })?;
        let (mut student, _body): (Student, String) = frontmatter::parse(&content)?;
        student.id = id.to_string();

        Ok(student)
    }

    /// First record matching the filter
    async fn first_match(&self, filter: &Filter) -> Result<Option<Student>> {
        match filter.as_id() {
            Some(id) => self.get(id).await,
            None => Ok(self
                .list()
                .await?
                .into_iter()
                .find(|student| filter.matches(student))),
        }
    }

    /// Write a record file via a temporary sibling so readers never see half a file
    async fn write_document(&self, student: &Student) -> Result<()> {
        let path = self.document_path(&student.id);
        let tmp = self.path.join(format!(".{}.md.tmp", student.id));
        let content = frontmatter::render(student, &render_body(student))?;

        fs::write(&tmp, content)
            .await
            .map_err(|source| Error::FileWrite {
                path: tmp.clone(),
                source,
            })?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|source| Error::FileWrite {
                path: path.clone(),
                source,
            })?;
        Ok(())
    }

    async fn remove_document(&self, id: &str) -> Result<()> {
        let path = self.document_path(id);
        fs::remove_file(&path)
            .await
            .map_err(|source| Error::FileWrite { path, source })
    }
}

/// Markdown body shown when browsing the repository
fn render_body(student: &Student) -> String {
    format!(
        "# {}\n\n`{}`, seat {}\n",
        student.profile.name, student.profile.account, student.seat_number
    )
}

#[async_trait]
impl StudentStore for MarkdownStore {
    async fn find(&self, filter: &Filter) -> Result<Vec<Student>> {
        if let Some(id) = filter.as_id() {
            return Ok(self.get(id).await?.into_iter().collect());
        }
        let mut students = self.list().await?;
        students.retain(|student| filter.matches(student));
        Ok(students)
    }

    /// Orders over every record file, so a file that cannot be read fails
    /// the call rather than hiding its seat number from the allocator.
    async fn find_one_sorted(&self, filter: &Filter, sort: Sort) -> Result<Option<Student>> {
        if let Some(id) = filter.as_id() {
            return self.get(id).await;
        }
        let mut students = self.scan(true).await?;
        students.retain(|student| filter.matches(student));
        Ok(sort.first(&students).cloned())
    }

    async fn insert(&self, seat_number: u32, profile: StudentProfile) -> Result<Student> {
        let git = self.git.lock().await;

        let student = Student::new(new_document_id(), seat_number, profile);
        if self.document_path(&student.id).exists() {
            return Err(Error::DocumentAlreadyExists {
                collection: STUDENTS_COLLECTION.to_string(),
                id: student.id,
            });
        }

        self.write_document(&student).await?;
        if let Err(e) = git.commit(&format!("INSERT into {}: {}", STUDENTS_COLLECTION, student.id)) {
            // Leave nothing behind that a later read would pick up
            let _ = self.remove_document(&student.id).await;
            return Err(e);
        }

        Ok(student)
    }

    async fn find_and_update(
        &self,
        filter: &Filter,
        patch: &StudentPatch,
    ) -> Result<Option<Student>> {
        let git = self.git.lock().await;

        let Some(previous) = self.first_match(filter).await? else {
            return Ok(None);
        };
        let mut student = previous.clone();
        student.apply(patch);

        self.write_document(&student).await?;
        if let Err(e) = git.commit(&format!("UPDATE {}: {}", STUDENTS_COLLECTION, student.id)) {
            let _ = self.write_document(&previous).await;
            return Err(e);
        }

        Ok(Some(student))
    }

    async fn find_and_delete(&self, filter: &Filter) -> Result<Option<Student>> {
        let git = self.git.lock().await;

        let Some(student) = self.first_match(filter).await? else {
            return Ok(None);
        };

        self.remove_document(&student.id).await?;
        if let Err(e) = git.commit(&format!("DELETE from {}: {}", STUDENTS_COLLECTION, student.id)) {
            let _ = self.write_document(&student).await;
            return Err(e);
        }

        Ok(Some(student))
    }

    fn is_connected(&self) -> bool {
        self.path.is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{sample_profile, StudentField};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_markdown_crud() {
        let tmp = TempDir::new().unwrap();
        let store = MarkdownStore::open(tmp.path()).await.unwrap();
        assert!(store.is_connected());

        // Create
        let created = store
            .insert(1, sample_profile("tkubm1760", "Lin"))
            .await
            .unwrap();
        let file = tmp
            .path()
            .join("collections/students")
            .join(format!("{}.md", created.id));
        assert!(file.exists());

        // Read
        let fetched = store.find(&Filter::id(&created.id)).await.unwrap();
        assert_eq!(fetched, vec![created.clone()]);

        // Update
        let patch = StudentPatch {
            department: Some("Computer Science".into()),
            ..Default::default()
        };
        let updated = store
            .find_and_update(&Filter::eq(StudentField::Account, "tkubm1760"), &patch)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.profile.department, "Computer Science");
        assert_eq!(updated.seat_number, 1);

        // Delete
        let deleted = store
            .find_and_delete(&Filter::id(&created.id))
            .await
            .unwrap();
        assert!(deleted.is_some());
        assert!(!file.exists());

        // init + insert + update + delete
        assert_eq!(store.commit_count().await.unwrap(), 4);
        assert!(!store.has_uncommitted_changes().await.unwrap());
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let tmp = TempDir::new().unwrap();
        let created = {
            let store = MarkdownStore::open(tmp.path()).await.unwrap();
            store
                .insert(7, sample_profile("tkubm0007", "Wang"))
                .await
                .unwrap()
        };

        let store = MarkdownStore::open(tmp.path()).await.unwrap();
        let top = store
            .find_one_sorted(&Filter::All, Sort::desc(StudentField::SeatNumber))
            .await
            .unwrap();
        assert_eq!(top, Some(created));
    }

    #[tokio::test]
    async fn test_traversal_ids_are_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = MarkdownStore::open(tmp.path()).await.unwrap();

        assert!(store
            .find(&Filter::id("../../etc/passwd"))
            .await
            .unwrap()
            .is_empty());
        assert!(store
            .find_and_delete(&Filter::id("../students"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_unreadable_files_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let store = MarkdownStore::open(tmp.path()).await.unwrap();
        store
            .insert(1, sample_profile("tkubm0001", "Lin"))
            .await
            .unwrap();
        std::fs::write(store.path.join("broken.md"), "no frontmatter here").unwrap();

        let all = store.find(&Filter::All).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_file_blocks_seat_allocation() {
        let tmp = TempDir::new().unwrap();
        let store = MarkdownStore::open(tmp.path()).await.unwrap();
        store
            .insert(1, sample_profile("tkubm0001", "Lin"))
            .await
            .unwrap();
        // Hand-edited record that still holds seat 9 on disk
        std::fs::write(store.path.join("broken.md"), "---\nseatNumber: 9\nname: [\n---\n").unwrap();

        let err = store
            .find_one_sorted(&Filter::All, Sort::desc(StudentField::SeatNumber))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnreadableRecord { .. }));
        assert_eq!(err.status_code(), 500);

        let allocator = crate::seat::SeatAllocator::new();
        assert!(allocator
            .assign(&store, sample_profile("tkubm0002", "Chen"))
            .await
            .is_err());
        assert_eq!(store.find(&Filter::All).await.unwrap().len(), 1);
    }
}
