//! The `CatalogStore` and `ProgressStore` traits and supporting query types.
//!
//! The traits are implemented by storage backends (e.g.
//! `lectern-store-sqlite`, or [`crate::memory::MemoryStore`] in tests).
//! Higher layers depend on these abstractions, never on a concrete backend.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  catalog::{Chapter, ChapterId, Course, CourseId, Lecture, LectureId},
  import::{CatalogImport, ImportSummary},
  progress::{ProgressFact, UserId},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Which lectures [`CatalogStore::list_lectures`] returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LectureFilter {
  #[default]
  All,
  Chapter(ChapterId),
  Course(CourseId),
}

impl LectureFilter {
  pub fn matches(&self, lecture: &Lecture) -> bool {
    match self {
      Self::All => true,
      Self::Chapter(id) => &lecture.chapter_id == id,
      Self::Course(id) => &lecture.course_id == id,
    }
  }
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// Read access to the catalog, plus the offline import that populates it.
pub trait CatalogStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All courses, ordered by display order.
  fn list_courses(
    &self,
  ) -> impl Future<Output = Result<Vec<Course>, Self::Error>> + Send + '_;

  /// Retrieve a course by id. Returns `None` if not found.
  fn get_course<'a>(
    &'a self,
    id: &'a CourseId,
  ) -> impl Future<Output = Result<Option<Course>, Self::Error>> + Send + 'a;

  /// Chapters ordered by chapter number, optionally restricted to one course.
  fn list_chapters<'a>(
    &'a self,
    course: Option<&'a CourseId>,
  ) -> impl Future<Output = Result<Vec<Chapter>, Self::Error>> + Send + 'a;

  /// Retrieve a chapter by id. Returns `None` if not found.
  fn get_chapter<'a>(
    &'a self,
    id: &'a ChapterId,
  ) -> impl Future<Output = Result<Option<Chapter>, Self::Error>> + Send + 'a;

  /// Lectures matching `filter`, ordered by their in-chapter order.
  fn list_lectures<'a>(
    &'a self,
    filter: &'a LectureFilter,
  ) -> impl Future<Output = Result<Vec<Lecture>, Self::Error>> + Send + 'a;

  /// Retrieve a lecture by id. Returns `None` if not found.
  fn get_lecture<'a>(
    &'a self,
    id: &'a LectureId,
  ) -> impl Future<Output = Result<Option<Lecture>, Self::Error>> + Send + 'a;

  /// A counter that changes whenever the catalog is written. Readers compare
  /// it to decide whether a derived view is still current.
  fn catalog_version(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Write an imported catalog. Rows are upserted by id and never deleted, so
  /// progress facts recorded against earlier imports stay valid. Documents
  /// that derive duplicate ids are rejected without writing.
  fn import_catalog<'a>(
    &'a self,
    import: &'a CatalogImport,
  ) -> impl Future<Output = Result<ImportSummary, Self::Error>> + Send + 'a;
}

// ─── Progress ────────────────────────────────────────────────────────────────

/// Per-user completion facts. Every read is scoped by user id.
pub trait ProgressStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The fact for (user, lecture), if one has ever been created.
  fn get_fact<'a>(
    &'a self,
    user: &'a UserId,
    lecture: &'a LectureId,
  ) -> impl Future<Output = Result<Option<ProgressFact>, Self::Error>> + Send + 'a;

  /// All of `user`'s facts; with `completed_only`, only completed ones.
  fn list_facts<'a>(
    &'a self,
    user: &'a UserId,
    completed_only: bool,
  ) -> impl Future<Output = Result<Vec<ProgressFact>, Self::Error>> + Send + 'a;

  /// Insert `fact`, or overwrite `completed`, `completed_at` and `notes` of
  /// the existing fact for the same (user, lecture). Returns the stored fact,
  /// whose `fact_id` is the original one on conflict.
  ///
  /// Rejects facts whose `completed_at` disagrees with `completed` and facts
  /// for lectures missing from the catalog.
  fn upsert_fact<'a>(
    &'a self,
    fact: &'a ProgressFact,
  ) -> impl Future<Output = Result<ProgressFact, Self::Error>> + Send + 'a;

  /// Atomically flip the completion of `lecture` for `user`, creating a
  /// completed fact if none exists.
  ///
  /// Returns `None`, without writing, if `lecture` is not in the catalog.
  fn toggle_fact<'a>(
    &'a self,
    user: &'a UserId,
    lecture: &'a LectureId,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<ProgressFact>, Self::Error>> + Send + 'a;
}
