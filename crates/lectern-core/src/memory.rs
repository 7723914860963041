//! In-memory catalog and progress store.
//!
//! [`MemoryStore`] is a thread-safe implementation of [`CatalogStore`] and
//! [`ProgressStore`] suitable for unit tests and demos. Toggles run under a
//! single write lock, so they are atomic just like the SQLite upsert.
//!
//! ```
//! use lectern_core::memory::MemoryStore;
//!
//! let store = MemoryStore::new();
//! ```

use std::{
  collections::HashMap,
  sync::{
    Arc, PoisonError, RwLock,
    atomic::{AtomicBool, Ordering},
  },
};

use chrono::{DateTime, Utc};

use crate::{
  catalog::{Chapter, ChapterId, Course, CourseId, Lecture, LectureId},
  import::{CatalogImport, ImportError, ImportSummary},
  progress::{ProgressFact, UserId},
  store::{CatalogStore, LectureFilter, ProgressStore},
};

/// Error type for the in-memory store.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
  /// Returned by every operation while the store is switched offline.
  #[error("store is offline")]
  Offline,

  #[error(transparent)]
  Import(#[from] ImportError),

  /// A fact referenced a lecture missing from the catalog.
  #[error("unknown lecture {0}")]
  UnknownLecture(LectureId),

  /// A fact whose `completed_at` disagrees with `completed`.
  #[error("completed_at must be set exactly when completed is true")]
  InconsistentFact,
}

type Result<T, E = MemoryError> = std::result::Result<T, E>;

#[derive(Default)]
struct Inner {
  courses:  HashMap<CourseId, Course>,
  chapters: HashMap<ChapterId, Chapter>,
  lectures: HashMap<LectureId, Lecture>,
  facts:    HashMap<(UserId, LectureId), ProgressFact>,
  /// Bumped by every import.
  catalog_version: u64,
}

/// In-memory store keeping every table in a hash map.
///
/// Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
  inner:   Arc<RwLock<Inner>>,
  offline: Arc<AtomicBool>,
}

impl MemoryStore {
  #[must_use]
  pub fn new() -> Self { Self::default() }

  /// Make every subsequent call fail with [`MemoryError::Offline`] until
  /// switched back.
  pub fn set_offline(&self, offline: bool) {
    self.offline.store(offline, Ordering::SeqCst);
  }

  /// Number of stored facts across all users.
  pub fn fact_count(&self) -> usize {
    self.inner.read().unwrap_or_else(PoisonError::into_inner).facts.len()
  }

  fn check(&self) -> Result<()> {
    if self.offline.load(Ordering::SeqCst) {
      Err(MemoryError::Offline)
    } else {
      Ok(())
    }
  }

  fn read<T>(&self, f: impl FnOnce(&Inner) -> T) -> Result<T> {
    self.check()?;
    let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
    Ok(f(&guard))
  }

  fn write<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> Result<T> {
    self.check()?;
    let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
    Ok(f(&mut guard))
  }
}

impl CatalogStore for MemoryStore {
  type Error = MemoryError;

  async fn list_courses(&self) -> Result<Vec<Course>> {
    self.read(|inner| {
      let mut courses: Vec<Course> = inner.courses.values().cloned().collect();
      courses.sort_by_key(|c| c.display_order);
      courses
    })
  }

  async fn get_course(&self, id: &CourseId) -> Result<Option<Course>> {
    self.read(|inner| inner.courses.get(id).cloned())
  }

  async fn list_chapters(&self, course: Option<&CourseId>) -> Result<Vec<Chapter>> {
    self.read(|inner| {
      let mut chapters: Vec<Chapter> = inner
        .chapters
        .values()
        .filter(|ch| course.is_none_or(|id| &ch.course_id == id))
        .cloned()
        .collect();
      chapters.sort_by(|a, b| {
        (a.number, &a.chapter_id).cmp(&(b.number, &b.chapter_id))
      });
      chapters
    })
  }

  async fn get_chapter(&self, id: &ChapterId) -> Result<Option<Chapter>> {
    self.read(|inner| inner.chapters.get(id).cloned())
  }

  async fn list_lectures(&self, filter: &LectureFilter) -> Result<Vec<Lecture>> {
    self.read(|inner| {
      let mut lectures: Vec<Lecture> = inner
        .lectures
        .values()
        .filter(|l| filter.matches(l))
        .cloned()
        .collect();
      lectures.sort_by(|a, b| (a.order, &a.lecture_id).cmp(&(b.order, &b.lecture_id)));
      lectures
    })
  }

  async fn get_lecture(&self, id: &LectureId) -> Result<Option<Lecture>> {
    self.read(|inner| inner.lectures.get(id).cloned())
  }

  async fn catalog_version(&self) -> Result<u64> {
    self.read(|inner| inner.catalog_version)
  }

  async fn import_catalog(&self, import: &CatalogImport) -> Result<ImportSummary> {
    let rows = import.to_rows()?;
    let summary = rows.summary();
    self.write(|inner| {
      inner.catalog_version += 1;
      for c in rows.courses {
        inner.courses.insert(c.course_id.clone(), c);
      }
      for ch in rows.chapters {
        inner.chapters.insert(ch.chapter_id.clone(), ch);
      }
      for l in rows.lectures {
        inner.lectures.insert(l.lecture_id.clone(), l);
      }
    })?;
    Ok(summary)
  }
}

impl ProgressStore for MemoryStore {
  type Error = MemoryError;

  async fn get_fact(&self, user: &UserId, lecture: &LectureId) -> Result<Option<ProgressFact>> {
    self.read(|inner| inner.facts.get(&(user.clone(), lecture.clone())).cloned())
  }

  async fn list_facts(&self, user: &UserId, completed_only: bool) -> Result<Vec<ProgressFact>> {
    self.read(|inner| {
      let mut facts: Vec<ProgressFact> = inner
        .facts
        .values()
        .filter(|f| &f.user_id == user && (!completed_only || f.completed))
        .cloned()
        .collect();
      facts.sort_by(|a, b| a.lecture_id.cmp(&b.lecture_id));
      facts
    })
  }

  async fn upsert_fact(&self, fact: &ProgressFact) -> Result<ProgressFact> {
    self.write(|inner| {
      if !fact.is_consistent() {
        return Err(MemoryError::InconsistentFact);
      }
      if !inner.lectures.contains_key(&fact.lecture_id) {
        return Err(MemoryError::UnknownLecture(fact.lecture_id.clone()));
      }
      let key = (fact.user_id.clone(), fact.lecture_id.clone());
      let stored = match inner.facts.get(&key) {
        Some(existing) => ProgressFact {
          fact_id: existing.fact_id,
          ..fact.clone()
        },
        None => fact.clone(),
      };
      inner.facts.insert(key, stored.clone());
      Ok(stored)
    })?
  }

  async fn toggle_fact(
    &self,
    user: &UserId,
    lecture: &LectureId,
    now: DateTime<Utc>,
  ) -> Result<Option<ProgressFact>> {
    self.write(|inner| {
      if !inner.lectures.contains_key(lecture) {
        return None;
      }
      let key = (user.clone(), lecture.clone());
      let next = ProgressFact::toggle(
        inner.facts.remove(&key),
        user.clone(),
        lecture.clone(),
        now,
      );
      inner.facts.insert(key, next.clone());
      Some(next)
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  const CATALOG: &str = r#"{
    "courses": [
      {
        "course": "Statistics I", "course_url": "https://example.com/1", "phase": 1,
        "instructor": "",
        "chapters": [
          { "chapter": 1, "title": "Basics", "lectures": [
            { "id": "a", "title": "A", "url": "https://v/a" }
          ] }
        ]
      }
    ]
  }"#;

  fn at(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

  async fn seeded() -> MemoryStore {
    let store = MemoryStore::new();
    let import = CatalogImport::from_json(CATALOG).unwrap();
    store.import_catalog(&import).await.unwrap();
    store
  }

  #[tokio::test]
  async fn fact_for_unknown_lecture_is_rejected() {
    let store = seeded().await;
    let fact =
      ProgressFact::first_completion("alice".into(), "course-9_zz".into(), at(5));

    let err = store.upsert_fact(&fact).await.unwrap_err();
    assert!(matches!(err, MemoryError::UnknownLecture(id) if id.as_str() == "course-9_zz"));
    assert_eq!(store.fact_count(), 0);
  }

  #[tokio::test]
  async fn inconsistent_fact_is_rejected() {
    let store = seeded().await;
    let mut fact =
      ProgressFact::first_completion("alice".into(), "course-1_a".into(), at(5));
    fact.completed_at = None;

    let err = store.upsert_fact(&fact).await.unwrap_err();
    assert!(matches!(err, MemoryError::InconsistentFact));
    assert_eq!(store.fact_count(), 0);
  }

  #[tokio::test]
  async fn valid_fact_is_stored() {
    let store = seeded().await;
    let fact =
      ProgressFact::first_completion("alice".into(), "course-1_a".into(), at(5));
    store.upsert_fact(&fact).await.unwrap();
    assert_eq!(store.fact_count(), 1);
  }

  #[tokio::test]
  async fn import_bumps_catalog_version() {
    let store = MemoryStore::new();
    assert_eq!(store.catalog_version().await.unwrap(), 0);
    let import = CatalogImport::from_json(CATALOG).unwrap();
    store.import_catalog(&import).await.unwrap();
    store.import_catalog(&import).await.unwrap();
    assert_eq!(store.catalog_version().await.unwrap(), 2);
  }

  #[tokio::test]
  async fn rejected_import_changes_nothing() {
    let store = seeded().await;
    let dup = CATALOG.replace(
      r#"{ "id": "a", "title": "A", "url": "https://v/a" }"#,
      r#"{ "id": "a", "title": "A", "url": "https://v/a" },
            { "id": "a", "title": "A again", "url": "https://v/a2" }"#,
    );
    let import = CatalogImport::from_json(&dup).unwrap();

    let err = store.import_catalog(&import).await.unwrap_err();
    assert!(matches!(err, MemoryError::Import(ImportError::DuplicateLecture(_))));
    assert_eq!(store.catalog_version().await.unwrap(), 1);
  }
}
