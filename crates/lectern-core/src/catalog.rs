//! Catalog types: the immutable course / chapter / lecture reference data.
//!
//! Catalog rows are written once by an offline import and never mutated by
//! the application. Every level carries an ordering key that defines its
//! presentation sequence.

use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};

// ─── Identifiers ─────────────────────────────────────────────────────────────

macro_rules! string_id {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct $name(String);

    impl $name {
      pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

      pub fn as_str(&self) -> &str { &self.0 }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
      }
    }

    impl From<&str> for $name {
      fn from(s: &str) -> Self { Self(s.to_owned()) }
    }

    impl From<String> for $name {
      fn from(s: String) -> Self { Self(s) }
    }
  };
}

string_id!(
  /// Stable course identifier, e.g. `course-1`.
  CourseId
);
string_id!(
  /// Stable chapter identifier, e.g. `course-1_ch-3`.
  ChapterId
);
string_id!(
  /// Stable lecture identifier, e.g. `course-1_l01`.
  LectureId
);

// ─── Course ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
  pub course_id:     CourseId,
  pub title:         String,
  /// External reference page for the course.
  pub course_url:    String,
  pub phase:         i64,
  pub instructor:    Option<String>,
  /// Unique within the catalog; primary sort key for every listing.
  pub display_order: i64,
}

// ─── Chapter ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
  pub chapter_id: ChapterId,
  pub course_id:  CourseId,
  /// Unique within a course; contiguous by convention only.
  pub number:     i64,
  pub title:      String,
}

// ─── Lecture ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lecture {
  pub lecture_id: LectureId,
  pub chapter_id: ChapterId,
  /// Denormalised from the owning chapter for query convenience.
  pub course_id:  CourseId,
  pub title:      String,
  pub url:        String,
  /// Unique within a chapter.
  pub order:      i64,
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// The whole catalog, materialised in memory and sorted the way every view
/// presents it: courses by display order, chapters by (course order, number),
/// lectures by order.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
  pub courses:  Vec<Course>,
  pub chapters: Vec<Chapter>,
  pub lectures: Vec<Lecture>,
}

impl CatalogSnapshot {
  pub fn new(
    mut courses: Vec<Course>,
    mut chapters: Vec<Chapter>,
    mut lectures: Vec<Lecture>,
  ) -> Self {
    courses.sort_by_key(|c| c.display_order);
    let rank: HashMap<&CourseId, i64> = courses
      .iter()
      .map(|c| (&c.course_id, c.display_order))
      .collect();
    // Orphaned chapters sort after every known course.
    chapters.sort_by_key(|ch| {
      (rank.get(&ch.course_id).copied().unwrap_or(i64::MAX), ch.number)
    });
    lectures.sort_by_key(|l| l.order);
    Self { courses, chapters, lectures }
  }

  pub fn course(&self, id: &CourseId) -> Option<&Course> {
    self.courses.iter().find(|c| &c.course_id == id)
  }

  pub fn chapter(&self, id: &ChapterId) -> Option<&Chapter> {
    self.chapters.iter().find(|ch| &ch.chapter_id == id)
  }

  pub fn chapters_of<'a>(
    &'a self,
    course_id: &'a CourseId,
  ) -> impl Iterator<Item = &'a Chapter> + 'a {
    self.chapters.iter().filter(move |ch| &ch.course_id == course_id)
  }

  pub fn lectures_of_chapter<'a>(
    &'a self,
    chapter_id: &'a ChapterId,
  ) -> impl Iterator<Item = &'a Lecture> + 'a {
    self.lectures.iter().filter(move |l| &l.chapter_id == chapter_id)
  }
}
