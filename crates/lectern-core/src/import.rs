//! The offline catalog import format and its mapping onto catalog rows.
//!
//! The input is a JSON document of nested courses → chapters → lectures.
//! Identifiers are derived from position and source ids:
//!
//! | Row | Id | Order |
//! |-----|----|-------|
//! | course  | `course-{i+1}` | `i + 1` |
//! | chapter | `{course_id}_ch-{chapter}` | `chapter` |
//! | lecture | `{course_id}_{lecture.id}` | position in chapter + 1 |

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Chapter, ChapterId, Course, Lecture, LectureId};

/// A document that cannot be flattened into catalog rows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
  /// Two chapters of one course share a chapter number.
  #[error("duplicate chapter id {0}")]
  DuplicateChapter(ChapterId),

  /// Two lectures of one course share a source id.
  #[error("duplicate lecture id {0}")]
  DuplicateLecture(LectureId),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogImport {
  pub courses: Vec<ImportCourse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportCourse {
  #[serde(rename = "course")]
  pub title:      String,
  pub course_url: String,
  pub phase:      i64,
  #[serde(default)]
  pub instructor: Option<String>,
  #[serde(default)]
  pub chapters:   Vec<ImportChapter>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportChapter {
  #[serde(rename = "chapter")]
  pub number:   i64,
  pub title:    String,
  #[serde(default)]
  pub lectures: Vec<ImportLecture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportLecture {
  pub id:    String,
  pub title: String,
  pub url:   String,
}

/// Row counts written by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
  pub courses:  usize,
  pub chapters: usize,
  pub lectures: usize,
}

/// Catalog rows produced from a [`CatalogImport`].
#[derive(Debug, Clone, Default)]
pub struct CatalogRows {
  pub courses:  Vec<Course>,
  pub chapters: Vec<Chapter>,
  pub lectures: Vec<Lecture>,
}

impl CatalogRows {
  pub fn summary(&self) -> ImportSummary {
    ImportSummary {
      courses:  self.courses.len(),
      chapters: self.chapters.len(),
      lectures: self.lectures.len(),
    }
  }
}

impl CatalogImport {
  pub fn from_json(raw: &str) -> serde_json::Result<Self> {
    serde_json::from_str(raw)
  }

  /// Flatten the nested document into catalog rows.
  ///
  /// Fails if two rows would derive the same id.
  pub fn to_rows(&self) -> Result<CatalogRows, ImportError> {
    let mut rows = CatalogRows::default();
    let mut chapter_ids = HashSet::new();
    let mut lecture_ids = HashSet::new();

    for (ci, course) in self.courses.iter().enumerate() {
      let course_id = format!("course-{}", ci + 1);
      rows.courses.push(Course {
        course_id:     course_id.as_str().into(),
        title:         course.title.clone(),
        course_url:    course.course_url.clone(),
        phase:         course.phase,
        instructor:    course
          .instructor
          .as_deref()
          .map(str::trim)
          .filter(|s| !s.is_empty())
          .map(str::to_owned),
        display_order: ci as i64 + 1,
      });

      for chapter in &course.chapters {
        let chapter_id = format!("{course_id}_ch-{}", chapter.number);
        if !chapter_ids.insert(chapter_id.clone()) {
          return Err(ImportError::DuplicateChapter(chapter_id.into()));
        }
        rows.chapters.push(Chapter {
          chapter_id: chapter_id.as_str().into(),
          course_id:  course_id.as_str().into(),
          number:     chapter.number,
          title:      chapter.title.clone(),
        });

        for (li, lecture) in chapter.lectures.iter().enumerate() {
          let lecture_id = format!("{course_id}_{}", lecture.id);
          if !lecture_ids.insert(lecture_id.clone()) {
            return Err(ImportError::DuplicateLecture(lecture_id.into()));
          }
          rows.lectures.push(Lecture {
            lecture_id: lecture_id.into(),
            chapter_id: chapter_id.as_str().into(),
            course_id:  course_id.as_str().into(),
            title:      lecture.title.clone(),
            url:        lecture.url.clone(),
            order:      li as i64 + 1,
          });
        }
      }
    }

    Ok(rows)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE: &str = r#"{
    "courses": [
      {
        "course": "Statistics I",
        "course_url": "https://ocw.example.ac.jp/stat1",
        "phase": 1,
        "instructor": "Yamada",
        "total_lectures": 3,
        "chapters": [
          {
            "chapter": 1,
            "title": "Descriptive statistics",
            "lectures": [
              { "id": "l01", "title": "Mean", "url": "https://v.example/1" },
              { "id": "l02", "title": "Variance", "url": "https://v.example/2" }
            ]
          },
          {
            "chapter": 2,
            "title": "Probability",
            "lectures": [
              { "id": "l03", "title": "Axioms", "url": "https://v.example/3" }
            ]
          }
        ]
      },
      {
        "course": "Statistics II",
        "course_url": "https://ocw.example.ac.jp/stat2",
        "phase": 2,
        "instructor": "",
        "chapters": [ { "chapter": 1, "title": "Placeholder" } ]
      }
    ]
  }"#;

  #[test]
  fn derives_ids_and_orders() {
    let rows = CatalogImport::from_json(SAMPLE).unwrap().to_rows().unwrap();
    assert_eq!(rows.summary(), ImportSummary { courses: 2, chapters: 3, lectures: 3 });

    assert_eq!(rows.courses[0].course_id.as_str(), "course-1");
    assert_eq!(rows.courses[1].display_order, 2);
    assert_eq!(rows.chapters[1].chapter_id.as_str(), "course-1_ch-2");
    assert_eq!(rows.chapters[2].chapter_id.as_str(), "course-2_ch-1");

    let l = &rows.lectures[1];
    assert_eq!(l.lecture_id.as_str(), "course-1_l02");
    assert_eq!(l.chapter_id.as_str(), "course-1_ch-1");
    assert_eq!(l.order, 2);
    assert_eq!(rows.lectures[2].order, 1);
  }

  #[test]
  fn empty_instructor_becomes_none() {
    let rows = CatalogImport::from_json(SAMPLE).unwrap().to_rows().unwrap();
    assert_eq!(rows.courses[0].instructor.as_deref(), Some("Yamada"));
    assert_eq!(rows.courses[1].instructor, None);
  }

  #[test]
  fn duplicate_lecture_id_across_chapters_is_rejected() {
    let doc = r#"{"courses": [{
      "course": "C", "course_url": "u", "phase": 1,
      "chapters": [
        { "chapter": 1, "title": "A", "lectures": [{ "id": "x", "title": "X", "url": "u" }] },
        { "chapter": 2, "title": "B", "lectures": [{ "id": "x", "title": "Y", "url": "u" }] }
      ]
    }]}"#;
    let err = CatalogImport::from_json(doc).unwrap().to_rows().unwrap_err();
    assert_eq!(err, ImportError::DuplicateLecture(LectureId::from("course-1_x")));
  }

  #[test]
  fn duplicate_chapter_number_is_rejected() {
    let doc = r#"{"courses": [{
      "course": "C", "course_url": "u", "phase": 1,
      "chapters": [
        { "chapter": 3, "title": "A" },
        { "chapter": 3, "title": "B" }
      ]
    }]}"#;
    let err = CatalogImport::from_json(doc).unwrap().to_rows().unwrap_err();
    assert_eq!(err, ImportError::DuplicateChapter(ChapterId::from("course-1_ch-3")));
  }

  #[test]
  fn same_source_id_in_different_courses_is_fine() {
    let doc = r#"{"courses": [
      { "course": "C1", "course_url": "u", "phase": 1,
        "chapters": [{ "chapter": 1, "title": "A", "lectures": [{ "id": "x", "title": "X", "url": "u" }] }] },
      { "course": "C2", "course_url": "u", "phase": 1,
        "chapters": [{ "chapter": 1, "title": "A", "lectures": [{ "id": "x", "title": "X", "url": "u" }] }] }
    ]}"#;
    let rows = CatalogImport::from_json(doc).unwrap().to_rows().unwrap();
    assert_eq!(rows.summary().lectures, 2);
  }

  #[test]
  fn rejects_malformed_document() {
    assert!(CatalogImport::from_json(r#"{"courses": [{"course": 1}]}"#).is_err());
  }
}
