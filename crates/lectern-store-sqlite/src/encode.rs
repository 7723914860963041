//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, UUIDs as hyphenated lowercase
//! strings, and booleans as `0`/`1` integers.

use chrono::{DateTime, Utc};
use lectern_core::{
  catalog::{Chapter, Course, Lecture},
  progress::{ProgressFact, UserId},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Column lists ────────────────────────────────────────────────────────────

pub const COURSE_COLUMNS: &str =
  "course_id, title, course_url, phase, instructor, display_order";

pub const CHAPTER_COLUMNS: &str = "chapter_id, course_id, number, title";

pub const LECTURE_COLUMNS: &str =
  "lecture_id, chapter_id, course_id, title, url, \"order\"";

pub const FACT_COLUMNS: &str =
  "fact_id, user_id, lecture_id, completed, completed_at, notes";

// ─── Row readers ─────────────────────────────────────────────────────────────

/// Catalog rows hold only plain text and integers, so they decode directly.
pub fn course_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Course> {
  Ok(Course {
    course_id:     row.get::<_, String>(0)?.into(),
    title:         row.get(1)?,
    course_url:    row.get(2)?,
    phase:         row.get(3)?,
    instructor:    row.get(4)?,
    display_order: row.get(5)?,
  })
}

pub fn chapter_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Chapter> {
  Ok(Chapter {
    chapter_id: row.get::<_, String>(0)?.into(),
    course_id:  row.get::<_, String>(1)?.into(),
    number:     row.get(2)?,
    title:      row.get(3)?,
  })
}

pub fn lecture_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Lecture> {
  Ok(Lecture {
    lecture_id: row.get::<_, String>(0)?.into(),
    chapter_id: row.get::<_, String>(1)?.into(),
    course_id:  row.get::<_, String>(2)?.into(),
    title:      row.get(3)?,
    url:        row.get(4)?,
    order:      row.get(5)?,
  })
}

// ─── Progress facts ──────────────────────────────────────────────────────────

/// Raw values read directly from a `progress_facts` row.
pub struct RawFact {
  pub fact_id:      String,
  pub user_id:      String,
  pub lecture_id:   String,
  pub completed:    bool,
  pub completed_at: Option<String>,
  pub notes:        Option<String>,
}

impl RawFact {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      fact_id:      row.get(0)?,
      user_id:      row.get(1)?,
      lecture_id:   row.get(2)?,
      completed:    row.get(3)?,
      completed_at: row.get(4)?,
      notes:        row.get(5)?,
    })
  }

  pub fn into_fact(self) -> Result<ProgressFact> {
    Ok(ProgressFact {
      fact_id:      decode_uuid(&self.fact_id)?,
      user_id:      UserId::new(self.user_id),
      lecture_id:   self.lecture_id.into(),
      completed:    self.completed,
      completed_at: self.completed_at.as_deref().map(decode_dt).transpose()?,
      notes:        self.notes,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn datetime_roundtrips_through_rfc3339() {
    let dt = Utc.with_ymd_and_hms(2025, 4, 1, 9, 30, 0).unwrap();
    assert_eq!(decode_dt(&encode_dt(dt)).unwrap(), dt);
  }

  #[test]
  fn bad_datetime_is_a_parse_error() {
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }

  #[test]
  fn bad_uuid_is_rejected() {
    assert!(matches!(decode_uuid("not-a-uuid"), Err(Error::Uuid(_))));
  }
}
