//! [`SqliteStore`]: the SQLite implementation of [`CatalogStore`] and
//! [`ProgressStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use lectern_core::{
  catalog::{Chapter, ChapterId, Course, CourseId, Lecture, LectureId},
  import::{CatalogImport, ImportSummary},
  progress::{ProgressFact, UserId},
  store::{CatalogStore, LectureFilter, ProgressStore},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    CHAPTER_COLUMNS, COURSE_COLUMNS, FACT_COLUMNS, LECTURE_COLUMNS, RawFact,
    chapter_from_row, course_from_row, encode_dt, encode_uuid, lecture_from_row,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Lectern store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a single-row catalog lookup by primary key.
  async fn get_one<T, F>(&self, sql: String, id: String, map: F) -> Result<Option<T>>
  where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Row<'_>) -> rusqlite::Result<T> + Send + 'static,
  {
    let row = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&sql, rusqlite::params![id], map).optional()?)
      })
      .await?;
    Ok(row)
  }

  async fn fact_rows(&self, sql: String, params: Vec<String>) -> Result<Vec<ProgressFact>> {
    let raws: Vec<RawFact> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawFact::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFact::into_fact).collect()
  }
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  type Error = crate::Error;

  async fn list_courses(&self) -> Result<Vec<Course>> {
    let courses = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COURSE_COLUMNS} FROM courses ORDER BY display_order, course_id"
        ))?;
        let rows = stmt
          .query_map([], course_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(courses)
  }

  async fn get_course(&self, id: &CourseId) -> Result<Option<Course>> {
    self
      .get_one(
        format!("SELECT {COURSE_COLUMNS} FROM courses WHERE course_id = ?1"),
        id.as_str().to_owned(),
        course_from_row,
      )
      .await
  }

  async fn list_chapters(&self, course: Option<&CourseId>) -> Result<Vec<Chapter>> {
    let course_str = course.map(|c| c.as_str().to_owned());

    let chapters = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CHAPTER_COLUMNS} FROM chapters
           WHERE (?1 IS NULL OR course_id = ?1)
           ORDER BY number, chapter_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![course_str], chapter_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(chapters)
  }

  async fn get_chapter(&self, id: &ChapterId) -> Result<Option<Chapter>> {
    self
      .get_one(
        format!("SELECT {CHAPTER_COLUMNS} FROM chapters WHERE chapter_id = ?1"),
        id.as_str().to_owned(),
        chapter_from_row,
      )
      .await
  }

  async fn list_lectures(&self, filter: &LectureFilter) -> Result<Vec<Lecture>> {
    let (chapter_str, course_str) = match filter {
      LectureFilter::All => (None, None),
      LectureFilter::Chapter(id) => (Some(id.as_str().to_owned()), None),
      LectureFilter::Course(id) => (None, Some(id.as_str().to_owned())),
    };

    let lectures = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {LECTURE_COLUMNS} FROM lectures
           WHERE (?1 IS NULL OR chapter_id = ?1)
             AND (?2 IS NULL OR course_id  = ?2)
           ORDER BY \"order\", lecture_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![chapter_str, course_str], lecture_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(lectures)
  }

  async fn get_lecture(&self, id: &LectureId) -> Result<Option<Lecture>> {
    self
      .get_one(
        format!("SELECT {LECTURE_COLUMNS} FROM lectures WHERE lecture_id = ?1"),
        id.as_str().to_owned(),
        lecture_from_row,
      )
      .await
  }

  async fn catalog_version(&self) -> Result<u64> {
    let version = self
      .conn
      .call(|conn| {
        let version: i64 = conn.query_row(
          "SELECT version FROM catalog_meta WHERE id = 1",
          [],
          |row| row.get(0),
        )?;
        Ok(version)
      })
      .await?;
    Ok(version.max(0) as u64)
  }

  async fn import_catalog(&self, import: &CatalogImport) -> Result<ImportSummary> {
    let rows = import.to_rows()?;
    let summary = rows.summary();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO courses (course_id, title, course_url, phase, instructor, display_order)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (course_id) DO UPDATE SET
               title         = excluded.title,
               course_url    = excluded.course_url,
               phase         = excluded.phase,
               instructor    = excluded.instructor,
               display_order = excluded.display_order",
          )?;
          for c in &rows.courses {
            stmt.execute(rusqlite::params![
              c.course_id.as_str(),
              c.title,
              c.course_url,
              c.phase,
              c.instructor,
              c.display_order,
            ])?;
          }

          let mut stmt = tx.prepare(
            "INSERT INTO chapters (chapter_id, course_id, number, title)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (chapter_id) DO UPDATE SET
               course_id = excluded.course_id,
               number    = excluded.number,
               title     = excluded.title",
          )?;
          for ch in &rows.chapters {
            stmt.execute(rusqlite::params![
              ch.chapter_id.as_str(),
              ch.course_id.as_str(),
              ch.number,
              ch.title,
            ])?;
          }

          let mut stmt = tx.prepare(
            "INSERT INTO lectures (lecture_id, chapter_id, course_id, title, url, \"order\")
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (lecture_id) DO UPDATE SET
               chapter_id = excluded.chapter_id,
               course_id  = excluded.course_id,
               title      = excluded.title,
               url        = excluded.url,
               \"order\"    = excluded.\"order\"",
          )?;
          for l in &rows.lectures {
            stmt.execute(rusqlite::params![
              l.lecture_id.as_str(),
              l.chapter_id.as_str(),
              l.course_id.as_str(),
              l.title,
              l.url,
              l.order,
            ])?;
          }
        }
        tx.execute("UPDATE catalog_meta SET version = version + 1 WHERE id = 1", [])?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::info!(
      courses = summary.courses,
      chapters = summary.chapters,
      lectures = summary.lectures,
      "imported catalog"
    );
    Ok(summary)
  }
}

// ─── ProgressStore impl ──────────────────────────────────────────────────────

impl ProgressStore for SqliteStore {
  type Error = crate::Error;

  async fn get_fact(&self, user: &UserId, lecture: &LectureId) -> Result<Option<ProgressFact>> {
    let facts = self
      .fact_rows(
        format!(
          "SELECT {FACT_COLUMNS} FROM progress_facts
           WHERE user_id = ?1 AND lecture_id = ?2"
        ),
        vec![user.as_str().to_owned(), lecture.as_str().to_owned()],
      )
      .await?;
    Ok(facts.into_iter().next())
  }

  async fn list_facts(&self, user: &UserId, completed_only: bool) -> Result<Vec<ProgressFact>> {
    let filter = if completed_only { "AND completed = 1" } else { "" };
    self
      .fact_rows(
        format!(
          "SELECT {FACT_COLUMNS} FROM progress_facts
           WHERE user_id = ?1 {filter}
           ORDER BY lecture_id"
        ),
        vec![user.as_str().to_owned()],
      )
      .await
  }

  async fn upsert_fact(&self, fact: &ProgressFact) -> Result<ProgressFact> {
    let fact_id_str      = encode_uuid(fact.fact_id);
    let user_str         = fact.user_id.as_str().to_owned();
    let lecture_str      = fact.lecture_id.as_str().to_owned();
    let completed        = fact.completed;
    let completed_at_str = fact.completed_at.map(encode_dt);
    let notes            = fact.notes.clone();

    let raw: RawFact = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &format!(
            "INSERT INTO progress_facts ({FACT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (user_id, lecture_id) DO UPDATE SET
               completed    = excluded.completed,
               completed_at = excluded.completed_at,
               notes        = excluded.notes
             RETURNING {FACT_COLUMNS}"
          ),
          rusqlite::params![
            fact_id_str,
            user_str,
            lecture_str,
            completed,
            completed_at_str,
            notes,
          ],
          RawFact::from_row,
        )?)
      })
      .await?;

    raw.into_fact()
  }

  async fn toggle_fact(
    &self,
    user: &UserId,
    lecture: &LectureId,
    now: DateTime<Utc>,
  ) -> Result<Option<ProgressFact>> {
    let fact_id_str = encode_uuid(Uuid::new_v4());
    let user_str    = user.as_str().to_owned();
    let lecture_str = lecture.as_str().to_owned();
    let now_str     = encode_dt(now);

    // Existence check and upsert share one transaction, so an unknown
    // lecture never leaves a row behind.
    let raw: Option<RawFact> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists = tx
          .query_row(
            "SELECT 1 FROM lectures WHERE lecture_id = ?1",
            rusqlite::params![lecture_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(None);
        }

        let raw = tx.query_row(
          &format!(
            "INSERT INTO progress_facts (fact_id, user_id, lecture_id, completed, completed_at)
             VALUES (?1, ?2, ?3, 1, ?4)
             ON CONFLICT (user_id, lecture_id) DO UPDATE SET
               completed    = NOT progress_facts.completed,
               completed_at = CASE WHEN progress_facts.completed
                                   THEN NULL
                                   ELSE excluded.completed_at END
             RETURNING {FACT_COLUMNS}"
          ),
          rusqlite::params![fact_id_str, user_str, lecture_str, now_str],
          RawFact::from_row,
        )?;

        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    raw.map(RawFact::into_fact).transpose()
  }
}
