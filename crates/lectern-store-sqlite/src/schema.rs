//! SQL schema for the Lectern SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Catalog tables are written only by the offline import.
CREATE TABLE IF NOT EXISTS courses (
    course_id     TEXT PRIMARY KEY,
    title         TEXT NOT NULL,
    course_url    TEXT NOT NULL,
    phase         INTEGER NOT NULL,
    instructor    TEXT,
    display_order INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS chapters (
    chapter_id TEXT PRIMARY KEY,
    course_id  TEXT NOT NULL REFERENCES courses(course_id),
    number     INTEGER NOT NULL,
    title      TEXT NOT NULL,
    UNIQUE (course_id, number)
);

CREATE TABLE IF NOT EXISTS lectures (
    lecture_id TEXT PRIMARY KEY,
    chapter_id TEXT NOT NULL REFERENCES chapters(chapter_id),
    course_id  TEXT NOT NULL REFERENCES courses(course_id),
    title      TEXT NOT NULL,
    url        TEXT NOT NULL,
    \"order\"    INTEGER NOT NULL
);

-- One row per (user, lecture); created by the first toggle, never deleted.
CREATE TABLE IF NOT EXISTS progress_facts (
    fact_id      TEXT PRIMARY KEY,
    user_id      TEXT NOT NULL,   -- opaque id from the identity provider
    lecture_id   TEXT NOT NULL REFERENCES lectures(lecture_id),
    completed    INTEGER NOT NULL DEFAULT 0,
    completed_at TEXT,            -- RFC 3339 UTC; NULL iff not completed
    notes        TEXT,
    UNIQUE (user_id, lecture_id),
    CHECK  ((completed = 1) = (completed_at IS NOT NULL))
);

-- Single row; bumped by every catalog import.
CREATE TABLE IF NOT EXISTS catalog_meta (
    id      INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL
);
INSERT OR IGNORE INTO catalog_meta (id, version) VALUES (1, 0);

CREATE INDEX IF NOT EXISTS courses_order_idx     ON courses(display_order);
CREATE INDEX IF NOT EXISTS chapters_course_idx   ON chapters(course_id);
CREATE INDEX IF NOT EXISTS lectures_chapter_idx  ON lectures(chapter_id);
CREATE INDEX IF NOT EXISTS lectures_course_idx   ON lectures(course_id);
CREATE INDEX IF NOT EXISTS progress_user_idx     ON progress_facts(user_id);

PRAGMA user_version = 1;
";
