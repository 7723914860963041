//! Error types for `lectern-core`.

use thiserror::Error;

use crate::catalog::{ChapterId, CourseId, LectureId};

#[derive(Debug, Error)]
pub enum Error {
  /// No authenticated user was supplied for a user-scoped operation.
  #[error("unauthorized")]
  Unauthorized,

  #[error("course not found: {0}")]
  CourseNotFound(CourseId),

  #[error("chapter not found: {0}")]
  ChapterNotFound(ChapterId),

  #[error("lecture not found: {0}")]
  LectureNotFound(LectureId),

  /// Any failure reported by a catalog or progress store. Never retried.
  #[error("storage unavailable: {0}")]
  StorageUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error as [`Error::StorageUnavailable`].
  pub fn storage<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::StorageUnavailable(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
