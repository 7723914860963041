//! Progress facts, the only user-mutable state in Lectern.
//!
//! There is at most one [`ProgressFact`] per (user, lecture) pair. A missing
//! fact means the lecture is not completed. Facts are created lazily by the
//! first toggle and are never deleted.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::LectureId;

/// Opaque, stable identifier handed out by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for UserId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

/// Whether a user has completed a lecture, and when.
///
/// Invariant: `completed_at.is_some() == completed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressFact {
  pub fact_id:      Uuid,
  pub user_id:      UserId,
  pub lecture_id:   LectureId,
  pub completed:    bool,
  pub completed_at: Option<DateTime<Utc>>,
  /// Free text; no mutation path writes it yet.
  pub notes:        Option<String>,
}

impl ProgressFact {
  /// The fact created by a user's first toggle of a lecture. A first toggle
  /// always marks the lecture complete.
  pub fn first_completion(
    user_id: UserId,
    lecture_id: LectureId,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      fact_id: Uuid::new_v4(),
      user_id,
      lecture_id,
      completed: true,
      completed_at: Some(now),
      notes: None,
    }
  }

  /// Flip `completed`, stamping or clearing `completed_at` to match.
  pub fn toggled(self, now: DateTime<Utc>) -> Self {
    let completed = !self.completed;
    Self {
      completed,
      completed_at: completed.then_some(now),
      ..self
    }
  }

  /// Apply a toggle to an optional existing fact.
  pub fn toggle(
    existing: Option<Self>,
    user_id: UserId,
    lecture_id: LectureId,
    now: DateTime<Utc>,
  ) -> Self {
    match existing {
      Some(fact) => fact.toggled(now),
      None => Self::first_completion(user_id, lecture_id, now),
    }
  }

  /// `true` if `completed_at` agrees with `completed`.
  pub fn is_consistent(&self) -> bool {
    self.completed_at.is_some() == self.completed
  }
}
