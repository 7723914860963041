//! Handlers for `/courses` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/courses` | Every course with the caller's stats, in display order |
//! | `GET`  | `/courses/:id` | Course page; 404 if not found |

use axum::{
  Json,
  extract::{Path, State},
};
use lectern_core::{
  catalog::CourseId,
  store::{CatalogStore, ProgressStore},
  view::{CourseProgress, CourseSummary},
};

use crate::{ApiState, CurrentUser, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /courses`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<CourseSummary>>, ApiError>
where
  S: CatalogStore + ProgressStore + 'static,
{
  Ok(Json(state.tracker.courses(&user).await?))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /courses/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<CourseId>,
) -> Result<Json<CourseProgress>, ApiError>
where
  S: CatalogStore + ProgressStore + 'static,
{
  Ok(Json(state.tracker.course_detail(&user, &id).await?))
}
