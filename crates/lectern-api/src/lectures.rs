//! `POST /lectures/:id/toggle`: flip the caller's completion of one lecture.
//!
//! Returns the resulting [`ProgressFact`]. Unknown lectures are 404 and
//! leave no trace in the store.

use axum::{
  Json,
  extract::{Path, State},
};
use lectern_core::{
  catalog::LectureId,
  progress::ProgressFact,
  store::{CatalogStore, ProgressStore},
};

use crate::{ApiState, CurrentUser, error::ApiError};

pub async fn toggle<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<LectureId>,
) -> Result<Json<ProgressFact>, ApiError>
where
  S: CatalogStore + ProgressStore + 'static,
{
  let fact = state.tracker.toggle(&user, &id).await?;
  Ok(Json(fact))
}
