//! `GET /chapters/:id`: one chapter with its lectures and the caller's flags.

use axum::{
  Json,
  extract::{Path, State},
};
use lectern_core::{
  catalog::ChapterId,
  store::{CatalogStore, ProgressStore},
  view::ChapterDetail,
};

use crate::{ApiState, CurrentUser, error::ApiError};

pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<ChapterId>,
) -> Result<Json<ChapterDetail>, ApiError>
where
  S: CatalogStore + ProgressStore + 'static,
{
  Ok(Json(state.tracker.chapter_detail(&user, &id).await?))
}
