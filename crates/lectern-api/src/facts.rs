//! Handlers for `/facts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/facts` | Caller's progress facts; optional `completed_only` |

use axum::{
  Json,
  extract::{Query, State, rejection::QueryRejection},
};
use lectern_core::{
  progress::ProgressFact,
  store::{CatalogStore, ProgressStore},
};
use serde::Deserialize;

use crate::{ApiState, CurrentUser, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  /// If `true`, only facts currently marked completed. Default `false`.
  #[serde(default)]
  pub completed_only: bool,
}

/// `GET /facts[?completed_only=true]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(user): CurrentUser,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<ProgressFact>>, ApiError>
where
  S: CatalogStore + ProgressStore + 'static,
{
  let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  Ok(Json(state.tracker.facts(&user, params.completed_only).await?))
}
