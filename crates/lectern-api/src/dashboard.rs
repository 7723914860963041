//! `GET /dashboard` with conditional-GET support.

use axum::{
  body::Body,
  extract::State,
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use lectern_core::store::{CatalogStore, ProgressStore};

use crate::{
  ApiState, CurrentUser,
  error::ApiError,
  etag::{compute_etag, if_none_match},
};

/// Returns the caller's [`Dashboard`](lectern_core::view::Dashboard) as JSON
/// with an `ETag`, or `304 Not Modified` when `If-None-Match` already names
/// the current tag.
pub async fn handler<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(user): CurrentUser,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: CatalogStore + ProgressStore + 'static,
{
  let dashboard = state.tracker.dashboard(&user).await?;
  let body = serde_json::to_vec(&*dashboard)?;
  let etag = compute_etag(&body);

  if if_none_match(&headers, &etag) {
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
  }

  Ok(
    (
      StatusCode::OK,
      [(header::ETAG, etag)],
      [(header::CONTENT_TYPE, "application/json")],
      Body::from(body),
    )
      .into_response(),
  )
}
