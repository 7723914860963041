//! The [`CurrentUser`] extractor.
//!
//! Resolves the caller through the state's
//! [`IdentityProvider`](lectern_core::identity::IdentityProvider) before any
//! handler body runs, so a rejected request never reaches the tracker.

use axum::{extract::FromRequestParts, http::request::Parts};
use lectern_core::{
  progress::UserId,
  store::{CatalogStore, ProgressStore},
};

use crate::{ApiState, error::ApiError};

/// The authenticated user behind the current request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserId);

impl<S> FromRequestParts<ApiState<S>> for CurrentUser
where
  S: CatalogStore + ProgressStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let user = state.identity.require_user(&parts.headers)?;
    Ok(CurrentUser(user))
  }
}
