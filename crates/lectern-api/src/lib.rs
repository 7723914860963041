//! JSON REST API for Lectern.
//!
//! Exposes an axum [`Router`] backed by a [`Tracker`] over any store that
//! implements both [`CatalogStore`] and [`ProgressStore`]. Who the caller is
//! comes from an injected [`IdentityProvider`] over request headers; TLS and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", lectern_api::api_router(tracker.clone(), identity.clone()))
//! ```

pub mod chapters;
pub mod courses;
pub mod dashboard;
pub mod error;
pub mod etag;
pub mod facts;
pub mod identity;
pub mod lectures;

use std::sync::Arc;

use axum::{
  Router,
  http::HeaderMap,
  routing::{get, post},
};
use lectern_core::{
  identity::IdentityProvider,
  store::{CatalogStore, ProgressStore},
  tracker::Tracker,
};

pub use error::ApiError;
pub use identity::CurrentUser;

// ─── Application state ────────────────────────────────────────────────────────

/// Identity provider resolving users from request headers.
pub type HeaderIdentity = dyn IdentityProvider<HeaderMap>;

/// Shared state threaded through all API handlers.
pub struct ApiState<S> {
  pub tracker:  Arc<Tracker<S>>,
  pub identity: Arc<HeaderIdentity>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      tracker:  self.tracker.clone(),
      identity: self.identity.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(
  tracker: Arc<Tracker<S>>,
  identity: Arc<HeaderIdentity>,
) -> Router<()>
where
  S: CatalogStore + ProgressStore + 'static,
{
  Router::new()
    // Catalog with progress
    .route("/courses", get(courses::list::<S>))
    .route("/courses/{id}", get(courses::get_one::<S>))
    .route("/chapters/{id}", get(chapters::get_one::<S>))
    .route("/dashboard", get(dashboard::handler::<S>))
    // Progress facts
    .route("/facts", get(facts::list::<S>))
    .route("/lectures/{id}/toggle", post(lectures::toggle::<S>))
    .with_state(ApiState { tracker, identity })
}
