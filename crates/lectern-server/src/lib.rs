//! HTTP server for Lectern.
//!
//! Wires the JSON API from `lectern-api` to a concrete store and the
//! Basic-auth [`BasicAuth`] identity provider, and adds request tracing.

pub mod auth;

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use lectern_core::{
  store::{CatalogStore, ProgressStore},
  tracker::Tracker,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{BasicAuth, UserConfig};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `LECTERN_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  #[serde(default)]
  pub users:      Vec<UserConfig>,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Everything the router needs, shared across requests.
pub struct AppState<S> {
  pub tracker: Arc<Tracker<S>>,
  pub auth:    Arc<BasicAuth>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      tracker: self.tracker.clone(),
      auth:    self.auth.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router with the API mounted at `/api`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: CatalogStore + ProgressStore + 'static,
{
  Router::new()
    .nest("/api", lectern_api::api_router(state.tracker, state.auth))
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────
