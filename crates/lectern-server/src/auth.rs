//! HTTP Basic-auth identity provider backed by argon2 password hashes.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::http::{HeaderMap, header};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use lectern_core::{identity::IdentityProvider, progress::UserId};
use rand_core::OsRng;
use serde::Deserialize;
use thiserror::Error;

/// One account allowed to use this server instance.
#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
  /// Stable id progress facts are recorded under.
  pub user_id:       String,
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Why a request's credentials were rejected. Never shown to the client.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
  #[error("missing Authorization header")]
  MissingHeader,
  #[error("malformed Basic credentials")]
  Malformed,
  #[error("unknown user {0:?}")]
  UnknownUser(String),
  #[error("wrong password for {0:?}")]
  BadPassword(String),
  #[error("stored hash is not a valid PHC string")]
  BadHash,
}

/// Verify Basic credentials in `headers` against `users`.
pub fn verify_auth(
  headers: &HeaderMap,
  users: &[UserConfig],
) -> Result<UserId, AuthError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(AuthError::MissingHeader)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(AuthError::Malformed)?;

  let decoded = B64.decode(encoded).map_err(|_| AuthError::Malformed)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| AuthError::Malformed)?;

  let (username, password) = creds.split_once(':').ok_or(AuthError::Malformed)?;

  let user = users
    .iter()
    .find(|u| u.username == username)
    .ok_or_else(|| AuthError::UnknownUser(username.to_owned()))?;

  let parsed_hash =
    PasswordHash::new(&user.password_hash).map_err(|_| AuthError::BadHash)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| AuthError::BadPassword(username.to_owned()))?;

  Ok(UserId::new(user.user_id.clone()))
}

/// Produce an argon2id PHC string for `password` with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)?
      .to_string(),
  )
}

// ─── Identity provider ───────────────────────────────────────────────────────

/// The configured accounts, resolved from each request's `Authorization`
/// header.
#[derive(Debug, Clone, Default)]
pub struct BasicAuth {
  users: Vec<UserConfig>,
}

impl BasicAuth {
  pub fn new(users: Vec<UserConfig>) -> Self { Self { users } }

  pub fn user_count(&self) -> usize { self.users.len() }
}

impl IdentityProvider<HeaderMap> for BasicAuth {
  fn current_user(&self, headers: &HeaderMap) -> Option<UserId> {
    match verify_auth(headers, &self.users) {
      Ok(user) => Some(user),
      Err(AuthError::MissingHeader) => None,
      Err(reason) => {
        tracing::warn!(%reason, "rejected credentials");
        None
      }
    }
  }
}
