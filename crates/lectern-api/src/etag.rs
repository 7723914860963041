//! ETag computation and `If-None-Match` evaluation for JSON views.
//!
//! Tags are SHA-256 hashes over the exact response body, so any change in
//! the user's progress or the catalog behind a view yields a new tag.

use axum::http::{HeaderMap, header};
use sha2::{Digest, Sha256};

/// Compute a strong, quoted ETag for a serialised response body.
pub fn compute_etag(body: &[u8]) -> String {
  let hash = Sha256::digest(body);
  format!("\"{}\"", hex::encode(hash))
}

/// `true` if the request's `If-None-Match` header matches `etag`.
///
/// Accepts `*`, comma-separated lists, and weak (`W/`) validators, which
/// compare equal to their strong form for GET.
pub fn if_none_match(headers: &HeaderMap, etag: &str) -> bool {
  headers
    .get_all(header::IF_NONE_MATCH)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(','))
    .map(str::trim)
    .any(|candidate| {
      candidate == "*" || candidate.trim_start_matches("W/") == etag
    })
}
