//! The boundary to whatever authenticates requests.
//!
//! Lectern never authenticates anyone itself. An [`IdentityProvider`] turns a
//! request context (headers, a session, a test fixture) into a [`UserId`], and
//! every user-scoped operation takes that id as an explicit argument.

use crate::{Error, Result, progress::UserId};

/// Resolves the user behind a request context of type `Ctx`.
pub trait IdentityProvider<Ctx: ?Sized>: Send + Sync {
  /// The authenticated user, or `None` if the context carries no valid
  /// identity.
  fn current_user(&self, ctx: &Ctx) -> Option<UserId>;

  /// Like [`current_user`](Self::current_user), failing with
  /// [`Error::Unauthorized`].
  fn require_user(&self, ctx: &Ctx) -> Result<UserId> {
    self.current_user(ctx).ok_or(Error::Unauthorized)
  }
}
