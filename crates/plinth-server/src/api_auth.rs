//! Authentication route group.
//!
//! Declares the `/auth` prefix and its not-found contract. No endpoints are
//! registered yet; login and token flows land here once an account model
//! exists. Until then every request under the prefix, whatever the method,
//! answers `404 {"description": "Not found"}`.

use crate::routes::RouteGroup;

/// Builds the auth route group.
pub fn routes() -> RouteGroup {
    RouteGroup::new("auth", "/auth").not_found_description("Not found")
}
