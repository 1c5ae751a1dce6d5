//! Route table assembly.
//!
//! Handlers are declared in [`RouteGroup`]s, plain data owned by the module
//! that defines them. [`RouterBuilder::mount`] validates each group and nests
//! it under its prefix, so a malformed path or a prefix collision surfaces as
//! a [`MountError`] at startup instead of a routing panic or a silently
//! shadowed endpoint.

use std::collections::HashSet;

use axum::handler::Handler;
use axum::http::{Method, StatusCode};
use axum::routing::{any, on, MethodFilter, MethodRouter};
use axum::{Json, Router};
use thiserror::Error;

/// Errors raised while mounting a route group.
#[derive(Debug, Error)]
pub enum MountError {
    /// The group's prefix is malformed.
    #[error("invalid route group prefix {prefix:?}: {reason}")]
    InvalidPrefix {
        prefix: &'static str,
        reason: &'static str,
    },

    /// The group's prefix overlaps a prefix that is already mounted.
    #[error("route group prefix {new:?} collides with already mounted {existing:?}")]
    PrefixCollision {
        new: &'static str,
        existing: &'static str,
    },

    /// A path inside the group does not start with `/`.
    #[error("invalid route path {path:?} in group \"{tag}\": paths must start with '/'")]
    InvalidPath {
        tag: &'static str,
        path: &'static str,
    },

    /// The same method and path were registered twice within one group.
    #[error("duplicate route {method} {path} in group \"{tag}\"")]
    DuplicateRoute {
        tag: &'static str,
        method: Method,
        path: &'static str,
    },

    /// The method has no dispatch filter (extension methods such as PURGE).
    #[error("method {method} on {path} cannot be routed")]
    UnsupportedMethod {
        method: Method,
        path: &'static str,
    },
}

struct RouteEntry {
    method: Method,
    path: &'static str,
    /// `None` when the method has no dispatch filter; rejected at mount time.
    action: Option<MethodRouter>,
}

/// A named set of routes sharing a path prefix.
///
/// Groups are built by the API modules and handed to [`RouterBuilder::mount`]
/// during startup. Until then they are inert data, which keeps route
/// declarations testable without a running router.
pub struct RouteGroup {
    tag: &'static str,
    prefix: &'static str,
    not_found: Option<&'static str>,
    entries: Vec<RouteEntry>,
}

impl RouteGroup {
    /// Declares an empty group under `prefix`, tagged `tag` for logs.
    pub fn new(tag: &'static str, prefix: &'static str) -> Self {
        Self {
            tag,
            prefix,
            not_found: None,
            entries: Vec::new(),
        }
    }

    /// Serves `404 {"description": <text>}` for any request under the prefix
    /// that matches no registered route. Groups without a description fall
    /// through to the framework's plain 404.
    pub fn not_found_description(mut self, description: &'static str) -> Self {
        self.not_found = Some(description);
        self
    }

    /// Registers `handler` for `method` on `path`, relative to the prefix.
    pub fn route<H, T>(mut self, method: Method, path: &'static str, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        let action = MethodFilter::try_from(method.clone())
            .ok()
            .map(|filter| on(filter, handler));
        self.entries.push(RouteEntry {
            method,
            path,
            action,
        });
        self
    }

    /// The group's log tag.
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// The path prefix the group mounts under.
    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Number of registered endpoints.
    pub fn route_count(&self) -> usize {
        self.entries.len()
    }
}

/// Assembles the application router from route groups.
pub struct RouterBuilder {
    router: Router,
    mounted: Vec<&'static str>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            mounted: Vec::new(),
        }
    }

    /// Adds a single route outside any group, e.g. the root endpoint.
    pub fn route(mut self, path: &str, action: MethodRouter) -> Self {
        self.router = self.router.route(path, action);
        self
    }

    /// Validates `group` and nests it under its prefix.
    ///
    /// # Errors
    ///
    /// Returns [`MountError`] when the prefix is malformed or collides with
    /// an already mounted group, or when an entry has a bad path, duplicates
    /// an earlier one, or uses a method that cannot be dispatched on.
    pub fn mount(mut self, group: RouteGroup) -> Result<Self, MountError> {
        let RouteGroup {
            tag,
            prefix,
            not_found,
            entries,
        } = group;

        validate_prefix(prefix)?;
        if let Some(existing) = self
            .mounted
            .iter()
            .copied()
            .find(|mounted| prefixes_collide(mounted, prefix))
        {
            return Err(MountError::PrefixCollision {
                new: prefix,
                existing,
            });
        }

        let route_count = entries.len();
        let mut seen: HashSet<(Method, &'static str)> = HashSet::new();
        let mut routes: Vec<(&'static str, MethodRouter)> = Vec::new();

        for entry in entries {
            let RouteEntry {
                method,
                path,
                action,
            } = entry;

            if !path.starts_with('/') {
                return Err(MountError::InvalidPath { tag, path });
            }
            if !seen.insert((method.clone(), path)) {
                return Err(MountError::DuplicateRoute { tag, method, path });
            }
            let action = match action {
                Some(action) => action,
                None => return Err(MountError::UnsupportedMethod { method, path }),
            };

            // Entries for the same path collapse into one method router.
            match routes.iter_mut().find(|(existing, _)| *existing == path) {
                Some((_, merged)) => *merged = std::mem::take(merged).merge(action),
                None => routes.push((path, action)),
            }
        }

        let mut inner = Router::new();
        for (path, action) in routes {
            inner = inner.route(path, action);
        }
        if let Some(description) = not_found {
            let not_found_handler = move || async move {
                (
                    StatusCode::NOT_FOUND,
                    Json(serde_json::json!({ "description": description })),
                )
            };
            inner = inner.fallback(not_found_handler.clone());
            // The bare prefix with a trailing slash resolves outside the
            // nest, so it needs its own route to stay inside the contract.
            self.router = self
                .router
                .route(&format!("{prefix}/"), any(not_found_handler));
        }

        tracing::info!(tag, prefix, routes = route_count, "mounted route group");

        self.router = self.router.nest(prefix, inner);
        self.mounted.push(prefix);
        Ok(self)
    }

    /// Finishes assembly, yielding the live router.
    pub fn into_router(self) -> Router {
        self.router
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_prefix(prefix: &'static str) -> Result<(), MountError> {
    let invalid = |reason: &'static str| MountError::InvalidPrefix { prefix, reason };

    if !prefix.starts_with('/') {
        return Err(invalid("must start with '/'"));
    }
    if prefix.len() == 1 {
        return Err(invalid("must not be the bare root"));
    }
    if prefix.ends_with('/') {
        return Err(invalid("must not end with '/'"));
    }
    if prefix.contains("//") {
        return Err(invalid("must not contain empty segments"));
    }
    if prefix.contains(['{', '}', '*', ':']) {
        return Err(invalid("must not contain parameters or wildcards"));
    }
    Ok(())
}

/// Two prefixes collide when one equals the other or is nested inside it,
/// segment-wise. `/auth` and `/auth/tokens` collide; `/auth` and `/authz`
/// do not.
fn prefixes_collide(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let (short, long) = if a.len() < b.len() { (a, b) } else { (b, a) };
    long.starts_with(short) && long.as_bytes()[short.len()] == b'/'
}
