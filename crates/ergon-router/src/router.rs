//! The [`Router`] front end over the radix tree.

use http::Method;

use crate::error::RouteError;
use crate::method_router::MethodRouter;
use crate::node::Node;
use crate::params::Params;
use crate::RouteMatch;

/// Radix tree router generic over its route target.
///
/// # Example
///
/// ```rust
/// use ergon_router::{MethodRouter, Router};
/// use http::Method;
///
/// let mut router = Router::new();
/// router.insert("/users", MethodRouter::new().get(1).post(2))?;
/// router.route(&Method::DELETE, "/users/{id:[0-9]+}", 3)?;
///
/// let m = router.match_route(&Method::DELETE, "/users/9").unwrap();
/// assert_eq!(*m.target, 3);
/// assert_eq!(router.len(), 3);
/// # Ok::<(), ergon_router::RouteError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Router<T> {
    root: Node<T>,
    route_count: usize,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Registers every method of `methods` at `path`.
    ///
    /// Registrations for the same path merge. Registering a method that the
    /// path already answers is an error and leaves the router unchanged.
    ///
    /// # Errors
    ///
    /// Returns a [`RouteError`] if the pattern is malformed, a constraint
    /// fails to compile, a parameter conflicts with an existing one, or a
    /// method is already registered for the path.
    pub fn insert(&mut self, path: &str, methods: MethodRouter<T>) -> Result<(), RouteError> {
        let added = methods.allowed_methods().len() + usize::from(methods.has_any());
        self.root.insert(path, methods)?;
        self.route_count += added;
        Ok(())
    }

    /// Registers a single method at `path`.
    ///
    /// # Errors
    ///
    /// Same as [`insert`](Self::insert).
    pub fn route(&mut self, method: &Method, path: &str, target: T) -> Result<(), RouteError> {
        self.insert(path, MethodRouter::new().method(method, target))
    }

    /// Matches a request method and path.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        let (methods, params) = self.root.match_path(path)?;
        let target = methods.get_target(method)?;
        Some(RouteMatch::new(target, params))
    }

    /// Matches a path regardless of method. Used to tell a 404 from a 405.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        self.root.match_path(path)
    }

    /// Number of method registrations, counting an `any` target as one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// True if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}
