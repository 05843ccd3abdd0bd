//! HTTP method dispatch for a single path.

use http::Method;
use smallvec::SmallVec;

/// Maps HTTP methods to route targets for one path.
///
/// A path may also carry an `any` target that answers every method without
/// an explicit registration.
///
/// ```rust
/// use ergon_router::MethodRouter;
/// use http::Method;
///
/// let methods = MethodRouter::new().get("list").post("create");
///
/// assert_eq!(methods.get_target(&Method::GET), Some(&"list"));
/// assert_eq!(methods.get_target(&Method::DELETE), None);
/// assert_eq!(methods.allowed_methods(), vec![Method::GET, Method::POST]);
/// ```
#[derive(Debug, Clone)]
pub struct MethodRouter<T> {
    by_method: SmallVec<[(Method, T); 4]>,
    any: Option<T>,
}

impl<T> Default for MethodRouter<T> {
    fn default() -> Self {
        Self {
            by_method: SmallVec::new(),
            any: None,
        }
    }
}

impl<T> MethodRouter<T> {
    /// Creates an empty method router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a GET target.
    #[must_use]
    pub fn get(self, target: T) -> Self {
        self.method(&Method::GET, target)
    }

    /// Registers a POST target.
    #[must_use]
    pub fn post(self, target: T) -> Self {
        self.method(&Method::POST, target)
    }

    /// Registers a PUT target.
    #[must_use]
    pub fn put(self, target: T) -> Self {
        self.method(&Method::PUT, target)
    }

    /// Registers a DELETE target.
    #[must_use]
    pub fn delete(self, target: T) -> Self {
        self.method(&Method::DELETE, target)
    }

    /// Registers a PATCH target.
    #[must_use]
    pub fn patch(self, target: T) -> Self {
        self.method(&Method::PATCH, target)
    }

    /// Registers a target for an arbitrary method. An existing registration
    /// for the same method is kept.
    #[must_use]
    pub fn method(mut self, method: &Method, target: T) -> Self {
        if !self.contains(method) {
            self.by_method.push((method.clone(), target));
        }
        self
    }

    /// Registers a target that answers any method without its own entry.
    #[must_use]
    pub fn any(mut self, target: T) -> Self {
        if self.any.is_none() {
            self.any = Some(target);
        }
        self
    }

    /// Looks up the target for `method`, falling back to the `any` target.
    #[must_use]
    pub fn get_target(&self, method: &Method) -> Option<&T> {
        self.by_method
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, t)| t)
            .or(self.any.as_ref())
    }

    /// True if `method` has its own registration (the `any` target does not
    /// count).
    #[must_use]
    pub fn contains(&self, method: &Method) -> bool {
        self.by_method.iter().any(|(m, _)| m == method)
    }

    /// True if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_method.is_empty() && self.any.is_none()
    }

    /// Methods with their own registration, in registration order.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        self.by_method.iter().map(|(m, _)| m.clone()).collect()
    }

    /// True if an `any` target is registered.
    #[must_use]
    pub fn has_any(&self) -> bool {
        self.any.is_some()
    }

    /// Methods that `other` would register but `self` already owns. An
    /// `any` target on both sides is reported as `None` in the list.
    pub(crate) fn overlaps(&self, other: &Self) -> Vec<Option<Method>> {
        let mut overlaps: Vec<Option<Method>> = other
            .by_method
            .iter()
            .filter(|(m, _)| self.contains(m))
            .map(|(m, _)| Some(m.clone()))
            .collect();
        if self.any.is_some() && other.any.is_some() {
            overlaps.push(None);
        }
        overlaps
    }

    /// Moves every registration of `other` into `self`. Existing entries are
    /// kept; callers check [`overlaps`](Self::overlaps) first.
    pub(crate) fn merge(&mut self, other: Self) {
        for (method, target) in other.by_method {
            if !self.contains(&method) {
                self.by_method.push((method, target));
            }
        }
        if self.any.is_none() {
            self.any = other.any;
        }
    }
}
