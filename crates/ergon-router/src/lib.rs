//! Radix tree router for Ergon.
//!
//! Paths are split into segments and stored in a compressed trie, so a
//! lookup costs one step per segment regardless of how many routes exist.
//! Each endpoint node owns a [`MethodRouter`] that maps HTTP methods to an
//! arbitrary route target `T` (a handler, an operation id, ...).
//!
//! # Segment syntax
//!
//! | Pattern | Matches |
//! |---|---|
//! | `users` | the literal segment `users` |
//! | `{id}` | any single segment, captured as `id` |
//! | `{id:[0-9]+}` | a single segment matching the regex, captured as `id` |
//! | `*rest` | every remaining segment, captured as `rest` (must be last) |
//!
//! # Example
//!
//! ```rust
//! use ergon_router::{MethodRouter, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert("/widgets", MethodRouter::new().get("listWidgets").post("createWidget"))?;
//! router.insert("/widgets/{id:[0-9]+}", MethodRouter::new().get("getWidget"))?;
//!
//! let found = router.match_route(&Method::GET, "/widgets/42").unwrap();
//! assert_eq!(*found.target, "getWidget");
//! assert_eq!(found.params.get("id"), Some("42"));
//!
//! assert!(router.match_route(&Method::GET, "/widgets/abc").is_none());
//! # Ok::<(), ergon_router::RouteError>(())
//! ```
//!
//! # Priority
//!
//! Static segments win over parameters, parameters over wildcards. When a
//! higher-priority branch fails further down the path, matching backtracks
//! and tries the next branch.

#![doc(html_root_url = "https://docs.rs/ergon-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod method_router;
mod node;
mod params;
mod router;

pub use error::RouteError;
pub use method_router::MethodRouter;
pub use node::{Constraint, SegmentKind};
pub use params::Params;
pub use router::Router;

/// A matched route: the registered target and the captured parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// The target registered for the matched method and path.
    pub target: &'a T,
    /// Path parameters captured while matching.
    pub params: Params,
}

impl<'a, T> RouteMatch<'a, T> {
    /// Creates a new route match.
    #[must_use]
    pub fn new(target: &'a T, params: Params) -> Self {
        Self { target, params }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_collection_and_item_routes() {
        let mut router = Router::new();
        router
            .insert("/orders", MethodRouter::new().get("list").post("create"))
            .unwrap();
        router
            .insert(
                "/orders/{id:[0-9]+}",
                MethodRouter::new().get("get").put("update").delete("delete"),
            )
            .unwrap();

        let m = router.match_route(&Method::POST, "/orders").unwrap();
        assert_eq!(*m.target, "create");
        assert!(m.params.is_empty());

        let m = router.match_route(&Method::DELETE, "/orders/7").unwrap();
        assert_eq!(*m.target, "delete");
        assert_eq!(m.params.get("id"), Some("7"));

        assert!(router.match_route(&Method::PUT, "/orders/seven").is_none());
        assert!(router.match_route(&Method::PATCH, "/orders/7").is_none());
    }

    #[test]
    fn test_nested_collections() {
        let mut router = Router::new();
        router
            .route(&Method::POST, "/orders/items", "createItem")
            .unwrap();
        router
            .route(&Method::GET, "/orders/items/{id:[0-9]+}", "getItem")
            .unwrap();
        router
            .route(&Method::GET, "/orders/{id:[0-9]+}", "getOrder")
            .unwrap();

        assert_eq!(
            router
                .match_route(&Method::POST, "/orders/items")
                .map(|m| *m.target),
            Some("createItem")
        );
        assert_eq!(
            router
                .match_route(&Method::GET, "/orders/items/3")
                .map(|m| *m.target),
            Some("getItem")
        );
        assert_eq!(
            router
                .match_route(&Method::GET, "/orders/3")
                .map(|m| *m.target),
            Some("getOrder")
        );
    }

    #[test]
    fn test_wildcard_routing() {
        let mut router = Router::new();
        router
            .insert("/assets/*file", MethodRouter::new().get("serveAsset"))
            .unwrap();

        let m = router
            .match_route(&Method::GET, "/assets/css/site.css")
            .unwrap();
        assert_eq!(*m.target, "serveAsset");
        assert_eq!(m.params.get("file"), Some("css/site.css"));
    }
}
