//! Route registration errors.

use http::Method;
use thiserror::Error;

/// Errors raised while registering a route.
///
/// Matching never fails with an error; only building the tree does.
#[derive(Debug, Error)]
pub enum RouteError {
    /// A `{name:regex}` constraint did not compile.
    #[error("invalid constraint `{pattern}` in route `{path}`: {source}")]
    InvalidConstraint {
        /// The route pattern being registered.
        path: String,
        /// The regex source as written in the pattern.
        pattern: String,
        /// The regex compilation error.
        #[source]
        source: regex::Error,
    },

    /// A segment is syntactically malformed (e.g. `{}` or `{:[0-9]+}`).
    #[error("malformed segment `{segment}` in route `{path}`")]
    MalformedSegment {
        /// The route pattern being registered.
        path: String,
        /// The offending segment.
        segment: String,
    },

    /// A wildcard segment was followed by more segments.
    #[error("wildcard must be the last segment in route `{path}`")]
    WildcardNotLast {
        /// The route pattern being registered.
        path: String,
    },

    /// Two routes place differently named or constrained parameters at the
    /// same position.
    #[error("parameter `{new}` in route `{path}` conflicts with existing `{existing}`")]
    ParamConflict {
        /// The route pattern being registered.
        path: String,
        /// The segment already in the tree.
        existing: String,
        /// The segment being inserted.
        new: String,
    },

    /// The method is already registered for this path.
    #[error("route {method} {path} is already registered")]
    Duplicate {
        /// The duplicated method.
        method: Method,
        /// The route pattern being registered.
        path: String,
    },

    /// The path already has a target answering any method.
    #[error("route {path} already has a fallback for any method")]
    DuplicateFallback {
        /// The route pattern being registered.
        path: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_display() {
        let err = RouteError::Duplicate {
            method: Method::POST,
            path: "/widgets".to_string(),
        };
        assert_eq!(err.to_string(), "route POST /widgets is already registered");
    }

    #[test]
    fn test_conflict_display() {
        let err = RouteError::ParamConflict {
            path: "/a/{slug}".to_string(),
            existing: "{id:[0-9]+}".to_string(),
            new: "{slug}".to_string(),
        };
        assert!(err.to_string().contains("conflicts with existing `{id:[0-9]+}`"));
    }
}
