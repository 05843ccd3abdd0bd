//! Server error types.

use std::io;
use std::net::{AddrParseError, SocketAddr};

use ergon_core::EntityError;
use ergon_router::RouteError;
use thiserror::Error;

/// Errors raised while building a [`Routes`](crate::Routes) table.
#[derive(Debug, Error)]
pub enum RoutesError {
    /// The router refused a pattern or a duplicate registration.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// An entity could not be expanded.
    #[error(transparent)]
    Entity(#[from] EntityError),

    /// A header filter name or value is not valid HTTP.
    #[error("invalid header filter `{name}: {value}` on route `{pattern}`")]
    InvalidHeader {
        /// The route pattern.
        pattern: String,
        /// The header name as given.
        name: String,
        /// The header value as given.
        value: String,
    },
}

/// Errors raised while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address does not parse.
    #[error("invalid address `{addr}`: {source}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// The parse failure.
        #[source]
        source: AddrParseError,
    },

    /// Binding the listener failed.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address we tried to bind.
        addr: SocketAddr,
        /// The I/O failure.
        #[source]
        source: io::Error,
    },

    /// Any other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_routes_error_is_transparent() {
        let err: RoutesError = RouteError::Duplicate {
            method: Method::POST,
            path: "/widgets".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "route POST /widgets is already registered");

        let err: RoutesError = EntityError::NoOperations {
            path: "/empty".to_string(),
        }
        .into();
        assert!(err.to_string().contains("/empty"));
    }

    #[test]
    fn test_invalid_address_display() {
        let source = "nope".parse::<SocketAddr>().unwrap_err();
        let err = ServerError::InvalidAddress {
            addr: "nope".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("invalid address `nope`"));
    }
}
