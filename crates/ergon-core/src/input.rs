//! Narrowed views of a [`RequestContext`] handed to each pipeline stage.
//!
//! Every stage sees only what it needs: authentication gets headers, path,
//! and execution context; authorization gets path, context, and the decoded
//! body; validation gets the body alone. Stages take the view as a trait
//! object, so tests can pass a small fake instead of a full request.

use std::any::Any;

use http::HeaderMap;

use crate::body::Payload;
use crate::context::{ExecutionContext, RequestContext};

/// What an [`Authenticator`](crate::Authenticator) may inspect.
pub trait AuthenticationInput {
    /// Request headers.
    fn headers(&self) -> &HeaderMap;
    /// Request path.
    fn path(&self) -> &str;
    /// Request-scoped metadata.
    fn context(&self) -> &ExecutionContext;
}

/// What an [`Authorizer`](crate::Authorizer) may inspect.
pub trait AuthorizationInput {
    /// Request path.
    fn path(&self) -> &str;
    /// Request-scoped metadata.
    fn context(&self) -> &ExecutionContext;
    /// The decoded body, if any.
    fn body(&self) -> Option<&Payload>;
}

/// What a [`Validator`](crate::Validator) may inspect.
pub trait ValidationInput {
    /// The decoded body, if any.
    fn body(&self) -> Option<&Payload>;
}

impl dyn AuthorizationInput + '_ {
    /// The decoded body, if it is a `T`.
    #[must_use]
    pub fn body_as<T: Any>(&self) -> Option<&T> {
        self.body().and_then(Payload::downcast_ref)
    }
}

impl dyn ValidationInput + '_ {
    /// The decoded body, if it is a `T`.
    #[must_use]
    pub fn body_as<T: Any>(&self) -> Option<&T> {
        self.body().and_then(Payload::downcast_ref)
    }
}

impl AuthenticationInput for RequestContext {
    fn headers(&self) -> &HeaderMap {
        Self::headers(self)
    }

    fn path(&self) -> &str {
        Self::path(self)
    }

    fn context(&self) -> &ExecutionContext {
        Self::context(self)
    }
}

impl AuthorizationInput for RequestContext {
    fn path(&self) -> &str {
        Self::path(self)
    }

    fn context(&self) -> &ExecutionContext {
        Self::context(self)
    }

    fn body(&self) -> Option<&Payload> {
        self.payload()
    }
}

impl ValidationInput for RequestContext {
    fn body(&self) -> Option<&Payload> {
        self.payload()
    }
}
