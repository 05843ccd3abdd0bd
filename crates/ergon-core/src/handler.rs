//! Pipeline capabilities.
//!
//! Each role is a single-method trait plus a function adapter implementing
//! the same trait, so callers can pass either a stateful object or an inline
//! closure:
//!
//! | Trait | Adapter |
//! |---|---|
//! | [`Authenticator`] | [`AuthenticateFn`] |
//! | [`Authorizer`] | [`AuthorizeFn`] |
//! | [`Validator`] | [`ValidateFn`] |
//! | [`OperationHandler`] | [`HandlerFn`] |
//!
//! All calls are synchronous and expected to return quickly.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;

use crate::context::RequestContext;
use crate::input::{AuthenticationInput, AuthorizationInput, ValidationInput};

/// What a business handler returns: the status and the raw response body.
pub type Reply = (StatusCode, Bytes);

/// Builds a [`Reply`].
///
/// ```
/// use ergon_core::reply;
/// use http::StatusCode;
///
/// let (status, body) = reply(StatusCode::OK, "created");
/// assert_eq!(status, StatusCode::OK);
/// assert_eq!(body.as_ref(), b"created");
/// ```
#[must_use]
pub fn reply(status: StatusCode, body: impl Into<Bytes>) -> Reply {
    (status, body.into())
}

/// Decides whether the caller is who they claim to be.
pub trait Authenticator: Send + Sync + 'static {
    /// Returns true to let the request proceed.
    fn authenticate(&self, input: &dyn AuthenticationInput) -> bool;
}

/// Decides whether the caller may perform the request.
pub trait Authorizer: Send + Sync + 'static {
    /// Returns true to let the request proceed.
    fn authorize(&self, input: &dyn AuthorizationInput) -> bool;
}

/// Decides whether the request input is well formed.
pub trait Validator: Send + Sync + 'static {
    /// Returns true to let the request proceed.
    fn validate(&self, input: &dyn ValidationInput) -> bool;
}

/// Business logic for one operation.
///
/// ```
/// use ergon_core::{reply, OperationHandler, Reply, RequestContext};
/// use http::StatusCode;
///
/// struct Echo;
///
/// impl OperationHandler for Echo {
///     fn handle(&self, ctx: &RequestContext) -> Reply {
///         reply(StatusCode::OK, ctx.path().to_string())
///     }
/// }
///
/// let (status, body) = Echo.handle(&RequestContext::mock());
/// assert_eq!(status, StatusCode::OK);
/// assert_eq!(body.as_ref(), b"/");
/// ```
pub trait OperationHandler: Send + Sync + 'static {
    /// Produces the response status and body.
    fn handle(&self, ctx: &RequestContext) -> Reply;
}

macro_rules! fn_adapter {
    ($(#[$doc:meta])* $name:ident, $trait:ident, $method:ident, $input:ty, $output:ty) => {
        $(#[$doc])*
        pub struct $name<F> {
            func: F,
        }

        impl<F> $name<F>
        where
            F: Fn($input) -> $output + Send + Sync + 'static,
        {
            /// Wraps a function.
            #[must_use]
            pub const fn new(func: F) -> Self {
                Self { func }
            }
        }

        impl<F> $trait for $name<F>
        where
            F: Fn($input) -> $output + Send + Sync + 'static,
        {
            fn $method(&self, input: $input) -> $output {
                (self.func)(input)
            }
        }

        impl<F> fmt::Debug for $name<F> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name)).finish_non_exhaustive()
            }
        }
    };
}

fn_adapter!(
    /// Function form of [`Authenticator`].
    AuthenticateFn,
    Authenticator,
    authenticate,
    &dyn AuthenticationInput,
    bool
);

fn_adapter!(
    /// Function form of [`Authorizer`].
    AuthorizeFn,
    Authorizer,
    authorize,
    &dyn AuthorizationInput,
    bool
);

fn_adapter!(
    /// Function form of [`Validator`].
    ValidateFn,
    Validator,
    validate,
    &dyn ValidationInput,
    bool
);

fn_adapter!(
    /// Function form of [`OperationHandler`].
    ///
    /// ```
    /// use ergon_core::{reply, HandlerFn, OperationHandler, RequestContext};
    /// use http::StatusCode;
    ///
    /// let handler = HandlerFn::new(|_ctx: &RequestContext| reply(StatusCode::CREATED, "ok"));
    /// assert_eq!(handler.handle(&RequestContext::mock()).0, StatusCode::CREATED);
    /// ```
    HandlerFn,
    OperationHandler,
    handle,
    &RequestContext,
    Reply
);

impl<A: Authenticator + ?Sized> Authenticator for Arc<A> {
    fn authenticate(&self, input: &dyn AuthenticationInput) -> bool {
        (**self).authenticate(input)
    }
}

impl<A: Authorizer + ?Sized> Authorizer for Arc<A> {
    fn authorize(&self, input: &dyn AuthorizationInput) -> bool {
        (**self).authorize(input)
    }
}

impl<V: Validator + ?Sized> Validator for Arc<V> {
    fn validate(&self, input: &dyn ValidationInput) -> bool {
        (**self).validate(input)
    }
}

impl<H: OperationHandler + ?Sized> OperationHandler for Arc<H> {
    fn handle(&self, ctx: &RequestContext) -> Reply {
        (**self).handle(ctx)
    }
}
