//! # Ergon Core
//!
//! Entity model and request pipeline for the Ergon REST layer.
//!
//! An [`Entity`] declares a RESTful resource once: a base path, a handler
//! per [`EntityOperation`], and optional authentication, authorization, and
//! validation stages. `ergon-server` expands it into one route per
//! operation and runs each request through the compiled [`Pipeline`]:
//!
//! ```text
//! Authenticate -> Authorize -> Validate -> Handle
//! ```
//!
//! The first stage that returns `false` ends the request with a
//! [`Rejection`]; later stages and the handler never run.
//!
//! - [`EntityOperation`] - the five operations, their methods and paths
//! - [`RequestContext`] - read-only view of one request
//! - [`AuthenticationInput`], [`AuthorizationInput`], [`ValidationInput`] -
//!   the narrowed views each stage receives
//! - [`Authenticator`], [`Authorizer`], [`Validator`], [`OperationHandler`] -
//!   the pluggable capabilities, each with a function adapter
//! - [`BodyDecoder`] - pluggable body decoding
//!
//! # Example
//!
//! ```
//! use ergon_core::{reply, AuthorizationInput, Entity, EntityOperation, Outcome, RequestContext};
//! use http::StatusCode;
//!
//! let widgets = Entity::new()
//!     .with_path("/widgets")
//!     .handle_operation_fn(EntityOperation::Create, |_: &RequestContext| {
//!         reply(StatusCode::OK, "created")
//!     })
//!     .authorize_fn(|input: &dyn AuthorizationInput| input.path().starts_with("/widgets"));
//!
//! let pipeline = widgets.pipeline(EntityOperation::Create).unwrap();
//! let ctx = RequestContext::new(http::Method::POST, "/widgets");
//! match pipeline.run(&ctx) {
//!     Outcome::Handled((status, body)) => {
//!         assert_eq!(status, StatusCode::OK);
//!         assert_eq!(body.as_ref(), b"created");
//!     }
//!     Outcome::Rejected(r) => panic!("rejected: {r}"),
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/ergon-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod body;
mod context;
mod entity;
mod error;
mod handler;
mod input;
mod operation;
mod pipeline;

pub use body::{BodyDecoder, BodyError, JsonBody, NoBody, Payload};
pub use context::{ExecutionContext, RequestContext, RequestId, REQUEST_ID_HEADER};
pub use entity::{Entity, DEFAULT_BASE_PATH};
pub use error::{EntityError, ErrorDetail, ErrorEnvelope, Rejection, RejectionKind};
pub use handler::{
    reply, AuthenticateFn, Authenticator, AuthorizeFn, Authorizer, HandlerFn, OperationHandler,
    Reply, ValidateFn, Validator,
};
pub use input::{AuthenticationInput, AuthorizationInput, ValidationInput};
pub use operation::{join_path, EntityOperation, ParseOperationError, ID_PARAM, ID_PATTERN};
pub use pipeline::{Outcome, Pipeline, PipelineBuilder, Stage};
