//! # Ergon
//!
//! **Entity-oriented REST routing**
//!
//! An [`Entity`](prelude::Entity) is a resource at a base path with up to
//! five handlers (create, update, delete, get, get-list). Ergon expands each
//! entity, and its children, into HTTP routes and runs every request
//! through a fixed chain:
//!
//! ```text
//! Request → Authenticate → Authorize → Validate → Handler
//!               │              │           │
//!               ▼              ▼           ▼
//!              401            403         400
//! ```
//!
//! Any stage returning `false` ends the request; later stages and the
//! handler never run.
//!
//! | Operation | Method | Path |
//! |-----------|--------|------|
//! | Create | POST | `{base}` |
//! | Update | PUT | `{base}/{id}` |
//! | Delete | DELETE | `{base}/{id}` |
//! | Get | GET | `{base}/{id}` |
//! | GetList | GET | `{base}` |
//!
//! Item ids must be decimal digits; `/widgets/abc` matches nothing.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ergon::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let widgets = Entity::new()
//!         .with_path("/widgets")
//!         .handle_operation_fn(EntityOperation::Create, |_: &RequestContext| {
//!             reply(StatusCode::OK, "created")
//!         })
//!         .authenticate_fn(
//!             |input: &dyn AuthenticationInput| input.headers().contains_key("authorization"),
//!             &[EntityOperation::Create],
//!         );
//!
//!     Server::builder()
//!         .http_addr("0.0.0.0:8080")
//!         .routes(Routes::new().entity(widgets)?)
//!         .build()
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/ergon/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Entity model, stage traits and the request pipeline.
pub use ergon_core as core;

/// Path router.
pub use ergon_router as router;

/// HTTP server and route table.
pub use ergon_server as server;

/// Logging setup.
pub use ergon_telemetry as telemetry;

/// Everything needed to declare entities and serve them.
///
/// ```rust
/// use ergon::prelude::*;
///
/// let routes = Routes::new()
///     .entity(Entity::new().with_path("/orders").handle_operation_fn(
///         EntityOperation::GetList,
///         |_: &RequestContext| reply(StatusCode::OK, "[]"),
///     ))
///     .unwrap();
/// assert_eq!(routes.route_count(), 1);
/// ```
pub mod prelude {
    pub use ergon_core::{
        reply, AuthenticateFn, AuthenticationInput, Authenticator, AuthorizationInput,
        AuthorizeFn, Authorizer, BodyDecoder, Entity, EntityError, EntityOperation,
        ExecutionContext, HandlerFn, JsonBody, OperationHandler, Payload, Rejection, Reply,
        RequestContext, Stage, ValidateFn, ValidationInput, Validator,
    };

    pub use ergon_server::{
        HttpResponse, PlainRoute, Routes, RoutesError, Server, ServerConfig, ServerError,
        ShutdownSignal,
    };

    pub use ergon_telemetry::{init_logging, LogConfig};

    pub use http::{Method, StatusCode};
}
