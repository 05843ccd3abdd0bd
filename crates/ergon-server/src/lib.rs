//! # Ergon Server
//!
//! HTTP serving for Ergon entities.
//!
//! This crate turns entity trees into routes and serves them:
//!
//! - [`expand`] walks an [`Entity`](ergon_core::Entity) tree into one route per operation
//! - [`Routes`] holds entity routes and plain routes and dispatches requests
//! - [`Server`] runs the table over HTTP/1.1 with graceful shutdown
//!
//! ## Example
//!
//! ```rust
//! use bytes::Bytes;
//! use ergon_core::{reply, Entity, EntityOperation, RequestContext};
//! use ergon_server::Routes;
//! use http::{Method, Request, StatusCode};
//!
//! let widgets = Entity::new()
//!     .with_path("/widgets")
//!     .handle_operation_fn(EntityOperation::Update, |ctx: &RequestContext| {
//!         reply(StatusCode::OK, format!("updated {}", ctx.id().unwrap_or_default()))
//!     });
//! let routes = Routes::new().entity(widgets)?;
//!
//! let put = |uri: &str| {
//!     Request::builder()
//!         .method(Method::PUT)
//!         .uri(uri)
//!         .body(Bytes::new())
//!         .unwrap()
//! };
//! assert_eq!(routes.dispatch(put("/widgets/42")).status(), StatusCode::OK);
//! assert_eq!(routes.dispatch(put("/widgets/abc")).status(), StatusCode::NOT_FOUND);
//! # Ok::<(), ergon_server::RoutesError>(())
//! ```

#![doc(html_root_url = "https://docs.rs/ergon-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod expand;
pub mod response;
mod routes;
mod server;
mod shutdown;

pub use config::{
    ServerConfig, ServerConfigBuilder, DEFAULT_HTTP_ADDR, DEFAULT_MAX_BODY_BYTES,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
pub use error::{RoutesError, ServerError};
pub use expand::{expand, ExpandedRoute};
pub use response::{HttpResponse, ResponseBody};
pub use routes::{PlainRoute, RouteInfo, Routes};
pub use server::{bind_addr, Server, ServerBuilder};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
