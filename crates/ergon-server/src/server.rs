//! HTTP server.
//!
//! Accepts HTTP/1.1 connections with Hyper, reads each body up to
//! `max_body_bytes` and dispatches it through [`Routes`] on the blocking
//! pool, since stages and handlers are synchronous. Both steps run under
//! the configured request timeout.
//!
//! # Example
//!
//! ```rust,no_run
//! use ergon_core::{reply, Entity, EntityOperation, RequestContext};
//! use ergon_server::{Routes, Server};
//! use http::StatusCode;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let routes = Routes::new().entity(
//!         Entity::new()
//!             .with_path("/widgets")
//!             .handle_operation_fn(EntityOperation::Create, |_: &RequestContext| {
//!                 reply(StatusCode::OK, "created")
//!             }),
//!     )?;
//!
//!     Server::builder()
//!         .http_addr("127.0.0.1:8081")
//!         .routes(routes)
//!         .build()
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use ergon_core::ExecutionContext;
use http::{Request, StatusCode};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};

use crate::config::{ServerConfig, ServerConfigBuilder};
use crate::error::ServerError;
use crate::response::{self, HttpResponse};
use crate::routes::Routes;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// The Ergon HTTP server.
pub struct Server {
    config: ServerConfig,
    routes: Arc<Routes>,
}

impl Server {
    /// Creates a server for `routes`.
    #[must_use]
    pub fn new(config: ServerConfig, routes: Routes) -> Self {
        Self {
            config,
            routes: Arc::new(routes),
        }
    }

    /// Creates a server builder.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the route table.
    #[must_use]
    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    /// Runs until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Fails if the configured address is invalid or cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Binds the configured address and runs until `shutdown` triggers.
    ///
    /// # Errors
    ///
    /// Fails if the configured address is invalid or cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = bind_addr(&self.config)?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// triggers, then waits up to the shutdown timeout for open
    /// connections to finish.
    ///
    /// # Errors
    ///
    /// Fails if the listener's local address cannot be read.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(
            addr = %local_addr,
            routes = self.routes.route_count(),
            "server listening"
        );
        for route in self.routes.describe() {
            tracing::debug!(route = %route, "route");
        }

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let server = Arc::clone(&server);
                            let token = tracker.acquire();
                            let shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                if let Err(e) = server.handle_connection(stream, shutdown).await {
                                    tracing::error!(
                                        remote_addr = %remote_addr,
                                        error = %e,
                                        "connection error"
                                    );
                                }
                                drop(token);
                            });
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to accept connection");
                        }
                    }
                }

                () = shutdown.wait() => {
                    tracing::info!("shutdown signal received, stopping server");
                    break;
                }
            }
        }

        let shutdown_timeout = server.config.shutdown_timeout();
        tracing::info!(
            timeout = ?shutdown_timeout,
            active = tracker.active_connections(),
            "waiting for connections to close"
        );

        tokio::select! {
            () = tracker.wait_idle() => {
                tracing::info!("all connections closed");
            }
            () = tokio::time::sleep(shutdown_timeout) => {
                tracing::warn!(
                    active = tracker.active_connections(),
                    "shutdown timeout reached"
                );
            }
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: &Arc<Self>,
        stream: TcpStream,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(self);

        let service = service_fn(move |req: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { server.handle_request(req).await }
        });

        let conn = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.wait() => {
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    async fn handle_request(
        self: &Arc<Self>,
        req: Request<Incoming>,
    ) -> Result<HttpResponse, Infallible> {
        let timeout = self.config.request_timeout();
        let context = ExecutionContext::from_headers(req.headers()).with_timeout(timeout);
        let request_id = context.request_id().to_string();

        let mut response = match self.read_body(req, timeout).await {
            Ok(request) => self.dispatch(request, context, timeout).await,
            Err(response) => response,
        };
        response::set_request_id(&mut response, &request_id);
        Ok(response)
    }

    async fn read_body(
        &self,
        req: Request<Incoming>,
        timeout: Duration,
    ) -> Result<Request<Bytes>, HttpResponse> {
        let (parts, body) = req.into_parts();
        let limited = Limited::new(body, self.config.max_body_bytes());

        match tokio::time::timeout(timeout, limited.collect()).await {
            Ok(Ok(collected)) => Ok(Request::from_parts(parts, collected.to_bytes())),
            Ok(Err(e)) if e.downcast_ref::<LengthLimitError>().is_some() => {
                tracing::debug!(limit = self.config.max_body_bytes(), "request body too large");
                Err(response::json_error(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "PAYLOAD_TOO_LARGE",
                    "request body exceeds the configured limit",
                    None,
                ))
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "failed to read request body");
                Err(response::json_error(
                    StatusCode::BAD_REQUEST,
                    "BODY_READ_ERROR",
                    &format!("failed to read request body: {e}"),
                    None,
                ))
            }
            Err(_) => {
                tracing::warn!(path = parts.uri.path(), "request body read timed out");
                Err(response::json_error(
                    StatusCode::REQUEST_TIMEOUT,
                    "REQUEST_TIMEOUT",
                    "request body read timed out",
                    None,
                ))
            }
        }
    }

    async fn dispatch(
        &self,
        request: Request<Bytes>,
        context: ExecutionContext,
        timeout: Duration,
    ) -> HttpResponse {
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let routes = Arc::clone(&self.routes);
        let task = tokio::task::spawn_blocking(move || routes.dispatch_with(request, context));

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::error!(method = %method, path = %path, error = %e, "handler panicked");
                response::json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "handler failed",
                    None,
                )
            }
            Err(_) => {
                tracing::warn!(method = %method, path = %path, "handler timed out");
                response::json_error(
                    StatusCode::GATEWAY_TIMEOUT,
                    "HANDLER_TIMEOUT",
                    "handler execution timed out",
                    None,
                )
            }
        }
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("routes", &self.routes)
            .finish()
    }
}

/// Builder for [`Server`].
///
/// ```rust
/// use ergon_server::ServerBuilder;
/// use std::time::Duration;
///
/// let server = ServerBuilder::new()
///     .http_addr("0.0.0.0:9090")
///     .shutdown_timeout(Duration::from_secs(60))
///     .request_timeout(Duration::from_secs(10))
///     .build();
/// assert_eq!(server.config().http_addr(), "0.0.0.0:9090");
/// assert_eq!(server.routes().route_count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct ServerBuilder {
    config_builder: ServerConfigBuilder,
    routes: Option<Routes>,
}

impl ServerBuilder {
    /// Creates a builder with default settings and no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the route table.
    #[must_use]
    pub fn routes(mut self, routes: Routes) -> Self {
        self.routes = Some(routes);
        self
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn config(mut self, config: &ServerConfig) -> Self {
        self.config_builder = ServerConfigBuilder::new()
            .http_addr(config.http_addr())
            .shutdown_timeout(config.shutdown_timeout())
            .request_timeout(config.request_timeout())
            .max_body_bytes(config.max_body_bytes());
        self
    }

    /// Sets the HTTP bind address.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.http_addr(addr);
        self
    }

    /// Sets the graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config_builder = self.config_builder.shutdown_timeout(timeout);
        self
    }

    /// Sets the request timeout, applied to body reading and dispatch.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config_builder = self.config_builder.request_timeout(timeout);
        self
    }

    /// Sets the request body limit.
    #[must_use]
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.config_builder = self.config_builder.max_body_bytes(limit);
        self
    }

    /// Builds the server.
    #[must_use]
    pub fn build(self) -> Server {
        Server::new(self.config_builder.build(), self.routes.unwrap_or_default())
    }
}

/// Returns the address a server built from `config` would bind.
///
/// # Errors
///
/// Fails if the address does not parse.
pub fn bind_addr(config: &ServerConfig) -> Result<SocketAddr, ServerError> {
    config
        .socket_addr()
        .map_err(|source| ServerError::InvalidAddress {
            addr: config.http_addr().to_string(),
            source,
        })
}
