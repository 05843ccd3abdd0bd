//! The route table.
//!
//! [`Routes`] owns every registration: expanded entities and plain
//! handlers. It is built up front, then shared read-only by the server.
//! Dispatch is synchronous; the server runs it on the blocking pool.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use ergon_core::{
    BodyDecoder, Entity, EntityOperation, ExecutionContext, HandlerFn, OperationHandler, Outcome,
    Pipeline, PipelineBuilder, Rejection, Reply, RequestContext,
};
use ergon_router::{MethodRouter, Router};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request};

use crate::error::RoutesError;
use crate::expand::expand;
use crate::response::{self, HttpResponse};

#[derive(Clone)]
struct Endpoint {
    pipeline: Pipeline,
    decoder: Option<Arc<dyn BodyDecoder>>,
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl Endpoint {
    fn accepts(&self, headers: &HeaderMap) -> bool {
        self.headers
            .iter()
            .all(|(name, value)| headers.get_all(name).iter().any(|v| v == value))
    }
}

/// One registration as reported by [`Routes::describe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    /// The method, or `None` for a route answering any method.
    pub method: Option<Method>,
    /// The route pattern.
    pub pattern: String,
    /// The entity operation behind the route, if any.
    pub operation: Option<EntityOperation>,
}

impl fmt::Display for RouteInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.method {
            Some(method) => write!(f, "{method} {}", self.pattern),
            None => write!(f, "* {}", self.pattern),
        }
    }
}

/// A non-entity route with optional method and header filters.
///
/// ```
/// use ergon_core::{reply, HandlerFn, RequestContext};
/// use ergon_server::{PlainRoute, Routes};
/// use http::{Method, StatusCode};
///
/// let route = PlainRoute::new(
///     "/products",
///     HandlerFn::new(|_: &RequestContext| reply(StatusCode::OK, "products")),
/// )
/// .methods([Method::GET, Method::POST])
/// .header("content-type", "application/json");
///
/// let routes = Routes::new().route(route)?;
/// assert_eq!(routes.route_count(), 2);
/// # Ok::<(), ergon_server::RoutesError>(())
/// ```
pub struct PlainRoute {
    pattern: String,
    handler: Arc<dyn OperationHandler>,
    methods: Vec<Method>,
    headers: Vec<(HeaderName, HeaderValue)>,
    invalid_header: Option<(String, String)>,
    decoder: Option<Arc<dyn BodyDecoder>>,
}

impl PlainRoute {
    /// A route at `pattern` answering any method.
    pub fn new(pattern: impl Into<String>, handler: impl OperationHandler) -> Self {
        Self {
            pattern: pattern.into(),
            handler: Arc::new(handler),
            methods: Vec::new(),
            headers: Vec::new(),
            invalid_header: None,
            decoder: None,
        }
    }

    /// Restricts the route to `methods`.
    #[must_use]
    pub fn methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        for method in methods {
            if !self.methods.contains(&method) {
                self.methods.push(method);
            }
        }
        self
    }

    /// Requires a request header to carry `value`. Requests that fail any
    /// header filter are treated as unrouted.
    ///
    /// Names match case-insensitively. An invalid name or value is reported
    /// by [`Routes::route`].
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => self.headers.push((name, value)),
            _ => {
                if self.invalid_header.is_none() {
                    self.invalid_header = Some((name.to_string(), value.to_string()));
                }
            }
        }
        self
    }

    /// Like [`header`](Self::header) for values built at runtime.
    #[must_use]
    pub fn header_value(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    /// Decodes request bodies with `decoder`.
    #[must_use]
    pub fn decode_with(mut self, decoder: impl BodyDecoder) -> Self {
        self.decoder = Some(Arc::new(decoder));
        self
    }
}

impl fmt::Debug for PlainRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlainRoute")
            .field("pattern", &self.pattern)
            .field("methods", &self.methods)
            .field("headers", &self.headers)
            .field("invalid_header", &self.invalid_header)
            .finish_non_exhaustive()
    }
}

/// The route table.
///
/// ```
/// use bytes::Bytes;
/// use ergon_core::{reply, Entity, EntityOperation, RequestContext};
/// use ergon_server::Routes;
/// use http::{Method, Request, StatusCode};
///
/// let widgets = Entity::new()
///     .with_path("/widgets")
///     .handle_operation_fn(EntityOperation::Create, |_: &RequestContext| {
///         reply(StatusCode::OK, "created")
///     });
///
/// let routes = Routes::new().entity(widgets)?;
///
/// let request = Request::builder()
///     .method(Method::POST)
///     .uri("/widgets")
///     .body(Bytes::new())
///     .unwrap();
/// let response = routes.dispatch(request);
/// assert_eq!(response.status(), StatusCode::OK);
/// # Ok::<(), ergon_server::RoutesError>(())
/// ```
pub struct Routes {
    router: Router<Endpoint>,
    registry: Vec<RouteInfo>,
}

impl Default for Routes {
    fn default() -> Self {
        Self::new()
    }
}

impl Routes {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            registry: Vec::new(),
        }
    }

    /// Expands `entity` and registers one route per operation.
    ///
    /// # Errors
    ///
    /// Fails if the entity does not expand or a route is already taken.
    pub fn entity(mut self, entity: Entity) -> Result<Self, RoutesError> {
        for route in expand(&entity)? {
            let endpoint = Endpoint {
                pipeline: route.pipeline,
                decoder: route.decoder,
                headers: Vec::new(),
            };
            self.router
                .insert(&route.path, MethodRouter::new().method(&route.method, endpoint))?;
            tracing::debug!(
                method = %route.method,
                path = %route.path,
                operation = %route.operation,
                "registered entity route"
            );
            self.registry.push(RouteInfo {
                method: Some(route.method),
                pattern: route.path,
                operation: Some(route.operation),
            });
        }
        Ok(self)
    }

    /// Registers `handler` for a single method.
    ///
    /// # Errors
    ///
    /// Fails if the pattern is invalid or the route is already taken.
    pub fn register(
        self,
        method: Method,
        pattern: &str,
        handler: impl OperationHandler,
    ) -> Result<Self, RoutesError> {
        self.route(PlainRoute::new(pattern, handler).methods([method]))
    }

    /// Function form of [`register`](Self::register).
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register).
    pub fn register_fn<F>(self, method: Method, pattern: &str, func: F) -> Result<Self, RoutesError>
    where
        F: Fn(&RequestContext) -> Reply + Send + Sync + 'static,
    {
        self.register(method, pattern, HandlerFn::new(func))
    }

    /// Registers `handler` for every method at `pattern`.
    ///
    /// # Errors
    ///
    /// Fails if the pattern is invalid or already has an any-method route.
    pub fn handle(
        self,
        pattern: &str,
        handler: impl OperationHandler,
    ) -> Result<Self, RoutesError> {
        self.route(PlainRoute::new(pattern, handler))
    }

    /// Function form of [`handle`](Self::handle).
    ///
    /// # Errors
    ///
    /// Same as [`handle`](Self::handle).
    pub fn handle_fn<F>(self, pattern: &str, func: F) -> Result<Self, RoutesError>
    where
        F: Fn(&RequestContext) -> Reply + Send + Sync + 'static,
    {
        self.handle(pattern, HandlerFn::new(func))
    }

    /// Registers a [`PlainRoute`].
    ///
    /// # Errors
    ///
    /// Fails if the pattern is invalid, a header filter is not a valid
    /// header, or a method is already taken.
    pub fn route(mut self, route: PlainRoute) -> Result<Self, RoutesError> {
        if let Some((name, value)) = route.invalid_header {
            return Err(RoutesError::InvalidHeader {
                pattern: route.pattern,
                name,
                value,
            });
        }

        let endpoint = Endpoint {
            pipeline: PipelineBuilder::new(route.handler).build(),
            decoder: route.decoder,
            headers: route.headers,
        };

        let methods = if route.methods.is_empty() {
            MethodRouter::new().any(endpoint)
        } else {
            route
                .methods
                .iter()
                .fold(MethodRouter::new(), |m, method| m.method(method, endpoint.clone()))
        };
        self.router.insert(&route.pattern, methods)?;

        if route.methods.is_empty() {
            self.registry.push(RouteInfo {
                method: None,
                pattern: route.pattern,
                operation: None,
            });
        } else {
            for method in route.methods {
                self.registry.push(RouteInfo {
                    method: Some(method),
                    pattern: route.pattern.clone(),
                    operation: None,
                });
            }
        }
        Ok(self)
    }

    /// Number of method registrations.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.router.len()
    }

    /// Every registration, in registration order.
    #[must_use]
    pub fn describe(&self) -> &[RouteInfo] {
        &self.registry
    }

    /// Routes and serves one request with a fresh execution context.
    #[must_use]
    pub fn dispatch(&self, request: Request<Bytes>) -> HttpResponse {
        let context = ExecutionContext::from_headers(request.headers());
        self.dispatch_with(request, context)
    }

    /// Routes and serves one request.
    ///
    /// Unknown paths, and requests failing a header filter, get 404. Known
    /// paths without the method get 405 with `Allow`. Header filters are
    /// checked only after a method is selected, so a request that fails the
    /// filter of the matched method gets 404 even when its path answers other
    /// methods. A body the route's decoder rejects gets 400 before any stage
    /// runs. Otherwise the pipeline runs and its reply or rejection is
    /// written.
    #[must_use]
    pub fn dispatch_with(
        &self,
        request: Request<Bytes>,
        context: ExecutionContext,
    ) -> HttpResponse {
        let request_id = context.request_id().to_string();
        let mut response = self.route_request(request, context, &request_id);
        response::set_request_id(&mut response, &request_id);
        response
    }

    fn route_request(
        &self,
        request: Request<Bytes>,
        context: ExecutionContext,
        request_id: &str,
    ) -> HttpResponse {
        let (parts, body) = request.into_parts();
        let path = parts.uri.path().to_string();

        let Some((methods, params)) = self.router.match_path(&path) else {
            tracing::debug!(method = %parts.method, path = %path, "no route");
            return response::not_found(&path, Some(request_id));
        };
        let Some(endpoint) = methods.get_target(&parts.method) else {
            tracing::debug!(method = %parts.method, path = %path, "method not allowed");
            return response::method_not_allowed(
                &parts.method,
                &methods.allowed_methods(),
                Some(request_id),
            );
        };
        if !endpoint.accepts(&parts.headers) {
            tracing::debug!(method = %parts.method, path = %path, "header filter mismatch");
            return response::not_found(&path, Some(request_id));
        }

        let payload = match endpoint
            .decoder
            .as_ref()
            .map(|decoder| decoder.decode(&parts.headers, &body))
            .transpose()
        {
            Ok(payload) => payload.flatten(),
            Err(err) => {
                tracing::debug!(path = %path, error = %err, "body rejected");
                return response::rejection(&Rejection::invalid_body(&err), Some(request_id));
            }
        };

        let ctx = RequestContext::new(parts.method, path)
            .with_headers(parts.headers)
            .with_params(params)
            .with_context(context)
            .with_raw_body(body)
            .with_payload(payload);

        match endpoint.pipeline.run(&ctx) {
            Outcome::Handled(reply) => {
                tracing::debug!(
                    method = %ctx.method(),
                    path = ctx.path(),
                    status = reply.0.as_u16(),
                    "request handled"
                );
                response::from_reply(reply)
            }
            Outcome::Rejected(rejection) => response::rejection(&rejection, Some(request_id)),
        }
    }
}

impl fmt::Debug for Routes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Routes")
            .field("routes", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ergon_core::reply;
    use http::StatusCode;

    fn request(method: Method, uri: &str) -> Request<Bytes> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::new())
            .unwrap()
    }

    #[test]
    fn test_describe_lists_registrations() {
        let routes = Routes::new()
            .entity(
                Entity::new()
                    .with_path("/widgets")
                    .handle_operation_fn(EntityOperation::GetList, |_: &RequestContext| {
                        reply(StatusCode::OK, "")
                    }),
            )
            .unwrap()
            .handle_fn("/health", |_: &RequestContext| reply(StatusCode::OK, "ok"))
            .unwrap();

        let described: Vec<String> = routes.describe().iter().map(ToString::to_string).collect();
        assert_eq!(described, vec!["GET /widgets", "* /health"]);
        assert_eq!(routes.describe()[0].operation, Some(EntityOperation::GetList));
        assert_eq!(routes.route_count(), 2);
    }

    #[test]
    fn test_any_method_route() {
        let routes = Routes::new()
            .handle_fn("/echo", |ctx: &RequestContext| {
                reply(StatusCode::OK, ctx.method().to_string())
            })
            .unwrap();

        for method in [Method::GET, Method::DELETE, Method::PATCH] {
            let response = routes.dispatch(request(method, "/echo"));
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[test]
    fn test_header_filter_requires_all() {
        let routes = Routes::new()
            .route(
                PlainRoute::new(
                    "/products",
                    HandlerFn::new(|_: &RequestContext| reply(StatusCode::OK, "p")),
                )
                .header("content-type", "application/json")
                .header("x-tenant", "acme"),
            )
            .unwrap();

        let mut req = request(Method::GET, "/products");
        req.headers_mut()
            .insert("content-type", HeaderValue::from_static("application/json"));
        assert_eq!(routes.dispatch(req).status(), StatusCode::NOT_FOUND);

        let mut req = request(Method::GET, "/products");
        req.headers_mut()
            .insert("content-type", HeaderValue::from_static("application/json"));
        req.headers_mut()
            .insert("x-tenant", HeaderValue::from_static("acme"));
        assert_eq!(routes.dispatch(req).status(), StatusCode::OK);
    }

    #[test]
    fn test_header_filter_name_any_case() {
        let routes = Routes::new()
            .route(
                PlainRoute::new(
                    "/products",
                    HandlerFn::new(|_: &RequestContext| reply(StatusCode::OK, "p")),
                )
                .header("Content-Type", "application/json"),
            )
            .unwrap();

        let mut req = request(Method::GET, "/products");
        req.headers_mut()
            .insert("content-type", HeaderValue::from_static("application/json"));
        assert_eq!(routes.dispatch(req).status(), StatusCode::OK);

        let req = request(Method::GET, "/products");
        assert_eq!(routes.dispatch(req).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_invalid_header_filter_is_error() {
        let handler = || HandlerFn::new(|_: &RequestContext| reply(StatusCode::OK, ""));

        let err = Routes::new()
            .route(PlainRoute::new("/a", handler()).header("bad header", "x"))
            .unwrap_err();
        assert!(matches!(
            err,
            RoutesError::InvalidHeader { ref pattern, ref name, .. }
                if pattern == "/a" && name == "bad header"
        ));

        let err = Routes::new()
            .route(PlainRoute::new("/b", handler()).header("x-tenant", "line\nbreak"))
            .unwrap_err();
        assert!(matches!(err, RoutesError::InvalidHeader { .. }));
    }

    #[test]
    fn test_header_filter_checked_after_method() {
        let handler = || HandlerFn::new(|_: &RequestContext| reply(StatusCode::OK, ""));
        let routes = Routes::new()
            .route(
                PlainRoute::new("/items", handler())
                    .methods([Method::GET])
                    .header("x-tenant", "acme"),
            )
            .unwrap()
            .route(PlainRoute::new("/items", handler()).methods([Method::POST]))
            .unwrap();

        let response = routes.dispatch(request(Method::GET, "/items"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(http::header::ALLOW).is_none());
        assert_eq!(
            routes.dispatch(request(Method::POST, "/items")).status(),
            StatusCode::OK
        );
    }

    #[test]
    fn test_response_carries_request_id() {
        let routes = Routes::new()
            .register_fn(Method::GET, "/ping", |_: &RequestContext| {
                reply(StatusCode::OK, "pong")
            })
            .unwrap();

        let id = "0190b6a8-7c1e-7a3b-9f00-000000000001";
        let mut req = request(Method::GET, "/ping");
        req.headers_mut()
            .insert("x-request-id", HeaderValue::from_static(id));
        let response = routes.dispatch(req);
        assert_eq!(response.headers().get("x-request-id").unwrap(), id);
    }

    #[test]
    fn test_methods_deduplicated() {
        let routes = Routes::new()
            .route(
                PlainRoute::new(
                    "/a",
                    HandlerFn::new(|_: &RequestContext| reply(StatusCode::OK, "")),
                )
                .methods([Method::GET, Method::GET]),
            )
            .unwrap();
        assert_eq!(routes.route_count(), 1);
    }
}
