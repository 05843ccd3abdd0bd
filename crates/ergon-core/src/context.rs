//! Per-request context.
//!
//! [`RequestContext`] is the read-only view of one inbound request that
//! flows through the pipeline. It is built once by the server after routing
//! and body decoding, and never changes afterwards.

use std::any::Any;
use std::time::{Duration, Instant};

use bytes::Bytes;
use ergon_router::Params;
use http::{Extensions, HeaderMap, Method};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::body::Payload;
use crate::operation::ID_PARAM;

/// Header carrying an inbound request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// A unique identifier for each request, using UUID v7.
///
/// ```
/// use ergon_core::RequestId;
///
/// let id = RequestId::new();
/// assert_eq!(id.to_string().len(), 36);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new time-ordered request id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Request-scoped metadata: id, deadline, and typed extension values.
///
/// Stages may read the deadline but nothing enforces it at this layer.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    request_id: RequestId,
    deadline: Option<Instant>,
    extensions: Extensions,
}

impl ExecutionContext {
    /// Creates a context with a fresh request id and no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: RequestId::new(),
            deadline: None,
            extensions: Extensions::new(),
        }
    }

    /// Creates a context for an inbound request, reusing its
    /// `x-request-id` header when it holds a valid UUID.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let request_id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok())
            .map_or_else(RequestId::new, RequestId::from);
        Self::new().with_request_id(request_id)
    }

    /// Replaces the request id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Sets an absolute deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets a deadline `timeout` from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Attaches a typed value. A second value of the same type replaces the
    /// first.
    #[must_use]
    pub fn with_extension<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.extensions.insert(value);
        self
    }

    /// The request id.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// The deadline, if one was set.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline; `None` without a deadline.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// True once the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Reads a typed extension value.
    #[must_use]
    pub fn extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only projection of one inbound request.
///
/// ```
/// use bytes::Bytes;
/// use ergon_core::RequestContext;
/// use ergon_router::Params;
/// use http::Method;
///
/// let params: Params = [("id".to_string(), "42".to_string())].into_iter().collect();
/// let ctx = RequestContext::new(Method::PUT, "/widgets/42")
///     .with_params(params)
///     .with_raw_body(Bytes::from_static(b"{}"));
///
/// assert_eq!(ctx.id(), Some(42));
/// assert_eq!(ctx.raw_body().as_ref(), b"{}");
/// assert!(!ctx.has_body());
/// ```
#[derive(Debug)]
pub struct RequestContext {
    method: Method,
    path: String,
    headers: HeaderMap,
    params: Params,
    context: ExecutionContext,
    raw_body: Bytes,
    body: Option<Payload>,
}

impl RequestContext {
    /// Creates a context with no headers, params, or body.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            params: Params::new(),
            context: ExecutionContext::new(),
            raw_body: Bytes::new(),
            body: None,
        }
    }

    /// Creates a `GET /` context for tests.
    #[must_use]
    pub fn mock() -> Self {
        Self::new(Method::GET, "/")
    }

    /// Sets the request headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the captured path parameters.
    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Sets the execution context.
    #[must_use]
    pub fn with_context(mut self, context: ExecutionContext) -> Self {
        self.context = context;
        self
    }

    /// Sets the raw body bytes.
    #[must_use]
    pub fn with_raw_body(mut self, raw_body: Bytes) -> Self {
        self.raw_body = raw_body;
        self
    }

    /// Sets the decoded body.
    #[must_use]
    pub fn with_payload(mut self, body: Option<Payload>) -> Self {
        self.body = body;
        self
    }

    /// The request method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// The request path as received.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// All request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The first value of a header, if it is valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Path parameters captured by the router.
    #[must_use]
    pub const fn params(&self) -> &Params {
        &self.params
    }

    /// The numeric identifier of an item route.
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        self.params.parse(ID_PARAM)
    }

    /// Request-scoped metadata.
    #[must_use]
    pub const fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// The body bytes, undecoded.
    #[must_use]
    pub const fn raw_body(&self) -> &Bytes {
        &self.raw_body
    }

    /// The decoded body, if it is a `T`.
    #[must_use]
    pub fn body<T: Any>(&self) -> Option<&T> {
        self.body.as_ref().and_then(Payload::downcast_ref)
    }

    /// The decoded body, type-erased.
    #[must_use]
    pub const fn payload(&self) -> Option<&Payload> {
        self.body.as_ref()
    }

    /// True if the decoder produced a payload.
    #[must_use]
    pub const fn has_body(&self) -> bool {
        self.body.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_request_id_from_header() {
        let id = Uuid::now_v7();
        let mut headers = HeaderMap::new();
        headers.insert(
            REQUEST_ID_HEADER,
            HeaderValue::from_str(&id.to_string()).unwrap(),
        );
        let ctx = ExecutionContext::from_headers(&headers);
        assert_eq!(ctx.request_id().as_uuid(), &id);
    }

    #[test]
    fn test_request_id_generated_when_invalid() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        let a = ExecutionContext::from_headers(&headers);
        let b = ExecutionContext::from_headers(&headers);
        assert_ne!(a.request_id(), b.request_id());
    }

    #[test]
    fn test_deadline() {
        let ctx = ExecutionContext::new();
        assert!(ctx.deadline().is_none());
        assert!(!ctx.is_expired());

        let past = ExecutionContext::new().with_deadline(Instant::now());
        assert!(past.is_expired());
        assert_eq!(past.remaining(), Some(Duration::ZERO));

        let future = ExecutionContext::new().with_timeout(Duration::from_secs(60));
        assert!(!future.is_expired());
    }

    #[test]
    fn test_extensions() {
        #[derive(Clone, Debug, PartialEq)]
        struct Tenant(&'static str);

        let ctx = ExecutionContext::new().with_extension(Tenant("acme"));
        assert_eq!(ctx.extension::<Tenant>(), Some(&Tenant("acme")));
        assert!(ctx.extension::<u32>().is_none());
    }

    #[test]
    fn test_typed_body() {
        let ctx = RequestContext::mock().with_payload(Some(Payload::new(7_u32)));
        assert!(ctx.has_body());
        assert_eq!(ctx.body::<u32>(), Some(&7));
        assert!(ctx.body::<String>().is_none());
    }

    #[test]
    fn test_id_requires_numeric_param() {
        let params: Params = [("id".to_string(), "abc".to_string())]
            .into_iter()
            .collect();
        let ctx = RequestContext::mock().with_params(params);
        assert_eq!(ctx.id(), None);
        assert_eq!(ctx.params().get("id"), Some("abc"));
    }

    #[test]
    fn test_header_lookup() {
        let mut headers = HeaderMap::new();
        headers.append("accept", HeaderValue::from_static("text/plain"));
        headers.append("accept", HeaderValue::from_static("application/json"));
        let ctx = RequestContext::mock().with_headers(headers);
        assert_eq!(ctx.header("accept"), Some("text/plain"));
        assert_eq!(ctx.headers().get_all("accept").iter().count(), 2);
    }
}
