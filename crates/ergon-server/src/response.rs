//! Response construction.
//!
//! Handler replies are written verbatim. Everything the framework itself
//! answers (rejections, unknown routes, timeouts) uses the JSON error
//! envelope from [`ErrorEnvelope`].

use bytes::Bytes;
use ergon_core::{ErrorEnvelope, Rejection, Reply, REQUEST_ID_HEADER};
use http::header::{ALLOW, CONTENT_TYPE};
use http::{HeaderValue, Method, Response, StatusCode};
use http_body_util::Full;

/// Body type of every response.
pub type ResponseBody = Full<Bytes>;

/// Response type produced by dispatch.
pub type HttpResponse = Response<ResponseBody>;

/// Writes a handler's status and body with no other headers.
#[must_use]
pub fn from_reply((status, body): Reply) -> HttpResponse {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
}

/// A JSON error envelope response.
#[must_use]
pub fn json_error(
    status: StatusCode,
    code: &str,
    message: &str,
    request_id: Option<&str>,
) -> HttpResponse {
    envelope_response(status, &ErrorEnvelope::new(code, message, request_id))
}

/// The response for a rejected request.
#[must_use]
pub fn rejection(rejection: &Rejection, request_id: Option<&str>) -> HttpResponse {
    envelope_response(rejection.status(), &rejection.to_envelope(request_id))
}

/// 404 for a path no route matches.
#[must_use]
pub fn not_found(path: &str, request_id: Option<&str>) -> HttpResponse {
    json_error(
        StatusCode::NOT_FOUND,
        "NOT_FOUND",
        &format!("no route for {path}"),
        request_id,
    )
}

/// 405 listing the methods the path does answer in `Allow`.
#[must_use]
pub fn method_not_allowed(
    method: &Method,
    allowed: &[Method],
    request_id: Option<&str>,
) -> HttpResponse {
    let mut response = json_error(
        StatusCode::METHOD_NOT_ALLOWED,
        "METHOD_NOT_ALLOWED",
        &format!("method {method} not allowed"),
        request_id,
    );
    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(ALLOW, value);
    }
    response
}

/// Echoes the request id back to the client.
pub fn set_request_id(response: &mut HttpResponse, request_id: &str) {
    if let Ok(value) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
}

fn envelope_response(status: StatusCode, envelope: &ErrorEnvelope) -> HttpResponse {
    let body = serde_json::to_vec(envelope).unwrap_or_else(|_| {
        br#"{"error":{"code":"INTERNAL_ERROR","message":"failed to encode error"}}"#.to_vec()
    });
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use ergon_core::Stage;
    use http_body_util::BodyExt;

    async fn body_json(response: HttpResponse) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_reply_is_verbatim() {
        let response = from_reply((StatusCode::CREATED, Bytes::from_static(b"created")));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().is_empty());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes.as_ref(), b"created");
    }

    #[tokio::test]
    async fn test_rejection_envelope() {
        let response = rejection(&Rejection::from_stage(Stage::Authorize), Some("rid"));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "FORBIDDEN");
        assert_eq!(json["request_id"], "rid");
    }

    #[test]
    fn test_method_not_allowed_sets_allow() {
        let response = method_not_allowed(&Method::PATCH, &[Method::GET, Method::PUT], None);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(ALLOW).unwrap(), "GET, PUT");
    }

    #[tokio::test]
    async fn test_not_found() {
        let response = not_found("/nope", None);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[test]
    fn test_set_request_id() {
        let mut response = from_reply((StatusCode::OK, Bytes::new()));
        set_request_id(&mut response, "abc");
        assert_eq!(response.headers().get(REQUEST_ID_HEADER).unwrap(), "abc");
    }
}
