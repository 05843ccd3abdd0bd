//! Pluggable request body decoding.
//!
//! A [`BodyDecoder`] turns the raw request bytes into a type-erased
//! [`Payload`] before any pipeline stage runs. Stages and handlers then read
//! it back with a typed downcast. The default decoder, [`NoBody`], never
//! produces a payload.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::HeaderMap;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// A decoded request body of some concrete type.
pub struct Payload(Box<dyn Any + Send + Sync>);

impl Payload {
    /// Wraps a decoded value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Box::new(value))
    }

    /// Borrows the value if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// True if the value is a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload").finish_non_exhaustive()
    }
}

/// Errors raised while decoding a request body.
#[derive(Debug, Error)]
pub enum BodyError {
    /// The body is not valid JSON for the expected type.
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    /// The request declares a content type the decoder does not accept.
    #[error("unsupported content type `{0}`")]
    UnsupportedContentType(String),
}

/// Decodes raw request bytes into a [`Payload`].
///
/// `Ok(None)` means the request carries no body worth decoding.
pub trait BodyDecoder: Send + Sync + 'static {
    /// Decodes the body.
    ///
    /// # Errors
    ///
    /// Returns a [`BodyError`] if the bytes cannot be decoded. The request
    /// is then rejected with 400 before any stage runs.
    fn decode(&self, headers: &HeaderMap, body: &Bytes) -> Result<Option<Payload>, BodyError>;
}

/// Decoder that ignores the body entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBody;

impl BodyDecoder for NoBody {
    fn decode(&self, _headers: &HeaderMap, _body: &Bytes) -> Result<Option<Payload>, BodyError> {
        Ok(None)
    }
}

/// Decoder that deserializes JSON into `T`.
///
/// Empty bodies decode to no payload. A `Content-Type` header, if present,
/// must name a JSON media type.
///
/// ```
/// use bytes::Bytes;
/// use ergon_core::{BodyDecoder, JsonBody};
/// use http::HeaderMap;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Widget {
///     name: String,
/// }
///
/// let payload = JsonBody::<Widget>::new()
///     .decode(&HeaderMap::new(), &Bytes::from_static(br#"{"name":"gear"}"#))
///     .unwrap()
///     .unwrap();
/// assert_eq!(payload.downcast_ref::<Widget>().unwrap().name, "gear");
/// ```
pub struct JsonBody<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonBody<T> {
    /// Creates a JSON decoder for `T`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonBody<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonBody<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonBody")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> BodyDecoder for JsonBody<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    fn decode(&self, headers: &HeaderMap, body: &Bytes) -> Result<Option<Payload>, BodyError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        if let Some(content_type) = headers.get(CONTENT_TYPE) {
            let value = content_type.to_str().unwrap_or_default();
            if !value.to_ascii_lowercase().contains("json") {
                return Err(BodyError::UnsupportedContentType(value.to_string()));
            }
        }
        let value: T = serde_json::from_slice(body)?;
        Ok(Some(Payload::new(value)))
    }
}
