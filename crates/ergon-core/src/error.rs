//! Error types for Ergon.
//!
//! Two families live here:
//!
//! - [`Rejection`]: a request stopped before its business handler ran,
//!   either by a pipeline stage or because its body failed to decode. It
//!   renders as the standard JSON [`ErrorEnvelope`].
//! - [`EntityError`]: an entity definition that cannot be turned into
//!   routes. These surface when routes are built, never per request.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::body::BodyError;
use crate::pipeline::Stage;

/// Why a request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    /// The authenticator said no.
    Unauthenticated,
    /// The authorizer said no.
    Forbidden,
    /// The validator said no.
    InvalidInput,
    /// The body decoder failed.
    InvalidBody,
}

impl RejectionKind {
    /// The HTTP status sent for this rejection.
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::InvalidInput | Self::InvalidBody => StatusCode::BAD_REQUEST,
        }
    }

    /// Machine-readable code used in the error envelope.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Forbidden => "FORBIDDEN",
            Self::InvalidInput => "INVALID_INPUT",
            Self::InvalidBody => "INVALID_BODY",
        }
    }
}

/// A request that never reached its business handler.
///
/// ```
/// use ergon_core::{Rejection, Stage};
/// use http::StatusCode;
///
/// let rejection = Rejection::from_stage(Stage::Authorize);
/// assert_eq!(rejection.status(), StatusCode::FORBIDDEN);
/// assert_eq!(rejection.stage(), Some(Stage::Authorize));
/// assert_eq!(rejection.to_envelope(None).error.code, "FORBIDDEN");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Rejection {
    kind: RejectionKind,
    stage: Option<Stage>,
    message: String,
}

impl Rejection {
    /// A rejection by a pipeline stage.
    #[must_use]
    pub fn from_stage(stage: Stage) -> Self {
        let (kind, message) = match stage {
            Stage::Authenticate => (RejectionKind::Unauthenticated, "authentication required"),
            Stage::Authorize => (RejectionKind::Forbidden, "access denied"),
            Stage::Validate => (RejectionKind::InvalidInput, "request input is invalid"),
        };
        Self {
            kind,
            stage: Some(stage),
            message: message.to_string(),
        }
    }

    /// A rejection because the body did not decode.
    #[must_use]
    pub fn invalid_body(err: &BodyError) -> Self {
        Self {
            kind: RejectionKind::InvalidBody,
            stage: None,
            message: err.to_string(),
        }
    }

    /// Why the request was rejected.
    #[must_use]
    pub const fn kind(&self) -> RejectionKind {
        self.kind
    }

    /// The stage that rejected the request; `None` for body failures.
    #[must_use]
    pub const fn stage(&self) -> Option<Stage> {
        self.stage
    }

    /// The HTTP status to respond with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.kind.status()
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Converts to the JSON error envelope.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>) -> ErrorEnvelope {
        ErrorEnvelope::new(self.kind.code(), self.message.clone(), request_id)
    }
}

/// Standard JSON error body: `{"error":{"code":…,"message":…}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// The request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorEnvelope {
    /// Creates an envelope.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        request_id: Option<&str>,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
            },
            request_id: request_id.map(ToString::to_string),
        }
    }
}

/// An entity that cannot be expanded into routes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    /// The base path contains route pattern syntax.
    #[error("entity base path `{path}` must not contain `{{`, `}}` or `*`")]
    InvalidBasePath {
        /// The offending base path.
        path: String,
    },

    /// The entity has neither handlers nor children.
    #[error("entity at `{path}` has no operations and no children")]
    NoOperations {
        /// Full collection path of the entity.
        path: String,
    },
}
