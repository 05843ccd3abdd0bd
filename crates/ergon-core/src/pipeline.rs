//! Fixed-order request pipeline.
//!
//! Every entity route runs the same sequence:
//!
//! 1. **Authenticate** - only if an authenticator is configured and the
//!    operation is in its allow-list
//! 2. **Authorize** - if an authorizer is configured
//! 3. **Validate** - if a validator is configured
//! 4. **Handle** - the business handler
//!
//! Each gate is a boolean predicate. The first `false` ends the request with
//! a [`Rejection`] and nothing after it runs. The order is fixed by
//! [`Stage`] and does not depend on the order gates were added.

use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::context::RequestContext;
use crate::error::Rejection;
use crate::handler::{Authenticator, Authorizer, OperationHandler, Reply, Validator};

/// A gate of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Stage 1: caller authentication.
    Authenticate = 1,
    /// Stage 2: authorization.
    Authorize = 2,
    /// Stage 3: input validation.
    Validate = 3,
}

impl Stage {
    /// Returns the stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Authenticate => "authenticate",
            Self::Authorize => "authorize",
            Self::Validate => "validate",
        }
    }

    /// Returns all stages in order.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Authenticate, Self::Authorize, Self::Validate]
    }

    /// Status sent when this stage rejects.
    #[must_use]
    pub const fn rejection_status(self) -> StatusCode {
        match self {
            Self::Authenticate => StatusCode::UNAUTHORIZED,
            Self::Authorize => StatusCode::FORBIDDEN,
            Self::Validate => StatusCode::BAD_REQUEST,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone)]
enum Gate {
    Authenticate(Arc<dyn Authenticator>),
    Authorize(Arc<dyn Authorizer>),
    Validate(Arc<dyn Validator>),
}

impl Gate {
    const fn stage(&self) -> Stage {
        match self {
            Self::Authenticate(_) => Stage::Authenticate,
            Self::Authorize(_) => Stage::Authorize,
            Self::Validate(_) => Stage::Validate,
        }
    }

    fn check(&self, ctx: &RequestContext) -> bool {
        match self {
            Self::Authenticate(a) => a.authenticate(ctx),
            Self::Authorize(a) => a.authorize(ctx),
            Self::Validate(v) => v.validate(ctx),
        }
    }
}

/// Result of running a pipeline.
#[derive(Debug)]
pub enum Outcome {
    /// Every gate passed and the handler replied.
    Handled(Reply),
    /// A gate said no; the handler was not called.
    Rejected(Rejection),
}

impl Outcome {
    /// The status the client will see.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Handled((status, _)) => *status,
            Self::Rejected(rejection) => rejection.status(),
        }
    }

    /// True if the handler ran.
    #[must_use]
    pub const fn is_handled(&self) -> bool {
        matches!(self, Self::Handled(_))
    }
}

/// The compiled gates and handler for one route.
///
/// ```
/// use ergon_core::{reply, AuthorizeFn, AuthorizationInput, HandlerFn, Outcome, Pipeline,
///     RequestContext, Stage};
/// use http::StatusCode;
///
/// let pipeline = Pipeline::builder(HandlerFn::new(|_: &RequestContext| {
///     reply(StatusCode::OK, "created")
/// }))
/// .authorize(AuthorizeFn::new(|_: &dyn AuthorizationInput| false))
/// .build();
///
/// assert_eq!(pipeline.stages(), vec![Stage::Authorize]);
/// match pipeline.run(&RequestContext::mock()) {
///     Outcome::Rejected(r) => assert_eq!(r.status(), StatusCode::FORBIDDEN),
///     Outcome::Handled(_) => unreachable!(),
/// }
/// ```
#[derive(Clone)]
pub struct Pipeline {
    gates: Vec<Gate>,
    handler: Arc<dyn OperationHandler>,
}

impl Pipeline {
    /// Starts a pipeline around `handler`.
    pub fn builder(handler: impl OperationHandler) -> PipelineBuilder {
        PipelineBuilder::new(Arc::new(handler))
    }

    /// Runs the gates in order, then the handler.
    pub fn run(&self, ctx: &RequestContext) -> Outcome {
        for gate in &self.gates {
            if !gate.check(ctx) {
                let stage = gate.stage();
                tracing::debug!(
                    request_id = %ctx.context().request_id(),
                    method = %ctx.method(),
                    path = ctx.path(),
                    stage = stage.name(),
                    "request rejected"
                );
                return Outcome::Rejected(Rejection::from_stage(stage));
            }
        }
        Outcome::Handled(self.handler.handle(ctx))
    }

    /// The gates this pipeline runs, in order.
    #[must_use]
    pub fn stages(&self) -> Vec<Stage> {
        self.gates.iter().map(Gate::stage).collect()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Pipeline`].
///
/// Each stage can be set once; a second call for the same stage is ignored.
pub struct PipelineBuilder {
    authenticator: Option<Arc<dyn Authenticator>>,
    authorizer: Option<Arc<dyn Authorizer>>,
    validator: Option<Arc<dyn Validator>>,
    handler: Arc<dyn OperationHandler>,
}

impl PipelineBuilder {
    /// Creates a builder from a shared handler.
    #[must_use]
    pub fn new(handler: Arc<dyn OperationHandler>) -> Self {
        Self {
            authenticator: None,
            authorizer: None,
            validator: None,
            handler,
        }
    }

    /// Adds the authentication gate.
    #[must_use]
    pub fn authenticate(self, authenticator: impl Authenticator) -> Self {
        self.authenticate_shared(Arc::new(authenticator))
    }

    /// Adds the authorization gate.
    #[must_use]
    pub fn authorize(self, authorizer: impl Authorizer) -> Self {
        self.authorize_shared(Arc::new(authorizer))
    }

    /// Adds the validation gate.
    #[must_use]
    pub fn validate(self, validator: impl Validator) -> Self {
        self.validate_shared(Arc::new(validator))
    }

    /// Adds an already shared authentication gate.
    #[must_use]
    pub fn authenticate_shared(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator.get_or_insert(authenticator);
        self
    }

    /// Adds an already shared authorization gate.
    #[must_use]
    pub fn authorize_shared(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer.get_or_insert(authorizer);
        self
    }

    /// Adds an already shared validation gate.
    #[must_use]
    pub fn validate_shared(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator.get_or_insert(validator);
        self
    }

    /// Builds the pipeline with gates in [`Stage`] order.
    #[must_use]
    pub fn build(self) -> Pipeline {
        let gates = [
            self.authenticator.map(Gate::Authenticate),
            self.authorizer.map(Gate::Authorize),
            self.validator.map(Gate::Validate),
        ]
        .into_iter()
        .flatten()
        .collect();

        Pipeline {
            gates,
            handler: self.handler,
        }
    }
}

impl fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("authenticator", &self.authenticator.is_some())
            .field("authorizer", &self.authorizer.is_some())
            .field("validator", &self.validator.is_some())
            .finish_non_exhaustive()
    }
}
