//! Declarative resource definitions.
//!
//! An [`Entity`] describes one REST resource: its base path, a handler per
//! [`EntityOperation`], the optional pipeline stages, and nested child
//! resources. Configuration is first-wins throughout: once a path, handler,
//! or stage is set, later calls for the same slot are ignored.
//!
//! ```
//! use ergon_core::{reply, AuthenticationInput, Entity, EntityOperation, RequestContext};
//! use http::StatusCode;
//!
//! let orders = Entity::new()
//!     .with_path("/orders")
//!     .handle_operation_fn(EntityOperation::GetList, |_: &RequestContext| {
//!         reply(StatusCode::OK, "[]")
//!     })
//!     .handle_operation_fn(EntityOperation::Create, |_: &RequestContext| {
//!         reply(StatusCode::CREATED, "created")
//!     })
//!     .authenticate_fn(
//!         |input: &dyn AuthenticationInput| input.headers().contains_key("authorization"),
//!         &[EntityOperation::Create],
//!     )
//!     .for_child(Entity::new().with_path("/items").handle_operation_fn(
//!         EntityOperation::Create,
//!         |_: &RequestContext| reply(StatusCode::CREATED, "item"),
//!     ));
//!
//! assert!(orders.requires_authentication(EntityOperation::Create));
//! assert!(!orders.requires_authentication(EntityOperation::GetList));
//! assert_eq!(orders.children().len(), 1);
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::body::BodyDecoder;
use crate::context::RequestContext;
use crate::handler::{
    AuthenticateFn, Authenticator, AuthorizeFn, Authorizer, HandlerFn, OperationHandler, Reply,
    ValidateFn, Validator,
};
use crate::input::{AuthenticationInput, AuthorizationInput, ValidationInput};
use crate::operation::EntityOperation;
use crate::pipeline::{Pipeline, PipelineBuilder};

/// Base path of a freshly created entity.
pub const DEFAULT_BASE_PATH: &str = "/";

/// A REST resource definition.
#[derive(Default)]
pub struct Entity {
    base_path: Option<String>,
    handlers: IndexMap<EntityOperation, Arc<dyn OperationHandler>>,
    authenticator: Option<Arc<dyn Authenticator>>,
    authenticated: IndexSet<EntityOperation>,
    authorizer: Option<Arc<dyn Authorizer>>,
    validator: Option<Arc<dyn Validator>>,
    decoder: Option<Arc<dyn BodyDecoder>>,
    children: Vec<Entity>,
}

impl Entity {
    /// Creates an entity at `/` with nothing configured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base path unless one was already set.
    ///
    /// Setting `/` explicitly leaves the entity at its default, so a later
    /// call can still choose a path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        if self.base_path.is_none() {
            let path = path.into();
            if path != DEFAULT_BASE_PATH {
                self.base_path = Some(path);
            }
        }
        self
    }

    /// Registers the handler for `operation` unless one is already present.
    #[must_use]
    pub fn handle_operation(
        mut self,
        operation: EntityOperation,
        handler: impl OperationHandler,
    ) -> Self {
        self.handlers
            .entry(operation)
            .or_insert_with(|| Arc::new(handler));
        self
    }

    /// Function form of [`handle_operation`](Self::handle_operation).
    #[must_use]
    pub fn handle_operation_fn<F>(self, operation: EntityOperation, func: F) -> Self
    where
        F: Fn(&RequestContext) -> Reply + Send + Sync + 'static,
    {
        self.handle_operation(operation, HandlerFn::new(func))
    }

    /// Installs the authenticator and enforces it for `operations`.
    ///
    /// An empty list means every operation. Only the first authenticator is
    /// kept, but the operations of every call accumulate.
    #[must_use]
    pub fn authenticate(
        mut self,
        authenticator: impl Authenticator,
        operations: &[EntityOperation],
    ) -> Self {
        if self.authenticator.is_none() {
            self.authenticator = Some(Arc::new(authenticator));
        }
        let operations = if operations.is_empty() {
            &EntityOperation::ALL[..]
        } else {
            operations
        };
        self.authenticated.extend(operations.iter().copied());
        self
    }

    /// Function form of [`authenticate`](Self::authenticate).
    #[must_use]
    pub fn authenticate_fn<F>(self, func: F, operations: &[EntityOperation]) -> Self
    where
        F: Fn(&dyn AuthenticationInput) -> bool + Send + Sync + 'static,
    {
        self.authenticate(AuthenticateFn::new(func), operations)
    }

    /// Installs the authorizer for every operation, unless one is present.
    #[must_use]
    pub fn authorize(mut self, authorizer: impl Authorizer) -> Self {
        if self.authorizer.is_none() {
            self.authorizer = Some(Arc::new(authorizer));
        }
        self
    }

    /// Function form of [`authorize`](Self::authorize).
    #[must_use]
    pub fn authorize_fn<F>(self, func: F) -> Self
    where
        F: Fn(&dyn AuthorizationInput) -> bool + Send + Sync + 'static,
    {
        self.authorize(AuthorizeFn::new(func))
    }

    /// Installs the validator for every operation, unless one is present.
    #[must_use]
    pub fn validate(mut self, validator: impl Validator) -> Self {
        if self.validator.is_none() {
            self.validator = Some(Arc::new(validator));
        }
        self
    }

    /// Function form of [`validate`](Self::validate).
    #[must_use]
    pub fn validate_fn<F>(self, func: F) -> Self
    where
        F: Fn(&dyn ValidationInput) -> bool + Send + Sync + 'static,
    {
        self.validate(ValidateFn::new(func))
    }

    /// Sets the body decoder for this entity's routes, unless one is
    /// present. Without one the body is never decoded.
    #[must_use]
    pub fn decode_with(mut self, decoder: impl BodyDecoder) -> Self {
        if self.decoder.is_none() {
            self.decoder = Some(Arc::new(decoder));
        }
        self
    }

    /// Appends a nested resource. Its routes are prefixed with this
    /// entity's collection path; nothing else is inherited.
    #[must_use]
    pub fn for_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Appends several nested resources in order.
    #[must_use]
    pub fn for_children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }

    /// The base path.
    #[must_use]
    pub fn base_path(&self) -> &str {
        self.base_path.as_deref().unwrap_or(DEFAULT_BASE_PATH)
    }

    /// Operations with a handler, in registration order.
    pub fn operations(&self) -> impl Iterator<Item = EntityOperation> + '_ {
        self.handlers.keys().copied()
    }

    /// The handler registered for `operation`.
    #[must_use]
    pub fn handler(&self, operation: EntityOperation) -> Option<&Arc<dyn OperationHandler>> {
        self.handlers.get(&operation)
    }

    /// True if requests for `operation` go through the authenticator.
    #[must_use]
    pub fn requires_authentication(&self, operation: EntityOperation) -> bool {
        self.authenticator.is_some() && self.authenticated.contains(&operation)
    }

    /// Operations listed for authentication, in declaration order.
    #[must_use]
    pub fn authenticated_operations(&self) -> Vec<EntityOperation> {
        EntityOperation::ALL
            .into_iter()
            .filter(|op| self.authenticated.contains(op))
            .collect()
    }

    /// True if an authenticator is installed.
    #[must_use]
    pub const fn has_authenticator(&self) -> bool {
        self.authenticator.is_some()
    }

    /// True if an authorizer is installed.
    #[must_use]
    pub const fn has_authorizer(&self) -> bool {
        self.authorizer.is_some()
    }

    /// True if a validator is installed.
    #[must_use]
    pub const fn has_validator(&self) -> bool {
        self.validator.is_some()
    }

    /// The body decoder, if one is set.
    #[must_use]
    pub const fn decoder(&self) -> Option<&Arc<dyn BodyDecoder>> {
        self.decoder.as_ref()
    }

    /// Child entities in the order they were added.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Compiles the pipeline for `operation`, or `None` without a handler.
    #[must_use]
    pub fn pipeline(&self, operation: EntityOperation) -> Option<Pipeline> {
        let handler = Arc::clone(self.handlers.get(&operation)?);
        let mut builder = PipelineBuilder::new(handler);
        if let Some(authenticator) = &self.authenticator {
            if self.authenticated.contains(&operation) {
                builder = builder.authenticate_shared(Arc::clone(authenticator));
            }
        }
        if let Some(authorizer) = &self.authorizer {
            builder = builder.authorize_shared(Arc::clone(authorizer));
        }
        if let Some(validator) = &self.validator {
            builder = builder.validate_shared(Arc::clone(validator));
        }
        Some(builder.build())
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("base_path", &self.base_path())
            .field("operations", &self.handlers.keys().collect::<Vec<_>>())
            .field("authenticated", &self.authenticated_operations())
            .field("authorizer", &self.has_authorizer())
            .field("validator", &self.has_validator())
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::reply;
    use crate::pipeline::{Outcome, Stage};
    use http::StatusCode;

    fn ok(body: &'static str) -> impl Fn(&RequestContext) -> Reply + Send + Sync + 'static {
        move |_: &RequestContext| reply(StatusCode::OK, body)
    }

    fn body_of(outcome: Outcome) -> String {
        match outcome {
            Outcome::Handled((_, body)) => String::from_utf8(body.to_vec()).unwrap(),
            Outcome::Rejected(r) => panic!("unexpected rejection: {r}"),
        }
    }

    #[test]
    fn test_default_path() {
        assert_eq!(Entity::new().base_path(), "/");
    }

    #[test]
    fn test_with_path_first_wins() {
        let entity = Entity::new().with_path("/widgets").with_path("/gadgets");
        assert_eq!(entity.base_path(), "/widgets");
    }

    #[test]
    fn test_with_default_path_keeps_slot_open() {
        let entity = Entity::new().with_path("/").with_path("/widgets");
        assert_eq!(entity.base_path(), "/widgets");
    }

    #[test]
    fn test_handler_first_wins() {
        let entity = Entity::new()
            .handle_operation_fn(EntityOperation::Create, ok("first"))
            .handle_operation_fn(EntityOperation::Create, ok("second"));

        assert_eq!(entity.operations().collect::<Vec<_>>(), vec![EntityOperation::Create]);
        let pipeline = entity.pipeline(EntityOperation::Create).unwrap();
        assert_eq!(body_of(pipeline.run(&RequestContext::mock())), "first");
    }

    #[test]
    fn test_object_and_fn_handler_share_slot() {
        let entity = Entity::new()
            .handle_operation(EntityOperation::Get, HandlerFn::new(ok("object")))
            .handle_operation_fn(EntityOperation::Get, ok("closure"));
        let pipeline = entity.pipeline(EntityOperation::Get).unwrap();
        assert_eq!(body_of(pipeline.run(&RequestContext::mock())), "object");
    }

    #[test]
    fn test_authentication_defaults_to_all_operations() {
        let entity = Entity::new().authenticate_fn(|_| true, &[]);
        assert_eq!(entity.authenticated_operations(), EntityOperation::ALL.to_vec());
        for op in EntityOperation::ALL {
            assert!(entity.requires_authentication(op));
        }
    }

    #[test]
    fn test_authentication_scoped() {
        let entity = Entity::new()
            .handle_operation_fn(EntityOperation::Create, ok("c"))
            .handle_operation_fn(EntityOperation::GetList, ok("l"))
            .authenticate_fn(|_| false, &[EntityOperation::Create]);

        assert!(entity.requires_authentication(EntityOperation::Create));
        assert!(!entity.requires_authentication(EntityOperation::GetList));

        let create = entity.pipeline(EntityOperation::Create).unwrap();
        assert_eq!(create.stages(), vec![Stage::Authenticate]);
        let list = entity.pipeline(EntityOperation::GetList).unwrap();
        assert!(list.stages().is_empty());
    }

    #[test]
    fn test_authentication_operations_accumulate() {
        let entity = Entity::new()
            .authenticate_fn(|_| true, &[EntityOperation::Delete])
            .authenticate_fn(|_| false, &[EntityOperation::Create]);

        assert_eq!(
            entity.authenticated_operations(),
            vec![EntityOperation::Create, EntityOperation::Delete]
        );
    }

    #[test]
    fn test_first_authenticator_kept() {
        let entity = Entity::new()
            .handle_operation_fn(EntityOperation::Create, ok("c"))
            .authenticate_fn(|_| true, &[])
            .authenticate_fn(|_| false, &[]);
        let pipeline = entity.pipeline(EntityOperation::Create).unwrap();
        assert!(pipeline.run(&RequestContext::mock()).is_handled());
    }

    #[test]
    fn test_authorizer_and_validator_first_wins() {
        let entity = Entity::new()
            .handle_operation_fn(EntityOperation::Update, ok("u"))
            .authorize_fn(|_| true)
            .authorize_fn(|_| false)
            .validate_fn(|_| true)
            .validate_fn(|_| false);

        assert!(entity.has_authorizer());
        assert!(entity.has_validator());
        let pipeline = entity.pipeline(EntityOperation::Update).unwrap();
        assert_eq!(pipeline.stages(), vec![Stage::Authorize, Stage::Validate]);
        assert!(pipeline.run(&RequestContext::mock()).is_handled());
    }

    #[test]
    fn test_no_pipeline_without_handler() {
        let entity = Entity::new().authorize_fn(|_| true);
        assert!(entity.pipeline(EntityOperation::Delete).is_none());
    }

    #[test]
    fn test_children_keep_order_and_config() {
        let entity = Entity::new()
            .with_path("/orders")
            .authorize_fn(|_| false)
            .for_child(Entity::new().with_path("/items"))
            .for_children([
                Entity::new().with_path("/notes"),
                Entity::new().with_path("/tags"),
            ]);

        let paths: Vec<_> = entity.children().iter().map(Entity::base_path).collect();
        assert_eq!(paths, vec!["/items", "/notes", "/tags"]);
        assert!(entity.children().iter().all(|c| !c.has_authorizer()));
    }

    #[test]
    fn test_decoder_first_wins() {
        use crate::body::{JsonBody, NoBody};

        let entity = Entity::new();
        assert!(entity.decoder().is_none());
        let entity = entity.decode_with(JsonBody::<u32>::new()).decode_with(NoBody);
        let decoded = entity
            .decoder()
            .unwrap()
            .decode(&http::HeaderMap::new(), &bytes::Bytes::from_static(b"3"))
            .unwrap();
        assert!(decoded.is_some());
    }
}
