//! Expansion of an entity tree into concrete routes.
//!
//! The tree is walked pre-order. Each registered operation becomes one
//! route at `(op.http_method(), op.build_path(base_path, prefix))`, and each
//! child is visited with its parent's collection path as prefix. So a child
//! at `/items` under `/orders` gets `POST /orders/items` and
//! `GET /orders/items/{id:[0-9]+}`.

use std::sync::Arc;

use ergon_core::{join_path, BodyDecoder, Entity, EntityError, EntityOperation, Pipeline};
use http::Method;

/// One route produced from an entity.
#[derive(Clone)]
pub struct ExpandedRoute {
    /// HTTP method of the operation.
    pub method: Method,
    /// Route pattern, including the `{id:[0-9]+}` segment for item routes.
    pub path: String,
    /// The operation served.
    pub operation: EntityOperation,
    /// Compiled gates and handler.
    pub pipeline: Pipeline,
    /// Body decoder of the owning entity.
    pub decoder: Option<Arc<dyn BodyDecoder>>,
}

impl std::fmt::Debug for ExpandedRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpandedRoute")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("operation", &self.operation)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

/// Expands `entity` and all of its descendants.
///
/// # Errors
///
/// Returns [`EntityError::InvalidBasePath`] if a base path contains route
/// pattern syntax, and [`EntityError::NoOperations`] for an entity with
/// neither handlers nor children.
///
/// ```
/// use ergon_core::{reply, Entity, EntityOperation, RequestContext};
/// use ergon_server::expand;
/// use http::StatusCode;
///
/// let orders = Entity::new()
///     .with_path("/orders")
///     .handle_operation_fn(EntityOperation::Get, |_: &RequestContext| reply(StatusCode::OK, "order"))
///     .for_child(Entity::new().with_path("/items").handle_operation_fn(
///         EntityOperation::Create,
///         |_: &RequestContext| reply(StatusCode::CREATED, "item"),
///     ));
///
/// let routes: Vec<_> = expand(&orders)?
///     .into_iter()
///     .map(|r| format!("{} {}", r.method, r.path))
///     .collect();
/// assert_eq!(routes, vec!["GET /orders/{id:[0-9]+}", "POST /orders/items"]);
/// # Ok::<(), ergon_core::EntityError>(())
/// ```
pub fn expand(entity: &Entity) -> Result<Vec<ExpandedRoute>, EntityError> {
    let mut routes = Vec::new();
    expand_into(entity, "", &mut routes)?;
    Ok(routes)
}

fn expand_into(
    entity: &Entity,
    prefix: &str,
    routes: &mut Vec<ExpandedRoute>,
) -> Result<(), EntityError> {
    let base_path = entity.base_path();
    if base_path.contains(['{', '}', '*']) {
        return Err(EntityError::InvalidBasePath {
            path: base_path.to_string(),
        });
    }

    let collection = join_path(prefix, base_path);
    if entity.operations().next().is_none() && entity.children().is_empty() {
        return Err(EntityError::NoOperations { path: collection });
    }

    for operation in entity.operations() {
        let Some(pipeline) = entity.pipeline(operation) else {
            continue;
        };
        routes.push(ExpandedRoute {
            method: operation.http_method(),
            path: operation.build_path(base_path, prefix),
            operation,
            pipeline,
            decoder: entity.decoder().cloned(),
        });
    }

    for child in entity.children() {
        expand_into(child, &collection, routes)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ergon_core::{reply, RequestContext, Stage};
    use http::StatusCode;

    fn ok(_: &RequestContext) -> ergon_core::Reply {
        reply(StatusCode::OK, "")
    }

    fn shapes(routes: &[ExpandedRoute]) -> Vec<String> {
        routes
            .iter()
            .map(|r| format!("{} {} {}", r.method, r.path, r.operation))
            .collect()
    }

    #[test]
    fn test_one_route_per_operation() {
        let mut entity = Entity::new().with_path("/widgets");
        for op in EntityOperation::ALL {
            entity = entity.handle_operation_fn(op, ok);
        }

        let routes = expand(&entity).unwrap();
        assert_eq!(
            shapes(&routes),
            vec![
                "POST /widgets create",
                "PUT /widgets/{id:[0-9]+} update",
                "DELETE /widgets/{id:[0-9]+} delete",
                "GET /widgets/{id:[0-9]+} get",
                "GET /widgets get_list",
            ]
        );
    }

    #[test]
    fn test_pre_order_with_prefixes() {
        let tree = Entity::new()
            .with_path("/orders")
            .handle_operation_fn(EntityOperation::Create, ok)
            .for_child(
                Entity::new()
                    .with_path("/items")
                    .handle_operation_fn(EntityOperation::Create, ok)
                    .for_child(
                        Entity::new()
                            .with_path("/notes")
                            .handle_operation_fn(EntityOperation::Get, ok),
                    ),
            )
            .for_child(
                Entity::new()
                    .with_path("/tags")
                    .handle_operation_fn(EntityOperation::GetList, ok),
            );

        assert_eq!(
            shapes(&expand(&tree).unwrap()),
            vec![
                "POST /orders create",
                "POST /orders/items create",
                "GET /orders/items/notes/{id:[0-9]+} get",
                "GET /orders/tags get_list",
            ]
        );
    }

    #[test]
    fn test_children_do_not_inherit_stages() {
        let tree = Entity::new()
            .with_path("/orders")
            .handle_operation_fn(EntityOperation::Create, ok)
            .authorize_fn(|_| false)
            .for_child(
                Entity::new()
                    .with_path("/items")
                    .handle_operation_fn(EntityOperation::Create, ok),
            );

        let routes = expand(&tree).unwrap();
        assert_eq!(routes[0].pipeline.stages(), vec![Stage::Authorize]);
        assert!(routes[1].pipeline.stages().is_empty());
    }

    #[test]
    fn test_grouping_entity_without_handlers() {
        let tree = Entity::new().with_path("/api").for_child(
            Entity::new()
                .with_path("/widgets")
                .handle_operation_fn(EntityOperation::GetList, ok),
        );
        assert_eq!(shapes(&expand(&tree).unwrap()), vec!["GET /api/widgets get_list"]);
    }

    #[test]
    fn test_empty_entity_rejected() {
        let err = expand(&Entity::new().with_path("/empty")).unwrap_err();
        assert_eq!(
            err,
            EntityError::NoOperations {
                path: "/empty".to_string()
            }
        );
    }

    #[test]
    fn test_empty_child_rejected() {
        let tree = Entity::new()
            .with_path("/orders")
            .handle_operation_fn(EntityOperation::Create, ok)
            .for_child(Entity::new().with_path("/items"));
        let err = expand(&tree).unwrap_err();
        assert_eq!(
            err,
            EntityError::NoOperations {
                path: "/orders/items".to_string()
            }
        );
    }

    #[test]
    fn test_pattern_in_base_path_rejected() {
        for path in ["/orders/{id}", "/files/*rest"] {
            let entity = Entity::new()
                .with_path(path)
                .handle_operation_fn(EntityOperation::Create, ok);
            assert!(matches!(
                expand(&entity),
                Err(EntityError::InvalidBasePath { .. })
            ));
        }
    }
}
