//! A small service mixing plain routes and an entity.
//!
//! ```text
//! cargo run -p ergon --example entity_server
//!
//! curl -H 'content-type: application/json' localhost:8081/products
//! curl localhost:8081/articles
//! curl -X POST -H 'authorization: Bearer demo' \
//!      -H 'content-type: application/json' -d '{"name":"gear"}' localhost:8081/path
//! curl -X PUT localhost:8081/path/7
//! curl -X POST localhost:8081/path/notes
//! ```

use ergon::prelude::*;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct NewItem {
    name: String,
}

fn products(_: &RequestContext) -> Reply {
    reply(StatusCode::OK, "hello, this is product handler")
}

fn articles(_: &RequestContext) -> Reply {
    reply(StatusCode::OK, "hello, this is articles handler")
}

fn update(ctx: &RequestContext) -> Reply {
    tracing::info!(id = ?ctx.id(), "updating item");
    reply(StatusCode::OK, "entity PUT is handled")
}

fn items() -> Entity {
    Entity::new()
        .with_path("/path")
        .decode_with(JsonBody::<NewItem>::new())
        .handle_operation_fn(EntityOperation::Create, |ctx: &RequestContext| {
            let name = ctx.body::<NewItem>().map_or("", |item| item.name.as_str());
            reply(StatusCode::OK, format!("entity post is handled: {name}"))
        })
        .handle_operation_fn(EntityOperation::Update, update)
        .authenticate_fn(
            |input: &dyn AuthenticationInput| input.headers().contains_key("authorization"),
            &[EntityOperation::Create],
        )
        .authorize_fn(|_: &dyn AuthorizationInput| true)
        .validate_fn(|input: &dyn ValidationInput| {
            input
                .body_as::<NewItem>()
                .map_or(true, |item| !item.name.is_empty())
        })
        .for_child(
            Entity::new()
                .with_path("/notes")
                .handle_operation_fn(EntityOperation::Create, |_: &RequestContext| {
                    reply(StatusCode::CREATED, "note added")
                }),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(&LogConfig::development().with_service_name("entity-server"))?;

    let routes = Routes::new()
        .route(
            PlainRoute::new("/products", HandlerFn::new(products))
                .header("content-type", "application/json"),
        )?
        .handle("/articles", HandlerFn::new(articles))?
        .entity(items())?;

    for route in routes.describe() {
        tracing::info!(route = %route, "registered");
    }

    let config = ServerConfig::builder().http_addr("127.0.0.1:8081").build();
    Server::new(config, routes).run().await?;
    Ok(())
}
