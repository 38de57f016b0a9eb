//! `nosqldb` Server - HTTP front-end for the `nosqldb` document store.

use axum::{
    routing::{get, patch, post},
    Router,
};
use clap::Parser;
use nosqldb_core::Database;
use nosqldb_server::{
    create_collection, delete_objects, health_check, list_collections, query_objects,
    update_object, write_object, ApiDoc, AppState,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// `nosqldb` Server - a small append-only JSON document store.
#[derive(Parser, Debug)]
#[command(name = "nosqldb-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding one subdirectory per collection.
    #[arg(short, long, default_value = "./nosqldbData", env = "NOSQLDB_DATA_DIR")]
    data_dir: String,

    /// Host address to bind to.
    #[arg(long, default_value = "127.0.0.1", env = "NOSQLDB_HOST")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = 9999, env = "NOSQLDB_PORT")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    tracing::info!(data_dir = %args.data_dir, "starting nosqldb server");

    let db = Database::open(&args.data_dir)?;
    let state = Arc::new(AppState { db });

    let api_router = Router::new()
        .route("/health", get(health_check))
        .route(
            "/collections",
            get(list_collections).post(create_collection),
        )
        .route("/collections/{name}/objects", post(write_object))
        .route("/collections/{name}/query", post(query_objects))
        .route("/collections/{name}/objects/{id}", patch(update_object))
        .route("/collections/{name}/delete", post(delete_objects))
        .with_state(state);

    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi());

    let app = api_router
        .merge(Router::<()>::new().merge(swagger_ui))
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("nosqldb server listening on http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
