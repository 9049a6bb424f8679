use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;

use blocs_backend::config::AppState;
use blocs_backend::handlers;
use blocs_backend::middleware::auth::auth_middleware;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blocs_backend=info,tower_http=info".into()),
        )
        .with_target(false)
        .compact()
        .init();

    // If configuration is broken the process should not come up at all.
    let app_state = AppState::new()
        .await
        .expect("failed to initialise application state");

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("failed to run database migrations");
    tracing::info!("database migrations applied");

    let bloc_routes = Router::new()
        .route("/", post(handlers::blocs::create_bloc))
        .route("/lookup", post(handlers::blocs::lookup_blocs))
        .route("/move", put(handlers::blocs::move_blocs))
        .route("/batch/name", put(handlers::blocs::batch_name))
        .route("/batch/dimensions", put(handlers::blocs::batch_dimensions))
        .route("/batch/tags", put(handlers::blocs::batch_tags))
        .route("/batch/picture", put(handlers::blocs::batch_picture))
        .route("/batch/parent", put(handlers::blocs::change_parents_batch))
        .route(
            "/{id}",
            get(handlers::blocs::get_bloc)
                .put(handlers::blocs::update_bloc)
                .delete(handlers::blocs::delete_bloc),
        )
        .route("/{id}/move", put(handlers::blocs::move_bloc))
        .route("/{id}/parent", put(handlers::blocs::change_parent))
        .route("/{id}/warehouse", put(handlers::blocs::change_warehouse))
        .route("/{id}/picture", put(handlers::blocs::upload_picture))
        .route("/{id}/notes", get(handlers::notes::list_notes));

    let warehouse_routes = Router::new()
        .route(
            "/",
            post(handlers::warehouses::create_warehouse)
                .get(handlers::warehouses::list_warehouses),
        )
        .route("/join", post(handlers::warehouses::join_warehouse))
        .route(
            "/{id}",
            get(handlers::warehouses::get_warehouse)
                .put(handlers::warehouses::update_warehouse)
                .delete(handlers::warehouses::delete_warehouse),
        )
        .route("/{id}/invite", post(handlers::warehouses::issue_invite))
        .route("/{id}/blocs", get(handlers::blocs::warehouse_roots))
        .route("/{id}/blocs/search", get(handlers::blocs::search_blocs))
        .route("/{id}/tags", get(handlers::tags::list_tags));

    let tag_routes = Router::new()
        .route("/", post(handlers::tags::create_tag))
        .route(
            "/{id}",
            put(handlers::tags::update_tag).delete(handlers::tags::delete_tag),
        );

    let note_routes = Router::new()
        .route("/", post(handlers::notes::create_note))
        .route("/{id}", axum::routing::delete(handlers::notes::delete_note));

    // Everything under /api is bearer-token protected except the health probe,
    // which is registered after the auth layer.
    let app = Router::new()
        .nest("/api/bloc", bloc_routes)
        .nest("/api/warehouse", warehouse_routes)
        .nest("/api/tag", tag_routes)
        .nest("/api/note", note_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ))
        .route("/api/health", get(|| async { "OK" }))
        .with_state(app_state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&addr)
        .await
        .expect("failed to bind TCP listener");
    tracing::info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.expect("server error");
}
