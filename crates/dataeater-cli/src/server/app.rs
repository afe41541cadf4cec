//! Axum application setup.

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::cors::{Any, CorsLayer};

use super::handlers;
use super::state::AppState;

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration for local development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Dataset
        .route("/dataset", get(handlers::get_dataset))
        .route("/preview", get(handlers::get_preview))
        .route("/health", get(handlers::get_health))
        .route("/history", get(handlers::get_history))
        .route("/status", get(handlers::get_status))
        .route("/columns/selection", delete(handlers::clear_selection))
        .route("/columns/:name/select", post(handlers::select_column))
        // Mutations and queries
        .route("/mutations", post(handlers::post_mutation))
        .route("/query", post(handlers::post_query))
        .route("/cancel", post(handlers::post_cancel))
        // View state
        .route("/view", delete(handlers::clear_view))
        .route("/view/rules", put(handlers::put_rules))
        .route("/view/search", put(handlers::put_search))
        .route("/view/sort/:column", post(handlers::post_sort))
        // Favorites
        .route(
            "/favorites",
            get(handlers::list_favorites).post(handlers::create_favorite),
        )
        .route("/favorites/:id", delete(handlers::delete_favorite))
        .route("/favorites/:id/apply", post(handlers::apply_favorite));

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(state)
}

/// Start the web server.
pub async fn run_server(state: AppState, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));

    tracing::info!(%addr, "server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
