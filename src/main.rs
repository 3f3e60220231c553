use axum::extract::State;
use axum::{
    routing::{get, post},
    Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use catalog_api_rust::state::AppState;
use catalog_api_rust::{config, database, handlers};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, OAUTH_CLIENT_ID, etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();

    tracing_subscriber::fmt::init();
    tracing::info!("Starting Catalog API in {:?} mode", config.environment);

    let pool = database::connect();
    if let Err(e) = database::migrate(&pool).await {
        // The pool is lazy; come up anyway and report degraded on /health.
        tracing::warn!("Migrations not applied: {}", e);
    }

    let app = app(AppState::from_config(pool));

    // Allow tests or deployments to override port via env
    let port = std::env::var("CATALOG_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(8080);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Catalog API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app(state: AppState) -> Router {
    Router::new()
        // Browsing
        .route("/", get(handlers::pages::index))
        .route("/health", get(health))
        .route("/media/:key", get(handlers::pages::media_get))
        // Catalog forms and mutations
        .merge(catalog_routes())
        // Read-only JSON API
        .merge(api_routes())
        // Login / logout
        .merge(auth_routes())
        // Global middleware
        .layer(axum::extract::DefaultBodyLimit::max(
            config::config().media.max_upload_bytes,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn catalog_routes() -> Router<AppState> {
    use catalog_api_rust::handlers::{category, item, pages};

    Router::new()
        .route("/category/:id/items/", get(pages::category_items))
        .route("/category/new/", get(category::new_get).post(category::new_post))
        .route("/category/:id/delete", post(category::delete_post))
        .route("/item/new/", get(item::new_get).post(item::new_post))
        .route("/item/:id/", get(pages::item_show))
        .route("/item/:id/edit/", get(item::edit_get).post(item::edit_post))
        .route("/item/:id/delete", post(item::delete_post))
}

fn api_routes() -> Router<AppState> {
    use catalog_api_rust::handlers::api;

    Router::new()
        .route("/api/all/", get(api::all))
        .route("/api/:id/items/", get(api::category_items))
        .route("/api/:id/item/", get(api::item))
}

fn auth_routes() -> Router<AppState> {
    use catalog_api_rust::handlers::auth;

    Router::new()
        .route("/login/", get(auth::login_get))
        .route("/gconnect", post(auth::gconnect))
        .route("/logout/", get(auth::logout))
}

async fn health(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::health_check(&state.pool).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
