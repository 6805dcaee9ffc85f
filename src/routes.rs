// src/routes.rs

use axum::{
    Json, Router,
    http::{Method, StatusCode},
    middleware,
    routing::{get, post, put},
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, favorite, property},
    state::AppState,
    utils::jwt::{authenticate, authenticate_optional, require_admin, require_owner_role},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, properties, favorites, admin).
/// * Routes declare their required role set via middleware layers;
///   resource-ownership checks live in the handlers.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .merge(
            Router::new()
                .route("/me", get(auth::me))
                .route("/update", put(auth::update_profile))
                .route("/logout", post(auth::logout))
                .layer(middleware::from_fn_with_state(state.clone(), authenticate)),
        );

    // Public reads carry an optional bearer token: owners see their drafts
    // and authenticated callers get favorite flags.
    let property_routes = Router::new()
        .route("/", get(property::list_properties))
        .route("/{id}", get(property::get_property))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authenticate_optional,
        ))
        .merge(
            Router::new()
                .route("/", post(property::create_property))
                .route("/my-properties/all", get(property::my_properties))
                .layer(middleware::from_fn(require_owner_role))
                .layer(middleware::from_fn_with_state(state.clone(), authenticate)),
        )
        .merge(
            Router::new()
                .route(
                    "/{id}",
                    put(property::update_property).delete(property::delete_property),
                )
                .route("/{id}/publish", put(property::publish_property))
                .layer(middleware::from_fn_with_state(state.clone(), authenticate)),
        );

    let favorite_routes = Router::new()
        .route("/", get(favorite::list_favorites))
        .route(
            "/{property_id}",
            post(favorite::add_favorite).delete(favorite::remove_favorite),
        )
        .route("/check/{property_id}", get(favorite::check_favorite))
        .layer(middleware::from_fn_with_state(state.clone(), authenticate));

    let admin_routes = Router::new()
        .route("/metrics", get(admin::get_metrics))
        .route("/users", get(admin::list_users))
        .route("/properties", get(admin::list_properties))
        .route("/properties/{id}/toggle", put(admin::toggle_property))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/properties", property_routes)
        .nest("/api/favorites", favorite_routes)
        .nest("/api/admin", admin_routes)
        .fallback(not_found)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": "Route not found" })),
    )
}
