pub mod middleware;
pub mod rest;
pub mod state;

pub use middleware::{assign_session, render_errors};
pub use rest::{
    add_favourite_handler, list_favourites_handler, list_images_handler, remove_favourite_handler,
    root_handler,
};

use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use state::AppState;

/// Builds the REST router with session handling, error rendering, CORS and
/// request tracing applied to every route.
pub fn router(app_state: Arc<AppState>) -> Router {
    let cors = cors_layer(&app_state.config.cors_origins);

    Router::new()
        .route("/", get(root_handler))
        .route("/images", get(list_images_handler))
        .route(
            "/favourites",
            get(list_favourites_handler).post(add_favourite_handler),
        )
        .route("/favourites/{id}", delete(remove_favourite_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            render_errors,
        ))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            assign_session,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT])
}
