use axum::http::{header, Method};
use axum::routing::get;
use axum::Router;
use mds_core::MetadataService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all metadata endpoints.
pub fn build_router(service: MetadataService) -> Router {
    let metadata = Router::new()
        .route(
            "/metadata",
            axum::routing::post(handler::create_handler)
                .put(handler::upsert_handler)
                .delete(handler::delete_all_handler),
        )
        .route(
            "/metadata/:key",
            get(handler::get_handler)
                .put(handler::update_handler)
                .patch(handler::patch_handler)
                .delete(handler::delete_handler),
        );

    Router::new()
        .route("/health", get(handler::health_handler))
        .nest("/api", metadata)
        .with_state(AppState::new(service))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::ACCEPT])
}
