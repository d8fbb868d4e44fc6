use axum::extract::DefaultBodyLimit;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler;
use crate::state::AppState;

/// Build the axum router with all Corkboard endpoints.
///
/// Uploaded files are served from `config.uploads_dir` under `/uploads`.
/// Every response, including CORS preflights and static files, carries
/// `Cache-Control: no-store`.
pub fn build_router(state: AppState, config: &ServerConfig) -> ServerResult<Router> {
    let cors = CorsLayer::new()
        .allow_origin(config.origin_header()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE]);

    let api = Router::new()
        .route(
            "/api/posts",
            get(handler::list_posts).post(handler::create_post),
        )
        .route("/api/posts/like/:post_id", post(handler::like_post))
        .route("/api/posts/dislike/:post_id", post(handler::dislike_post))
        .route("/api/posts/comment/:post_id", post(handler::comment_post))
        .route(
            "/api/posts/:post_id",
            put(handler::update_post).delete(handler::delete_post),
        )
        .route("/health", get(handler::health_handler))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .with_state(state);

    Ok(api
        .nest_service("/uploads", ServeDir::new(&config.uploads_dir))
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http()))
}
