use axum::http::HeaderName;
use axum::routing::get;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::handlers;
use crate::state::AppState;

/// All routes plus the middleware stack, ready to serve.
pub fn build_app_router(state: AppState) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health))
        .route(
            "/collect_data/",
            get(handlers::collect_form).post(handlers::collect_data),
        )
        .route(
            "/receive_frame/",
            get(handlers::receive_frame_get).post(handlers::receive_frame),
        )
        .route(
            "/train_model/",
            get(handlers::train_page).post(handlers::train_model),
        )
        .route(
            "/recognize_faces/",
            get(handlers::recognize_page).post(handlers::recognize),
        )
        .route(
            "/start_recognition/",
            get(handlers::start_recognition_get).post(handlers::recognize),
        )
        // -- Middleware stack (applied bottom-up) --
        .layer(CatchPanicLayer::new())
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .with_state(state)
}
