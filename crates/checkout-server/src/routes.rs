//! Router

use std::path::Path;

use axum::{
    Router,
    http::header::CONTENT_TYPE,
    routing::get_service,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::handlers::{checkout, method_not_allowed, preflight};
use crate::state::AppState;

/// `/` serves the checkout page on GET/HEAD and takes submissions on POST.
/// Every other path is a static file.
pub fn router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    let static_files = ServeDir::new(static_dir.as_ref());

    let mut app = Router::new()
        .route(
            "/",
            get_service(static_files.clone())
                .post(checkout)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .fallback_service(static_files);

    if state.dev {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers([CONTENT_TYPE]);
        app = app.layer(cors);
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}
