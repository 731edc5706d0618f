use std::sync::Arc;

use axum::{
    Router,
    extract::Extension,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::any,
};

use crate::{config::Config, subscription};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

/// Routes `/`, `/{sub_path}` and a 404 fallback.
///
/// Every HTTP method is accepted on both routes and query strings are
/// ignored.
pub fn build_router(config: Arc<Config>) -> Router {
    let sub_route = config.sub_route();
    let app_state = AppState { config };

    Router::new()
        .route("/", any(hello))
        .route(&sub_route, any(get_subscription))
        .fallback(fallback_not_found)
        .layer(Extension(app_state))
}

async fn hello() -> &'static str {
    "Hello world!"
}

async fn fallback_not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

fn text_plain_utf8(body: String) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    (headers, body).into_response()
}

async fn get_subscription(Extension(state): Extension<AppState>) -> Response {
    text_plain_utf8(subscription::build_base64(&state.config))
}
