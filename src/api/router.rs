//! HTTP API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.
//!
//! Middleware stack (outermost → innermost):
//! CORS → Cache-Control → Extension → Auth (session routes, and data routes
//! when `require_auth` is set) → Audit logger

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::error::ApiError;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

fn build_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    // Routes sharing a prefix must share the param name, hence `/tasks/:id`.
    let mut data = Router::new()
        .route(
            "/user/:id",
            get(endpoints::users::get).put(endpoints::users::update),
        )
        .route("/health-data", post(endpoints::health_data::create))
        .route("/health-data/:user_id", get(endpoints::health_data::list))
        .route(
            "/health-data/:user_id/latest",
            get(endpoints::health_data::latest),
        )
        .route("/patients", get(endpoints::patients::list))
        .route(
            "/patients/doctor/:doctor_name",
            get(endpoints::patients::by_doctor),
        )
        .route(
            "/patients/doctor/:doctor_name/stats",
            get(endpoints::patients::stats),
        )
        .route("/tasks", post(endpoints::tasks::create))
        .route(
            "/tasks/:id",
            get(endpoints::tasks::list).put(endpoints::tasks::update),
        )
        .route("/suggestions", post(endpoints::suggestions::create))
        .route("/suggestions/:patient_id", get(endpoints::suggestions::list))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access));

    if ctx.core.config.require_auth {
        data = data.layer(axum::middleware::from_fn(middleware::auth::require_session));
    }

    // Always token-protected: they only make sense with a session
    let sessioned = Router::new()
        .route("/session", get(endpoints::auth::current))
        .route("/logout", post(endpoints::auth::logout))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_session));

    let public = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/register", post(endpoints::auth::register))
        .route("/login", post(endpoints::auth::login))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let api = Router::new()
        .merge(public)
        .merge(sessioned)
        .merge(data)
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx));

    Router::new()
        .nest("/api", api)
        .fallback(route_not_found)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(cors)
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".into())
}
