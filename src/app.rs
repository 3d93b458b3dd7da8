use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config;
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, validate_user_middleware};
use crate::state::AppState;

/// Full application router with global middleware.
pub fn app(state: AppState) -> Router {
    let api = &config::config().api;

    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(auth_public_routes())
        // Protected
        .merge(protected_routes(state.clone()))
        .fallback(fallback)
        .with_state(state)
        // Global middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer())
                .layer(TimeoutLayer::new(Duration::from_secs(api.request_timeout_secs)))
                .layer(DefaultBodyLimit::max(api.max_request_size_bytes)),
        )
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/login", post(auth::login_post))
        .route("/auth/refresh", post(auth::refresh_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(user_routes())
        .merge(campaign_routes())
        .merge(ad_account_routes())
        .merge(team_routes())
        .merge(notification_routes())
        .merge(billing_routes())
        .merge(analytics_routes())
        // Layers run outermost-last: JWT first, then the user lookup.
        .route_layer(from_fn_with_state(state, validate_user_middleware))
        .route_layer(from_fn(jwt_auth_middleware))
}

fn user_routes() -> Router<AppState> {
    use protected::auth;

    Router::new()
        .route("/api/auth/user", get(auth::user_get).patch(auth::user_patch))
        .route("/api/logout", post(auth::logout))
}

fn campaign_routes() -> Router<AppState> {
    use protected::campaigns;

    Router::new()
        .route("/api/campaigns", get(campaigns::list).post(campaigns::create))
        .route(
            "/api/campaigns/:id",
            get(campaigns::get).put(campaigns::update).delete(campaigns::delete),
        )
        .route(
            "/api/campaigns/:id/metrics",
            get(campaigns::metrics_get).post(campaigns::metrics_post),
        )
}

fn ad_account_routes() -> Router<AppState> {
    use protected::ad_accounts;

    Router::new()
        .route("/api/ad-accounts", get(ad_accounts::list).post(ad_accounts::create))
        .route(
            "/api/ad-accounts/:id",
            put(ad_accounts::update).delete(ad_accounts::delete),
        )
        .route("/api/ad-accounts/:id/sync", post(ad_accounts::sync))
        .route("/api/oauth/connect/:platform", post(ad_accounts::oauth_connect))
}

fn team_routes() -> Router<AppState> {
    use protected::team;

    Router::new()
        .route("/api/team", get(team::list).post(team::invite))
        .route("/api/team/:id", put(team::update).delete(team::remove))
        .route("/api/team/:id/accept", post(team::accept))
}

fn notification_routes() -> Router<AppState> {
    use protected::notifications;

    Router::new()
        .route("/api/notifications", get(notifications::list))
        .route("/api/notifications/unread-count", get(notifications::unread_count))
        .route("/api/notifications/read-all", put(notifications::mark_all_read))
        .route("/api/notifications/:id/read", put(notifications::mark_read))
}

fn billing_routes() -> Router<AppState> {
    use protected::billing;

    Router::new()
        .route("/api/billing/plans", get(billing::plans))
        .route("/api/create-subscription", post(billing::create_subscription))
}

fn analytics_routes() -> Router<AppState> {
    use protected::analytics;

    Router::new()
        .route("/api/analytics/overview", get(analytics::overview))
        .route("/api/dashboard", get(analytics::dashboard))
}

fn cors_layer() -> CorsLayer {
    let origins = &config::config().security.cors_origins;

    let allow_origin = if crate::is_development!() || origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

async fn fallback() -> ApiError {
    ApiError::not_found("Route not found")
}
