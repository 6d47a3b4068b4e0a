use crate::config::Config;
use crate::domain::user::Claims;
use crate::services::{CleanupService, ConnectionService, ExchangeService, SessionClient};
use crate::storage::SessionStore;
use axum::body::Body;
use axum::http::Request;
use axum::{
    Router,
    routing::{any, delete, get, post},
};
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub mod connections;
pub mod cors;
pub mod health;
pub mod maintenance;
pub mod middleware;
pub mod oauth;
pub mod rate_limit;
pub mod schemas;
pub mod session;

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Config,
    pub exchange_service: ExchangeService,
    pub connection_service: ConnectionService,
    pub cleanup_service: CleanupService,
    pub store: Arc<dyn SessionStore>,
}

impl AppState {
    /// Builds the per-invocation session client for an authenticated caller.
    #[must_use]
    pub fn session_client(&self, claims: Claims) -> SessionClient {
        SessionClient::new(Arc::clone(&self.store), claims)
            .with_attempt_timeout(self.config.session_attempt_timeout())
    }
}

#[derive(Clone, Debug)]
pub struct MgmtState {
    pub store: Arc<dyn SessionStore>,
}

#[derive(Debug)]
pub struct ServiceContainer {
    pub exchange_service: ExchangeService,
    pub connection_service: ConnectionService,
    pub cleanup_service: CleanupService,
    pub store: Arc<dyn SessionStore>,
}

/// Configures and returns the primary application router.
///
/// # Panics
/// Panics if the rate limiter configuration cannot be constructed.
pub fn app_router(config: Config, services: ServiceContainer) -> Router {
    let extractor = rate_limit::IpKeyExtractor::new(config.server.trusted_proxies.clone());

    let std_interval_ns = 1_000_000_000 / config.rate_limit.per_second.max(1);
    let standard_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_nanosecond(u64::from(std_interval_ns))
            .burst_size(config.rate_limit.burst)
            .key_extractor(extractor.clone())
            .finish()
            .expect("Failed to build standard rate limiter config"),
    );

    // Exchange tier: stricter limits, since every hit costs a pair of
    // upstream Graph calls.
    let exchange_interval_ns = 1_000_000_000 / config.rate_limit.exchange_per_second.max(1);
    let exchange_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_nanosecond(u64::from(exchange_interval_ns))
            .burst_size(config.rate_limit.exchange_burst)
            .key_extractor(extractor)
            .finish()
            .expect("Failed to build exchange rate limiter config"),
    );

    let state = AppState {
        config,
        exchange_service: services.exchange_service,
        connection_service: services.connection_service,
        cleanup_service: services.cleanup_service,
        store: services.store,
    };

    let exchange_routes = Router::new()
        .route("/oauth/exchange", get(oauth::exchange))
        .layer(GovernorLayer::new(exchange_conf));

    let api_routes = Router::new()
        .route("/session", get(session::get_session))
        .route("/session/refresh", post(session::refresh))
        .route("/me", get(session::me))
        .route("/connections", get(connections::list))
        .route("/connections", post(connections::create))
        .route("/connections/{id}", delete(connections::remove))
        .route("/maintenance/session-cleanup", any(maintenance::session_cleanup))
        .layer(GovernorLayer::new(standard_conf));

    Router::new()
        .nest("/v1", exchange_routes.merge(api_routes))
        .layer(axum::middleware::from_fn(cors::cors))
        .layer(PropagateRequestIdLayer::new(axum::http::HeaderName::from_static("x-request-id")))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(move |request: &Request<Body>| {
                    let request_id = request
                        .extensions()
                        .get::<tower_http::request_id::RequestId>()
                        .map(|id| id.header_value().to_str().unwrap_or_default())
                        .unwrap_or_default()
                        .to_string();

                    tracing::info_span!(
                        "request",
                        "request_id" = %request_id,
                        "http.request.method" = %request.method(),
                        "url.path" = %request.uri().path(),
                        "http.response.status_code" = tracing::field::Empty,
                        "otel.kind" = "server",
                        "user_id" = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, _span: &tracing::Span| {
                        let status = response.status();
                        tracing::Span::current().record("http.response.status_code", status.as_u16());

                        tracing::info!(
                            latency_ms = %latency.as_millis(),
                            status = %status.as_u16(),
                            "request completed"
                        );
                    },
                )
                .on_failure(|error, _latency, _span: &tracing::Span| {
                    tracing::error!(error = %error, "request failed");
                }),
        )
        .layer(SetRequestIdLayer::new(
            axum::http::HeaderName::from_static("x-request-id"),
            middleware::MakeRequestUuidOrHeader,
        ))
        .with_state(state)
}

pub fn mgmt_router(state: MgmtState) -> Router {
    Router::new().route("/livez", get(health::livez)).route("/readyz", get(health::readyz)).with_state(state)
}
