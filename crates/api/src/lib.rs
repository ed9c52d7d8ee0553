//! HTTP front end for the vehicle rent workflow.
//!
//! Serves the rent pages over cookie-bound sessions, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod render;
pub mod routes;
pub mod session;
pub mod state;
pub mod templates;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use rent_store::RentRepository;
use tower_http::trace::TraceLayer;
use workflow::{InMemorySessionStore, RentWorkflow};

use config::Config;
use render::Templates;
use session::{CookieSettings, SessionBinding};
use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<R: RentRepository + Clone + 'static>(
    state: Arc<AppState<R>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::ops::metrics))
        .with_state(metrics_handle);

    let health_router = Router::new()
        .route("/health", get(routes::ops::health::<R>))
        .with_state(state.clone());

    Router::new()
        .route("/", get(routes::pages::home::<R>))
        .route("/about", get(routes::pages::about::<R>))
        .route("/contact", get(routes::pages::contact::<R>))
        .route("/models/{id}", get(routes::pages::model::<R>))
        .route(
            "/check-availability",
            get(routes::availability::search_form::<R>).post(routes::availability::search::<R>),
        )
        .route(
            "/check-availability-json",
            post(routes::availability::probe::<R>),
        )
        .route("/choose-model/{id}", get(routes::rent::choose_model::<R>))
        .route("/rent-vehicle", get(routes::rent::rent_vehicle::<R>))
        .route(
            "/rent",
            get(routes::rent::rent_form::<R>).post(routes::rent::submit_rent::<R>),
        )
        .route("/rent-summary", get(routes::rent::summary::<R>))
        .layer(middleware::from_fn_with_state(
            SessionBinding {
                sessions: state.sessions.clone(),
                cookie: state.cookie.clone(),
            },
            session::bind_session,
        ))
        .with_state(state)
        .merge(health_router)
        .merge(metrics_router)
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over a rent store.
pub fn create_default_state<R: RentRepository + Clone + 'static>(
    store: R,
    config: &Config,
) -> Arc<AppState<R>> {
    let sessions = InMemorySessionStore::new(config.session_lifetime);
    let workflow =
        RentWorkflow::new(store, sessions.clone()).with_commit_policy(config.commit_policy);

    Arc::new(AppState {
        workflow,
        sessions,
        templates: Templates::builtin(),
        cookie: CookieSettings {
            secure: config.in_production,
            max_age: config.session_lifetime,
        },
        csrf_protection: config.csrf_protection,
    })
}
