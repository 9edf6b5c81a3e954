pub mod handlers;
pub mod middleware;
pub mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{config::Settings, service::ServiceContext};
use state::AppState;

pub fn create_app(service_context: Arc<ServiceContext>, settings: Arc<Settings>) -> Router {
    let app_state = AppState::new(service_context, settings);

    Router::new()
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))
        .nest("/api/bookings", booking_routes(app_state.clone()))
        .nest("/admin", admin_routes(app_state.clone()))
        .with_state(app_state)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive()) // Configure properly for production
        .layer(TraceLayer::new_for_http())
}

fn booking_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Webhook is unauthenticated; the body signature is the credential.
        .route("/webhook", post(handlers::payments::webhook))
        // Guest and participant routes
        .merge(
            Router::new()
                .route("/", post(handlers::bookings::create))
                .route("/mine", get(handlers::bookings::list_mine))
                .route("/by-order/:order_code", get(handlers::bookings::get_by_order_code))
                .route("/:id", get(handlers::bookings::get))
                .route("/:id/pay/initiate", post(handlers::bookings::initiate_payment))
                .route("/:id/cancel", post(handlers::bookings::cancel))
                .route_layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    middleware::auth::require_auth,
                )),
        )
        // Host decision routes
        .merge(
            Router::new()
                .route("/host/mine", get(handlers::bookings::list_host))
                .route("/:id/host-accept", post(handlers::bookings::host_accept))
                .route("/:id/host-decline", post(handlers::bookings::host_decline))
                .route_layer(axum::middleware::from_fn_with_state(
                    state,
                    middleware::auth::require_host,
                )),
        )
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/payouts/batch/latest", get(handlers::admin::latest_batch))
        .route("/payouts/settlements", get(handlers::admin::list_settlements))
        .route(
            "/payouts/settlements/:id/pay",
            post(handlers::admin::confirm_settlement),
        )
        .route(
            "/bookings/:id/refund/confirm",
            post(handlers::admin::confirm_refund),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_admin,
        ))
}
