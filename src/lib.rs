pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        // Public
        .route("/api/services", get(handlers::public::list_services))
        .route(
            "/api/payment-methods",
            get(handlers::public::list_payment_methods),
        )
        .route("/api/bookings", post(handlers::public::create_booking))
        .route("/api/contact", post(handlers::public::create_message))
        .route("/api/track/booking", post(handlers::tracking::track_booking))
        .route("/api/track/message", post(handlers::tracking::track_message))
        // Admin
        .route(
            "/api/admin/auth",
            get(handlers::admin::verify_session).post(handlers::admin::login),
        )
        .route("/api/admin/logout", post(handlers::admin::logout))
        .route("/api/admin/stats", get(handlers::admin::get_stats))
        .route("/api/admin/bookings", get(handlers::admin::get_bookings))
        .route(
            "/api/admin/bookings/:id/confirm",
            post(handlers::admin::confirm_booking),
        )
        .route(
            "/api/admin/bookings/:id/complete",
            post(handlers::admin::complete_booking),
        )
        .route(
            "/api/admin/bookings/:id/cancel",
            post(handlers::admin::cancel_booking),
        )
        .route(
            "/api/admin/bookings/:id/payment-status",
            post(handlers::admin::update_payment_status),
        )
        .route("/api/admin/messages", get(handlers::admin::get_messages))
        .route(
            "/api/admin/messages/:id/read",
            post(handlers::admin::mark_message_read),
        )
        .route(
            "/api/admin/messages/:id/reply",
            post(handlers::admin::reply_to_message),
        )
        .route(
            "/api/admin/payment-methods",
            get(handlers::admin::get_payment_methods),
        )
        .route(
            "/api/admin/payment-methods/:id",
            put(handlers::admin::update_payment_method),
        )
        .route(
            "/api/admin/payment-methods/:id/toggle",
            post(handlers::admin::toggle_payment_method),
        )
        .route("/api/admin/events", get(handlers::events::activity_stream))
        .route(
            "/api/notifications",
            post(handlers::notifications::send_notification),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
