pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        // public booking flow
        .route("/api/employees", get(handlers::public::list_employees))
        .route("/api/employees/:id/week", get(handlers::public::employee_week))
        .route("/api/services", get(handlers::public::list_services))
        .route("/api/availability", get(handlers::public::get_availability))
        .route("/api/bookings", post(handlers::public::create_booking))
        // webhooks and cron
        .route("/webhook/sms", post(handlers::webhook::sms_webhook))
        .route(
            "/webhook/booking-created",
            post(handlers::webhook::booking_created),
        )
        .route(
            "/api/cron/booking-reminders",
            get(handlers::reminders::run_booking_reminders),
        )
        // admin
        .route("/api/admin/bookings", get(handlers::admin::get_bookings))
        .route(
            "/api/admin/bookings/:id/cancel",
            post(handlers::admin::cancel_booking),
        )
        .route(
            "/api/admin/employees",
            get(handlers::admin::list_employees).post(handlers::admin::create_employee),
        )
        .route(
            "/api/admin/employees/:id",
            put(handlers::admin::update_employee).delete(handlers::admin::delete_employee),
        )
        .route(
            "/api/admin/employees/:id/schedule",
            get(handlers::admin::get_schedule).put(handlers::admin::replace_schedule),
        )
        .route(
            "/api/admin/employees/:id/time-off",
            get(handlers::admin::list_time_off).post(handlers::admin::add_time_off),
        )
        .route(
            "/api/admin/time-off/:id",
            delete(handlers::admin::delete_time_off),
        )
        .route(
            "/api/admin/services",
            get(handlers::admin::list_services).post(handlers::admin::create_service),
        )
        .route(
            "/api/admin/services/:id",
            put(handlers::admin::update_service).delete(handlers::admin::delete_service),
        )
        .route("/api/admin/customers", get(handlers::admin::list_customers))
        .route("/api/admin/week", get(handlers::admin::week_overview))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
