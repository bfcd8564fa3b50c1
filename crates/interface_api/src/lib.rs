//! HTTP API Layer
//!
//! A thin axum surface over [`app_booking::BookingEngine`].
//!
//! # Architecture
//!
//! - **Handlers**: One function per engine operation
//! - **Middleware**: Request ids, tracing, request logging
//! - **DTOs**: Request bodies with `HH:MM` times and their validation
//! - **Error Handling**: Engine errors mapped to status codes
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(Arc::new(engine));
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;

use std::sync::Arc;

use app_booking::BookingEngine;
use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{bookings, health, patterns, resources};
use crate::middleware::request_logging;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<BookingEngine>,
}

/// Creates the main API router
pub fn create_router(engine: Arc<BookingEngine>) -> Router {
    let state = AppState { engine };

    let booking_routes = Router::new()
        .route("/", post(bookings::create_booking))
        .route("/flex", post(bookings::create_flex_booking))
        .route("/:id", delete(bookings::delete_booking))
        .route("/:id/status", put(bookings::change_status))
        .route("/:id/slot", put(bookings::move_booking))
        .route(
            "/:id/invoice",
            post(bookings::invoice_booking).delete(bookings::uninvoice_booking),
        );

    let pattern_routes = Router::new()
        .route("/", post(patterns::create_pattern))
        .route("/flex", post(patterns::fill_flex_pattern))
        .route("/:id/extend", post(patterns::extend_pattern))
        .route("/:id/deactivate", post(patterns::deactivate_pattern));

    let query_routes = Router::new()
        .route("/resources/:id/agenda", get(resources::day_agenda))
        .route("/resources/:id/free-slots", get(resources::free_slots))
        .route("/leases/:id/credits", get(resources::credit_usage));

    let api_routes = Router::new()
        .nest("/bookings", booking_routes)
        .nest("/patterns", pattern_routes)
        .merge(query_routes)
        .layer(axum_middleware::from_fn(request_logging));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
