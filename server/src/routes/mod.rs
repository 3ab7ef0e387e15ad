use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, with_security_headers, Config};
use crate::handlers::{events, health_check, orders, products};
use crate::state::AppState;

pub fn create_routes(state: AppState, config: &Config) -> Router {
    let api = Router::new()
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events/active", get(events::active_event))
        .route("/events/reconcile", post(events::reconcile_events))
        .route(
            "/events/:id",
            put(events::update_event).delete(events::cancel_event),
        )
        .route("/events/:id/end", post(events::end_event))
        .route("/events/:id/history", get(events::event_history))
        .route("/events/:id/finances", get(events::event_finances))
        .route("/orders/pending", get(orders::pending_orders))
        .route("/orders/:id/accept", post(orders::accept_order))
        .route("/orders/:id/reject", post(orders::reject_order))
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/products/:id",
            put(products::update_product).delete(products::delete_product),
        )
        .route("/tables", get(products::list_tables));

    let router = Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .with_state(state);

    with_security_headers(router, config.production)
        .layer(create_cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
}
