use axum::{routing::get, routing::post, Router};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer, Config};
use crate::handlers::{attendees, events, health_check};
use crate::state::AppState;

/// Application routes without middleware.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/events", get(events::list_events).post(events::create_event))
        .route(
            "/events/:id",
            get(events::get_event)
                .put(events::replace_event)
                .patch(events::update_event)
                .delete(events::delete_event),
        )
        .route("/events/:id/register", post(attendees::register_attendee))
        .route("/events/:id/attendees", get(attendees::list_attendees))
        .route(
            "/events/:id/attendees/count",
            get(attendees::count_attendees),
        )
}

pub fn create_routes(state: AppState, config: &Config) -> Router {
    api_routes()
        .with_state(state)
        .layer(create_security_headers_layer(config.production))
        .layer(create_cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
}
