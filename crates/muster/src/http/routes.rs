use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use muster_db::Store;
use serde_json::json;
use tower_http::trace::TraceLayer;

use super::{dashboard, event_participants, events, gate, ips, locations, participants};

/// Assembles the application router: the JSON API under `/api` behind the IP
/// gate, the dashboard pages in front of it.
///
/// The registration collection is routed before the event id routes so that
/// `/api/events/participants` is never read as an event id.
pub fn app(db: Arc<Store>) -> Router {
    let api = Router::new()
        .route(
            "/events/participants",
            get(event_participants::index).post(event_participants::store),
        )
        .route(
            "/events/participants/{id}",
            get(event_participants::show).delete(event_participants::destroy),
        )
        .route("/events", get(events::index).post(events::store))
        .route(
            "/events/{id}",
            get(events::show)
                .patch(events::update)
                .delete(events::destroy),
        )
        .route("/locations", get(locations::index).post(locations::store))
        .route(
            "/locations/{id}",
            get(locations::show)
                .patch(locations::update)
                .delete(locations::destroy),
        )
        .route(
            "/participants",
            get(participants::index).post(participants::store),
        )
        .route(
            "/participants/{id}",
            get(participants::show)
                .patch(participants::update)
                .delete(participants::destroy),
        )
        .route("/ips", get(ips::index).post(ips::store))
        .route("/ips/{id}", get(ips::show).delete(ips::destroy))
        .layer(middleware::from_fn_with_state(db.clone(), gate::allow_api));

    Router::new()
        .nest("/api", api)
        .route("/", get(dashboard::index))
        .route("/blacklisted/unblock/{id}", post(dashboard::unblock))
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

async fn route_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Route not found" })),
    )
}
