use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use muster_db::Store;
use serde_json::json;
use tracing::warn;

use crate::model::Ip;
use crate::service::IpService;

use super::error::ApiError;

/// Admission check in front of the API: loopback callers pass, blacklisted
/// addresses are refused, and anything not explicitly whitelisted is refused
/// as well.
pub async fn allow_api(
    State(db): State<Arc<Store>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(request.headers(), peer);
    if ip != "127.0.0.1" {
        let entry = match IpService::new(&db).find_by_ip(&ip) {
            Ok(entry) => entry,
            Err(err) => return ApiError::from(err).into_response(),
        };
        if entry.as_ref().is_some_and(Ip::is_blacklisted) {
            warn!(%ip, "refused blacklisted address");
            return refuse("Your IP has been blacklisted.");
        }
        if !entry.as_ref().is_some_and(Ip::is_whitelisted) {
            warn!(%ip, "refused unlisted address");
            return refuse("Your IP is not authorized");
        }
    }
    next.run(request).await
}

/// The caller's address: a `Client-Ip` header wins, then the first entry of
/// `X-Forwarded-For`, then the socket peer.
fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    if let Some(value) = header_text(headers, "client-ip") {
        return value;
    }
    if let Some(value) = header_text(headers, "x-forwarded-for") {
        if let Some(first) = value.split(',').next() {
            return first.trim().to_string();
        }
    }
    peer.ip().to_string()
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    let value = headers.get(name)?.to_str().ok()?;
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn refuse(message: &str) -> Response {
    (StatusCode::FORBIDDEN, Json(json!({ "error": message }))).into_response()
}
