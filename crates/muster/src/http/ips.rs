use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use muster_db::{Connective, Filter, Store};
use serde_json::{json, Map, Value};

use crate::model::Ip;
use crate::service::IpService;

use super::error::ApiError;
use super::resource::IpResource;
use super::validate::{self, Validator};

pub async fn index(
    State(db): State<Arc<Store>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<IpResource>>, ApiError> {
    let fields = validate::query_map(params);
    // The last filter parameter is spelled without its final `d`.
    Validator::new(&db, &fields)
        .string("ip_address")
        .boolean("blacklisted")
        .boolean("whiteliste")
        .finish()?;

    let mut filter = Filter::new();
    if let Some(address) = fields.get("ip_address").and_then(Value::as_str) {
        filter = filter.where_string("ip_address", address, Connective::And);
    }
    let filter = filter
        .when(validate::bool_field(&fields, "blacklisted"), |filter| {
            filter.and_where("blacklisted", "=", true)
        })
        .when(validate::bool_field(&fields, "whiteliste"), |filter| {
            filter.and_where("blacklisted", "=", false)
        });

    let ips = IpService::new(&db).get(&filter.build())?;
    let payload: Vec<IpResource> = ips.iter().map(IpResource::from).collect();
    Ok(Json(payload))
}

pub async fn show(
    State(db): State<Arc<Store>>,
    Path(id): Path<i64>,
) -> Result<Json<IpResource>, ApiError> {
    let Some(ip) = IpService::new(&db).find(id)? else {
        return Err(ApiError::NotFound);
    };
    Ok(Json(IpResource::from(&ip)))
}

pub async fn store(
    State(db): State<Arc<Store>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let fields = validate::body_fields(&body);
    let conflict = conflict_message(&db, &fields)?;
    Validator::new(&db, &fields)
        .required("ip_address")
        .ip("ip_address")
        .required("is_blacklisted")
        .boolean("is_blacklisted")
        .unique::<Ip>("ip_address", "ip_address", None, Some(&conflict))
        .finish()?;

    let address = validate::str_field(&fields, "ip_address")?;
    let blacklisted = validate::bool_field(&fields, "is_blacklisted");

    let ip = IpService::new(&db).create(address, blacklisted)?;
    let message = if ip.is_blacklisted() {
        "IP blacklisted successfully"
    } else {
        "IP whitelisted successfully"
    };
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": message, "ip": IpResource::from(&ip) })),
    ))
}

pub async fn destroy(
    State(db): State<Arc<Store>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let service = IpService::new(&db);
    let Some(ip) = service.find(id)? else {
        return Err(ApiError::NotFound);
    };
    service.delete(&ip)?;
    Ok(Json(json!({ "message": "IP deleted successfully" })))
}

/// The uniqueness message depends on which list the existing row is on and
/// which list the request asks for. Empty when the address is new; the
/// unique rule finds nothing in that case.
fn conflict_message(db: &Store, fields: &Map<String, Value>) -> muster_db::Result<String> {
    let Some(address) = fields.get("ip_address").and_then(Value::as_str) else {
        return Ok(String::new());
    };
    let Some(existing) = IpService::new(db).find_by_ip(address)? else {
        return Ok(String::new());
    };
    let requested = validate::bool_field(fields, "is_blacklisted");
    let message = match (existing.is_blacklisted(), requested) {
        (true, true) => "The IP address already blacklisted.",
        (true, false) => "The IP is blacklisted, please remove it from blacklist first.",
        (false, true) => "The IP is whitelisted, please remove it from whitelist first.",
        (false, false) => "The IP address already whitelisted.",
    };
    Ok(message.to_string())
}
