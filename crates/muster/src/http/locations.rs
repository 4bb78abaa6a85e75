use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use muster_db::{Connective, Filter, Store};
use serde_json::{json, Value};

use crate::service::LocationService;

use super::error::ApiError;
use super::resource::LocationResource;
use super::validate::{self, Validator};

pub async fn index(
    State(db): State<Arc<Store>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<LocationResource>>, ApiError> {
    let fields = validate::query_map(params);
    Validator::new(&db, &fields)
        .string("name")
        .string("address")
        .boolean("available")
        .finish()?;

    let mut filter = Filter::new();
    if let Some(name) = fields.get("name").and_then(Value::as_str) {
        filter = filter.where_string_has("name", name, Connective::And);
    }
    if let Some(address) = fields.get("address").and_then(Value::as_str) {
        filter = filter.where_string_has("address", address, Connective::And);
    }
    let filter = filter.when(
        validate::has(&fields, "available") && validate::bool_field(&fields, "available"),
        |filter| filter.and_where("capacity", ">", "0"),
    );

    let locations = LocationService::new(&db).get(&filter.build())?;
    let payload: Vec<LocationResource> = locations.iter().map(LocationResource::from).collect();
    Ok(Json(payload))
}

pub async fn show(
    State(db): State<Arc<Store>>,
    Path(id): Path<i64>,
) -> Result<Json<LocationResource>, ApiError> {
    let Some(location) = LocationService::new(&db).find(id)? else {
        return Err(ApiError::NotFound);
    };
    Ok(Json(LocationResource::from(&location)))
}

pub async fn store(
    State(db): State<Arc<Store>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let fields = validate::body_fields(&body);
    validator(&db, &fields).finish()?;

    let name = validate::str_field(&fields, "name")?;
    let address = validate::str_field(&fields, "address")?;
    let capacity = validate::int_field(&fields, "capacity")?;

    let location = LocationService::new(&db).create(name, address, capacity)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Location created successfully",
            "location": LocationResource::from(&location)
        })),
    ))
}

pub async fn update(
    State(db): State<Arc<Store>>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let service = LocationService::new(&db);
    let Some(location) = service.find(id)? else {
        return Err(ApiError::NotFound);
    };

    let fields = validate::body_fields(&body);
    validator(&db, &fields).finish()?;

    let name = validate::str_field(&fields, "name")?;
    let address = validate::str_field(&fields, "address")?;
    let capacity = validate::int_field(&fields, "capacity")?;

    let Some(location) = service.update(&location, name, address, capacity)? else {
        return Err(ApiError::NotFound);
    };
    Ok(Json(json!({
        "message": "Location updated successfully",
        "location": LocationResource::from(&location)
    })))
}

pub async fn destroy(
    State(db): State<Arc<Store>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let service = LocationService::new(&db);
    let Some(mut location) = service.find(id)? else {
        return Err(ApiError::NotFound);
    };
    service.delete(&mut location)?;
    Ok(Json(json!({ "message": "Location deleted successfully" })))
}

fn validator<'a>(db: &'a Store, fields: &'a serde_json::Map<String, Value>) -> Validator<'a> {
    Validator::new(db, fields)
        .required("name")
        .string("name")
        .required("address")
        .string("address")
        .required("capacity")
        .integer("capacity")
}
