use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use muster_db::{Connective, Filter, Store};
use serde_json::{json, Value};

use crate::model::{Event, Location};
use crate::service::EventService;

use super::error::ApiError;
use super::resource::{EventInclude, EventResource};
use super::validate::{self, Validator};

pub async fn index(
    State(db): State<Arc<Store>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<EventResource>>, ApiError> {
    let fields = validate::query_map(params);
    Validator::new(&db, &fields)
        .string("name")
        .date("before_date")
        .date("after_date")
        .date("date")
        .integer("location_id")
        .finish()?;

    let mut filter = Filter::new();
    if let Some(name) = fields.get("name").and_then(Value::as_str) {
        filter = filter.where_string_has("name", name, Connective::And);
    }
    if let Some(before) = validate::date_opt(&fields, "before_date")? {
        filter = filter.where_before_date("date", before, Connective::And);
    }
    if let Some(after) = validate::date_opt(&fields, "after_date")? {
        filter = filter.where_after_date("date", after, Connective::And);
    }
    if let Some(date) = validate::date_opt(&fields, "date")? {
        filter = filter.where_date("date", date, Connective::And);
    }
    if let Some(location_id) = validate::int_opt(&fields, "location_id") {
        filter = filter.and_where("location_id", "=", location_id);
    }

    let mut events = EventService::new(&db).get(&filter.build())?;
    let include = EventInclude {
        location: true,
        visitors: true,
        ..Default::default()
    };
    let mut payload = Vec::with_capacity(events.len());
    for event in &mut events {
        payload.push(EventResource::render(&db, event, include)?);
    }
    Ok(Json(payload))
}

pub async fn show(
    State(db): State<Arc<Store>>,
    Path(id): Path<i64>,
) -> Result<Json<EventResource>, ApiError> {
    let Some(mut event) = EventService::new(&db).find(id)? else {
        return Err(ApiError::NotFound);
    };
    let include = EventInclude {
        location: true,
        participants: true,
        ..Default::default()
    };
    Ok(Json(EventResource::render(&db, &mut event, include)?))
}

pub async fn store(
    State(db): State<Arc<Store>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let fields = validate::body_fields(&body);
    validator(&db, &fields, None).finish()?;

    let name = validate::str_field(&fields, "name")?;
    let date = validate::date_field(&fields, "date")?;
    let location_id = validate::int_field(&fields, "location_id")?;

    let mut event = EventService::new(&db).create(name, date, location_id)?;
    let include = EventInclude {
        location: true,
        ..Default::default()
    };
    let resource = EventResource::render(&db, &mut event, include)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Event created successfully", "event": resource })),
    ))
}

pub async fn update(
    State(db): State<Arc<Store>>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let service = EventService::new(&db);
    let Some(event) = service.find(id)? else {
        return Err(ApiError::NotFound);
    };

    let fields = validate::body_fields(&body);
    validator(&db, &fields, event.id).finish()?;

    let name = validate::str_field(&fields, "name")?;
    let date = validate::date_field(&fields, "date")?;
    let location_id = validate::int_field(&fields, "location_id")?;

    let Some(mut event) = service.update(&event, name, date, location_id)? else {
        return Err(ApiError::NotFound);
    };
    let include = EventInclude {
        location: true,
        ..Default::default()
    };
    let resource = EventResource::render(&db, &mut event, include)?;
    Ok(Json(json!({ "message": "Event updated successfully", "event": resource })))
}

pub async fn destroy(
    State(db): State<Arc<Store>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let service = EventService::new(&db);
    let Some(event) = service.find(id)? else {
        return Err(ApiError::NotFound);
    };
    service.delete(&event)?;
    Ok(Json(json!({ "message": "Event deleted successfully" })))
}

/// Shared store/update rules; updates except their own row from the
/// location-and-date uniqueness check.
fn validator<'a>(
    db: &'a Store,
    fields: &'a serde_json::Map<String, Value>,
    except: Option<i64>,
) -> Validator<'a> {
    Validator::new(db, fields)
        .required("name")
        .string("name")
        .required("date")
        .date("date")
        .required("location_id")
        .integer("location_id")
        .exists::<Location>("location_id")
        .unique_on::<Event>(
            &["location_id", "date"],
            except,
            "Location reserved for this date",
        )
}
