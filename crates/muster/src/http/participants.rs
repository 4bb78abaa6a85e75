use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use muster_db::{Connective, Filter, Store};
use serde_json::{json, Value};

use crate::model::Participant;
use crate::service::ParticipantService;

use super::error::ApiError;
use super::resource::ParticipantResource;
use super::validate::{self, Validator};

pub async fn index(
    State(db): State<Arc<Store>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<ParticipantResource>>, ApiError> {
    let fields = validate::query_map(params);
    Validator::new(&db, &fields)
        .string("name")
        .email("email")
        .finish()?;

    let mut filter = Filter::new();
    if let Some(name) = fields.get("name").and_then(Value::as_str) {
        filter = filter.where_string_has("name", name, Connective::And);
    }
    if let Some(email) = fields.get("email").and_then(Value::as_str) {
        filter = filter.where_string("email", email, Connective::And);
    }

    let participants = ParticipantService::new(&db).get(&filter.build())?;
    let payload: Vec<ParticipantResource> =
        participants.iter().map(ParticipantResource::from).collect();
    Ok(Json(payload))
}

pub async fn show(
    State(db): State<Arc<Store>>,
    Path(id): Path<i64>,
) -> Result<Json<ParticipantResource>, ApiError> {
    let Some(participant) = ParticipantService::new(&db).find(id)? else {
        return Err(ApiError::NotFound);
    };
    Ok(Json(ParticipantResource::from(&participant)))
}

pub async fn store(
    State(db): State<Arc<Store>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let fields = validate::body_fields(&body);
    Validator::new(&db, &fields)
        .required("name")
        .string("name")
        .required("email")
        .email("email")
        .unique::<Participant>("email", "email", None, None)
        .finish()?;

    let name = validate::str_field(&fields, "name")?;
    let email = validate::str_field(&fields, "email")?;

    let participant = ParticipantService::new(&db).create(name, email)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Participant created successfully",
            "participant": ParticipantResource::from(&participant)
        })),
    ))
}

pub async fn update(
    State(db): State<Arc<Store>>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let service = ParticipantService::new(&db);
    let Some(participant) = service.find(id)? else {
        return Err(ApiError::NotFound);
    };

    // Updates only require email to be a string, and a participant may keep
    // their own address.
    let fields = validate::body_fields(&body);
    Validator::new(&db, &fields)
        .required("name")
        .string("name")
        .required("email")
        .string("email")
        .unique::<Participant>("email", "email", participant.id, None)
        .finish()?;

    let name = validate::str_field(&fields, "name")?;
    let email = validate::str_field(&fields, "email")?;

    let Some(participant) = service.update(&participant, name, email)? else {
        return Err(ApiError::NotFound);
    };
    Ok(Json(json!({
        "message": "Participant updated successfully",
        "participant": ParticipantResource::from(&participant)
    })))
}

pub async fn destroy(
    State(db): State<Arc<Store>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let service = ParticipantService::new(&db);
    let Some(participant) = service.find(id)? else {
        return Err(ApiError::NotFound);
    };
    service.delete(&participant)?;
    Ok(Json(json!({ "message": "Participant deleted successfully" })))
}
