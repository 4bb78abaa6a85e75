use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use muster_db::{Filter, Store};
use serde_json::{json, Value};

use crate::model::{Event, EventParticipant, Participant};
use crate::service::{EventParticipantService, EventService, ParticipantService};

use super::error::ApiError;
use super::resource::EventParticipantResource;
use super::validate::{self, Validator};

pub async fn index(
    State(db): State<Arc<Store>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<EventParticipantResource>>, ApiError> {
    let fields = validate::query_map(params);
    Validator::new(&db, &fields)
        .integer("event_id")
        .exists::<Event>("event_id")
        .integer("participant_id")
        .exists::<Participant>("participant_id")
        .finish()?;

    let mut filter = Filter::new();
    if let Some(event_id) = validate::int_opt(&fields, "event_id") {
        filter = filter.and_where("event_id", "=", event_id);
    }
    if let Some(participant_id) = validate::int_opt(&fields, "participant_id") {
        filter = filter.and_where("participant_id", "=", participant_id);
    }

    let mut registrations = EventParticipantService::new(&db).get(&filter.build())?;
    let mut payload = Vec::with_capacity(registrations.len());
    for registration in &mut registrations {
        payload.push(EventParticipantResource::render(&db, registration)?);
    }
    Ok(Json(payload))
}

pub async fn show(
    State(db): State<Arc<Store>>,
    Path(id): Path<i64>,
) -> Result<Json<EventParticipantResource>, ApiError> {
    let Some(mut registration) = EventParticipantService::new(&db).find(id)? else {
        return Err(ApiError::NotFound);
    };
    Ok(Json(EventParticipantResource::render(&db, &mut registration)?))
}

/// Registers a participant for an event.
///
/// The validator reports duplicate seats and full events in the 422 shape;
/// the registration itself re-checks both inside a write transaction, so a
/// racing request cannot slip past the advisory pass.
pub async fn store(
    State(db): State<Arc<Store>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let fields = validate::body_fields(&body);

    let mut event = match validate::int_opt(&fields, "event_id") {
        Some(id) => EventService::new(&db).find(id)?,
        None => None,
    };
    let capacity = match event.as_mut() {
        Some(event) => event.capacity(&db)?,
        None => i64::MAX,
    };
    let seats_taken = Filter::new()
        .and_where("event_id", "=", validate::int_opt(&fields, "event_id"))
        .build();

    Validator::new(&db, &fields)
        .required("event_id")
        .integer("event_id")
        .exists::<Event>("event_id")
        .required("participant_id")
        .integer("participant_id")
        .exists::<Participant>("participant_id")
        .unique_on::<EventParticipant>(
            &["event_id", "participant_id"],
            None,
            "Already reserved a seat for the event",
        )
        .count::<EventParticipant>(
            "capacity",
            &seats_taken,
            |taken| (taken as i64) + 1 < capacity,
            "The event reached it's maximum capacity",
        )
        .finish()?;

    let Some(event) = event else {
        return Err(ApiError::NotFound);
    };
    let participant_id = validate::int_field(&fields, "participant_id")?;
    let Some(participant) = ParticipantService::new(&db).find(participant_id)? else {
        return Err(ApiError::NotFound);
    };

    let mut registration = EventParticipantService::new(&db).register(&event, &participant)?;
    let resource = EventParticipantResource::render(&db, &mut registration)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "EventParticipant created successfully",
            "eventParticipant": resource
        })),
    ))
}

pub async fn destroy(
    State(db): State<Arc<Store>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let service = EventParticipantService::new(&db);
    let Some(registration) = service.find(id)? else {
        return Err(ApiError::NotFound);
    };
    service.delete(&registration)?;
    Ok(Json(json!({ "message": "EventParticipant deleted successfully" })))
}
