use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};

use crate::service::RegisterError;

/// Every handler failure, mapped onto the wire shapes the API speaks.
#[derive(Debug)]
pub enum ApiError {
    /// A path referenced a record that does not exist.
    NotFound,
    /// Request data failed validation; field name to list of messages.
    Validation(Map<String, Value>),
    /// Anything the caller cannot fix.
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn validation(field: &str, message: &str) -> ApiError {
        let mut errors = Map::new();
        errors.insert(field.to_string(), json!([message]));
        ApiError::Validation(errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "Item Not Found" })),
            )
                .into_response(),
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "message": "Invalid data", "errors": errors })),
            )
                .into_response(),
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

impl From<muster_db::Error> for ApiError {
    fn from(err: muster_db::Error) -> ApiError {
        ApiError::Internal(err.into())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> ApiError {
        ApiError::Internal(err)
    }
}

impl From<RegisterError> for ApiError {
    fn from(err: RegisterError) -> ApiError {
        match err {
            RegisterError::AlreadyRegistered => {
                ApiError::validation("event_id, participant_id", &err.to_string())
            }
            RegisterError::CapacityFull => ApiError::validation("capacity", &err.to_string()),
            RegisterError::Db(db) => ApiError::Internal(db.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn not_found_wire_shape() {
        let (status, body) = body_json(ApiError::NotFound.into_response()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "Item Not Found" }));
    }

    #[tokio::test]
    async fn validation_wire_shape() {
        let err = ApiError::validation("name", "name is required.");
        let (status, body) = body_json(err.into_response()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body,
            json!({
                "message": "Invalid data",
                "errors": { "name": ["name is required."] }
            })
        );
    }

    #[tokio::test]
    async fn refused_registrations_map_to_field_errors() {
        let err = ApiError::from(RegisterError::CapacityFull);
        let (status, body) = body_json(err.into_response()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body["errors"],
            json!({ "capacity": ["The event reached it's maximum capacity"] })
        );

        let err = ApiError::from(RegisterError::AlreadyRegistered);
        let (_, body) = body_json(err.into_response()).await;
        assert_eq!(
            body["errors"],
            json!({ "event_id, participant_id": ["Already reserved a seat for the event"] })
        );
    }
}
