//! HTTP surface
//!
//! Handlers only pull values out of the request and hand them to
//! [`StudentService`]. The envelope `code` becomes the response status.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET | `/user/findAll` | list all |
//! | POST | `/user/insertOne` | create |
//! | PUT | `/user/updateOne/:sid` | update by account |
//! | GET | `/user/validate/:account` | check an identifier |
//! | GET | `/user/audit/seats` | duplicate seat numbers |
//! | GET | `/user/:field/:value` | query by field |
//! | PUT | `/user/:id` | update by id |
//! | DELETE | `/user/:id` | delete by id |
//! | GET | `/health` | store connectivity |

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::envelope::Envelope;
use crate::error::Error;
use crate::model::{NewStudent, Student, StudentPatch};
use crate::seat::{SeatConflict, ValidationOutcome};
use crate::service::StudentService;

type SharedService = Arc<StudentService>;

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Store connectivity as reported by `/health`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub connected: bool,
}

/// Build the router over a shared service
pub fn app(service: SharedService) -> Router {
    // Path parameters at the same depth share a name; static segments win.
    Router::new()
        .route("/health", get(health))
        .route("/user/findAll", get(find_all))
        .route("/user/insertOne", post(insert_one))
        .route("/user/updateOne/:sid", put(update_one))
        .route("/user/validate/:account", get(validate))
        .route("/user/audit/seats", get(audit_seats))
        .route("/user/:key/:value", get(find_by_field))
        .route("/user/:key", put(update_by_id).delete(delete_by_id))
        .with_state(service)
}

/// Bind and serve until the process is stopped
pub async fn serve(service: SharedService, bind: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app(service)).await?;
    Ok(())
}

fn invalid_json<T>(rejection: &JsonRejection) -> Envelope<T> {
    let err = Error::InvalidPayload {
        message: rejection.body_text(),
    };
    Envelope::from_error("decode request", &err)
}

async fn health(State(service): State<SharedService>) -> Envelope<Health> {
    let connected = service.is_connected();
    let health = Health { connected };
    if connected {
        Envelope::ok("ok", health)
    } else {
        Envelope {
            code: StatusCode::SERVICE_UNAVAILABLE.as_u16(),
            message: Error::StoreUnavailable.to_string(),
            body: Some(health),
        }
    }
}

async fn find_all(State(service): State<SharedService>) -> Envelope<Vec<Student>> {
    service.list_all().await
}

async fn insert_one(
    State(service): State<SharedService>,
    payload: Result<Json<NewStudent>, JsonRejection>,
) -> Envelope<Student> {
    match payload {
        Ok(Json(input)) => service.create(input).await,
        Err(rejection) => invalid_json(&rejection),
    }
}

async fn update_one(
    State(service): State<SharedService>,
    Path(sid): Path<String>,
    payload: Result<Json<StudentPatch>, JsonRejection>,
) -> Envelope<Student> {
    match payload {
        Ok(Json(patch)) => service.update_by_key(&sid, patch).await,
        Err(rejection) => invalid_json(&rejection),
    }
}

async fn validate(
    State(service): State<SharedService>,
    Path(account): Path<String>,
) -> Envelope<ValidationOutcome> {
    service.validate_identifier(&account).await
}

async fn audit_seats(State(service): State<SharedService>) -> Envelope<Vec<SeatConflict>> {
    service.audit_seats().await
}

async fn find_by_field(
    State(service): State<SharedService>,
    Path((field, value)): Path<(String, String)>,
) -> Envelope<Vec<Student>> {
    service.find_by_field(&field, &value).await
}

async fn update_by_id(
    State(service): State<SharedService>,
    Path(id): Path<String>,
    payload: Result<Json<StudentPatch>, JsonRejection>,
) -> Envelope<Student> {
    match payload {
        Ok(Json(patch)) => service.update_by_id(&id, patch).await,
        Err(rejection) => invalid_json(&rejection),
    }
}

async fn delete_by_id(
    State(service): State<SharedService>,
    Path(id): Path<String>,
) -> Envelope<Student> {
    service.delete_by_id(&id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_code_becomes_status() {
        let response = Envelope::<()>::empty(404, "student not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = Envelope::ok("find success", Vec::<Student>::new()).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_out_of_range_code_is_500() {
        let response = Envelope::<()>::empty(42, "odd").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
