use crate::antifraud::{Error, SessionBroker, SessionContext};
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::{IntoParams, ToSchema};

static UNABLE_TO_LIST: &str = "Unable to list sessions. Check your credentials in the settings section.";
static UNABLE_TO_SHOW: &str = "Unable to get session details";
static UNABLE_TO_EVENTS: &str = "Unable to get session events";

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CreateSession {
    pub user_id: i64,
    pub quiz_id: i64,
}

/// Outcome shape shared by session creation and attempt start.
///
/// Callers degrade gracefully on a denied outcome, so failures answer 200
/// with `success: false` instead of an error status.
#[derive(ToSchema, Serialize, Debug)]
pub struct SessionOutcome {
    pub success: bool,
    pub session_id: Option<String>,
    pub token: Option<String>,
}

impl SessionOutcome {
    #[must_use]
    pub fn granted(context: SessionContext) -> Self {
        Self {
            success: true,
            session_id: Some(context.session_id),
            token: Some(context.token),
        }
    }

    #[must_use]
    pub fn denied() -> Self {
        Self {
            success: false,
            session_id: None,
            token: None,
        }
    }
}

#[utoipa::path(
    post,
    path = "/sessions",
    request_body = CreateSession,
    responses(
        (status = 200, description = "Outcome of the session creation", body = SessionOutcome, content_type = "application/json"),
        (status = 400, description = "Missing payload"),
    ),
    tag = "sessions"
)]
#[instrument(skip(broker))]
pub async fn create(
    Extension(broker): Extension<Arc<SessionBroker>>,
    payload: Option<Json<CreateSession>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    match broker.create(request.user_id, request.quiz_id).await {
        Ok(context) => Json(SessionOutcome::granted(context)).into_response(),
        Err(e) => {
            error!("Session creation failed: {}", e);

            Json(SessionOutcome::denied()).into_response()
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListQuery {
    /// Page wanted (default 1)
    pub page: Option<u32>,
    /// Restrict to one quiz and attach its locally stored session ids
    pub quiz_id: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/sessions",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of sessions", content_type = "application/json"),
        (status = 502, description = "Listing failed"),
    ),
    tag = "sessions"
)]
#[instrument(skip(broker))]
pub async fn list(
    Extension(broker): Extension<Arc<SessionBroker>>,
    Query(query): Query<ListQuery>,
) -> Response {
    match broker.list(query.page.unwrap_or(1), query.quiz_id).await {
        Ok(content) => Json(content).into_response(),
        Err(e) => {
            error!("Session listing failed: {}", e);

            (StatusCode::BAD_GATEWAY, UNABLE_TO_LIST).into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/sessions/{id}",
    params(("id" = String, Path, description = "Remote session id")),
    responses(
        (status = 200, description = "Session details", content_type = "application/json"),
        (status = 502, description = "Lookup failed"),
    ),
    tag = "sessions"
)]
#[instrument(skip(broker))]
pub async fn show(
    Extension(broker): Extension<Arc<SessionBroker>>,
    Path(id): Path<String>,
) -> Response {
    match broker.show(&id).await {
        Ok(content) => Json(content).into_response(),
        Err(e) => {
            error!("Session lookup failed: {}", e);

            (StatusCode::BAD_GATEWAY, UNABLE_TO_SHOW).into_response()
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct EventsQuery {
    /// Page wanted (default 1)
    pub page: Option<u32>,
}

#[utoipa::path(
    get,
    path = "/sessions/{id}/events",
    params(
        ("id" = String, Path, description = "Remote session id"),
        EventsQuery,
    ),
    responses(
        (status = 200, description = "One page of session events", content_type = "application/json"),
        (status = 502, description = "Event listing failed"),
    ),
    tag = "sessions"
)]
#[instrument(skip(broker))]
pub async fn events(
    Extension(broker): Extension<Arc<SessionBroker>>,
    Path(id): Path<String>,
    Query(query): Query<EventsQuery>,
) -> Response {
    match broker.events(&id, query.page.unwrap_or(1)).await {
        Ok(content) => Json(content).into_response(),
        Err(e) => {
            error!("Session event listing failed: {}", e);

            (StatusCode::BAD_GATEWAY, UNABLE_TO_EVENTS).into_response()
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SubmitEvent {
    /// Student token returned by session creation
    pub token: String,
    pub event_type: String,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct EventOutcome {
    pub created: bool,
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/events",
    params(("id" = String, Path, description = "Remote session id")),
    request_body = SubmitEvent,
    responses(
        (status = 200, description = "Whether the event was created", body = EventOutcome, content_type = "application/json"),
        (status = 400, description = "Missing payload"),
        (status = 422, description = "Invalid event type"),
    ),
    tag = "sessions"
)]
#[instrument(skip(broker, payload))]
pub async fn submit_event(
    Extension(broker): Extension<Arc<SessionBroker>>,
    Path(id): Path<String>,
    payload: Option<Json<SubmitEvent>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    match broker
        .create_event(&request.token, &id, &request.event_type)
        .await
    {
        Ok(()) => Json(EventOutcome { created: true }).into_response(),
        Err(Error::Validation(message)) => {
            (StatusCode::UNPROCESSABLE_ENTITY, message).into_response()
        }
        Err(e) => {
            error!("Event submission failed: {}", e);

            Json(EventOutcome { created: false }).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_denied_outcome_shape() {
        let outcome = serde_json::to_value(SessionOutcome::denied()).unwrap();

        assert_eq!(
            outcome,
            json!({"success": false, "session_id": null, "token": null})
        );
    }

    #[test]
    fn test_granted_outcome_shape() {
        let context = SessionContext {
            session_id: "abc123".to_string(),
            token: "student-token".to_string(),
        };

        let outcome = serde_json::to_value(SessionOutcome::granted(context)).unwrap();

        assert_eq!(
            outcome,
            json!({"success": true, "session_id": "abc123", "token": "student-token"})
        );
    }
}
