use crate::api::handlers::sessions::SessionOutcome;
use crate::antifraud::SessionBroker;
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct StartAttempt {
    pub user_id: i64,
    pub quiz_id: i64,
}

/// Create a session for an exam attempt and emit its start event.
#[utoipa::path(
    post,
    path = "/attempts",
    request_body = StartAttempt,
    responses(
        (status = 200, description = "Outcome of the attempt start", body = SessionOutcome, content_type = "application/json"),
        (status = 400, description = "Missing payload"),
    ),
    tag = "attempts"
)]
#[instrument(skip(broker))]
pub async fn start(
    Extension(broker): Extension<Arc<SessionBroker>>,
    payload: Option<Json<StartAttempt>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    match broker.start_attempt(request.user_id, request.quiz_id).await {
        Ok(context) => Json(SessionOutcome::granted(context)).into_response(),
        Err(e) => {
            error!("Attempt start failed: {}", e);

            Json(SessionOutcome::denied()).into_response()
        }
    }
}
