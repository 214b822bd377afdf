use crate::api::handlers::{attempts, health, sessions};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        attempts::start,
        sessions::create,
        sessions::list,
        sessions::show,
        sessions::events,
        sessions::submit_event,
    ),
    components(schemas(
        attempts::StartAttempt,
        sessions::CreateSession,
        sessions::SessionOutcome,
        sessions::SubmitEvent,
        sessions::EventOutcome,
    )),
    tags(
        (name = "sessions", description = "Antifraud session brokering"),
        (name = "attempts", description = "Exam attempt lifecycle"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;
