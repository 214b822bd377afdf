use crate::antifraud::{
    auth::{self, Credentials},
    client::{ApiClient, Service},
    error::Error,
    store::SessionStore,
};
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{instrument, warn};

/// Event emitted when an exam attempt starts.
pub static START_SIMULATION: &str = "START_SIMULATION";

/// Page sizes and event filters for the broker, fixed at construction.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Maximum sessions per page on list
    pub sessions_per_page: u32,
    /// Maximum session events per page on list
    pub session_events_per_page: u32,
    /// Page size used to approximate "all sessions of one quiz" until the
    /// remote API grows real unbounded retrieval
    pub quiz_scan_page_size: u32,
    /// Event types excluded upstream to reduce server load
    pub ignored_events: Vec<String>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            sessions_per_page: 20,
            session_events_per_page: 50,
            quiz_scan_page_size: 9999,
            ignored_events: vec!["UI_EVENT".to_string()],
        }
    }
}

impl BrokerConfig {
    fn list_page_size(&self, quiz_filtered: bool) -> u32 {
        if quiz_filtered {
            self.quiz_scan_page_size
        } else {
            self.sessions_per_page
        }
    }
}

/// Session handle returned to the caller for the lifetime of one exam
/// attempt.
///
/// Carries the student token so follow-up events can be submitted without a
/// second sign-in.
#[derive(Debug, Clone, Serialize)]
pub struct SessionContext {
    pub session_id: String,
    pub token: String,
}

/// Mediates all session operations between exam-platform data and the
/// remote antifraud API.
pub struct SessionBroker {
    client: ApiClient,
    credentials: Credentials,
    config: BrokerConfig,
    store: Arc<dyn SessionStore>,
}

impl SessionBroker {
    #[must_use]
    pub fn new(
        client: ApiClient,
        credentials: Credentials,
        config: BrokerConfig,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            client,
            credentials,
            config,
            store,
        }
    }

    /// Create an antifraud session for one quiz attempt.
    ///
    /// The local record is written only after the remote creation
    /// succeeded.
    /// # Errors
    /// `Error::Auth` when the student sign-in fails, `Error::Network` when
    /// the remote creation fails, `Error::Persistence` when the local
    /// record cannot be written.
    #[instrument(skip(self))]
    pub async fn create(&self, user_id: i64, quiz_id: i64) -> Result<SessionContext, Error> {
        let token = auth::student_login(&self.client, &self.credentials, user_id).await?;

        let body = self
            .client
            .send(
                Method::POST,
                Service::Student,
                "antifraud/sessions/create",
                None,
                Some(&token),
            )
            .await?;

        let session_id = session_id_from(&body)?;

        self.store.insert(quiz_id, &session_id).await?;

        Ok(SessionContext { session_id, token })
    }

    /// List antifraud sessions, optionally scoped to one quiz.
    ///
    /// With a quiz filter the page size covers the whole quiz and the
    /// locally stored session ids are attached under `sessions_per_quiz`.
    /// # Errors
    /// `Error::Auth`, `Error::Network` or `Error::Persistence` depending on
    /// the failing collaborator.
    #[instrument(skip(self))]
    pub async fn list(&self, page: u32, quiz_id: Option<i64>) -> Result<Value, Error> {
        let token = auth::staff_login(&self.client, &self.credentials).await?;

        let per_page = self.config.list_page_size(quiz_id.is_some());
        let path = format!("cms/v1/antifraud_sessions?page={page}&paginates_per={per_page}");

        let body = self
            .client
            .send(Method::GET, Service::Cms, &path, None, Some(&token))
            .await?;

        let mut content = content_from(body, &path)?;

        if let Some(quiz_id) = quiz_id {
            let sessions_per_quiz = self.store.session_ids_for_quiz(quiz_id).await?;

            match content.as_object_mut() {
                Some(map) => {
                    map.insert("sessions_per_quiz".to_string(), json!(sessions_per_quiz));
                }
                None => {
                    return Err(Error::Network {
                        url: path,
                        status: None,
                        message: "list payload is not an object".to_string(),
                    });
                }
            }
        }

        Ok(content)
    }

    /// Show one antifraud session by its remote id.
    /// # Errors
    /// `Error::Auth` or `Error::Network`.
    #[instrument(skip(self))]
    pub async fn show(&self, id: &str) -> Result<Value, Error> {
        let token = auth::staff_login(&self.client, &self.credentials).await?;

        let path = format!("cms/v1/antifraud_sessions/{id}");

        let body = self
            .client
            .send(Method::GET, Service::Cms, &path, None, Some(&token))
            .await?;

        content_from(body, &path)
    }

    /// List a session's events, always excluding the configured noisy types
    /// upstream.
    /// # Errors
    /// `Error::Auth` or `Error::Network`.
    #[instrument(skip(self))]
    pub async fn events(&self, session_id: &str, page: u32) -> Result<Value, Error> {
        let token = auth::staff_login(&self.client, &self.credentials).await?;

        let except = self.config.ignored_events.join(",");
        let path = format!(
            "cms/v1/antifraud_sessions/{session_id}/events?except={except}&page={page}&paginates_per={}",
            self.config.session_events_per_page
        );

        let body = self
            .client
            .send(Method::GET, Service::Cms, &path, None, Some(&token))
            .await?;

        content_from(body, &path)
    }

    /// Submit a proctoring event with a caller-supplied student token.
    ///
    /// The event date is stamped in UTC regardless of host timezone.
    /// # Errors
    /// `Error::Validation` when the event type is rejected before any
    /// remote traffic, `Error::Network` when the submission fails.
    #[instrument(skip(self, student_token))]
    pub async fn create_event(
        &self,
        student_token: &str,
        session_id: &str,
        event_type: &str,
    ) -> Result<(), Error> {
        validate_event_type(event_type)?;

        let body = event_body(event_type, session_id, Utc::now());

        self.client
            .send(
                Method::POST,
                Service::Events,
                "events",
                Some(&body),
                Some(student_token),
            )
            .await?;

        Ok(())
    }

    /// Create a session and emit the start event for one exam attempt.
    ///
    /// A failed start event leaves the session usable; it is logged, not
    /// fatal.
    /// # Errors
    /// Same as [`SessionBroker::create`].
    #[instrument(skip(self))]
    pub async fn start_attempt(&self, user_id: i64, quiz_id: i64) -> Result<SessionContext, Error> {
        let context = self.create(user_id, quiz_id).await?;

        if let Err(e) = self
            .create_event(&context.token, &context.session_id, START_SIMULATION)
            .await
        {
            warn!(
                "start event for session {} not delivered: {}",
                context.session_id, e
            );
        }

        Ok(context)
    }
}

// The remote create endpoint answers with the new id at the body root;
// the CMS endpoints wrap their payloads in a content envelope.
fn session_id_from(body: &Value) -> Result<String, Error> {
    match &body["id"] {
        Value::String(id) => Ok(id.clone()),
        Value::Number(id) => Ok(id.to_string()),
        _ => Err(Error::Network {
            url: "antifraud/sessions/create".to_string(),
            status: None,
            message: "no id in create response".to_string(),
        }),
    }
}

fn content_from(body: Value, path: &str) -> Result<Value, Error> {
    match body {
        Value::Object(mut map) => map.remove("content").ok_or_else(|| Error::Network {
            url: path.to_string(),
            status: None,
            message: "no content in response".to_string(),
        }),
        _ => Err(Error::Network {
            url: path.to_string(),
            status: None,
            message: "response is not an object".to_string(),
        }),
    }
}

fn validate_event_type(event_type: &str) -> Result<(), Error> {
    let mut chars = event_type.chars();

    let valid_start = chars.next().map_or(false, |c| c.is_ascii_uppercase());
    let valid_rest = chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');

    if !valid_start || !valid_rest || event_type.len() > 64 {
        return Err(Error::Validation(
            "event type must be upper snake case, at most 64 characters",
        ));
    }

    Ok(())
}

fn event_body(event_type: &str, session_id: &str, date: DateTime<Utc>) -> Value {
    json!({
        "event": {
            "type": event_type,
            "date": date.format("%Y-%m-%d %H:%M:%S").to_string(),
            "isAntifraud": true,
            "antifraudId": session_id,
            "read": false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_event_body_shape() {
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();

        let body = event_body("FOCUS_LOST", "abc123", date);

        assert_eq!(body["event"]["type"], "FOCUS_LOST");
        assert_eq!(body["event"]["date"], "2024-05-01 12:30:00");
        assert_eq!(body["event"]["isAntifraud"], true);
        assert_eq!(body["event"]["antifraudId"], "abc123");
        assert_eq!(body["event"]["read"], false);
    }

    #[test]
    fn test_validate_event_type() {
        assert!(validate_event_type("START_SIMULATION").is_ok());
        assert!(validate_event_type("UI_EVENT").is_ok());
        assert!(validate_event_type("V2").is_ok());

        assert!(validate_event_type("").is_err());
        assert!(validate_event_type("focus_lost").is_err());
        assert!(validate_event_type("BAD-TYPE").is_err());
        assert!(validate_event_type("9LIVES").is_err());
        assert!(validate_event_type(&"A".repeat(65)).is_err());
    }

    #[test]
    fn test_list_page_size() {
        let config = BrokerConfig::default();

        assert_eq!(config.list_page_size(false), 20);
        assert_eq!(config.list_page_size(true), 9999);
    }

    #[test]
    fn test_session_id_from_string_or_number() {
        assert_eq!(
            session_id_from(&json!({"id": "abc123"})).unwrap(),
            "abc123"
        );
        assert_eq!(session_id_from(&json!({"id": 42})).unwrap(), "42");

        let err = session_id_from(&json!({"status": "ok"})).unwrap_err();
        assert!(matches!(err, Error::Network { .. }));
    }

    #[test]
    fn test_content_from_envelope() {
        let body = json!({"id": 7, "content": {"sessions": []}});

        assert_eq!(
            content_from(body, "cms/v1/antifraud_sessions").unwrap(),
            json!({"sessions": []})
        );

        let err = content_from(json!({"id": 7}), "cms/v1/antifraud_sessions").unwrap_err();
        assert!(matches!(err, Error::Network { .. }));
    }
}
