use crate::antifraud::{
    client::{ApiClient, Service},
    error::Error,
};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::instrument;

static STUDENT_SIGN_IN: &str = "auth/v1/students/sign_in";
static STAFF_SIGN_IN: &str = "cms/v1/auth/sign_in";

/// Credentials for the two remote identities, loaded at startup.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: SecretString,
    pub staff_email: String,
    pub staff_password: SecretString,
}

/// Obtain a student-scoped bearer token for one exam-platform user.
/// # Errors
/// Returns `Error::Auth` when the sign-in call fails or yields no token.
#[instrument(skip(client, credentials))]
pub async fn student_login(
    client: &ApiClient,
    credentials: &Credentials,
    user_id: i64,
) -> Result<String, Error> {
    let payload = json!({
        "user_id": user_id,
        "api_key": credentials.api_key.expose_secret(),
    });

    let body = client
        .send(
            Method::POST,
            Service::Student,
            STUDENT_SIGN_IN,
            Some(&payload),
            None,
        )
        .await
        .map_err(|e| Error::auth("student", e))?;

    token_from(&body, "student")
}

/// Obtain a staff-scoped bearer token with the configured credentials.
/// # Errors
/// Returns `Error::Auth` when the sign-in call fails or yields no token.
#[instrument(skip(client, credentials))]
pub async fn staff_login(client: &ApiClient, credentials: &Credentials) -> Result<String, Error> {
    let payload = json!({
        "email": credentials.staff_email,
        "password": credentials.staff_password.expose_secret(),
    });

    let body = client
        .send(
            Method::POST,
            Service::Cms,
            STAFF_SIGN_IN,
            Some(&payload),
            None,
        )
        .await
        .map_err(|e| Error::auth("staff", e))?;

    token_from(&body, "staff")
}

fn token_from(body: &Value, role: &'static str) -> Result<String, Error> {
    body["token"]
        .as_str()
        .map(ToString::to_string)
        .ok_or_else(|| Error::Auth {
            role,
            message: "no token in sign-in response".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_from_body() {
        let body = json!({"token": "abc"});

        assert_eq!(token_from(&body, "student").unwrap(), "abc");
    }

    #[test]
    fn test_token_from_missing() {
        let body = json!({"user": {"id": 5}});

        let err = token_from(&body, "staff").unwrap_err();
        assert!(matches!(err, Error::Auth { role: "staff", .. }));
    }
}
