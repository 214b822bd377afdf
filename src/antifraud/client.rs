use crate::{antifraud::error::Error, APP_USER_AGENT};
use anyhow::{anyhow, Result};
use reqwest::{Client, Method};
use serde_json::Value;
use std::{fmt, time::Duration};
use tracing::{debug, instrument};
use url::Url;

/// Named upstream services of the antifraud platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Student,
    Cms,
    Events,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Student => write!(f, "student"),
            Self::Cms => write!(f, "cms"),
            Self::Events => write!(f, "events"),
        }
    }
}

/// Base URLs for the named services, validated at startup.
#[derive(Debug, Clone)]
pub struct Endpoints {
    student: Url,
    cms: Url,
    events: Url,
}

impl Endpoints {
    /// # Errors
    /// Returns an error if a base URL cannot be parsed or uses an
    /// unsupported scheme.
    pub fn new(student: &str, cms: &str, events: &str) -> Result<Self> {
        Ok(Self {
            student: base_url(student)?,
            cms: base_url(cms)?,
            events: base_url(events)?,
        })
    }

    fn base(&self, service: Service) -> &Url {
        match service {
            Service::Student => &self.student,
            Service::Cms => &self.cms,
            Service::Events => &self.events,
        }
    }
}

fn base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(anyhow!("Error parsing URL: unsupported scheme {}", scheme)),
    }
}

/// HTTP client over the named antifraud services.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    endpoints: Endpoints,
}

impl ApiClient {
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(endpoints: Endpoints) -> Result<Self> {
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { http, endpoints })
    }

    #[must_use]
    pub fn endpoint_url(&self, service: Service, path: &str) -> String {
        let base = self.endpoints.base(service).as_str().trim_end_matches('/');

        format!("{base}/{}", path.trim_start_matches('/'))
    }

    /// Send a request to one of the named services, attaching the bearer
    /// token when given, and return the decoded JSON body.
    /// # Errors
    /// Returns `Error::Network` on transport failure, a non-success status
    /// (carrying the upstream `errors` message when present), or an
    /// undecodable body.
    #[instrument(skip(self, body, bearer))]
    pub async fn send(
        &self,
        method: Method,
        service: Service,
        path: &str,
        body: Option<&Value>,
        bearer: Option<&str>,
    ) -> Result<Value, Error> {
        let url = self.endpoint_url(service, path);

        debug!("{} {}", method, url);

        let mut request = self.http.request(method, &url);

        if let Some(body) = body {
            request = request.json(body);
        }

        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| Error::Network {
            url: url.clone(),
            status: None,
            message: e.to_string(),
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let json_response: Value = response.json().await.unwrap_or(Value::Null);

            return Err(Error::Network {
                url,
                status: Some(status.as_u16()),
                message: format!(
                    "{}, {}",
                    status,
                    json_response["errors"][0].as_str().unwrap_or("")
                ),
            });
        }

        response.json().await.map_err(|e| Error::Network {
            url,
            status: None,
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        let endpoints = Endpoints::new(
            "https://student.antifraud.tld",
            "https://cms.antifraud.tld/",
            "http://localhost:4000",
        )
        .unwrap();

        ApiClient::new(endpoints).unwrap()
    }

    #[test]
    fn test_endpoint_url_joins_paths() {
        let client = client();

        assert_eq!(
            client.endpoint_url(Service::Student, "antifraud/sessions/create"),
            "https://student.antifraud.tld/antifraud/sessions/create"
        );
        assert_eq!(
            client.endpoint_url(Service::Cms, "/cms/v1/antifraud_sessions?page=1"),
            "https://cms.antifraud.tld/cms/v1/antifraud_sessions?page=1"
        );
        assert_eq!(
            client.endpoint_url(Service::Events, "events"),
            "http://localhost:4000/events"
        );
    }

    #[test]
    fn test_endpoints_reject_unsupported_scheme() {
        let result = Endpoints::new(
            "ftp://student.antifraud.tld",
            "https://cms.antifraud.tld",
            "https://events.antifraud.tld",
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_endpoints_reject_garbage() {
        let result = Endpoints::new(
            "not a url",
            "https://cms.antifraud.tld",
            "https://events.antifraud.tld",
        );

        assert!(result.is_err());
    }
}
