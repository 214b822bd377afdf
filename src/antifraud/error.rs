use thiserror::Error;

/// Failure kinds of the session broker.
///
/// The caller decides which kinds are fatal for its own flow; nothing in
/// this module terminates the process or swallows a failure.
#[derive(Debug, Error)]
pub enum Error {
    /// Token acquisition failed.
    #[error("{role} sign-in failed: {message}")]
    Auth { role: &'static str, message: String },

    /// A remote call failed in transport, returned a non-success status, or
    /// answered with a body the broker could not use.
    #[error("{url} - {message}")]
    Network {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// The local session store failed.
    #[error("session store failure: {0}")]
    Persistence(#[from] sqlx::Error),

    /// Caller-supplied data was rejected before any remote traffic.
    #[error("{0}")]
    Validation(&'static str),
}

impl Error {
    /// Wrap a failed sign-in call, keeping the underlying cause in the message.
    #[must_use]
    pub fn auth(role: &'static str, source: Error) -> Self {
        Self::Auth {
            role,
            message: source.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_wraps_network_cause() {
        let network = Error::Network {
            url: "https://cms.antifraud.tld/cms/v1/auth/sign_in".to_string(),
            status: Some(401),
            message: "401 Unauthorized, bad credentials".to_string(),
        };

        let auth = Error::auth("staff", network);

        let rendered = auth.to_string();
        assert!(rendered.starts_with("staff sign-in failed"));
        assert!(rendered.contains("bad credentials"));
    }
}
