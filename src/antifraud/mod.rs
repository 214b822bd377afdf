//! Integration with the remote antifraud platform.
//!
//! The broker signs a student or staff identity in, drives the session
//! endpoints with the obtained bearer token, and keeps a local audit index
//! of which session was created for which quiz. Tokens are obtained per
//! call and never persisted.

pub mod auth;
pub mod client;
pub mod error;
pub mod session;
pub mod store;

pub use client::{ApiClient, Endpoints, Service};
pub use error::Error;
pub use session::{BrokerConfig, SessionBroker, SessionContext};
pub use store::{MemorySessionStore, PgSessionStore, SessionStore};
