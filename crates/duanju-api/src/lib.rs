//! Client for the short-drama catalog API.
//!
//! [`CatalogClient`] is the HTTP adapter: it owns the connection pool and
//! normalizes every outcome into either a JSON payload or an [`ApiError`].
//! [`Gateway`] layers the six catalog verbs on top of it.

pub mod client;
pub mod error;
pub mod gateway;
pub mod types;

pub use client::{CatalogClient, Endpoint, DEFAULT_BASE_URL};
pub use error::{ApiError, GatewayError};
pub use gateway::{Gateway, Verb};
