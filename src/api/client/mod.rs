//! Client module
//!
//! This module provides HTTP client functionality to interact with the fragments service.

mod auth;
mod http;
mod transport;

// Re-export the client, its collaborators and types
pub use auth::{Anonymous, AuthProvider, BearerToken};
pub use http::{ClientConfig, ClientError, FragmentsClient, Operation, API_URL_ENV, DEFAULT_BASE_URL};
pub use transport::{ReqwestTransport, Transport, TransportError, TransportRequest, TransportResponse};
