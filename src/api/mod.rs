//! API module
//!
//! This module provides the API functionality for the fragments client:
//! the HTTP client and the collaborators it depends on.

pub mod client;

// Re-export commonly used types
pub use client::{
    Anonymous, AuthProvider, BearerToken, ClientConfig, ClientError, FragmentsClient, Operation,
    ReqwestTransport, Transport, TransportError,
};
