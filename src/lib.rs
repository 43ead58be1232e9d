//! Fragments client library crate
//!
//! A typed client for the fragments content-storage service. Each operation
//! performs a single authenticated request against `/v1/fragments` and either
//! returns the decoded response or fails with a [`ClientError`].
//!
//! ```no_run
//! use fragments_client::{BearerToken, ClientConfig, FragmentsClient};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let client = FragmentsClient::with_config(ClientConfig::from_env())?;
//! let auth = BearerToken::new("id-token")?;
//!
//! let created = client
//!     .create_typed_fragment(&auth, "hello", "text/plain")
//!     .await?;
//! println!("stored at {:?}", created.location);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cli;
pub mod models;

pub use api::client::{
    Anonymous, AuthProvider, BearerToken, ClientConfig, ClientError, FragmentsClient, Operation,
    ReqwestTransport, Transport, TransportError, TransportRequest, TransportResponse,
};
pub use models::{CreatedFragment, Fragment, FragmentBody, FragmentList};
