//! Authorization capability
//!
//! Sign-in and token storage live outside this crate. The client only needs
//! something that can hand it the current authorization headers, and asks for
//! them again on every request.

use std::sync::{Arc, RwLock};

use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue, AUTHORIZATION};

/// Supplies per-request authorization headers
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    /// The current header set, normally including `Authorization`
    async fn authorization_headers(&self) -> HeaderMap;
}

/// No credentials at all
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

#[async_trait::async_trait]
impl AuthProvider for Anonymous {
    async fn authorization_headers(&self) -> HeaderMap {
        HeaderMap::new()
    }
}

/// A bearer token that can be swapped while the client is in use
#[derive(Debug, Clone)]
pub struct BearerToken {
    value: Arc<RwLock<HeaderValue>>,
}

impl BearerToken {
    pub fn new(token: &str) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            value: Arc::new(RwLock::new(bearer_value(token)?)),
        })
    }

    /// Replaces the token; the next request picks it up
    pub fn rotate(&self, token: &str) -> Result<(), InvalidHeaderValue> {
        let value = bearer_value(token)?;
        match self.value.write() {
            Ok(mut guard) => *guard = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
        Ok(())
    }

    fn current(&self) -> HeaderValue {
        match self.value.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

fn bearer_value(token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
    value.set_sensitive(true);
    Ok(value)
}

#[async_trait::async_trait]
impl AuthProvider for BearerToken {
    async fn authorization_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, self.current());
        headers
    }
}

/// A fixed header set, e.g. from a test harness or a proxy
#[async_trait::async_trait]
impl AuthProvider for HeaderMap {
    async fn authorization_headers(&self) -> HeaderMap {
        self.clone()
    }
}
