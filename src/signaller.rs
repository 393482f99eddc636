pub mod limiter;
pub mod transport;

use std::sync::{Arc, RwLock};

use reqwest::Method;
use serde_json::Value;

use crate::settings::Settings;
use limiter::{RateLimiter, RetryPolicy};
pub use transport::{OutboundRequest, RawResponse, ReqwestTransport, Transport};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SignalError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("server still answering {status} after {attempts} attempts")]
    RetriesExhausted { status: u16, attempts: u32 },
}

/// Whether the bearer token should be attached to a request
#[derive(strum_macros::Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    Bearer,
    Anonymous,
}

/// The access token shared by every request. Readers take a snapshot, so a request
/// in flight is unaffected by a concurrent login.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    token: Arc<RwLock<Option<String>>>,
}

impl Credentials {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: Arc::new(RwLock::new(token)),
        }
    }

    pub fn set(&self, token: String) {
        match self.token.write() {
            Ok(mut guard) => *guard = Some(token),
            Err(poisoned) => *poisoned.into_inner() = Some(token),
        }
    }

    pub fn get(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Issues every request to the game server: attaches headers and auth,
/// enforces the client-side rate limit and waits out 429/502 responses.
/// Response bodies are handed back uninterpreted.
#[derive(Clone)]
pub struct Signaller {
    transport: Arc<dyn Transport>,
    base_url: String,
    credentials: Credentials,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl Signaller {
    pub fn new(transport: Arc<dyn Transport>, settings: &Settings, credentials: Credentials) -> Self {
        Self {
            transport,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            credentials,
            limiter: Arc::new(RateLimiter::new(&settings.rate_limit)),
            retry: RetryPolicy::new(&settings.retry),
        }
    }

    pub fn from_settings(settings: &Settings, credentials: Credentials) -> Result<Self, SignalError> {
        let transport = ReqwestTransport::new(settings.timeout())?;
        Ok(Self::new(Arc::new(transport), settings, credentials))
    }

    pub fn set_token(&self, token: String) {
        tracing::info!("Access token updated");
        self.credentials.set(token);
    }

    pub fn token(&self) -> Option<String> {
        self.credentials.get()
    }

    pub async fn get(&self, path: &str) -> Result<RawResponse, SignalError> {
        self.request(Method::GET, path, None).await
    }

    /// For public endpoints, which never see the bearer token
    pub async fn get_anonymous(&self, path: &str) -> Result<RawResponse, SignalError> {
        self.request_anonymous(Method::GET, path, None).await
    }

    /// Sends an authenticated request, if a token is set
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<RawResponse, SignalError> {
        self.dispatch(method, path, body, Auth::Bearer).await
    }

    /// Sends a request without the bearer token, used for registration
    /// before any token exists and for public endpoints
    pub async fn request_anonymous(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<RawResponse, SignalError> {
        self.dispatch(method, path, body, Auth::Anonymous).await
    }

    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        auth: Auth,
    ) -> Result<RawResponse, SignalError> {
        let request = self.prepare(method, path, body, auth);
        let mut retries = 0;
        loop {
            self.limiter.acquire().await;
            tracing::debug!("{} {} ({})", request.method, request.url, auth);
            let response = self.transport.send(request.clone()).await?;
            if !response.is_transient() {
                tracing::debug!("{} {} -> {}", request.method, request.url, response.status);
                return Ok(response);
            }
            if retries >= self.retry.max_retries {
                tracing::warn!(
                    "{} {} still {} after {} retries, giving up",
                    request.method,
                    request.url,
                    response.status,
                    retries
                );
                return Err(SignalError::RetriesExhausted {
                    status: response.status,
                    attempts: retries + 1,
                });
            }
            let delay = self.retry.delay(retries, response.retry_after);
            tracing::info!(
                "{} {} answered {}, retrying in {:?}",
                request.method,
                request.url,
                response.status,
                delay
            );
            tokio::time::sleep(delay).await;
            retries += 1;
        }
    }

    fn prepare(&self, method: Method, path: &str, body: Option<Value>, auth: Auth) -> OutboundRequest {
        let mut headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ];
        if auth == Auth::Bearer {
            if let Some(token) = self.credentials.get() {
                headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
            }
        }
        OutboundRequest {
            method,
            url: format!("{}/{}", self.base_url, path.trim_start_matches('/')),
            headers,
            body,
        }
    }
}
