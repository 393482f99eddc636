use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use super::SignalError;

/// A fully prepared request, headers included, ready to go on the wire
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// What came back from the server, uninterpreted
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    /// Parsed `Retry-After` header, if the server sent one
    pub retry_after: Option<Duration>,
    /// Parsed JSON body, `Value::Null` when the body was empty or not JSON
    pub body: Value,
    pub text: String,
}

impl RawResponse {
    pub fn new(status: u16, text: String) -> Self {
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            retry_after: None,
            body,
            text,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 429 Too Many Requests and 502 Bad Gateway are waited out, never surfaced
    pub fn is_transient(&self) -> bool {
        self.status == 429 || self.status == 502
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, SignalError>;
}

pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, SignalError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("spaceterminal/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SignalError::Network(e.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, SignalError> {
        let mut builder = self.http.request(request.method, &request.url);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(classify_reqwest_error)?;
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_retry_after);
        let text = response.text().await.map_err(classify_reqwest_error)?;

        let mut raw = RawResponse::new(status, text);
        raw.retry_after = retry_after;
        Ok(raw)
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> SignalError {
    if e.is_timeout() {
        SignalError::Timeout
    } else {
        SignalError::Network(e.to_string())
    }
}

/// Retry-After is given in (possibly fractional) seconds by the game server
fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

#[cfg(test)]
pub mod fake {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    impl OutboundRequest {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
        }
    }

    impl RawResponse {
        pub fn from_json(status: u16, body: Value) -> Self {
            Self {
                status,
                retry_after: None,
                text: body.to_string(),
                body,
            }
        }

        pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
            self.retry_after = Some(retry_after);
            self
        }
    }

    /// Scripted transport: replays queued outcomes in order and records every request
    #[derive(Default)]
    pub struct FakeTransport {
        script: Mutex<VecDeque<Result<RawResponse, SignalError>>>,
        sent: Mutex<Vec<OutboundRequest>>,
    }

    impl FakeTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, status: u16, body: Value) -> Self {
            self.push(Ok(RawResponse::from_json(status, body)));
            self
        }

        pub fn respond_raw(self, response: RawResponse) -> Self {
            self.push(Ok(response));
            self
        }

        pub fn fail(self, error: SignalError) -> Self {
            self.push(Err(error));
            self
        }

        fn push(&self, outcome: Result<RawResponse, SignalError>) {
            self.script.lock().unwrap().push_back(outcome);
        }

        pub fn sent(&self) -> Vec<OutboundRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn send(&self, request: OutboundRequest) -> Result<RawResponse, SignalError> {
            self.sent.lock().unwrap().push(request);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(SignalError::Network("script exhausted".to_string())))
        }
    }
}
