//! Scripted HTTP transport for tests.
//!
//! Every request is recorded. A handler closure decides the reply based on
//! the request, typically by matching on [`RecordedCall::method`] and
//! [`RecordedCall::attempt`].

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::traits::{HttpError, HttpRequest, HttpResponse, HttpTransport};

/// A request seen by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Full request URL.
    pub url: String,
    /// Last path segment of the URL (the API method).
    pub method: String,
    /// Parsed JSON body, if one was sent.
    pub body: Option<Value>,
    /// Request headers.
    pub headers: Vec<(String, String)>,
    /// Zero-based index of this call among calls to the same method.
    pub attempt: usize,
}

impl RecordedCall {
    /// Field of the JSON body.
    #[must_use]
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.body.as_ref().and_then(|b| b.get(name))
    }
}

type Handler = dyn Fn(&RecordedCall) -> Result<HttpResponse, HttpError> + Send + Sync;

/// Recording transport driven by a reply closure.
pub struct MockTransport {
    handler: Box<Handler>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    /// Create a transport that answers every request with `handler`.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&RecordedCall) -> Result<HttpResponse, HttpError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// All calls so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls to one API method, in order.
    #[must_use]
    pub fn calls_to(&self, method: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method)
            .collect()
    }

    /// Number of calls to one API method.
    #[must_use]
    pub fn count(&self, method: &str) -> usize {
        self.calls_to(method).len()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let method = request
            .url
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        let body = request
            .body
            .as_deref()
            .and_then(|b| serde_json::from_str(b).ok());

        let call = {
            let mut calls = self.calls.lock().unwrap();
            let attempt = calls.iter().filter(|c| c.method == method).count();
            let call = RecordedCall {
                url: request.url,
                method,
                body,
                headers: request.headers,
                attempt,
            };
            calls.push(call.clone());
            call
        };

        // Give concurrent callers a chance to interleave.
        tokio::task::yield_now().await;

        (self.handler)(&call)
    }
}

/// Successful reply wrapping `d` in the agent's envelope.
///
/// # Errors
/// Never; the `Result` matches the handler signature.
pub fn reply(d: Value) -> Result<HttpResponse, HttpError> {
    Ok(HttpResponse::new(200, json!({ "d": d }).to_string()))
}

/// Error reply with the agent's fault body.
///
/// # Errors
/// Never; the `Result` matches the handler signature.
pub fn fault(
    status: u16,
    message: Option<&str>,
    exception_type: Option<&str>,
) -> Result<HttpResponse, HttpError> {
    let mut body = serde_json::Map::new();
    if let Some(message) = message {
        body.insert("Message".into(), json!(message));
    }
    if let Some(exception_type) = exception_type {
        body.insert("ExceptionType".into(), json!(exception_type));
    }
    Ok(HttpResponse::new(status, Value::Object(body).to_string()))
}

#[cfg(test)]
mod tests {
    use tokio_test::assert_ok;

    use super::*;

    #[tokio::test]
    async fn test_records_calls_per_method() {
        let transport = MockTransport::new(|call| match call.attempt {
            0 => fault(500, Some("boom"), None),
            _ => reply(json!("ok")),
        });

        let request = HttpRequest::post("http://agent/API/v1/Json.asmx/ConnectApp");
        let first = assert_ok!(transport.post(request.clone()).await);
        let second = assert_ok!(transport.post(request.json(r#"{"a":1}"#.into())).await);

        assert_eq!(first.status, 500);
        assert_eq!(second.body, r#"{"d":"ok"}"#);
        assert_eq!(transport.count("ConnectApp"), 2);
        assert_eq!(transport.calls_to("ConnectApp")[1].arg("a"), Some(&json!(1)));
    }
}
