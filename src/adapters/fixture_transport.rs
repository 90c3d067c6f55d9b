//! In-memory transport for tests and offline runs.
//!
//! ## Example
//!
//! ```yaml
//! routes:
//!   - method: GET
//!     url: https://api.example.com/users/1
//!     replies:
//!       - error: connection reset
//!       - status: 200
//!         body: { id: 1, name: Ada }
//! ```
//!
//! Replies are served in order; the last one repeats. A reply with `error`
//! fails at the transport level instead of producing a response.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::{load_yaml, read_document, HttpMethod, LoadError};
use crate::domain::{HttpRequest, HttpResponse, HttpTransport, TransportError};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FixtureReply {
    Fail {
        error: String,
    },
    Respond {
        #[serde(default = "default_status")]
        status: u16,
        #[serde(default)]
        body: Option<Value>,
    },
}

fn default_status() -> u16 {
    200
}

impl FixtureReply {
    pub fn json(status: u16, body: Value) -> Self {
        FixtureReply::Respond {
            status,
            body: Some(body),
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        FixtureReply::Fail { error: error.into() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureRoute {
    /// Any method when absent
    #[serde(default)]
    pub method: Option<HttpMethod>,
    /// Matched against the request URL with or without its query string
    pub url: String,
    #[serde(default)]
    pub replies: Vec<FixtureReply>,
}

impl FixtureRoute {
    pub fn new(method: HttpMethod, url: impl Into<String>, replies: Vec<FixtureReply>) -> Self {
        Self {
            method: Some(method),
            url: url.into(),
            replies,
        }
    }

    fn matches(&self, request: &HttpRequest) -> bool {
        if self.method.map_or(false, |m| m != request.method) {
            return false;
        }
        let path = request.url.split('?').next().unwrap_or("");
        self.url == request.url || self.url == path
    }
}

#[derive(Deserialize)]
struct FixtureFile {
    #[serde(default)]
    routes: Vec<FixtureRoute>,
}

struct RouteState {
    route: FixtureRoute,
    hits: usize,
}

#[derive(Clone, Default)]
pub struct FixtureTransport {
    routes: Arc<RwLock<Vec<RouteState>>>,
    requests: Arc<RwLock<Vec<HttpRequest>>>,
}

impl FixtureTransport {
    pub fn new(routes: Vec<FixtureRoute>) -> Self {
        Self {
            routes: Arc::new(RwLock::new(
                routes.into_iter().map(|route| RouteState { route, hits: 0 }).collect(),
            )),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn from_yaml(text: &str) -> Result<Self, LoadError> {
        let file: FixtureFile = load_yaml(text)?;
        Ok(Self::new(file.routes))
    }

    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        Self::from_yaml(&read_document(path)?)
    }

    pub async fn add_route(&self, route: FixtureRoute) {
        let mut routes = self.routes.write().await;
        routes.push(RouteState { route, hits: 0 });
    }

    /// Every request received, in order.
    pub async fn requests(&self) -> Vec<HttpRequest> {
        self.requests.read().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }

    pub async fn reset(&self) {
        self.requests.write().await.clear();
        for state in self.routes.write().await.iter_mut() {
            state.hits = 0;
        }
    }
}

#[async_trait]
impl HttpTransport for FixtureTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.write().await.push(request.clone());

        let mut routes = self.routes.write().await;
        let Some(state) = routes.iter_mut().find(|s| s.route.matches(&request)) else {
            tracing::debug!(method = %request.method, url = %request.url, "No fixture route");
            return Ok(HttpResponse {
                status: 404,
                body: Some(json!({
                    "message": format!("No fixture for {} {}", request.method, request.url)
                })),
            });
        };

        let reply = state
            .route
            .replies
            .get(state.hits)
            .or_else(|| state.route.replies.last())
            .cloned();
        state.hits += 1;

        match reply {
            Some(FixtureReply::Fail { error }) => Err(TransportError::Network(error)),
            Some(FixtureReply::Respond { status, body }) => Ok(HttpResponse { status, body }),
            None => Ok(HttpResponse {
                status: 200,
                body: Some(json!({})),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: HttpMethod, url: &str) -> HttpRequest {
        HttpRequest {
            method,
            url: url.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    #[tokio::test]
    async fn test_replies_in_order_then_repeat_last() {
        let transport = FixtureTransport::from_yaml(
            r#"
routes:
  - method: GET
    url: https://api.test/items
    replies:
      - error: boom
      - status: 201
        body: { ok: true }
"#,
        )
        .unwrap();

        let first = transport.send(request(HttpMethod::Get, "https://api.test/items?page=2")).await;
        assert!(matches!(first, Err(TransportError::Network(msg)) if msg == "boom"));

        for _ in 0..2 {
            let reply = transport.send(request(HttpMethod::Get, "https://api.test/items")).await.unwrap();
            assert_eq!(reply.status, 201);
            assert_eq!(reply.body, Some(json!({ "ok": true })));
        }

        assert_eq!(transport.request_count().await, 3);
        assert_eq!(transport.requests().await[0].url, "https://api.test/items?page=2");
    }

    #[tokio::test]
    async fn test_unmatched_route_is_404() {
        let transport = FixtureTransport::new(vec![FixtureRoute::new(
            HttpMethod::Post,
            "https://api.test/items",
            vec![FixtureReply::json(200, json!({}))],
        )]);

        let reply = transport.send(request(HttpMethod::Get, "https://api.test/items")).await.unwrap();
        assert_eq!(reply.status, 404);
        assert_eq!(
            reply.body.unwrap()["message"],
            json!("No fixture for GET https://api.test/items")
        );
    }
}
