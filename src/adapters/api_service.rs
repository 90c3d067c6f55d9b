//! Endpoint-catalog client.
//!
//! Every call goes through the same pipeline: endpoint lookup, payload
//! validation, mock short-circuit, cache lookup (cached GETs only), then
//! dispatch with retry. Whatever happens, the caller gets an [`ApiResult`];
//! the optional completion callback receives the very same envelope.

use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

use super::response_cache::ResponseCache;
use super::token_store::TokenStore;
use crate::config::{ApiCatalog, EndpointConfig, HttpMethod, LoadError};
use crate::domain::{ApiResult, HttpRequest, HttpResponse, HttpTransport};
use crate::validation::{rules::value_as_text, PayloadValidator};

/// Per-call completion callback
pub type Completion = Box<dyn FnOnce(&ApiResult) + Send>;

#[derive(Clone)]
pub struct ApiService {
    service_name: String,
    endpoints: IndexMap<String, EndpointConfig>,
    /// Request schemas compiled at construction, keyed by endpoint name
    validators: Arc<IndexMap<String, PayloadValidator>>,
    transport: Arc<dyn HttpTransport>,
    base_url: Option<String>,
    cache: ResponseCache,
    token: TokenStore,
}

impl ApiService {
    pub fn new(catalog: ApiCatalog, transport: Arc<dyn HttpTransport>) -> Self {
        let service_name = catalog.service_name.clone();
        let endpoints = catalog.into_endpoint_map();
        let validators = endpoints
            .iter()
            .map(|(name, e)| (name.clone(), PayloadValidator::compile(&e.request_schema)))
            .collect();
        Self {
            service_name,
            endpoints,
            validators: Arc::new(validators),
            transport,
            base_url: None,
            cache: ResponseCache::new(),
            token: TokenStore::new(),
        }
    }

    pub fn from_yaml(text: &str, transport: Arc<dyn HttpTransport>) -> Result<Self, LoadError> {
        Ok(Self::new(ApiCatalog::from_yaml(text)?, transport))
    }

    /// Base for endpoint URLs that are not absolute.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Share a cache between services, or inject one in tests.
    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn endpoint(&self, name: &str) -> Option<&EndpointConfig> {
        self.endpoints.get(name)
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &EndpointConfig> {
        self.endpoints.values()
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Set or clear the bearer token used by `auth` endpoints.
    pub async fn set_token(&self, token: Option<String>) {
        self.token.set(token).await;
    }

    pub async fn token(&self) -> Option<String> {
        self.token.get().await
    }

    pub async fn get(&self, name: &str, payload: Value, on_complete: Option<Completion>) -> ApiResult {
        self.execute(name, Some(HttpMethod::Get), payload, on_complete).await
    }

    pub async fn post(&self, name: &str, payload: Value, on_complete: Option<Completion>) -> ApiResult {
        self.execute(name, Some(HttpMethod::Post), payload, on_complete).await
    }

    pub async fn put(&self, name: &str, payload: Value, on_complete: Option<Completion>) -> ApiResult {
        self.execute(name, Some(HttpMethod::Put), payload, on_complete).await
    }

    pub async fn patch(&self, name: &str, payload: Value, on_complete: Option<Completion>) -> ApiResult {
        self.execute(name, Some(HttpMethod::Patch), payload, on_complete).await
    }

    pub async fn delete(&self, name: &str, payload: Value, on_complete: Option<Completion>) -> ApiResult {
        self.execute(name, Some(HttpMethod::Delete), payload, on_complete).await
    }

    /// Call an endpoint with its declared method.
    pub async fn call(&self, name: &str, payload: Value, on_complete: Option<Completion>) -> ApiResult {
        self.execute(name, None, payload, on_complete).await
    }

    async fn execute(
        &self,
        name: &str,
        method: Option<HttpMethod>,
        payload: Value,
        on_complete: Option<Completion>,
    ) -> ApiResult {
        let payload = if payload.is_null() { json!({}) } else { payload };
        let result = self.run(name, method, &payload).await;
        if let Some(callback) = on_complete {
            callback(&result);
        }
        result
    }

    async fn run(&self, name: &str, method: Option<HttpMethod>, payload: &Value) -> ApiResult {
        let Some(endpoint) = self.endpoints.get(name) else {
            warn!(endpoint = %name, "Endpoint not found");
            return ApiResult::failure(format!("Endpoint '{}' not found", name), None);
        };
        let method = method.unwrap_or(endpoint.method);

        let validator = self.validators.get(name);
        if let Err(problems) = validator.map_or(Ok(()), |v| v.validate(payload)) {
            debug!(endpoint = %name, problems = problems.len(), "Payload rejected");
            return ApiResult::failure(format!("Validation failed: {}", problems.join(", ")), None);
        }

        if endpoint.mock {
            debug!(endpoint = %name, "Returning mock response");
            return ApiResult::ok(json!({ "mock": true, "endpoint": name, "payload": payload }), 200);
        }

        let cache_key = (method == HttpMethod::Get && endpoint.cache).then(|| ResponseCache::key(name, payload));
        if let Some(key) = &cache_key {
            if let Some(hit) = self.cache.get(key).await {
                debug!(endpoint = %name, "Cache hit");
                return hit;
            }
        }

        let request = self.build_request(endpoint, method, payload).await;
        let result = self.send_with_retry(endpoint, request).await;

        if let Some(key) = cache_key {
            if result.success {
                self.cache.set(key, result.clone()).await;
            }
        }
        result
    }

    async fn build_request(&self, endpoint: &EndpointConfig, method: HttpMethod, payload: &Value) -> HttpRequest {
        let (path, consumed) = fill_placeholders(&endpoint.url, payload);
        let mut url = self.resolve_url(path);

        let body = if method.has_body() {
            Some(payload.clone())
        } else {
            let query = query_string(payload, &consumed);
            if !query.is_empty() {
                url.push(if url.contains('?') { '&' } else { '?' });
                url.push_str(&query);
            }
            None
        };

        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        if body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        if endpoint.auth {
            if let Some(token) = self.token.get().await {
                headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
            }
        }

        HttpRequest {
            method,
            url,
            headers,
            body,
        }
    }

    fn resolve_url(&self, url: String) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url;
        }
        match &self.base_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), url.trim_start_matches('/')),
            None => url,
        }
    }

    /// `retry` extra attempts, sequential, stopping at the first success.
    async fn send_with_retry(&self, endpoint: &EndpointConfig, request: HttpRequest) -> ApiResult {
        let attempts = endpoint.retry.saturating_add(1);
        let mut attempt = 1;
        loop {
            debug!(
                endpoint = %endpoint.name,
                method = %request.method,
                url = %request.url,
                attempt,
                "Dispatching request"
            );
            let result = self.send_once(request.clone()).await;
            if result.success {
                return result;
            }
            warn!(
                endpoint = %endpoint.name,
                attempt,
                attempts,
                error = result.error.as_deref().unwrap_or(""),
                "Request attempt failed"
            );
            if attempt >= attempts {
                return result;
            }
            attempt += 1;
        }
    }

    async fn send_once(&self, request: HttpRequest) -> ApiResult {
        match self.transport.send(request).await {
            Ok(response) if response.is_success() => {
                let status = response.status;
                ApiResult::ok(response.body.unwrap_or_else(|| json!({})), status)
            }
            Ok(response) => ApiResult::failure(failure_message(&response), Some(response.status)),
            Err(e) => ApiResult::failure(e.to_string(), None),
        }
    }
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static placeholder pattern"))
}

/// Substitute `{field}` placeholders; unknown fields stay as written.
fn fill_placeholders(template: &str, payload: &Value) -> (String, HashSet<String>) {
    let mut consumed = HashSet::new();
    let url = placeholder_regex()
        .replace_all(template, |caps: &Captures| {
            let field = &caps[1];
            match payload.get(field).filter(|v| !v.is_null()) {
                Some(value) => {
                    consumed.insert(field.to_string());
                    urlencoding::encode(&value_as_text(value)).into_owned()
                }
                None => caps[0].to_string(),
            }
        })
        .into_owned();
    (url, consumed)
}

fn query_string(payload: &Value, consumed: &HashSet<String>) -> String {
    let Some(fields) = payload.as_object() else {
        return String::new();
    };
    fields
        .iter()
        .filter(|(key, value)| !value.is_null() && !consumed.contains(*key))
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(&value_as_text(value))
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn failure_message(response: &HttpResponse) -> String {
    let from_body = |key: &str| {
        response
            .body
            .as_ref()
            .and_then(|b| b.get(key))
            .and_then(Value::as_str)
            .map(String::from)
    };
    from_body("message")
        .or_else(|| from_body("error"))
        .unwrap_or_else(|| format!("Request failed with status {}", response.status))
}
