//! JSON API client for the Kompete backend
//!
//! Attaches the session's tenant and user headers, turns non-2xx responses
//! into [`ApiError`] with the backend's own message, and signs the session
//! out on 401.

use std::sync::Arc;
use std::time::Duration;

use kompete_domain::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_API_TIMEOUT_SECS, REQUEST_FAILED_MESSAGE, TENANT_HEADER,
    USER_HEADER,
};
use kompete_domain::ApiConfig;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::errors::ApiError;
use super::session::SessionStore;
use crate::http::HttpClient;

/// Configuration for API client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiClientConfig {
    /// Base URL for API (e.g., "http://localhost:3001/api")
    pub base_url: String,
    /// Timeout for a single request
    pub timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
            user_agent: None,
        }
    }
}

impl From<&ApiConfig> for ApiClientConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Backend API client
pub struct ApiClient {
    http_client: HttpClient,
    session: Arc<SessionStore>,
    config: ApiClientConfig,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be built
    pub fn new(config: ApiClientConfig, session: Arc<SessionStore>) -> Result<Self, ApiError> {
        let mut builder = HttpClient::builder().timeout(config.timeout);
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        let http_client = builder
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HttpClient: {}", e)))?;

        Ok(Self { http_client, session, config })
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Execute a GET request
    ///
    /// # Errors
    ///
    /// Returns error if request fails or response cannot be deserialized
    #[instrument(skip(self), fields(path = %path))]
    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        self.execute(Method::GET, path, None).await
    }

    /// Execute a POST request with a JSON body
    ///
    /// # Errors
    ///
    /// Returns error if request fails or response cannot be deserialized
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn post<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::Config(format!("Failed to serialize body: {}", e)))?;
        self.execute(Method::POST, path, Some(body)).await
    }

    /// Execute a POST request without a body
    #[instrument(skip(self), fields(path = %path))]
    pub async fn post_empty<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        self.execute(Method::POST, path, None).await
    }

    async fn execute<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<R, ApiError> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        debug!(%method, url = %url, "API request");

        let mut request = self
            .http_client
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");

        if let Some(session) = self.session.current() {
            if let Some(tenant) = session.tenant_id {
                request = request.header(TENANT_HEADER, tenant);
            }
            if let Some(email) = session.user_email {
                request = request.header(USER_HEADER, email);
            }
        }

        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = self.http_client.send(request).await.map_err(ApiError::from)?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            let err = Self::map_status_error(status, &bytes);
            if status == StatusCode::UNAUTHORIZED {
                self.session.force_logout(&format!("{} {} returned 401", method, path));
            } else {
                warn!(%method, path = %path, %status, error = %err, "API request failed");
            }
            return Err(err);
        }

        // Empty and 204 bodies decode as JSON null
        let value: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .map_err(|e| ApiError::Decode(format!("Failed to parse response: {}", e)))?
        };

        serde_json::from_value(value)
            .map_err(|e| ApiError::Decode(format!("Unexpected response shape: {}", e)))
    }

    fn map_status_error(status: StatusCode, body: &[u8]) -> ApiError {
        let message = backend_message(body).unwrap_or_else(|| REQUEST_FAILED_MESSAGE.to_string());

        if status == StatusCode::UNAUTHORIZED {
            ApiError::Auth(message)
        } else if status == StatusCode::NOT_FOUND {
            ApiError::NotFound(message)
        } else if status.is_server_error() {
            ApiError::Server(message)
        } else if status.is_client_error() {
            ApiError::Client(message)
        } else {
            ApiError::Network(message)
        }
    }
}

/// `error` (or `message`) field of a JSON error body.
fn backend_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    ["error", "message"]
        .iter()
        .filter_map(|field| value.get(field).and_then(Value::as_str))
        .map(str::trim)
        .find(|message| !message.is_empty())
        .map(str::to_owned)
}

/// Builder for API client
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ApiClientConfig>,
    session: Option<Arc<SessionStore>>,
}

impl ApiClientBuilder {
    /// Set the API configuration
    pub fn config(mut self, config: ApiClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the session store shared with the host
    pub fn session(mut self, session: Arc<SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    /// Build the API client; a fresh signed-out session store is used when
    /// none was provided.
    ///
    /// # Errors
    ///
    /// Returns error if client creation fails
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.unwrap_or_default();
        let session = self.session.unwrap_or_default();

        ApiClient::new(config, session)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::session::{Session, SessionEvent};

    fn client_for(server: &MockServer, session: Arc<SessionStore>) -> ApiClient {
        let config = ApiClientConfig { base_url: server.uri(), ..Default::default() };
        ApiClient::builder().config(config).session(session).build().unwrap()
    }

    fn signed_in() -> Arc<SessionStore> {
        let store = SessionStore::new();
        store.sign_in(Session::new("tenant-9", "ana@example.com"));
        Arc::new(store)
    }

    #[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq)]
    struct TestResponse {
        message: String,
    }

    #[tokio::test]
    async fn test_get_sends_session_headers() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/test"))
            .and(header("X-Tenant-Id", "tenant-9"))
            .and(header("X-User-Email", "ana@example.com"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(TestResponse { message: "success".to_string() }),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, signed_in());
        let result: TestResponse = client.get("/test").await.unwrap();
        assert_eq!(result.message, "success");
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/create"))
            .and(body_json(json!({ "data": "x" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, signed_in());
        let result: TestResponse = client.post("/create", &json!({ "data": "x" })).await.unwrap();
        assert_eq!(result.message, "ok");
    }

    #[tokio::test]
    async fn test_no_content_decodes_as_null() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/action"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, signed_in());
        let result: Result<(), ApiError> = client.post_empty("/action").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_error_body_message_is_surfaced() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/error"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "error": "Project not ready" })),
            )
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, signed_in());
        let err = client.get::<Value>("/error").await.unwrap_err();
        assert_eq!(err, ApiError::Client("Project not ready".into()));
    }

    #[tokio::test]
    async fn test_error_without_message_uses_generic_text() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/error"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, signed_in());
        let err = client.get::<Value>("/error").await.unwrap_err();
        assert_eq!(err, ApiError::Server(REQUEST_FAILED_MESSAGE.into()));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_unauthorized_signs_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/protected"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Expired" })))
            .mount(&mock_server)
            .await;

        let session = signed_in();
        let mut events = session.subscribe();
        let client = client_for(&mock_server, Arc::clone(&session));

        let err = client.get::<Value>("/protected").await.unwrap_err();
        assert_eq!(err, ApiError::Auth("Expired".into()));
        assert!(!session.is_signed_in());
        assert!(matches!(events.recv().await.unwrap(), SessionEvent::SignedOut { .. }));
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_decode_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, signed_in());
        let err = client.get::<Value>("/data").await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn test_backend_message_extraction() {
        assert_eq!(backend_message(br#"{"error":"boom"}"#).as_deref(), Some("boom"));
        assert_eq!(backend_message(br#"{"error":"  ","message":"fallback"}"#).as_deref(), Some("fallback"));
        assert_eq!(backend_message(b"plain text"), None);
    }
}
