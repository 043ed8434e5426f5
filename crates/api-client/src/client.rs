//! Main API client implementation

use crate::config::ClientConfig;
use crate::endpoints::{
    AssociacoesApi, AuthApi, BairrosApi, BancasApi, CepApi, CidadesApi, EstadosApi, FeirasApi,
    OcsApi, ReunioesApi, UsersApi,
};
use crate::error::{ApiError, ApiResult};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// Whether a request must carry the session token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    /// Fail with [`ApiError::Unauthenticated`] when no token is held
    Required,
    /// Send the token when one is held
    Optional,
    /// Never send the token (third-party services)
    Never,
}

/// Comércio Assim API client
///
/// Wraps `reqwest` with the API base URL, JSON headers, a per-request
/// correlation id and the bearer token of the current session. Requests are
/// sent exactly once; failures are mapped to [`ApiError`] and returned.
#[derive(Clone)]
pub struct AdminClient {
    inner: Client,
    config: Arc<ClientConfig>,
    token: Option<Arc<str>>,
}

impl fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminClient")
            .field("base_url", &self.config.base_url)
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl AdminClient {
    /// Create a new client with configuration from the environment
    pub fn new() -> ApiResult<Self> {
        let config = ClientConfig::from_env()?;
        Self::with_config(config)
    }

    /// Create a new client with specific configuration
    pub fn with_config(config: ClientConfig) -> ApiResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|_| ApiError::config("user_agent is not a valid header value"))?;
        default_headers.insert(USER_AGENT, agent);

        let inner = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(ApiError::Request)?;

        Ok(Self {
            inner,
            config: Arc::new(config),
            token: None,
        })
    }

    /// Use `token` as the bearer token for every authenticated request
    #[must_use]
    pub fn with_token(mut self, token: impl AsRef<str>) -> Self {
        let token = token.as_ref().trim();
        self.token = (!token.is_empty()).then(|| Arc::from(token));
        self
    }

    /// The bearer token currently held
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    // -------------------------------------------------------------------------
    // Endpoint API accessors
    // -------------------------------------------------------------------------

    /// Login and password recovery
    #[must_use]
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    /// User accounts
    #[must_use]
    pub fn users(&self) -> UsersApi {
        UsersApi::new(self.clone())
    }

    /// Associations
    #[must_use]
    pub fn associacoes(&self) -> AssociacoesApi {
        AssociacoesApi::new(self.clone())
    }

    /// Neighborhoods
    #[must_use]
    pub fn bairros(&self) -> BairrosApi {
        BairrosApi::new(self.clone())
    }

    /// Cities
    #[must_use]
    pub fn cidades(&self) -> CidadesApi {
        CidadesApi::new(self.clone())
    }

    /// States
    #[must_use]
    pub fn estados(&self) -> EstadosApi {
        EstadosApi::new(self.clone())
    }

    /// Fairs
    #[must_use]
    pub fn feiras(&self) -> FeirasApi {
        FeirasApi::new(self.clone())
    }

    /// Vendor stalls
    #[must_use]
    pub fn bancas(&self) -> BancasApi {
        BancasApi::new(self.clone())
    }

    /// Social control organizations
    #[must_use]
    pub fn ocs(&self) -> OcsApi {
        OcsApi::new(self.clone())
    }

    /// Meetings
    #[must_use]
    pub fn reunioes(&self) -> ReunioesApi {
        ReunioesApi::new(self.clone())
    }

    /// Postal-code lookup
    #[must_use]
    pub fn cep(&self) -> CepApi {
        CepApi::new(self.clone())
    }

    // -------------------------------------------------------------------------
    // Low-level HTTP methods
    // -------------------------------------------------------------------------

    /// Perform an authenticated GET request
    #[instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.send(Method::GET, path, Auth::Required, |r| r).await?;
        read_json(response).await
    }

    /// Perform an authenticated GET request with query parameters
    #[instrument(skip(self, query))]
    pub async fn get_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> ApiResult<T> {
        let response = self
            .send(Method::GET, path, Auth::Required, |r| r.query(query))
            .await?;
        read_json(response).await
    }

    /// Perform an authenticated POST request with a JSON body
    #[instrument(skip(self, body))]
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let response = self
            .send(Method::POST, path, Auth::Required, |r| r.json(body))
            .await?;
        read_json(response).await
    }

    /// POST a JSON body to an endpoint that does not need a session
    #[instrument(skip(self, body))]
    pub async fn post_public<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let response = self
            .send(Method::POST, path, Auth::Optional, |r| r.json(body))
            .await?;
        read_json(response).await
    }

    /// Perform an authenticated PUT request with a JSON body
    #[instrument(skip(self, body))]
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let response = self
            .send(Method::PUT, path, Auth::Required, |r| r.json(body))
            .await?;
        read_json(response).await
    }

    /// Perform an authenticated PATCH request with a JSON body
    #[instrument(skip(self, body))]
    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let response = self
            .send(Method::PATCH, path, Auth::Required, |r| r.json(body))
            .await?;
        read_json(response).await
    }

    /// Perform an authenticated DELETE request; any response body is ignored
    #[instrument(skip(self))]
    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        self.send(Method::DELETE, path, Auth::Required, |r| r).await?;
        Ok(())
    }

    /// Perform an authenticated multipart POST request
    #[instrument(skip(self, form))]
    pub async fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: Form) -> ApiResult<T> {
        let response = self
            .send(Method::POST, path, Auth::Required, |r| r.multipart(form))
            .await?;
        read_json(response).await
    }

    /// Download a binary body with its content type
    #[instrument(skip(self))]
    pub async fn get_bytes(&self, path: &str) -> ApiResult<(Vec<u8>, String)> {
        let response = self.send(Method::GET, path, Auth::Required, |r| r).await?;
        let mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response.bytes().await?;
        Ok((bytes.to_vec(), mime))
    }

    /// GET an absolute URL on a third-party service; the token is never sent
    #[instrument(skip(self))]
    pub async fn get_external<T: DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ApiError::InvalidUrl(url.to_string()));
        }
        let response = self.send(Method::GET, url, Auth::Never, |r| r).await?;
        read_json(response).await
    }

    /// Build the absolute URL of an API path
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Send one request and map non-2xx statuses to errors
    async fn send<F>(&self, method: Method, target: &str, auth: Auth, build: F) -> ApiResult<Response>
    where
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let url = if auth == Auth::Never {
            target.to_string()
        } else {
            self.url(target)
        };
        let request_id = Uuid::new_v4().to_string();

        let mut request = self
            .inner
            .request(method.clone(), &url)
            .header(X_REQUEST_ID, &request_id);

        match (auth, self.token.as_deref()) {
            (Auth::Never, _) | (Auth::Optional, None) => {}
            (Auth::Required | Auth::Optional, Some(token)) => {
                request = request.header(AUTHORIZATION, format!("Bearer {token}"));
            }
            (Auth::Required, None) => return Err(ApiError::Unauthenticated),
        }

        let start = Instant::now();
        let response = build(request).send().await?;
        let status = response.status();

        debug!(
            request_id = %request_id,
            method = %method,
            path = %target,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis(),
            "Request completed"
        );

        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_response(status.as_u16(), target, &body))
        }
    }
}

/// Deserialize a JSON body; an empty body reads as `null`
async fn read_json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_slice(b"null")?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = AdminClient::with_config(ClientConfig::development());
        assert!(client.is_ok());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = ClientConfig::default().with_base_url("ftp://example.com");
        assert!(matches!(
            AdminClient::with_config(config),
            Err(ApiError::Config(_))
        ));
    }

    #[test]
    fn test_token_handling() {
        let client = AdminClient::with_config(ClientConfig::development()).unwrap();
        assert!(client.token().is_none());

        let client = client.with_token("1|abc");
        assert_eq!(client.token(), Some("1|abc"));

        let client = client.with_token("   ");
        assert!(client.token().is_none());
    }

    #[test]
    fn test_url_joining() {
        let config = ClientConfig::default().with_base_url("http://localhost:8000/");
        let client = AdminClient::with_config(config).unwrap();
        assert_eq!(client.url("/api/bairros"), "http://localhost:8000/api/bairros");
        assert_eq!(client.url("api/feiras/"), "http://localhost:8000/api/feiras/");
    }

    #[tokio::test]
    async fn test_authenticated_call_without_token() {
        let client = AdminClient::with_config(ClientConfig::development()).unwrap();
        let result: ApiResult<serde_json::Value> = client.get("/api/users").await;
        assert!(matches!(result, Err(ApiError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_external_requires_absolute_url() {
        let client = AdminClient::with_config(ClientConfig::development()).unwrap();
        let result: ApiResult<serde_json::Value> = client.get_external("viacep.com.br").await;
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }
}
