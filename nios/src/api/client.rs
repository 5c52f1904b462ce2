use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::common::{ApiErrorDetails, ApiQueryParams, ResultWrapper, WapiErrorResponse};
use super::error::ApiError;

/// NIOS WAPI client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    retry_config: RetryConfig,
}

#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
            timeout_seconds: 30,
        }
    }
}

impl Client {
    /// Create a new API client with default configuration
    pub fn new(
        endpoint: &str,
        wapi_version: &str,
        username: &str,
        password: &str,
        insecure: bool,
    ) -> Result<Self, ApiError> {
        Self::with_config(
            endpoint,
            wapi_version,
            username,
            password,
            insecure,
            RetryConfig::default(),
        )
    }

    /// Create a new API client with custom retry configuration
    pub fn with_config(
        endpoint: &str,
        wapi_version: &str,
        username: &str,
        password: &str,
        insecure: bool,
        retry_config: RetryConfig,
    ) -> Result<Self, ApiError> {
        let parsed = url::Url::parse(endpoint)
            .map_err(|e| ApiError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidEndpoint(format!(
                "{}: unsupported scheme {}",
                endpoint,
                parsed.scheme()
            )));
        }

        let http_client = reqwest::Client::builder()
            .danger_accept_invalid_certs(insecure)
            .timeout(Duration::from_secs(retry_config.timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;

        let base_url = format!(
            "{}/wapi/v{}",
            endpoint.trim_end_matches('/'),
            wapi_version.trim_start_matches('v')
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url,
                username: username.to_string(),
                password: password.to_string(),
                retry_config,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Execute a GET request with retry logic
    pub async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, ApiError> {
        self.execute_with_retry(
            || async {
                let url = format!("{}{}", self.inner.base_url, path);

                tracing::debug!("GET request to: {}", url);

                self.inner
                    .http_client
                    .get(&url)
                    .basic_auth(&self.inner.username, Some(&self.inner.password))
                    .send()
                    .await
            },
            path,
        )
        .await
    }

    /// Execute a GET request with query parameters
    pub async fn get_with_params<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        params: &ApiQueryParams,
    ) -> Result<T, ApiError> {
        let full_path = format!("{}{}", path, params.to_query_string());
        self.get(&full_path).await
    }

    /// Execute a POST request with retry logic
    pub async fn post<T: for<'de> Deserialize<'de>, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute_with_retry(
            || async {
                let url = format!("{}{}", self.inner.base_url, path);

                tracing::debug!("POST request to: {}", url);

                self.inner
                    .http_client
                    .post(&url)
                    .basic_auth(&self.inner.username, Some(&self.inner.password))
                    .json(body)
                    .send()
                    .await
            },
            path,
        )
        .await
    }

    /// Execute a PUT request with retry logic
    pub async fn put<T: for<'de> Deserialize<'de>, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute_with_retry(
            || async {
                let url = format!("{}{}", self.inner.base_url, path);

                tracing::debug!("PUT request to: {}", url);

                self.inner
                    .http_client
                    .put(&url)
                    .basic_auth(&self.inner.username, Some(&self.inner.password))
                    .json(body)
                    .send()
                    .await
            },
            path,
        )
        .await
    }

    /// Execute a DELETE request with retry logic
    pub async fn delete<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, ApiError> {
        self.execute_with_retry(
            || async {
                let url = format!("{}{}", self.inner.base_url, path);

                tracing::debug!("DELETE request to: {}", url);

                self.inner
                    .http_client
                    .delete(&url)
                    .basic_auth(&self.inner.username, Some(&self.inner.password))
                    .send()
                    .await
            },
            path,
        )
        .await
    }

    /// Execute request with retry logic
    async fn execute_with_retry<F, Fut, T>(&self, request_fn: F, path: &str) -> Result<T, ApiError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
        T: for<'de> Deserialize<'de>,
    {
        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= self.inner.retry_config.max_retries {
            if attempt > 0 {
                let backoff = std::cmp::min(
                    self.inner.retry_config.initial_backoff_ms * (2_u64.pow(attempt - 1)),
                    self.inner.retry_config.max_backoff_ms,
                );
                tracing::debug!(
                    "Retrying request to {} after {}ms (attempt {})",
                    path,
                    backoff,
                    attempt
                );
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            match request_fn().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return self.parse_success_response(response).await;
                    }

                    match status {
                        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                            return Err(ApiError::AuthError)
                        }
                        reqwest::StatusCode::TOO_MANY_REQUESTS => {
                            last_error = Some(ApiError::RateLimited)
                        }
                        reqwest::StatusCode::SERVICE_UNAVAILABLE => {
                            last_error = Some(ApiError::ServiceUnavailable)
                        }
                        _ => return self.handle_error_response(response, path).await,
                    }
                }
                Err(e) => {
                    // Only retry when the request never reached the server
                    if e.is_connect() {
                        last_error = Some(ApiError::ServiceUnavailable);
                    } else if e.is_timeout() {
                        return Err(ApiError::Timeout(self.inner.retry_config.timeout_seconds));
                    } else {
                        return Err(ApiError::RequestError(e));
                    }
                }
            }

            attempt += 1;
        }

        tracing::warn!(
            "Giving up on {} after {} retries",
            path,
            self.inner.retry_config.max_retries
        );
        Err(last_error.unwrap_or(ApiError::ServiceUnavailable))
    }

    /// Parse successful response
    async fn parse_success_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let text = response.text().await?;
        tracing::debug!("API response body: {}", text);

        match serde_json::from_str::<ResultWrapper<T>>(&text) {
            Ok(wrapper) => Ok(wrapper.result),
            Err(_) => match serde_json::from_str::<T>(&text) {
                Ok(data) => Ok(data),
                Err(e) => {
                    tracing::error!("Failed to deserialize response: {}, body: {}", e, text);
                    Err(ApiError::ParseError(format!(
                        "Failed to parse response: {}",
                        e
                    )))
                }
            },
        }
    }

    /// Handle error response
    async fn handle_error_response<T>(
        &self,
        response: reqwest::Response,
        path: &str,
    ) -> Result<T, ApiError> {
        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        let body = serde_json::from_str::<WapiErrorResponse>(&text).ok();

        if status == reqwest::StatusCode::NOT_FOUND
            || body.as_ref().is_some_and(WapiErrorResponse::is_not_found)
        {
            let reference = path.split('?').next().unwrap_or(path).trim_start_matches('/');
            return Err(ApiError::NotFound(reference.to_string()));
        }

        let message = body
            .as_ref()
            .and_then(|b| b.text.clone().or_else(|| b.error.clone()))
            .unwrap_or_else(|| text.clone());

        Err(ApiError::ApiError {
            status: status.as_u16(),
            message,
            details: body.map(|b| Box::new(ApiErrorDetails::from(b))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn fast_retries() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
            timeout_seconds: 5,
        }
    }

    fn test_client(url: &str) -> Client {
        Client::with_config(url, "2.12", "admin", "secret", true, fast_retries()).unwrap()
    }

    #[test]
    fn base_url_includes_wapi_version() {
        let client = Client::new("https://nios.example.com/", "v2.12", "a", "b", false).unwrap();
        assert_eq!(client.base_url(), "https://nios.example.com/wapi/v2.12");
    }

    #[test]
    fn rejects_invalid_endpoint() {
        assert!(matches!(
            Client::new("not a url", "2.12", "a", "b", false),
            Err(ApiError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            Client::new("ftp://nios.example.com", "2.12", "a", "b", false),
            Err(ApiError::InvalidEndpoint(_))
        ));
    }

    #[tokio::test]
    async fn sends_basic_auth() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/wapi/v2.12/admingroup/abc:ops")
            .match_header("authorization", "Basic YWRtaW46c2VjcmV0")
            .with_body(r#"{"_ref": "admingroup/abc:ops", "name": "ops"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let value: serde_json::Value = client.get("/admingroup/abc:ops").await.unwrap();

        assert_eq!(value["name"], "ops");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unwraps_result_envelope() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/wapi/v2.12/networkview")
            .match_query(Matcher::UrlEncoded("_return_as_object".into(), "1".into()))
            .match_body(Matcher::Json(json!({"name": "blue"})))
            .with_body(r#"{"result": {"_ref": "networkview/xyz:blue", "name": "blue"}}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let params = ApiQueryParams::new().add("_return_as_object", 1);
        let value: serde_json::Value = client
            .post(
                &format!("/networkview{}", params.to_query_string()),
                &json!({"name": "blue"}),
            )
            .await
            .unwrap();

        assert_eq!(value["_ref"], "networkview/xyz:blue");
    }

    #[tokio::test]
    async fn not_found_status_maps_to_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/wapi/v2.12/admingroup/gone")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let result = client
            .get_with_params::<serde_json::Value>(
                "/admingroup/gone",
                &ApiQueryParams::new().return_fields(&["extattrs"]),
            )
            .await;

        match result {
            Err(ApiError::NotFound(reference)) => assert_eq!(reference, "admingroup/gone"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn not_found_error_code_maps_to_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/wapi/v2.12/admingroup/gone")
            .with_status(400)
            .with_body(
                r#"{"Error": "AdmConDataNotFoundError: Reference admingroup/gone not found",
                    "code": "Client.Ibap.Data.NotFound",
                    "text": "Reference admingroup/gone not found"}"#,
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let result = client.get::<serde_json::Value>("/admingroup/gone").await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn other_errors_keep_server_text() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("PUT", "/wapi/v2.12/admingroup/abc")
            .with_status(400)
            .with_body(
                r#"{"Error": "AdmConProtoError: Unknown extensible attribute: Site",
                    "code": "Client.Ibap.Proto",
                    "text": "Unknown extensible attribute: Site"}"#,
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client
            .put::<serde_json::Value, _>("/admingroup/abc", &json!({}))
            .await
            .unwrap_err();

        match err {
            ApiError::ApiError {
                status,
                message,
                details,
            } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Unknown extensible attribute: Site");
                assert_eq!(details.unwrap().code.as_deref(), Some("Client.Ibap.Proto"));
            }
            other => panic!("expected ApiError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unauthorized_is_not_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/wapi/v2.12/networkview")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let result = client.get::<serde_json::Value>("/networkview").await;

        assert!(matches!(result, Err(ApiError::AuthError)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn service_unavailable_is_retried_until_exhausted() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/wapi/v2.12/networkview")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let result = client.get::<serde_json::Value>("/networkview").await;

        assert!(matches!(result, Err(ApiError::ServiceUnavailable)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rate_limit_is_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/wapi/v2.12/networkview/xyz:blue")
            .with_status(429)
            .expect(3)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let result = client.delete::<String>("/networkview/xyz:blue").await;

        assert!(matches!(result, Err(ApiError::RateLimited)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn connection_errors_surface_as_unavailable() {
        let client = Client::with_config(
            "http://127.0.0.1:1",
            "2.12",
            "admin",
            "secret",
            true,
            fast_retries(),
        )
        .unwrap();

        let result = client.get::<serde_json::Value>("/networkview").await;
        assert!(matches!(result, Err(ApiError::ServiceUnavailable)));
    }
}
