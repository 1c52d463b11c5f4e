//! HTTP client with retry and error classification
//!
//! Provides the transport used by both API clients:
//! - App-id and gzip headers on every request
//! - Authentication applied to the built request
//! - Immediate retries for gateway errors and timeouts
//! - Error classification of failed responses

use crate::auth::{AuthConfig, Authenticator};
use crate::config::ClientConfig;
use crate::error::{is_retryable_status, Error, Result};
use crate::response::{QueryResponse, ResponseBody};
use crate::types::{ApiVersion, ContentType, Params};
use reqwest::header::{HeaderValue, ACCEPT_ENCODING, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Configuration for a single request
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Query parameters
    pub query: Params,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Request body (JSON)
    pub body: Option<Value>,
    /// Override max retries for this request
    pub max_retries: Option<u32>,
    /// Whether a timeout may be retried
    pub retry_on_timeout: bool,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            query: Params::new(),
            headers: HashMap::new(),
            body: None,
            max_retries: None,
            retry_on_timeout: true,
        }
    }
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add all parameters from a map
    #[must_use]
    pub fn params(mut self, params: &Params) -> Self {
        self.query
            .extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set max retries
    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Surface timeouts immediately instead of retrying them
    #[must_use]
    pub fn no_timeout_retry(mut self) -> Self {
        self.retry_on_timeout = false;
        self
    }
}

/// HTTP client shared by the query and connect clients
pub struct HttpClient {
    client: Client,
    config: ClientConfig,
    authenticator: Authenticator,
    app_id: String,
}

impl HttpClient {
    /// Create a client for one API surface
    pub fn new(config: ClientConfig, auth: AuthConfig, api_version: ApiVersion) -> Result<Self> {
        config.validate()?;

        let app_id = config.app_id();
        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .user_agent(app_id.clone())
            .gzip(config.accept_gzip)
            .danger_accept_invalid_certs(!config.verify);

        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }

        Ok(Self {
            client: builder.build()?,
            authenticator: Authenticator::new(auth, api_version),
            config,
            app_id,
        })
    }

    /// Get the client config
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// App-id string sent with every request
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Get the authenticator
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Make a GET request
    pub async fn get(&self, url: &str, config: RequestConfig) -> Result<Response> {
        self.request(Method::GET, url, config).await
    }

    /// Make a HEAD request
    pub async fn head(&self, url: &str, config: RequestConfig) -> Result<Response> {
        self.request(Method::HEAD, url, config).await
    }

    /// Make a POST request
    pub async fn post(&self, url: &str, config: RequestConfig) -> Result<Response> {
        self.request(Method::POST, url, config).await
    }

    /// Make a generic request.
    ///
    /// Returns the response only for 2xx statuses. The same request is sent
    /// again on 502/503 and on timeouts while the retry budget lasts, with
    /// no delay in between.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        config: RequestConfig,
    ) -> Result<Response> {
        // Checked before anything goes on the wire
        self.authenticator.resolve()?;

        let max_retries = config.max_retries.unwrap_or(self.config.max_retries);
        let mut attempt = 0;

        loop {
            let request = self.build_request(method.clone(), url, &config)?;
            debug!("{} {} (attempt {})", method, url, attempt + 1);

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    if is_retryable_status(status.as_u16()) && attempt < max_retries {
                        warn!(
                            "Request failed with {}, attempt {}/{}, retrying",
                            status.as_u16(),
                            attempt + 1,
                            max_retries + 1
                        );
                        attempt += 1;
                        continue;
                    }

                    return Err(classify_error(response).await);
                }
                Err(e) if e.is_timeout() => {
                    let timeout_ms =
                        u64::try_from(self.config.read_timeout.as_millis()).unwrap_or(u64::MAX);

                    if !config.retry_on_timeout {
                        warn!("Request timeout, not retrying");
                        return Err(Error::Timeout { timeout_ms });
                    }
                    if attempt < max_retries {
                        warn!(
                            "Request timeout, attempt {}/{}, retrying",
                            attempt + 1,
                            max_retries + 1
                        );
                        attempt += 1;
                        continue;
                    }
                    return Err(Error::Timeout { timeout_ms });
                }
                Err(e) => return Err(Error::Http(e)),
            }
        }
    }

    fn build_request(
        &self,
        method: Method,
        url: &str,
        config: &RequestConfig,
    ) -> Result<reqwest::Request> {
        let mut req = self
            .client
            .request(method, url)
            .query(&[("app_id", self.app_id.as_str())]);

        // app_id is always ours
        let mut params: Vec<(&String, &String)> = config
            .query
            .iter()
            .filter(|(key, _)| key.as_str() != "app_id")
            .collect();
        if !params.is_empty() {
            params.sort();
            req = req.query(&params);
        }

        for (key, value) in &config.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if !self.config.accept_gzip {
            req = req.header(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
        }

        if let Some(body) = &config.body {
            req = req.json(body);
        }

        let mut request = req.build()?;
        self.authenticator.apply(&mut request)?;
        Ok(request)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("app_id", &self.app_id)
            .field("auth", self.authenticator.config())
            .finish_non_exhaustive()
    }
}

/// Read a successful response into a `QueryResponse`.
///
/// With `expect_json` the body must parse as JSON; otherwise a JSON
/// `content-type` still decodes as JSON and anything else stays text.
pub async fn read_response(response: Response, expect_json: bool) -> Result<QueryResponse> {
    let status = response.status().as_u16();
    let headers = response.headers().clone();
    let is_json_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ContentType::from_header(ct) == ContentType::Json);
    let text = response.text().await?;

    let body = if expect_json || is_json_type {
        match serde_json::from_str(&text) {
            Ok(value) => ResponseBody::Json(value),
            Err(e) => {
                return Err(Error::JsonParse {
                    status,
                    message: e.to_string(),
                    body: text,
                })
            }
        }
    } else {
        ResponseBody::Text(text)
    };

    Ok(QueryResponse::new(status, headers, body))
}

/// Turn a non-2xx response into an error
async fn classify_error(response: Response) -> Error {
    let status = response.status();
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));
    let body = response.text().await.unwrap_or_default();

    let error_msg = if is_json {
        serde_json::from_str::<Value>(&body).ok().and_then(|v| {
            v.get("error").and_then(|e| match e {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
        })
    } else {
        None
    };

    if status == StatusCode::UNAUTHORIZED {
        return Error::Authentication {
            status: status.as_u16(),
            message: error_msg.unwrap_or_else(|| body.clone()),
            body,
        };
    }

    match error_msg {
        Some(message) => Error::HttpError {
            status: status.as_u16(),
            message,
            body,
        },
        None => Error::http_status(status.as_u16(), body),
    }
}
