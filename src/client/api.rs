//! Raw query API client

use crate::auth::AuthConfig;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::{read_response, HttpClient, RequestConfig};
use crate::pagination::{PageOptions, PagedItem, PagedQuery};
use crate::query::{Entity, Event, Output, Query, Reference};
use crate::response::QueryResponse;
use crate::types::{ApiVersion, Params};
use futures::future;
use futures::stream::{BoxStream, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

/// Client for the raw query API
#[derive(Debug)]
pub struct ApiClient {
    http: HttpClient,
}

impl ApiClient {
    /// Create a client. Credentials are not looked up until the first query.
    pub fn new(auth: AuthConfig, config: ClientConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(config, auth, ApiVersion::V1)?,
        })
    }

    /// Client with default config and credentials from the environment
    pub fn from_env() -> Result<Self> {
        Self::new(AuthConfig::Auto, ClientConfig::default())
    }

    /// Underlying transport
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Run a query with the configured retry budget
    pub async fn query(&self, query: &Query, params: Option<&Params>) -> Result<QueryResponse> {
        let retries = self.http.config().max_retries;
        self.query_with_retries(query, params, retries).await
    }

    /// Run a query.
    ///
    /// 502/503 and timeouts are retried up to `retries` times with the same
    /// body, except that a scan already carrying a cursor is never retried
    /// on timeout. A JSON body reporting `"status": "FAILURE"` becomes
    /// [`Error::RemoteServer`].
    pub async fn query_with_retries(
        &self,
        query: &Query,
        params: Option<&Params>,
        retries: u32,
    ) -> Result<QueryResponse> {
        let mut request = RequestConfig::new().json(query.to_value()).retries(retries);
        if let Some(params) = params {
            request = request.params(params);
        }
        if query.is_scan() && query.page_start().is_some() {
            request = request.no_timeout_retry();
        }

        debug!("Requesting query json={}", query.to_value());
        let url = self.http.config().api_url.clone();
        let response = self.http.post(&url, request).await?;

        let expect_json = query.output().expects_json();
        let response = read_response(response, expect_json).await?;

        if expect_json {
            check_failure(&response)?;
        }
        Ok(response)
    }

    /// Page through a query. Fails right away for queries that cannot be paged.
    pub fn paged_query(&self, query: &Query, options: PageOptions) -> Result<PagedQuery<'_>> {
        PagedQuery::new(self, query, options)
    }

    /// Stream references matching the `instance` part of a query
    pub fn get_references(
        &self,
        body: Value,
        limit: usize,
    ) -> Result<BoxStream<'_, Result<Reference>>> {
        let options = PageOptions::new().limit(limit).field("instances");
        let pager = self.paged_query(&Query::instance(body), options)?;
        Ok(typed_stream(pager))
    }

    /// Stream events matching the `cluster` part of a query
    pub fn get_events(&self, body: Value, limit: usize) -> Result<BoxStream<'_, Result<Event>>> {
        let options = PageOptions::new().limit(limit).field("events");
        let pager = self.paged_query(&Query::cluster(body), options)?;
        Ok(typed_stream(pager))
    }

    /// Fetch one entity by id; `None` when the server does not know it
    pub async fn get_entity(&self, entity_id: &str) -> Result<Option<Entity>> {
        let response = self
            .query(&Query::entity(json!({ "id": entity_id })), None)
            .await?;
        Ok(response.get_entity(entity_id))
    }

    /// Stream entities matching the `entity` part of a query
    pub fn get_entities(
        &self,
        body: Value,
        limit: usize,
    ) -> Result<BoxStream<'_, Result<Entity>>> {
        let options = PageOptions::new().limit(limit).field("entity_details");
        let pager = self.paged_query(&Query::entity(body), options)?;

        Ok(pager
            .into_stream()
            .filter_map(|item| {
                future::ready(match item {
                    Ok(PagedItem::Entry(id, details)) => {
                        Entity::from_details(&id, details).map(Ok)
                    }
                    Ok(_) => None,
                    Err(e) => Some(Err(e)),
                })
            })
            .boxed())
    }

    /// API usage of the current token, broken down by day
    pub async fn get_status(&self, show_statistics: bool) -> Result<Value> {
        let output = Output {
            statistics: Some(show_statistics),
            ..Default::default()
        };
        let response = self.query(&Query::status().with_output(output), None).await?;
        Ok(response.json().cloned().unwrap_or(Value::Null))
    }

    /// Type and event metadata (the `types` section of a metadata query)
    pub async fn get_metadata(&self) -> Result<Value> {
        let response = self.query(&Query::metadata(), None).await?;
        Ok(response
            .json()
            .and_then(|v| v.get("types"))
            .cloned()
            .unwrap_or(Value::Null))
    }
}

/// `status == "FAILURE"` inside a 200 response
fn check_failure(response: &QueryResponse) -> Result<()> {
    let Some(body) = response.json() else {
        return Ok(());
    };
    if body.get("status").and_then(Value::as_str) == Some("FAILURE") {
        let message = body
            .get("error")
            .map(|e| e.as_str().map_or_else(|| e.to_string(), String::from))
            .unwrap_or_else(|| "NONE".to_string());
        return Err(Error::remote_server(body.get("code").cloned(), message));
    }
    Ok(())
}

/// Deserialize each JSON item of a pager into `T`
fn typed_stream<'a, T>(pager: PagedQuery<'a>) -> BoxStream<'a, Result<T>>
where
    T: DeserializeOwned + Send + 'a,
{
    pager
        .into_stream()
        .filter_map(|item| {
            future::ready(match item {
                Ok(PagedItem::Value(value)) => Some(serde_json::from_value(value).map_err(Error::from)),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            })
        })
        .boxed()
}
