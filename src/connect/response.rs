//! Connect API responses

use crate::error::Result;
use crate::response::{QueryResponse, ResponseBody};
use bytes::Bytes;
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::ops::Deref;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// A decoded connect API response.
///
/// Derefs to [`QueryResponse`] for counts and headers.
#[derive(Debug, Clone)]
pub struct ConnectResponse {
    inner: QueryResponse,
}

impl ConnectResponse {
    pub(crate) fn new(inner: QueryResponse) -> Self {
        Self { inner }
    }

    /// The `data` section
    pub fn data(&self) -> Option<&Value> {
        self.inner.json()?.get("data")
    }

    /// Search results from `data.results`, each with `id` lifted from `entity.id`
    pub fn entities(&self) -> Vec<Value> {
        let Some(results) = self
            .data()
            .and_then(|d| d.get("results"))
            .and_then(Value::as_array)
        else {
            return Vec::new();
        };

        results
            .iter()
            .cloned()
            .map(|mut result| {
                let id = result.get("entity").and_then(|e| e.get("id")).cloned();
                if let (Some(id), Some(obj)) = (id, result.as_object_mut()) {
                    obj.insert("id".to_string(), id);
                }
                result
            })
            .collect()
    }

    /// Unwrap the inner response
    pub fn into_inner(self) -> QueryResponse {
        self.inner
    }
}

impl Deref for ConnectResponse {
    type Target = QueryResponse;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// A streamed file download (risk lists, demo events, fusion files)
#[derive(Debug)]
pub struct FileResponse {
    response: reqwest::Response,
}

impl FileResponse {
    pub(crate) fn new(response: reqwest::Response) -> Self {
        Self { response }
    }

    /// HTTP status code
    pub fn status(&self) -> u16 {
        self.response.status().as_u16()
    }

    /// Response headers
    pub fn headers(&self) -> &HeaderMap {
        self.response.headers()
    }

    /// Next chunk of the body, `None` at the end
    pub async fn chunk(&mut self) -> Result<Option<Bytes>> {
        Ok(self.response.chunk().await?)
    }

    /// Whole body as bytes
    pub async fn bytes(self) -> Result<Bytes> {
        Ok(self.response.bytes().await?)
    }

    /// Read the body as text into a [`QueryResponse`], ready for `csv_reader`
    pub async fn into_response(self) -> Result<QueryResponse> {
        let status = self.status();
        let headers = self.response.headers().clone();
        let text = self.response.text().await?;
        Ok(QueryResponse::new(status, headers, ResponseBody::Text(text)))
    }

    /// Stream the body into a writer; returns the number of bytes written
    pub async fn save<W>(mut self, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let mut written = 0u64;
        while let Some(chunk) = self.chunk().await? {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;
        Ok(written)
    }
}
