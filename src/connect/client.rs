//! Connect API client

use super::params::{LookupParams, SearchParams};
use super::response::{ConnectResponse, FileResponse};
use crate::auth::AuthConfig;
use crate::config::ClientConfig;
use crate::error::{Error, Result, ResultExt};
use crate::http::{read_response, HttpClient, RequestConfig};
use crate::response::CONTENT_SHA256_HEADER;
use crate::types::{ApiVersion, Params};
use reqwest::header::HeaderMap;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tracing::{debug, info};
use url::Url;

/// Default format of risk lists
pub const DEFAULT_RISKLIST_FORMAT: &str = "csv/splunk";

/// Client for the connect API
#[derive(Debug)]
pub struct ConnectClient {
    http: HttpClient,
}

impl ConnectClient {
    /// Create a client. Credentials are not looked up until the first call.
    pub fn new(auth: AuthConfig, config: ClientConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(config, auth, ApiVersion::V2)?,
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

    // ========================================================================
    // Generic
    // ========================================================================

    /// GET a route and decode the body.
    ///
    /// The body is JSON unless a non-JSON `format` parameter was asked for.
    pub async fn get_route(&self, segments: &[&str], params: Params) -> Result<ConnectResponse> {
        let expect_json = params.get("format").map_or(true, |f| f == "json");
        let url = self.route_url(segments)?;
        debug!("Requesting query path_info={}", url.path());

        let response = self
            .http
            .get(url.as_str(), RequestConfig::new().params(&params))
            .await?;
        Ok(ConnectResponse::new(read_response(response, expect_json).await?))
    }

    /// Search entities of a category
    pub async fn search(&self, category: &str, params: &SearchParams) -> Result<ConnectResponse> {
        self.get_route(&[category, "search"], params.to_params()?)
            .await
    }

    /// Look up a single entity; returns the whole decoded body
    pub async fn lookup(
        &self,
        category: &str,
        name: &str,
        params: &LookupParams,
    ) -> Result<Value> {
        let response = self.get_route(&[category, name], params.to_params()?).await?;
        Ok(response.json().cloned().unwrap_or(Value::Null))
    }

    /// Extension data for an entity; `None` when the response has no `data`
    pub async fn get_extension_info(
        &self,
        category: &str,
        entity: &str,
        extension: &str,
        metadata: Option<bool>,
    ) -> Result<Option<Value>> {
        let mut params = Params::new();
        if let Some(metadata) = metadata {
            params.insert("metadata".to_string(), metadata.to_string());
        }
        let response = self
            .get_route(&[category, entity, "extension", extension], params)
            .await?;
        Ok(response.data().cloned())
    }

    /// Download a risk list for a category (ip, domain, hash, vulnerability, url)
    pub async fn get_risklist(
        &self,
        category: &str,
        list: Option<&str>,
        format: &str,
        gzip: bool,
    ) -> Result<FileResponse> {
        let mut params = Params::new();
        params.insert("format".to_string(), format.to_string());
        params.insert("gzip".to_string(), gzip.to_string());
        if let Some(list) = list {
            params.insert("list".to_string(), list.to_string());
        }
        self.get_file(&[category, "risklist"], params).await
    }

    /// Stream a risk list into a writer
    pub async fn save_risklist<W>(
        &self,
        writer: &mut W,
        category: &str,
        list: Option<&str>,
        format: &str,
        gzip: bool,
    ) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        self.get_risklist(category, list, format, gzip)
            .await?
            .save(writer)
            .await
    }

    /// Risk rules of a category
    pub async fn get_riskrules(&self, category: &str) -> Result<Vec<Value>> {
        let response = self
            .get_route(&[category, "riskrules"], Params::new())
            .await?;
        Ok(response.entities())
    }

    /// Download demo events for a category (ip, domain, hash, ...)
    pub async fn get_demoevents(&self, category: &str, limit: u32) -> Result<FileResponse> {
        let mut params = Params::new();
        params.insert("limit".to_string(), limit.to_string());
        self.get_file(&[category, "demoevents"], params).await
    }

    /// Stream demo events into a writer
    pub async fn save_demoevents<W>(&self, writer: &mut W, category: &str, limit: u32) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        self.get_demoevents(category, limit)
            .await?
            .save(writer)
            .await
    }

    // ========================================================================
    // Per category helpers
    // ========================================================================

    /// Search IP addresses, optionally within a range (`start-end` or CIDR)
    pub async fn search_ips(
        &self,
        ip_range: Option<&str>,
        params: SearchParams,
    ) -> Result<ConnectResponse> {
        let params = SearchParams {
            ip_range: ip_range.map(String::from).or(params.ip_range.clone()),
            ..params
        };
        self.search("ip", &params).await
    }

    pub async fn lookup_ip(&self, ip: &str, params: &LookupParams) -> Result<Value> {
        self.lookup("ip", ip, params).await
    }

    /// Search domains, optionally below a parent domain
    pub async fn search_domains(
        &self,
        parent: Option<&str>,
        params: SearchParams,
    ) -> Result<ConnectResponse> {
        let params = SearchParams {
            parent: parent.map(String::from).or(params.parent.clone()),
            ..params
        };
        self.search("domain", &params).await
    }

    pub async fn lookup_domain(&self, domain: &str, params: &LookupParams) -> Result<Value> {
        self.lookup("domain", domain, params).await
    }

    /// Search hashes, optionally of one algorithm (`md5`, `sha256`, ...)
    pub async fn search_hashes(
        &self,
        algorithm: Option<&str>,
        params: SearchParams,
    ) -> Result<ConnectResponse> {
        let params = SearchParams {
            algorithm: algorithm
                .map(str::to_uppercase)
                .or(params.algorithm.clone()),
            ..params
        };
        self.search("hash", &params).await
    }

    pub async fn lookup_hash(&self, hash: &str, params: &LookupParams) -> Result<Value> {
        self.lookup("hash", hash, params).await
    }

    pub async fn search_malwares(
        &self,
        freetext: Option<&str>,
        params: SearchParams,
    ) -> Result<ConnectResponse> {
        let params = SearchParams {
            freetext: freetext.map(String::from).or(params.freetext.clone()),
            ..params
        };
        self.search("malware", &params).await
    }

    /// Look up a malware by entity id
    pub async fn lookup_malware(&self, malware_id: &str, params: &LookupParams) -> Result<Value> {
        self.lookup("malware", malware_id, params).await
    }

    pub async fn search_vulnerabilities(
        &self,
        freetext: Option<&str>,
        cvss_score: Option<&str>,
        params: SearchParams,
    ) -> Result<ConnectResponse> {
        let params = SearchParams {
            freetext: freetext.map(String::from).or(params.freetext.clone()),
            cvss_score: cvss_score.map(String::from).or(params.cvss_score.clone()),
            ..params
        };
        self.search("vulnerability", &params).await
    }

    pub async fn lookup_vulnerability(&self, id: &str, params: &LookupParams) -> Result<Value> {
        self.lookup("vulnerability", id, params).await
    }

    pub async fn search_urls(
        &self,
        freetext: Option<&str>,
        params: SearchParams,
    ) -> Result<ConnectResponse> {
        let params = SearchParams {
            freetext: freetext.map(String::from).or(params.freetext.clone()),
            ..params
        };
        self.search("url", &params).await
    }

    /// Look up a URL; the URL is sent percent-encoded as one path segment
    pub async fn lookup_url(&self, url: &str, params: &LookupParams) -> Result<Value> {
        self.lookup("url", url, params).await
    }

    pub async fn search_alerts(&self, params: SearchParams) -> Result<ConnectResponse> {
        self.search("alert", &params).await
    }

    pub async fn lookup_alert(&self, alert_id: &str) -> Result<Value> {
        self.lookup("alert", alert_id, &LookupParams::default())
            .await
    }

    /// Alert rules matching a free text
    pub async fn get_alert_rule(&self, freetext: &str, limit: u32) -> Result<ConnectResponse> {
        let mut params = Params::new();
        params.insert("freetext".to_string(), freetext.to_string());
        params.insert("limit".to_string(), limit.to_string());
        self.get_route(&["alert", "rule"], params).await
    }

    // ========================================================================
    // Fusion files
    // ========================================================================

    /// Download a fusion file, ex `/home/example/file.csv`
    pub async fn get_fusion_file(&self, path: &str) -> Result<FileResponse> {
        self.get_file(&["fusion", "files", ""], fusion_params(path))
            .await
    }

    /// Headers of a fusion file, from a HEAD request
    pub async fn head_fusion_file(&self, path: &str) -> Result<HeaderMap> {
        let url = self.route_url(&["fusion", "files", ""])?;
        let response = self
            .http
            .head(url.as_str(), RequestConfig::new().params(&fusion_params(path)))
            .await?;
        Ok(response.headers().clone())
    }

    /// Stream a fusion file into a writer
    pub async fn save_fusion_file<W>(&self, path: &str, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        self.get_fusion_file(path).await?.save(writer).await
    }

    /// Replace `local_path` with the fusion file when their SHA-256 differ.
    ///
    /// The remote checksum comes from a HEAD request; the local one is
    /// `sha256` when given, otherwise computed from the file. A missing local
    /// file always syncs. The download goes to a temp file (in `tmpdir` when
    /// given) before it is copied over the local file. Returns whether the
    /// local file was updated.
    pub async fn sync_fusion_file(
        &self,
        path: &str,
        local_path: impl AsRef<Path>,
        tmpdir: Option<&Path>,
        sha256: Option<&str>,
    ) -> Result<bool> {
        let local_path = local_path.as_ref();
        let headers = self.head_fusion_file(path).await?;
        let desired = headers
            .get(CONTENT_SHA256_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase);

        let actual = match sha256 {
            Some(sum) => Some(sum.to_ascii_lowercase()),
            None => match file_sha256(local_path).await {
                Ok(sum) => Some(sum),
                Err(e) => {
                    debug!("Checksum could not be computed, local file missing? {e}");
                    None
                }
            },
        };

        if desired.is_some() && desired == actual {
            debug!("Found matching checksums, {} is in sync", local_path.display());
            return Ok(false);
        }
        debug!("Local file: {actual:?} ({})", local_path.display());
        debug!("Api file:   {desired:?}");

        let tmp = match tmpdir {
            Some(dir) => {
                info!(
                    "Sync of local file {} with fusion file {path} needed, using tmpdir {}",
                    local_path.display(),
                    dir.display()
                );
                tempfile::NamedTempFile::new_in(dir)
                    .context("Failed to create temp file in tmpdir")?
            }
            None => {
                info!(
                    "Sync of local file {} with fusion file {path} needed",
                    local_path.display()
                );
                tempfile::NamedTempFile::new().context("Failed to create temp file")?
            }
        };

        let mut out = tokio::fs::File::create(tmp.path()).await?;
        self.save_fusion_file(path, &mut out).await?;
        out.sync_all().await?;
        drop(out);

        tokio::fs::copy(tmp.path(), local_path)
            .await
            .with_context(|| format!("Failed to update {}", local_path.display()))?;
        Ok(true)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn get_file(&self, segments: &[&str], params: Params) -> Result<FileResponse> {
        let url = self.route_url(segments)?;
        debug!("Requesting file path_info={}", url.path());
        let response = self
            .http
            .get(url.as_str(), RequestConfig::new().params(&params))
            .await?;
        Ok(FileResponse::new(response))
    }

    /// Connect URL with each segment percent-encoded
    fn route_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.http.config().connect_url)?;
        url.path_segments_mut()
            .map_err(|()| Error::config("connect_url cannot be a base URL"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn fusion_params(path: &str) -> Params {
    let mut params = Params::new();
    params.insert("path".to_string(), path.to_string());
    params
}

/// Hex SHA-256 of a file, read in blocks
async fn file_sha256(path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    hash_reader(&mut file).await
}

async fn hash_reader<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 65536];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
