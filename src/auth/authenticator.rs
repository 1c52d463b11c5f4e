//! Authenticator implementation
//!
//! Resolves credentials and applies them to outgoing requests.

use super::types::{AuthConfig, Credentials, LEGACY_TOKEN_ENV, TOKEN_ENV};
use crate::error::{Error, Result};
use crate::types::ApiVersion;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION, DATE};
use reqwest::Request;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Token header used by the connect API (`X-RFToken`)
const RF_TOKEN_HEADER: &str = "x-rftoken";

/// Authenticator applies credentials to HTTP requests
#[derive(Debug, Clone)]
pub struct Authenticator {
    /// Auth configuration
    config: AuthConfig,
    /// Decides which header carries the token
    api_version: ApiVersion,
}

impl Authenticator {
    /// Create an authenticator; never fails, nothing is looked up yet
    pub fn new(config: AuthConfig, api_version: ApiVersion) -> Self {
        Self {
            config,
            api_version,
        }
    }

    /// Get the current auth config
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Resolve credentials right before use
    pub fn resolve(&self) -> Result<Credentials> {
        match &self.config {
            AuthConfig::Auto => find_env_token()
                .map(Credentials::Token)
                .ok_or(Error::MissingAuth),
            AuthConfig::Token(token) if !token.is_empty() => {
                Ok(Credentials::Token(token.clone()))
            }
            AuthConfig::Signature { username, key } => Ok(Credentials::Signature {
                username: username.clone(),
                key: key.clone(),
            }),
            AuthConfig::Token(_) | AuthConfig::None => Err(Error::MissingAuth),
        }
    }

    /// Resolve credentials and put them on a built request
    pub fn apply(&self, request: &mut Request) -> Result<()> {
        match self.resolve()? {
            Credentials::Token(token) => match self.api_version {
                ApiVersion::V1 => {
                    let value = header_value(&format!("RF-TOKEN token={token}"))?;
                    request.headers_mut().insert(AUTHORIZATION, value);
                }
                ApiVersion::V2 => {
                    let value = header_value(&token)?;
                    request
                        .headers_mut()
                        .insert(HeaderName::from_static(RF_TOKEN_HEADER), value);
                }
            },
            Credentials::Signature { username, key } => {
                let url = request.url();
                let path_url = match url.query() {
                    Some(query) => format!("{}?{query}", url.path()),
                    None => url.path().to_string(),
                };
                let body = request
                    .body()
                    .and_then(reqwest::Body::as_bytes)
                    .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                    .unwrap_or_default();
                let date = http_date(Utc::now());
                let hash = signature_hash(&key, &path_url, &body, &date)?;

                let headers = request.headers_mut();
                headers.insert(DATE, header_value(&date)?);
                headers.insert(
                    AUTHORIZATION,
                    header_value(&format!("RF-HS256 user={username}, hash={hash}"))?,
                );
            }
        }
        Ok(())
    }
}

/// Hex HMAC-SHA256 over the signed text of a request.
///
/// Connect (`v2`) paths sign the path with `/rfq` removed; raw API paths sign
/// `?` followed by the query string. Both append the body and the date.
pub fn signature_hash(key: &str, path_url: &str, body: &str, date: &str) -> Result<String> {
    let text = if path_url.contains("v2") {
        format!("{}{body}{date}", path_url.replace("/rfq", ""))
    } else {
        let params = path_url.split_once('?').map_or("", |(_, q)| q);
        format!("?{params}{body}{date}")
    };

    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| Error::config(format!("Invalid signing key: {e}")))?;
    mac.update(text.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// RFC 1123 date as used in the `Date` header
pub fn http_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn find_env_token() -> Option<String> {
    [TOKEN_ENV, LEGACY_TOKEN_ENV]
        .into_iter()
        .find_map(|name| std::env::var(name).ok())
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::config(format!("Invalid header value: {e}")))
}
