//! Auth configuration types

use std::fmt;

/// Primary environment variable holding the API token
pub const TOKEN_ENV: &str = "RF_TOKEN";

/// Legacy environment variable, checked after `TOKEN_ENV`
pub const LEGACY_TOKEN_ENV: &str = "RECFUT_TOKEN";

/// Authentication configuration, as given by the caller
#[derive(Clone, Default, PartialEq, Eq)]
pub enum AuthConfig {
    /// Look the token up in the environment when a request is made
    #[default]
    Auto,

    /// Explicit API token
    Token(String),

    /// Signed requests (HMAC-SHA256 over path, body and date)
    Signature {
        /// User name sent in the Authorization header
        username: String,
        /// Secret key used for signing
        key: String,
    },

    /// No credentials; every request fails with `MissingAuth`
    None,
}

impl AuthConfig {
    /// Build from an optional token: `None` or `"auto"` means environment lookup
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            None | Some("auto") => Self::Auto,
            Some(token) => Self::Token(token.to_string()),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("Auto"),
            Self::Token(_) => f.write_str("Token(***)"),
            Self::Signature { username, .. } => f
                .debug_struct("Signature")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::None => f.write_str("None"),
        }
    }
}

/// Credentials after resolution, ready to be put on a request
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// API token
    Token(String),
    /// Signing credentials
    Signature { username: String, key: String },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token(***)"),
            Self::Signature { username, .. } => f
                .debug_struct("Signature")
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}
