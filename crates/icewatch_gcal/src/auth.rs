// --- File: crates/icewatch_gcal/src/auth.rs ---
//! Service-account authentication for the Google APIs.
//!
//! A signed JWT assertion is exchanged at the account's `token_uri` for a
//! short-lived bearer token. The token is reused until it expires and can be
//! cached in a small JSON file between runs.

use chrono::{DateTime, Duration, Utc};
use icewatch_config::GcalConfig;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::AuthError;

pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// The fields of a Google service-account credentials file that are used.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
}

impl ServiceAccountKey {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AuthError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| AuthError::CredentialsIo {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// An access token and the instant it stops being accepted.
///
/// Serialized as `{"Token": ..., "Validity": ...}` in the token cache file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BearerToken {
    #[serde(rename = "Token")]
    pub value: String,
    #[serde(rename = "Validity")]
    pub expiry: DateTime<Utc>,
}

impl BearerToken {
    /// Usable only strictly before its expiry.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.value.is_empty() && self.expiry > now
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    aud: &'a str,
    exp: i64,
    iat: i64,
    iss: &'a str,
    scope: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    expires_in: i64,
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

/// Hands out bearer tokens for calendar requests, renewing them as needed.
pub struct TokenAuthenticator {
    http: Client,
    key: EncodingKey,
    client_email: String,
    token_uri: String,
    token_path: Option<PathBuf>,
    token: Mutex<Option<BearerToken>>,
}

impl fmt::Debug for TokenAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthenticator")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .field("token_path", &self.token_path)
            .finish_non_exhaustive()
    }
}

impl TokenAuthenticator {
    /// Builds an authenticator from the `gcal` config section.
    ///
    /// Returns `Ok(None)` when no credentials file is configured.
    pub fn from_config(config: &GcalConfig) -> Result<Option<Self>, AuthError> {
        let Some(credentials) = config.credentials_path.as_deref().filter(|p| !p.is_empty())
        else {
            return Ok(None);
        };
        let key = ServiceAccountKey::from_file(credentials)?;
        let token_path = config
            .token_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);
        Self::new(key, token_path).map(Some)
    }

    /// Parses the private key and preloads a cached token if one exists.
    pub fn new(key: ServiceAccountKey, token_path: Option<PathBuf>) -> Result<Self, AuthError> {
        let encoding_key =
            EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(AuthError::InvalidKey)?;
        let cached = token_path.as_deref().and_then(load_stored_token);

        Ok(Self {
            http: (*icewatch_common::HTTP_CLIENT).clone(),
            key: encoding_key,
            client_email: key.client_email,
            token_uri: key.token_uri,
            token_path,
            token: Mutex::new(cached),
        })
    }

    pub async fn current_token(&self) -> Option<BearerToken> {
        self.token.lock().await.clone()
    }

    /// A token valid now, renewing first if needed.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        self.access_token_at(Utc::now()).await
    }

    pub async fn access_token_at(&self, now: DateTime<Utc>) -> Result<String, AuthError> {
        let mut current = self.token.lock().await;
        if let Some(token) = current.as_ref().filter(|t| t.is_valid_at(now)) {
            return Ok(token.value.clone());
        }

        debug!("Requesting a new access token from {}", self.token_uri);
        let renewed = self.request_token(now).await?;
        info!("Obtained access token valid until {}", renewed.expiry);
        if let Some(path) = &self.token_path {
            if let Err(e) = store_token(path, &renewed).await {
                warn!("Can't store access token in {}: {}", path.display(), e);
            }
        }
        let value = renewed.value.clone();
        *current = Some(renewed);
        Ok(value)
    }

    /// Attaches `Authorization: Bearer <token>` to `request`.
    pub async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, AuthError> {
        let token = self.access_token().await?;
        Ok(request.bearer_auth(token))
    }

    fn sign_assertion(&self, issued_at: DateTime<Utc>) -> Result<String, AuthError> {
        let iat = issued_at.timestamp();
        let claims = Claims {
            aud: &self.token_uri,
            exp: iat + ASSERTION_LIFETIME_SECS,
            iat,
            iss: &self.client_email,
            scope: CALENDAR_SCOPE,
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.key).map_err(AuthError::Signing)
    }

    async fn request_token(&self, now: DateTime<Utc>) -> Result<BearerToken, AuthError> {
        let assertion = self.sign_assertion(now)?;
        let response = self
            .http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed = serde_json::from_str::<TokenResponse>(&body);

        match parsed {
            Ok(r) if !r.error.is_empty() => Err(AuthError::Rejected {
                error: r.error,
                description: r.error_description,
            }),
            _ if !status.is_success() => Err(AuthError::Http {
                status: status.as_u16(),
                body,
            }),
            Err(e) => Err(AuthError::MalformedResponse(e.to_string())),
            Ok(r) if r.token_type != "Bearer" => Err(AuthError::UnknownTokenType(r.token_type)),
            Ok(r) => Ok(BearerToken {
                value: r.access_token,
                expiry: now + Duration::seconds(r.expires_in),
            }),
        }
    }
}

/// Reads a cached token; any problem just means starting without one.
fn load_stored_token(path: &Path) -> Option<BearerToken> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            info!("Stored token not retrieved from {}: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(token) => Some(token),
        Err(e) => {
            warn!("Stored token file {} malformed: {}", path.display(), e);
            None
        }
    }
}

async fn store_token(path: &Path, token: &BearerToken) -> std::io::Result<()> {
    let json = serde_json::to_vec(token)?;
    tokio::fs::write(path, json).await
}
