//! Service account credentials and OAuth2 access tokens

use crate::error::{SyncError, SyncResult};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const STORAGE_SCOPE: &str = "https://www.googleapis.com/auth/devstorage.read_write";
const JWT_LIFETIME_SECS: i64 = 3600;
/// Refresh this long before the server-side expiry
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Google service account key file, as downloaded from the cloud console
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: String,
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    pub client_id: String,
    pub auth_uri: String,
    pub token_uri: String,
    pub auth_provider_x509_cert_url: String,
    pub client_x509_cert_url: String,
    pub universe_domain: String,
}

impl ServiceAccountKey {
    pub fn load(path: &Path) -> SyncResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Auth(format!("cannot read credentials {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            SyncError::Auth(format!("malformed credentials {}: {}", path.display(), e))
        })
    }

    fn token_uri(&self) -> &str {
        if self.token_uri.trim().is_empty() {
            DEFAULT_TOKEN_URI
        } else {
            &self.token_uri
        }
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Clone, Debug)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Hands out bearer tokens for storage requests
///
/// Either a fixed token from the environment, or one exchanged for a signed
/// JWT and cached until shortly before it expires.
#[derive(Debug)]
pub struct GcsAuth {
    credentials_path: PathBuf,
    static_token: Option<String>,
    cached: Mutex<Option<CachedToken>>,
}

impl GcsAuth {
    pub fn new(credentials_path: PathBuf, static_token: Option<String>) -> Self {
        GcsAuth {
            credentials_path,
            static_token,
            cached: Mutex::new(None),
        }
    }

    pub fn key(&self) -> SyncResult<ServiceAccountKey> {
        ServiceAccountKey::load(&self.credentials_path)
    }

    pub fn project_id(&self) -> SyncResult<String> {
        let key = self.key()?;
        if key.project_id.trim().is_empty() {
            return Err(SyncError::Auth(format!(
                "no project_id in {}",
                self.credentials_path.display()
            )));
        }
        Ok(key.project_id)
    }

    pub fn access_token(&self, client: &reqwest::blocking::Client) -> SyncResult<String> {
        if let Some(token) = &self.static_token {
            return Ok(token.clone());
        }

        let mut cached = self
            .cached
            .lock()
            .map_err(|_| SyncError::Auth("token cache poisoned".to_string()))?;
        if let Some(entry) = cached.as_ref()
            && Instant::now() < entry.expires_at
        {
            return Ok(entry.token.clone());
        }

        let key = self.key()?;
        let assertion = sign_assertion(&key, chrono::Utc::now().timestamp())?;
        let fresh = exchange_assertion(client, key.token_uri(), &assertion)?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}

/// RS256 JWT asserting the service account identity
fn sign_assertion(key: &ServiceAccountKey, now: i64) -> SyncResult<String> {
    if key.private_key.trim().is_empty() || key.client_email.trim().is_empty() {
        return Err(SyncError::Auth(
            "credentials.json has no private_key or client_email".to_string(),
        ));
    }

    let mut header = Header::new(Algorithm::RS256);
    if !key.private_key_id.is_empty() {
        header.kid = Some(key.private_key_id.clone());
    }
    let claims = Claims {
        iss: &key.client_email,
        scope: STORAGE_SCOPE,
        aud: key.token_uri(),
        iat: now,
        exp: now + JWT_LIFETIME_SECS,
    };

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| SyncError::Auth(format!("invalid private key: {}", e)))?;
    jsonwebtoken::encode(&header, &claims, &encoding_key)
        .map_err(|e| SyncError::Auth(format!("cannot sign token request: {}", e)))
}

fn exchange_assertion(
    client: &reqwest::blocking::Client,
    token_uri: &str,
    assertion: &str,
) -> SyncResult<CachedToken> {
    debug!("Requesting access token from {}", token_uri);
    let response = client
        .post(token_uri)
        .form(&[
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion),
        ])
        .send()
        .map_err(|e| SyncError::Transport(format!("token request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(SyncError::Auth(format!(
            "token exchange rejected ({}): {}",
            status, body
        )));
    }

    let parsed: TokenResponse = response
        .json()
        .map_err(|e| SyncError::Auth(format!("malformed token response: {}", e)))?;
    let lifetime = Duration::from_secs(parsed.expires_in).saturating_sub(EXPIRY_MARGIN);
    Ok(CachedToken {
        token: parsed.access_token,
        expires_at: Instant::now() + lifetime,
    })
}
