//! Tuya OpenAPI client supplying thermometer status
//!
//! Requests are signed with HMAC-SHA256 over
//! `client_id [+ access_token] + t + nonce + stringToSign`, where
//! `stringToSign = METHOD \n sha256(body) \n \n path`.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use super::engine::DEFAULT_CALL_TIMEOUT;
use super::error::FetchError;
use super::ports::DeviceStatusFetcher;
use super::reading::RawStatus;

type HmacSha256 = Hmac<Sha256>;

/// Default Tuya data center
pub const TUYA_BASE_URL: &str = "https://openapi.tuyaus.com";

const TOKEN_PATH: &str = "/v1.0/token?grant_type=1";

/// Tokens are refreshed this long before they expire
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Tuya error codes meaning the access token is no longer valid
const TOKEN_INVALID_CODES: [i64; 2] = [1010, 1011];

/// Tuya credentials
#[derive(Debug, Clone)]
pub struct TuyaConfig {
    pub base_url: String,
    pub access_key: String,
    pub secret_key: String,
}

/// Tuya response envelope
#[derive(Debug, Deserialize)]
struct TuyaResponse {
    success: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResult {
    access_token: String,
    /// Lifetime in seconds
    expire_time: u64,
}

/// Failure reported inside a Tuya response envelope
#[derive(Debug)]
struct ApiRejection {
    code: i64,
    msg: String,
}

impl ApiRejection {
    fn is_token_invalid(&self) -> bool {
        TOKEN_INVALID_CODES.contains(&self.code)
    }

    fn into_fetch_error(self) -> FetchError {
        FetchError::Rejected(format!("code {}: {}", self.code, self.msg))
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    refresh_at: Instant,
}

fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

/// Device status client for the Tuya cloud
pub struct TuyaClient {
    config: TuyaConfig,
    client: Client,
    token: Mutex<Option<CachedToken>>,
}

impl TuyaClient {
    pub fn new(config: TuyaConfig) -> Self {
        Self {
            config,
            client: http_client(DEFAULT_CALL_TIMEOUT),
            token: Mutex::new(None),
        }
    }

    /// Bound every request (token and status) to `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }

    /// Cached access token, requesting a new one when missing or near expiry
    async fn access_token(&self) -> Result<String, FetchError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.access_token.clone());
            }
        }

        debug!("Requesting Tuya access token");
        let result = self
            .signed_get(TOKEN_PATH, None)
            .await?
            .map_err(ApiRejection::into_fetch_error)?;
        let token: TokenResult = serde_json::from_value(result)
            .map_err(|e| FetchError::Malformed(format!("token response: {}", e)))?;

        let lifetime = Duration::from_secs(token.expire_time).saturating_sub(TOKEN_REFRESH_MARGIN);
        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });

        Ok(token.access_token)
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    /// Signed GET returning the envelope's `result`
    ///
    /// The outer error is a transport or decoding failure, the inner one a
    /// rejection reported by the API itself.
    async fn signed_get(
        &self,
        path: &str,
        access_token: Option<&str>,
    ) -> Result<Result<Value, ApiRejection>, FetchError> {
        let t = chrono::Utc::now().timestamp_millis().to_string();
        let nonce = Uuid::new_v4().to_string();
        let sign = sign_request(
            &self.config.access_key,
            &self.config.secret_key,
            access_token.unwrap_or_default(),
            &t,
            &nonce,
            "GET",
            path,
            "",
        )?;

        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let mut request = self
            .client
            .get(&url)
            .header("client_id", &self.config.access_key)
            .header("sign", sign)
            .header("sign_method", "HMAC-SHA256")
            .header("t", &t)
            .header("nonce", &nonce);
        if let Some(token) = access_token {
            request = request.header("access_token", token);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Tuya request failed");
            FetchError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Transport(format!("HTTP {}", status)));
        }

        let envelope: TuyaResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        if !envelope.success {
            return Ok(Err(ApiRejection {
                code: envelope.code.unwrap_or_default(),
                msg: envelope.msg.unwrap_or_default(),
            }));
        }

        envelope
            .result
            .map(Ok)
            .ok_or_else(|| FetchError::Malformed("response has no result".to_string()))
    }
}

#[async_trait]
impl DeviceStatusFetcher for TuyaClient {
    #[instrument(skip(self))]
    async fn fetch(&self, device_id: &str) -> Result<RawStatus, FetchError> {
        if !is_valid_device_id(device_id) {
            warn!("Refusing to query malformed device id");
            return Err(FetchError::UnknownDevice(device_id.to_string()));
        }

        let token = self.access_token().await?;
        let path = format!("/v1.0/devices/{}/status", device_id);
        let result = match self.signed_get(&path, Some(&token)).await? {
            Ok(result) => result,
            Err(rejection) => {
                if rejection.is_token_invalid() {
                    self.invalidate_token().await;
                }
                return Err(rejection.into_fetch_error());
            }
        };

        let status = RawStatus::from_value(result)?;
        debug!(fields = status.fields().len(), "Tuya device status received");
        Ok(status)
    }
}

/// Compute the upper-case hex HMAC-SHA256 request signature
#[allow(clippy::too_many_arguments)]
pub fn sign_request(
    access_key: &str,
    secret_key: &str,
    access_token: &str,
    t: &str,
    nonce: &str,
    method: &str,
    path: &str,
    body: &str,
) -> Result<String, FetchError> {
    let content_hash = hex::encode(Sha256::digest(body.as_bytes()));
    let string_to_sign = format!("{}\n{}\n\n{}", method, content_hash, path);
    let message = format!(
        "{}{}{}{}{}",
        access_key, access_token, t, nonce, string_to_sign
    );

    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
        .map_err(|e| FetchError::Rejected(format!("invalid secret key: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(hex::encode_upper(mac.finalize().into_bytes()))
}

fn is_valid_device_id(device_id: &str) -> bool {
    !device_id.is_empty()
        && device_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
