// Blizzard game-data API client: OAuth client-credentials token
// exchange plus a cached current-period lookup. One client instance is
// constructed at startup and shared by reference; the caches live
// behind mutexes so concurrent callers can't race a refresh.

use chrono::{DateTime, Duration, TimeZone, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::affixes;
use crate::config::BlizzardConfig;

/// Refresh tokens this many seconds before their stated expiry so a
/// token never goes stale mid-request.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// How much upstream body to keep on errors (for logs, never chat).
const ERROR_BODY_LIMIT: usize = 256;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The token exchange itself failed. There is no degraded response
    /// for this; callers should treat it as a hard failure.
    #[error("token exchange failed: {0}")]
    Auth(String),
    #[error("upstream returned {status}: {body}")]
    Upstream { status: StatusCode, body: String },
    #[error("request failed: {0}")]
    Request(String),
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// A cached value paired with the expiry it was fetched with. The two
/// are only ever written together, so a reader can never observe a
/// value against a stale expiry.
#[derive(Debug, Default)]
pub struct Expiring<T> {
    slot: Option<(T, DateTime<Utc>)>,
}

impl<T: Clone> Expiring<T> {
    pub fn empty() -> Self {
        Self { slot: None }
    }

    /// The cached value, if one is present and `now` is before its expiry.
    pub fn get(&self, now: DateTime<Utc>) -> Option<T> {
        match &self.slot {
            Some((value, expires_at)) if now < *expires_at => Some(value.clone()),
            _ => None,
        }
    }

    pub fn put(&mut self, value: T, expires_at: DateTime<Utc>) {
        self.slot = Some((value, expires_at));
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Authenticated Blizzard API client. Construct exactly one per
/// process (it owns the credential session) and inject it wherever
/// period/affix data is needed.
pub struct BlizzardClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    token_url: String,
    api_base: String,
    seasonal_affix: u32,
    token: Mutex<Expiring<String>>,
    period: Mutex<Expiring<u32>>,
}

impl BlizzardClient {
    pub fn new(config: BlizzardConfig, seasonal_affix: u32) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: config.client_id,
            client_secret: config.client_secret,
            token_url: config.token_url,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            seasonal_affix,
            token: Mutex::new(Expiring::empty()),
            period: Mutex::new(Expiring::empty()),
        }
    }

    // ── Token cache ──────────────────────────────────────────────────

    /// Current bearer token, exchanging credentials when the cached one
    /// is absent or expired. The lock is held across the exchange so
    /// concurrent callers never issue duplicate requests.
    pub async fn access_token(&self) -> Result<String, ApiError> {
        let mut token = self.token.lock().await;
        if let Some(cached) = token.get(Utc::now()) {
            return Ok(cached);
        }
        let (fresh, expires_at) = self.exchange_token().await?;
        token.put(fresh.clone(), expires_at);
        Ok(fresh)
    }

    /// Discard the cached token and exchange for a new one. Used after
    /// an upstream 401, which means the token died before its expiry.
    async fn refresh_access_token(&self) -> Result<String, ApiError> {
        let mut token = self.token.lock().await;
        token.clear();
        let (fresh, expires_at) = self.exchange_token().await?;
        token.put(fresh.clone(), expires_at);
        Ok(fresh)
    }

    async fn exchange_token(&self) -> Result<(String, DateTime<Utc>), ApiError> {
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| ApiError::Auth(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Auth(e.to_string()))?;
        if !status.is_success() {
            return Err(ApiError::Auth(format!("token endpoint returned {status}")));
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::Auth(e.to_string()))?;
        let lifetime = (token.expires_in - TOKEN_EXPIRY_MARGIN_SECS).max(0);
        Ok((token.access_token, Utc::now() + Duration::seconds(lifetime)))
    }

    // ── Authenticated GET ────────────────────────────────────────────

    /// Authorized GET returning parsed JSON. A 401 triggers exactly one
    /// token refresh and retry.
    pub async fn get_json(&self, url: &str) -> Result<Value, ApiError> {
        let token = self.access_token().await?;
        let mut response = self.send_get(url, &token).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            let token = self.refresh_access_token().await?;
            response = self.send_get(url, &token).await?;
        }
        Self::decode_json(response).await
    }

    async fn send_get(&self, url: &str, token: &str) -> Result<reqwest::Response, ApiError> {
        self.http
            .get(url)
            .bearer_auth(token)
            .header("x-request-id", format!("req_{}", Uuid::new_v4().simple()))
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))
    }

    async fn decode_json(response: reqwest::Response) -> Result<Value, ApiError> {
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes)
                .chars()
                .take(ERROR_BODY_LIMIT)
                .collect();
            return Err(ApiError::Upstream { status, body });
        }
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    // ── Period cache ─────────────────────────────────────────────────

    /// Current scoring period id, cached until the period's own
    /// `end_timestamp`. The id and its expiry are fetched and stored
    /// under one guard so they can never be refreshed independently.
    pub async fn current_period(&self) -> Result<u32, ApiError> {
        let mut period = self.period.lock().await;
        if let Some(cached) = period.get(Utc::now()) {
            return Ok(cached);
        }

        let index = self.get_json(&self.period_index_url()).await?;
        let id = index
            .pointer("/current_period/id")
            .and_then(Value::as_u64)
            .ok_or_else(|| ApiError::Decode("missing current_period.id".to_string()))?
            as u32;

        let detail = self.get_json(&self.period_detail_url(id)).await?;
        let end_ms = detail
            .get("end_timestamp")
            .and_then(Value::as_i64)
            .ok_or_else(|| ApiError::Decode("missing end_timestamp".to_string()))?;
        let expires_at = Utc
            .timestamp_millis_opt(end_ms)
            .single()
            .ok_or_else(|| ApiError::Decode(format!("bad end_timestamp {end_ms}")))?;

        period.put(id, expires_at);
        Ok(id)
    }

    /// Affix ids for a period: rotation entry plus the configured
    /// seasonal affix. Pure lookup, no I/O.
    pub fn affixes_for_period(&self, period: u32) -> [u32; 4] {
        affixes::affixes_for_period(period, self.seasonal_affix)
    }

    /// Current period plus its four affix ids (rotation + seasonal).
    pub async fn current_affixes(&self) -> Result<(u32, [u32; 4]), ApiError> {
        let period = self.current_period().await?;
        Ok((period, self.affixes_for_period(period)))
    }

    /// Description text for an affix. Infrequent enough to skip caching.
    pub async fn affix_details(&self, affix_id: u32) -> Result<String, ApiError> {
        let data = self.get_json(&self.affix_detail_url(affix_id)).await?;
        data.get("description")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::Decode("missing description".to_string()))
    }

    // ── Endpoints ────────────────────────────────────────────────────

    fn period_index_url(&self) -> String {
        format!(
            "{}/data/wow/mythic-keystone/period/index?namespace=dynamic-us&locale=en_US",
            self.api_base
        )
    }

    fn period_detail_url(&self, period_id: u32) -> String {
        format!(
            "{}/data/wow/mythic-keystone/period/{period_id}?namespace=dynamic-us&locale=en_US",
            self.api_base
        )
    }

    fn affix_detail_url(&self, affix_id: u32) -> String {
        format!(
            "{}/data/wow/keystone-affix/{affix_id}?namespace=static-us&locale=en_US",
            self.api_base
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_API_BASE, DEFAULT_TOKEN_URL};

    fn test_client() -> BlizzardClient {
        BlizzardClient::new(
            BlizzardConfig {
                client_id: "id".to_string(),
                client_secret: "secret".to_string(),
                token_url: DEFAULT_TOKEN_URL.to_string(),
                api_base: format!("{DEFAULT_API_BASE}/"),
            },
            120,
        )
    }

    #[test]
    fn test_endpoint_urls() {
        let client = test_client();
        assert_eq!(
            client.period_index_url(),
            "https://us.api.blizzard.com/data/wow/mythic-keystone/period/index\
             ?namespace=dynamic-us&locale=en_US"
        );
        assert_eq!(
            client.period_detail_url(770),
            "https://us.api.blizzard.com/data/wow/mythic-keystone/period/770\
             ?namespace=dynamic-us&locale=en_US"
        );
        assert_eq!(
            client.affix_detail_url(9),
            "https://us.api.blizzard.com/data/wow/keystone-affix/9\
             ?namespace=static-us&locale=en_US"
        );
    }

    #[test]
    fn test_client_affix_lookup_appends_seasonal() {
        let client = test_client();
        assert_eq!(client.affixes_for_period(0), [10, 8, 12, 120]);
        assert_eq!(client.affixes_for_period(12), client.affixes_for_period(0));
    }

    #[test]
    fn test_expiring_starts_empty() {
        let cache: Expiring<String> = Expiring::empty();
        assert_eq!(cache.get(Utc::now()), None);
    }

    #[test]
    fn test_expiring_returns_value_before_expiry() {
        let now = Utc::now();
        let mut cache = Expiring::empty();
        cache.put("token-1".to_string(), now + Duration::seconds(60));

        assert_eq!(cache.get(now), Some("token-1".to_string()));
        assert_eq!(
            cache.get(now + Duration::seconds(59)),
            Some("token-1".to_string())
        );
    }

    #[test]
    fn test_expiring_expires_at_deadline() {
        let now = Utc::now();
        let mut cache = Expiring::empty();
        cache.put("token-1".to_string(), now + Duration::seconds(60));

        assert_eq!(cache.get(now + Duration::seconds(60)), None);
        assert_eq!(cache.get(now + Duration::seconds(3600)), None);
    }

    #[test]
    fn test_expiring_clear() {
        let now = Utc::now();
        let mut cache = Expiring::empty();
        cache.put(7u32, now + Duration::seconds(60));
        cache.clear();
        assert_eq!(cache.get(now), None);
    }

    #[test]
    fn test_refresh_happens_once_per_expiry_window() {
        // Drive the check-then-refresh sequence the way access_token()
        // does and count how many refreshes actually happen.
        let start = Utc::now();
        let mut cache = Expiring::empty();
        let refreshes = std::cell::Cell::new(0);

        let mut lookup = |now: DateTime<Utc>| -> String {
            if let Some(cached) = cache.get(now) {
                return cached;
            }
            refreshes.set(refreshes.get() + 1);
            let fresh = format!("token-{}", refreshes.get());
            cache.put(fresh.clone(), now + Duration::seconds(60));
            fresh
        };

        // Two lookups inside the validity window: one refresh, same token.
        let first = lookup(start);
        let second = lookup(start + Duration::seconds(30));
        assert_eq!(first, second);
        assert_eq!(refreshes.get(), 1);

        // Past expiry: exactly one more refresh, new token.
        let third = lookup(start + Duration::seconds(90));
        assert_ne!(third, first);
        assert_eq!(refreshes.get(), 2);
    }
}
