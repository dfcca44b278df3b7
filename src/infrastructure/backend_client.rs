//! REST client for the seller sales backend
//!
//! Implements [`SyncBackend`] and [`SalesReader`] over reqwest with optional
//! bearer authentication and client-side rate limiting.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::{
    Client, RequestBuilder, StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::domain::date_range::{DateRange, format_date_key};
use crate::domain::errors::BackendError;
use crate::domain::sales::{SaleOrder, SalesSummary};
use crate::domain::sync_backend::{DaySyncResponse, OwnerId, ReconcileResponse, SalesReader, SyncBackend};
use crate::infrastructure::config::BackendConfig;

const DAILY_SYNC_PATH: &str = "sync/daily";
const RECONCILE_PATH: &str = "sync/reconcile";
const SALES_PATH: &str = "sales";
// Error bodies are echoed into messages; keep them short
const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DailySyncRequest {
    date: String,
    seller_id: OwnerId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReconcileRequest {
    from: String,
    to: String,
    seller_id: OwnerId,
}

/// Orders as listed by the backend; totals are always recomputed locally
#[derive(Deserialize)]
struct SalesPayload {
    #[serde(default)]
    orders: Vec<SaleOrder>,
}

pub struct BackendClient {
    client: Client,
    base_url: Url,
    rate_limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| BackendError::Config(format!("invalid user agent: {e}")))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = config.api_token.as_deref().filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| BackendError::Config(format!("invalid api token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| BackendError::Config(format!("failed to build HTTP client: {e}")))?;

        // Url::join drops the last path segment unless it ends with '/'
        let mut base = config.base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base)
            .map_err(|e| BackendError::Config(format!("invalid base url {:?}: {e}", config.base_url)))?;

        let rate_limiter = NonZeroU32::new(config.max_requests_per_second)
            .map(|rps| RateLimiter::direct(Quota::per_second(rps)));

        Ok(Self {
            client,
            base_url,
            rate_limiter,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::Config(format!("invalid endpoint {path}: {e}")))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Backend rate limit hit");
            return Err(BackendError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SyncBackend for BackendClient {
    async fn sync_day(&self, day: NaiveDate, owner: OwnerId) -> Result<DaySyncResponse, BackendError> {
        let url = self.endpoint(DAILY_SYNC_PATH)?;
        let body = DailySyncRequest {
            date: format_date_key(day),
            seller_id: owner,
        };
        debug!(day = %body.date, %owner, "POST daily sync");
        self.send_json(self.client.post(url).json(&body)).await
    }

    async fn reconcile_status_changes(
        &self,
        range: &DateRange,
        owner: OwnerId,
    ) -> Result<ReconcileResponse, BackendError> {
        let url = self.endpoint(RECONCILE_PATH)?;
        let body = ReconcileRequest {
            from: format_date_key(range.from),
            to: format_date_key(range.to),
            seller_id: owner,
        };
        debug!(%range, %owner, "POST reconcile");
        self.send_json(self.client.post(url).json(&body)).await
    }
}

#[async_trait]
impl SalesReader for BackendClient {
    async fn fetch_sales(&self, range: &DateRange, owner: OwnerId) -> Result<SalesSummary, BackendError> {
        let url = self.endpoint(SALES_PATH)?;
        let query = [
            ("from", format_date_key(range.from)),
            ("to", format_date_key(range.to)),
            ("sellerId", owner.to_string()),
        ];
        debug!(%range, %owner, "GET sales");
        let payload: SalesPayload = self.send_json(self.client.get(url).query(&query)).await?;
        Ok(SalesSummary::new(*range, owner, payload.orders))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> BackendConfig {
        BackendConfig {
            base_url: base_url.to_string(),
            ..BackendConfig::default()
        }
    }

    #[test]
    fn test_endpoints_keep_base_path() {
        let client = BackendClient::new(&config("http://localhost:3000/api")).unwrap();
        assert_eq!(
            client.endpoint(DAILY_SYNC_PATH).unwrap().as_str(),
            "http://localhost:3000/api/sync/daily"
        );

        let client = BackendClient::new(&config("http://localhost:3000/api/")).unwrap();
        assert_eq!(client.endpoint(SALES_PATH).unwrap().as_str(), "http://localhost:3000/api/sales");
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let result = BackendClient::new(&config("::nope::"));
        assert!(matches!(result, Err(BackendError::Config(_))));
    }

    #[test]
    fn test_zero_rate_disables_limiter() {
        let mut cfg = config("http://localhost:3000/api");
        cfg.max_requests_per_second = 0;
        assert!(BackendClient::new(&cfg).unwrap().rate_limiter.is_none());
    }

    #[test]
    fn test_request_bodies_are_camel_case() {
        let body = DailySyncRequest {
            date: "2025-01-03".into(),
            seller_id: OwnerId(77),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"date": "2025-01-03", "sellerId": 77})
        );
    }
}
