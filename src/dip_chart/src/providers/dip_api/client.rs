use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde_json::Value;
use tracing::debug;

use crate::{
    config::ClientConfig,
    models::{
        bar_series::BarSeries,
        dips::{CurrentDips, DipRow, TickerDetail},
        range::{FetchPlan, Timespan},
        request_params::{ChartRequest, normalize_symbol},
    },
    providers::{
        HistoryProvider, ProviderError,
        dip_api::{
            params::{chart_path, construct_params, live_feed_path, ws_base_url},
            response::{decode_chart, decode_current_dips, decode_dips, decode_ticker},
        },
    },
};

/// Timeout for ordinary reads.
pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(8_000);

/// Timeout for the backend refresh trigger, which runs ingestion synchronously.
pub const REFRESH_TIMEOUT: Duration = Duration::from_secs(120);

/// REST client for the dip backend.
///
/// Every call is bounded by a timeout; a call that exceeds it is aborted and
/// reported as [`ProviderError::Timeout`].
#[derive(Clone, Debug)]
pub struct DipApiClient {
    client: Client,
    base_url: String,
    request_timeout: Duration,
    refresh_timeout: Duration,
}

impl DipApiClient {
    /// Creates a client for `base_url` (e.g. `http://127.0.0.1:8000`) with
    /// the default timeouts.
    pub fn new(base_url: &str) -> Result<Self, ProviderError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            request_timeout: REQUEST_TIMEOUT,
            refresh_timeout: REFRESH_TIMEOUT,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ProviderError> {
        Ok(Self::new(&config.api_base_url)?
            .with_timeouts(config.request_timeout(), config.refresh_timeout()))
    }

    pub fn with_timeouts(mut self, request: Duration, refresh: Duration) -> Self {
        self.request_timeout = request;
        self.refresh_timeout = refresh;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// WebSocket base derived from the REST base, for [`LiveFeed`](crate::feed::LiveFeed).
    pub fn ws_base_url(&self) -> String {
        ws_base_url(&self.base_url)
    }

    /// Full URL of the live bar stream for `symbol`.
    pub fn live_feed_url(&self, symbol: &str) -> String {
        format!("{}{}", self.ws_base_url(), live_feed_path(symbol))
    }

    /// `GET /chart/intraday/{symbol}`. Without `lookback_minutes` the backend
    /// applies its own default.
    pub async fn intraday_chart(
        &self,
        symbol: &str,
        lookback_minutes: Option<u32>,
    ) -> Result<BarSeries, ProviderError> {
        let query: Vec<(&str, String)> = lookback_minutes
            .map(|m| vec![("lookback_minutes", m.to_string())])
            .unwrap_or_default();
        let path = format!("/chart/intraday/{}", normalize_symbol(symbol));
        let value = self.get_json(&path, &query).await?;
        decode_chart(&value, symbol, Timespan::Minute)
    }

    /// `GET /chart/daily/{symbol}`.
    pub async fn daily_chart(
        &self,
        symbol: &str,
        lookback_days: u32,
        timespan: Timespan,
        multiplier: u32,
    ) -> Result<BarSeries, ProviderError> {
        let plan = FetchPlan::Aggregate {
            lookback_days,
            timespan,
            multiplier,
        };
        self.chart(symbol, plan).await
    }

    /// `GET /dips/current?limit=`.
    pub async fn current_dips(&self, limit: u32) -> Result<CurrentDips, ProviderError> {
        let value = self
            .get_json("/dips/current", &[("limit", limit.to_string())])
            .await?;
        Ok(decode_current_dips(&value))
    }

    /// `GET /dips?rule=&limit=`.
    pub async fn dips(&self, rule: &str, limit: u32) -> Result<Vec<DipRow>, ProviderError> {
        let query = [("rule", rule.to_string()), ("limit", limit.to_string())];
        let value = self.get_json("/dips", &query).await?;
        Ok(decode_dips(&value))
    }

    /// `GET /tickers/{symbol}`.
    pub async fn ticker(&self, symbol: &str) -> Result<TickerDetail, ProviderError> {
        let path = format!("/tickers/{}", normalize_symbol(symbol));
        let value = self.get_json(&path, &[]).await?;
        decode_ticker(&value, symbol)
    }

    /// `POST /refresh?days=`: asks the backend to re-ingest prices and
    /// recompute signals. Uses the long refresh timeout.
    pub async fn refresh(&self, days: u32) -> Result<(), ProviderError> {
        self.send(
            Method::POST,
            "/refresh",
            &[("days", days.to_string())],
            self.refresh_timeout,
        )
        .await?;
        Ok(())
    }

    async fn chart(&self, symbol: &str, plan: FetchPlan) -> Result<BarSeries, ProviderError> {
        let value = self
            .get_json(&chart_path(symbol, plan), &construct_params(plan))
            .await?;
        decode_chart(&value, symbol, plan.timespan())
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ProviderError> {
        let timeout = self.request_timeout;
        let response = self.send(Method::GET, path, query, timeout).await?;
        response
            .json::<Value>()
            .await
            .map_err(|err| ProviderError::from_reqwest(err, timeout))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<Response, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, timeout_ms = timeout.as_millis() as u64, "dip api request");

        let response = self
            .client
            .request(method, &url)
            .query(query)
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| ProviderError::from_reqwest(err, timeout))?;

        let status = response.status();
        if !status.is_success() {
            debug!(%url, status = status.as_u16(), "dip api request failed");
            return Err(ProviderError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl HistoryProvider for DipApiClient {
    async fn fetch_bars(&self, request: ChartRequest) -> Result<BarSeries, ProviderError> {
        self.chart(&request.symbol, request.plan()).await
    }
}
