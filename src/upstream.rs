// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Upstream client for the Financial Modeling Prep stable API.
//!
//! Every operation is a single GET to `{base_url}/{endpoint}` with the API key
//! appended as the `apikey` query parameter. Non-success statuses and timeouts
//! are normalized into [`UpstreamError`]; nothing is retried here.

use std::time::{Duration, Instant};

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::config::UpstreamConfig;
use crate::error::{AppError, UpstreamError};
use crate::metrics::Metrics;
use crate::model::{
    Period, RawBalanceSheet, RawCashFlow, RawIncomeStatement, RawProfile, RawSearchRecord,
};

const SEARCH_SYMBOL: &str = "search-symbol";
const PROFILE: &str = "profile";
const INCOME_STATEMENT: &str = "income-statement";
const BALANCE_SHEET: &str = "balance-sheet-statement";
const CASH_FLOW: &str = "cash-flow-statement";

/// Source of raw fundamentals data.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FundamentalsProvider: Send + Sync {
    /// Search symbols and company names. `exchange` overrides the default exchange filter.
    async fn search(
        &self,
        query: &str,
        limit: u32,
        exchange: Option<String>,
    ) -> Result<Vec<RawSearchRecord>, UpstreamError>;

    async fn profile(&self, symbol: &str) -> Result<Vec<RawProfile>, UpstreamError>;

    async fn income_statement(
        &self,
        symbol: &str,
        period: Period,
        limit: u32,
    ) -> Result<Vec<RawIncomeStatement>, UpstreamError>;

    async fn balance_sheet(
        &self,
        symbol: &str,
        period: Period,
        limit: u32,
    ) -> Result<Vec<RawBalanceSheet>, UpstreamError>;

    async fn cash_flow(
        &self,
        symbol: &str,
        period: Period,
        limit: u32,
    ) -> Result<Vec<RawCashFlow>, UpstreamError>;
}

/// HTTP client wrapper for talking to FMP.
#[derive(Clone)]
pub struct FmpClient {
    base_url: String,
    api_key: String,
    timeout: Duration,
    search_exchanges: String,
    client: Client,
    metrics: Metrics,
}

impl FmpClient {
    /// Construct a new client using the provided configuration.
    pub fn try_new(config: UpstreamConfig, metrics: Metrics) -> Result<Self, AppError> {
        if config.api_key.trim().is_empty() {
            return Err(AppError::Internal(anyhow!("FMP API key is empty")));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow!("Failed to build upstream client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            timeout: config.timeout,
            search_exchanges: config.search_exchanges,
            client,
            metrics,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        params: &[(&str, String)],
    ) -> Result<T, UpstreamError> {
        self.metrics.record_upstream_request(endpoint);
        let start = Instant::now();

        let result = self.fetch(endpoint, params).await;

        self.metrics
            .record_upstream_latency(endpoint, start.elapsed().as_secs_f64());

        if let Err(err) = &result {
            self.metrics.record_upstream_failure(endpoint, err.kind());
            tracing::warn!(
                endpoint,
                kind = err.kind(),
                retryable = err.is_retryable(),
                error = %err,
                "FMP request failed",
            );
        }

        result
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, UpstreamError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!(endpoint, ?params, "calling FMP");

        let response = self
            .client
            .get(url)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::status(status.as_u16(), &body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        serde_json::from_slice(&bytes).map_err(UpstreamError::Decode)
    }

    fn transport_error(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout(self.timeout)
        } else {
            // The request URL carries the API key.
            UpstreamError::Transport(err.without_url())
        }
    }

    async fn statement<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        symbol: &str,
        period: Period,
        limit: u32,
    ) -> Result<Vec<T>, UpstreamError> {
        self.get(
            endpoint,
            &[
                ("symbol", symbol.to_uppercase()),
                ("period", period.as_str().to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }
}

#[async_trait]
impl FundamentalsProvider for FmpClient {
    async fn search(
        &self,
        query: &str,
        limit: u32,
        exchange: Option<String>,
    ) -> Result<Vec<RawSearchRecord>, UpstreamError> {
        let exchange = exchange.unwrap_or_else(|| self.search_exchanges.clone());
        self.get(
            SEARCH_SYMBOL,
            &[
                ("query", query.to_string()),
                ("limit", limit.to_string()),
                ("exchange", exchange),
            ],
        )
        .await
    }

    async fn profile(&self, symbol: &str) -> Result<Vec<RawProfile>, UpstreamError> {
        self.get(PROFILE, &[("symbol", symbol.to_uppercase())]).await
    }

    async fn income_statement(
        &self,
        symbol: &str,
        period: Period,
        limit: u32,
    ) -> Result<Vec<RawIncomeStatement>, UpstreamError> {
        self.statement(INCOME_STATEMENT, symbol, period, limit).await
    }

    async fn balance_sheet(
        &self,
        symbol: &str,
        period: Period,
        limit: u32,
    ) -> Result<Vec<RawBalanceSheet>, UpstreamError> {
        self.statement(BALANCE_SHEET, symbol, period, limit).await
    }

    async fn cash_flow(
        &self,
        symbol: &str,
        period: Period,
        limit: u32,
    ) -> Result<Vec<RawCashFlow>, UpstreamError> {
        self.statement(CASH_FLOW, symbol, period, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};
    use serde_json::json;

    fn client_for(server: &MockServer, timeout: Duration) -> FmpClient {
        let config = UpstreamConfig {
            base_url: server.base_url(),
            api_key: "test-key".to_string(),
            timeout,
            search_exchanges: "NASDAQ,NYSE,AMEX".to_string(),
        };
        FmpClient::try_new(config, Metrics::new().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn search_sends_default_exchange_filter_and_key() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/search-symbol")
                    .query_param("query", "apple")
                    .query_param("limit", "5")
                    .query_param("exchange", "NASDAQ,NYSE,AMEX")
                    .query_param("apikey", "test-key");
                then.status(200).json_body(json!([
                    {"symbol": "AAPL", "name": "Apple Inc.", "currency": "USD", "stockExchange": "NASDAQ"}
                ]));
            })
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let rows = client.search("apple", 5, None).await.unwrap();

        mock.assert_async().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].symbol.as_deref(), Some("AAPL"));
        assert_eq!(rows[0].stock_exchange.as_deref(), Some("NASDAQ"));
    }

    #[tokio::test]
    async fn search_exchange_override_is_forwarded() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/search-symbol")
                    .query_param("exchange", "LSE");
                then.status(200).json_body(json!([]));
            })
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let rows = client
            .search("vod", 10, Some("LSE".to_string()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn profile_uppercases_symbol() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/profile")
                    .query_param("symbol", "MSFT")
                    .query_param("apikey", "test-key");
                then.status(200).json_body(json!([
                    {"symbol": "MSFT", "companyName": "Microsoft Corporation", "exchangeShortName": "NASDAQ"}
                ]));
            })
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let rows = client.profile("msft").await.unwrap();

        mock.assert_async().await;
        assert_eq!(rows[0].company_name.as_deref(), Some("Microsoft Corporation"));
    }

    #[tokio::test]
    async fn statements_send_period_and_limit() {
        let server = MockServer::start_async().await;
        let income = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/income-statement")
                    .query_param("symbol", "AAPL")
                    .query_param("period", "annual")
                    .query_param("limit", "3");
                then.status(200).json_body(json!([
                    {"date": "2023-09-30", "revenue": 383285000000.0, "netIncome": 96995000000.0},
                    {"date": "2022-09-24", "revenue": 394328000000.0, "netIncome": 99803000000.0},
                    {"date": "2021-09-25", "revenue": 365817000000.0, "netIncome": 94680000000.0}
                ]));
            })
            .await;
        let balance = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/balance-sheet-statement")
                    .query_param("period", "quarter")
                    .query_param("limit", "1");
                then.status(200).json_body(json!([]));
            })
            .await;
        let cash_flow = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/cash-flow-statement")
                    .query_param("symbol", "AAPL");
                then.status(200)
                    .json_body(json!([{"date": "2023-09-30", "operatingCashFlowTTM": 1.5}]));
            })
            .await;

        let client = client_for(&server, Duration::from_secs(5));

        let rows = client
            .income_statement("aapl", Period::Annual, 3)
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].date.as_deref(), Some("2021-09-25"));

        let rows = client
            .balance_sheet("aapl", Period::Quarter, 1)
            .await
            .unwrap();
        assert!(rows.is_empty());

        let rows = client.cash_flow("aapl", Period::Annual, 1).await.unwrap();
        assert_eq!(rows[0].operating_cash_flow_ttm, Some(1.5));

        income.assert_async().await;
        balance.assert_async().await;
        cash_flow.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_is_normalized_and_truncated() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/profile");
                then.status(500).body("E".repeat(1000));
            })
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let err = client.profile("AAPL").await.unwrap_err();

        match err {
            UpstreamError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body.len(), 200);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/profile");
                then.status(200)
                    .delay(Duration::from_secs(2))
                    .json_body(json!([]));
            })
            .await;

        let client = client_for(&server, Duration::from_millis(200));
        let err = client.profile("AAPL").await.unwrap_err();

        assert!(matches!(err, UpstreamError::Timeout(_)), "got {err:?}");
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn unexpected_payload_is_a_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/income-statement");
                then.status(200)
                    .json_body(json!({"Error Message": "Invalid API KEY."}));
            })
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let err = client
            .income_statement("AAPL", Period::Annual, 1)
            .await
            .unwrap_err();

        assert!(matches!(err, UpstreamError::Decode(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn failures_are_counted() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/profile");
                then.status(503).body("unavailable");
            })
            .await;

        let metrics = Metrics::new().unwrap();
        let config = UpstreamConfig {
            base_url: server.base_url(),
            api_key: "test-key".to_string(),
            timeout: Duration::from_secs(5),
            search_exchanges: "NASDAQ".to_string(),
        };
        let client = FmpClient::try_new(config, metrics.clone()).unwrap();

        assert!(client.profile("AAPL").await.is_err());

        let failures = metrics
            .upstream_failures
            .with_label_values(&["profile", "status"])
            .get();
        assert_eq!(failures, 1);
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let config = UpstreamConfig {
            base_url: "http://localhost".to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(1),
            search_exchanges: String::new(),
        };
        assert!(FmpClient::try_new(config, Metrics::new().unwrap()).is_err());
    }
}
