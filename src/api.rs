// Copyright 2025 Memophor Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTTP API handlers for the fundamentals gateway.
//!
//! - `GET /health` - Service health check
//! - `GET /metrics` - Prometheus metrics export
//! - `GET /companies/search` - Search companies by name or symbol
//! - `GET /companies/:symbol/snapshot` - Latest annual fundamentals
//! - `GET /companies/:symbol/history` - Revenue and net income by year
//!
//! Handlers are stateless; each request issues its own provider calls.

use std::ops::RangeInclusive;
use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use futures_util::future::try_join3;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::mapping;
use crate::metrics::Metrics;
use crate::model::{
    CompanySnapshot, HistoryQuery, HistoryResponse, Period, SearchQuery, SearchResponse,
};
use crate::upstream::FundamentalsProvider;

const SEARCH_LIMIT: RangeInclusive<u32> = 1..=50;
const DEFAULT_SEARCH_LIMIT: u32 = 10;
const HISTORY_YEARS: RangeInclusive<u32> = 1..=20;
const DEFAULT_HISTORY_YEARS: u32 = 5;

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn FundamentalsProvider>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(provider: Arc<dyn FundamentalsProvider>, metrics: Metrics) -> Self {
        Self { provider, metrics }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/companies/search", get(search_companies))
        .route("/companies/:symbol/snapshot", get(company_snapshot))
        .route("/companies/:symbol/history", get(company_history))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Metrics endpoint
pub async fn metrics(State(state): State<AppState>) -> Result<String, AppError> {
    state.metrics.export()
}

/// Search for companies by name or symbol
pub async fn search_companies(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<SearchResponse>, AppError> {
    state.metrics.record_request("search");

    let Query(query) = query.map_err(|e| AppError::validation("query", e.body_text()))?;

    let q = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::validation("q", "q is required and must not be empty"))?;

    let limit = bounded("limit", query.limit, DEFAULT_SEARCH_LIMIT, SEARCH_LIMIT)?;
    let exchange = query.exchange.filter(|e| !e.trim().is_empty());

    let records = state.provider.search(q, limit, exchange).await?;
    let results = records.into_iter().map(mapping::search_result).collect();

    Ok(Json(SearchResponse { results }))
}

/// Latest fundamentals snapshot for a given company
pub async fn company_snapshot(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<CompanySnapshot>, AppError> {
    state.metrics.record_request("snapshot");
    let symbol = require_symbol(&symbol)?;
    let provider = state.provider.as_ref();

    let Some(profile) = provider.profile(symbol).await?.into_iter().next() else {
        tracing::debug!(symbol, "no profile for symbol");
        return Err(AppError::not_found("Company profile not found"));
    };

    let (income, balance, cash_flow) = try_join3(
        provider.income_statement(symbol, Period::Annual, 1),
        provider.balance_sheet(symbol, Period::Annual, 1),
        provider.cash_flow(symbol, Period::Annual, 1),
    )
    .await?;

    let snapshot = mapping::company_snapshot(
        symbol,
        profile,
        mapping::first_or_default(income),
        mapping::first_or_default(balance),
        mapping::first_or_default(cash_flow),
    );

    Ok(Json(snapshot))
}

/// Revenue and net income history for charting
pub async fn company_history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoryResponse>, AppError> {
    state.metrics.record_request("history");
    let symbol = require_symbol(&symbol)?;

    let Query(query) = query.map_err(|e| AppError::validation("query", e.body_text()))?;
    let years = bounded("years", query.years, DEFAULT_HISTORY_YEARS, HISTORY_YEARS)?;

    let rows = state
        .provider
        .income_statement(symbol, Period::Annual, years)
        .await?;

    if rows.is_empty() {
        return Err(AppError::not_found("No income statement data found"));
    }

    let points = rows.into_iter().map(mapping::history_point).collect();

    Ok(Json(HistoryResponse {
        symbol: symbol.to_uppercase(),
        points,
    }))
}

fn require_symbol(symbol: &str) -> Result<&str, AppError> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(AppError::validation("symbol", "symbol must not be empty"));
    }
    Ok(symbol)
}

fn bounded(
    field: &str,
    value: Option<u32>,
    default: u32,
    range: RangeInclusive<u32>,
) -> Result<u32, AppError> {
    let value = value.unwrap_or(default);
    if !range.contains(&value) {
        return Err(AppError::validation(
            field,
            format!(
                "{field} must be between {} and {}",
                range.start(),
                range.end()
            ),
        ));
    }
    Ok(value)
}
