// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Data models for the gateway.
//!
//! Provider rows are decoded into the `Raw*` records below, every field optional,
//! and reshaped by [`crate::mapping`] into the response types.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Provider records
// ---------------------------------------------------------------------------

/// Row returned by `search-symbol`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSearchRecord {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub stock_exchange: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Row returned by `profile`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProfile {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub exchange_short_name: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
}

/// Row returned by `income-statement`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIncomeStatement {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub revenue: Option<f64>,
    #[serde(default, rename = "revenueTTM")]
    pub revenue_ttm: Option<f64>,
    #[serde(default)]
    pub net_income: Option<f64>,
    #[serde(default, rename = "netIncomeTTM")]
    pub net_income_ttm: Option<f64>,
}

/// Row returned by `balance-sheet-statement`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBalanceSheet {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub total_assets: Option<f64>,
    #[serde(default)]
    pub total_liabilities: Option<f64>,
}

/// Row returned by `cash-flow-statement`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCashFlow {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub operating_cash_flow: Option<f64>,
    #[serde(default, rename = "operatingCashFlowTTM")]
    pub operating_cash_flow_ttm: Option<f64>,
}

/// Reporting period accepted by the statement endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Annual,
    Quarter,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Annual => "annual",
            Period::Quarter => "quarter",
        }
    }
}

// ---------------------------------------------------------------------------
// Response schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub symbol: String,
    pub name: String,
    pub exchange: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeSnapshot {
    /// Total revenue for the period
    pub revenue: Option<f64>,
    /// Net income for the period
    pub net_income: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheetSnapshot {
    pub total_assets: Option<f64>,
    pub total_liabilities: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowSnapshot {
    pub operating_cash_flow: Option<f64>,
}

/// Condensed fundamentals for the latest annual reporting period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySnapshot {
    pub symbol: String,
    pub name: Option<String>,
    pub currency: Option<String>,
    pub exchange: Option<String>,
    /// Financial statement date
    pub as_of: Option<String>,
    pub income: IncomeSnapshot,
    pub balance_sheet: BalanceSheetSnapshot,
    pub cash_flow: CashFlowSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub date: String,
    pub revenue: Option<f64>,
    pub net_income: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub symbol: String,
    pub points: Vec<HistoryPoint>,
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub exchange: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub years: Option<u32>,
}
