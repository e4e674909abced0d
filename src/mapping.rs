// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Reshapes provider records into the gateway's response schema.
//!
//! Strings are treated as absent when empty. Numbers are absent only when the
//! provider omits them or sends `null`; a reported zero is kept.

use crate::model::{
    BalanceSheetSnapshot, CashFlowSnapshot, CompanySnapshot, HistoryPoint, IncomeSnapshot,
    RawBalanceSheet, RawCashFlow, RawIncomeStatement, RawProfile, RawSearchRecord, SearchResult,
};

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Takes the first row of a statement response, or the all-absent record.
pub fn first_or_default<T: Default>(rows: Vec<T>) -> T {
    rows.into_iter().next().unwrap_or_default()
}

pub fn search_result(record: RawSearchRecord) -> SearchResult {
    let name = non_empty(record.name)
        .or_else(|| non_empty(record.company_name))
        .unwrap_or_default();

    SearchResult {
        symbol: record.symbol.unwrap_or_default(),
        name,
        exchange: record.stock_exchange,
        currency: record.currency,
    }
}

pub fn income_snapshot(raw: &RawIncomeStatement) -> IncomeSnapshot {
    IncomeSnapshot {
        revenue: raw.revenue.or(raw.revenue_ttm),
        net_income: raw.net_income.or(raw.net_income_ttm),
    }
}

pub fn balance_sheet_snapshot(raw: &RawBalanceSheet) -> BalanceSheetSnapshot {
    BalanceSheetSnapshot {
        total_assets: raw.total_assets,
        total_liabilities: raw.total_liabilities,
    }
}

pub fn cash_flow_snapshot(raw: &RawCashFlow) -> CashFlowSnapshot {
    CashFlowSnapshot {
        operating_cash_flow: raw.operating_cash_flow.or(raw.operating_cash_flow_ttm),
    }
}

/// Statement date, income first, then balance sheet, then cash flow.
pub fn as_of(
    income: &RawIncomeStatement,
    balance: &RawBalanceSheet,
    cash_flow: &RawCashFlow,
) -> Option<String> {
    non_empty(income.date.clone())
        .or_else(|| non_empty(balance.date.clone()))
        .or_else(|| non_empty(cash_flow.date.clone()))
}

pub fn company_snapshot(
    symbol: &str,
    profile: RawProfile,
    income: RawIncomeStatement,
    balance: RawBalanceSheet,
    cash_flow: RawCashFlow,
) -> CompanySnapshot {
    CompanySnapshot {
        symbol: symbol.to_uppercase(),
        name: non_empty(profile.company_name).or_else(|| non_empty(profile.name)),
        currency: profile.currency,
        exchange: non_empty(profile.exchange_short_name).or_else(|| non_empty(profile.exchange)),
        as_of: as_of(&income, &balance, &cash_flow),
        income: income_snapshot(&income),
        balance_sheet: balance_sheet_snapshot(&balance),
        cash_flow: cash_flow_snapshot(&cash_flow),
    }
}

/// History rows pass `revenue` and `netIncome` through untouched; TTM fields are ignored here.
pub fn history_point(row: RawIncomeStatement) -> HistoryPoint {
    HistoryPoint {
        date: row.date.unwrap_or_default(),
        revenue: row.revenue,
        net_income: row.net_income,
    }
}
