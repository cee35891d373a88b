//! Output shapes produced by the report aggregator.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Income/expense totals for one date range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeriodSummary {
    pub total_income: i64,
    pub total_expense: i64,
    pub balance: i64,
    pub transaction_count: usize,
}

impl PeriodSummary {
    pub fn new(total_income: i64, total_expense: i64, transaction_count: usize) -> Self {
        Self {
            total_income,
            total_expense,
            balance: total_income - total_expense,
            transaction_count,
        }
    }
}

/// Bucket width for trend reports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrendGranularity {
    Weekly,
    Monthly,
}

impl fmt::Display for TrendGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrendGranularity::Weekly => "weekly",
            TrendGranularity::Monthly => "monthly",
        };
        f.write_str(label)
    }
}

/// One fixed time-span aggregation unit of a trend report. Buckets with no
/// transactions are still emitted with zero sums.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrendBucket {
    pub label: String,
    pub start: NaiveDate,
    pub income: i64,
    pub expense: i64,
    pub balance: i64,
}

/// Chronological trend buckets plus their rounded arithmetic means.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrendReport {
    pub granularity: TrendGranularity,
    pub buckets: Vec<TrendBucket>,
    pub avg_income: i64,
    pub avg_expense: i64,
    pub avg_balance: i64,
}

/// Per-category share of a period's income or expense total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryBreakdownEntry {
    pub category_id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub total: i64,
    pub count: usize,
    /// Share of the grand total, rounded; 0 when the grand total is 0.
    pub percentage: u8,
}

/// Zero-filled per-day sums inside a monthly report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayBucket {
    pub day: u32,
    pub income: i64,
    pub expense: i64,
}

/// Full monthly report: summary, category breakdowns, and a daily series
/// covering every day of the month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub summary: PeriodSummary,
    pub expense_by_category: Vec<CategoryBreakdownEntry>,
    pub income_by_category: Vec<CategoryBreakdownEntry>,
    pub daily: Vec<DayBucket>,
}

/// Totals for one calendar month inside a comparison.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonthTotals {
    pub year: i32,
    pub month: u32,
    pub income: i64,
    pub expense: i64,
    pub balance: i64,
}

/// Direction label for a period-over-period change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDirection {
    Up,
    Down,
}

impl fmt::Display for ChangeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChangeDirection::Up => "up",
            ChangeDirection::Down => "down",
        };
        f.write_str(label)
    }
}

/// Current month vs. the immediately preceding one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonthComparison {
    pub current: MonthTotals,
    pub previous: MonthTotals,
    pub income_change: i64,
    pub expense_change: i64,
    pub income_direction: ChangeDirection,
    pub expense_direction: ChangeDirection,
}
