//! Budget envelopes and their derived usage figures.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{Amounted, DateRange, Identifiable};

/// Spending warning threshold, in percent of the envelope amount.
const NEAR_LIMIT_PERCENT: i64 = 80;

/// A spending cap for one expense category over one time window. The
/// spent amount is never stored; it is recomputed from the transaction
/// log every time the envelope is read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Budget {
    pub id: Uuid,
    pub category_id: Uuid,
    pub amount: i64,
    pub period: BudgetPeriod,
    pub range: DateRange,
    pub created_at: DateTime<Utc>,
}

impl Budget {
    pub fn new(category_id: Uuid, amount: i64, period: BudgetPeriod, range: DateRange) -> Self {
        Self {
            id: Uuid::new_v4(),
            category_id,
            amount,
            period,
            range,
            created_at: Utc::now(),
        }
    }
}

impl Identifiable for Budget {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Amounted for Budget {
    fn amount(&self) -> i64 {
        self.amount
    }
}

/// Envelope cadence. Only one envelope of each cadence may exist per
/// category at a time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Weekly,
    Monthly,
    Yearly,
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BudgetPeriod::Weekly => "weekly",
            BudgetPeriod::Monthly => "monthly",
            BudgetPeriod::Yearly => "yearly",
        };
        f.write_str(label)
    }
}

/// How an envelope is tracking against its cap.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BudgetHealth {
    OnTrack,
    NearLimit,
    OverBudget,
}

impl fmt::Display for BudgetHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BudgetHealth::OnTrack => "on-track",
            BudgetHealth::NearLimit => "near-limit",
            BudgetHealth::OverBudget => "over",
        };
        f.write_str(label)
    }
}

/// Derived view of an envelope combined with its recomputed spending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetUsage {
    pub budget_id: Uuid,
    pub category_id: Uuid,
    pub amount: i64,
    pub spent: i64,
    pub remaining: i64,
    /// Display percentage, capped to 0..=100. The over-budget flag is
    /// derived from the raw amounts, not this capped value.
    pub percentage: u8,
    pub is_over_budget: bool,
    pub is_near_limit: bool,
    pub status: BudgetHealth,
    pub period: BudgetPeriod,
    pub range: DateRange,
}

impl BudgetUsage {
    pub fn from_spent(budget: &Budget, spent: i64) -> Self {
        let is_over_budget = if budget.amount == 0 {
            spent > 0
        } else {
            spent > budget.amount
        };
        let raw_percent = if budget.amount == 0 {
            0
        } else {
            ((spent as f64 / budget.amount as f64) * 100.0).round() as i64
        };
        let status = if is_over_budget {
            BudgetHealth::OverBudget
        } else if raw_percent >= NEAR_LIMIT_PERCENT {
            BudgetHealth::NearLimit
        } else {
            BudgetHealth::OnTrack
        };
        Self {
            budget_id: budget.id,
            category_id: budget.category_id,
            amount: budget.amount,
            spent,
            remaining: budget.amount - spent,
            percentage: raw_percent.clamp(0, 100) as u8,
            is_over_budget,
            is_near_limit: status == BudgetHealth::NearLimit,
            status,
            period: budget.period,
            range: budget.range,
        }
    }
}
