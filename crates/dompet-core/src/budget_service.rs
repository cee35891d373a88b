//! The budget engine: envelope CRUD and recomputed spending.

use chrono::NaiveDate;
use dompet_domain::{
    Budget, BudgetPeriod, BudgetUsage, DateRange, Ledger, TransactionKind,
};
use uuid::Uuid;

use crate::{CoreError, Result};

/// Input for creating a budget envelope.
#[derive(Debug, Clone)]
pub struct NewBudget {
    pub category_id: Uuid,
    pub amount: i64,
    pub period: BudgetPeriod,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Sparse update for a budget envelope.
#[derive(Debug, Clone, Default)]
pub struct BudgetPatch {
    pub category_id: Option<Uuid>,
    pub amount: Option<i64>,
    pub period: Option<BudgetPeriod>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Provides validated operations for [`Budget`] envelopes. Spent amounts
/// are always recomputed from the transaction log on read, never cached.
pub struct BudgetService;

impl BudgetService {
    pub fn create(ledger: &mut Ledger, input: NewBudget) -> Result<Uuid> {
        if input.amount <= 0 {
            return Err(CoreError::InvalidInput("budget amount must be positive".into()));
        }
        validate_category(ledger, input.category_id)?;
        let range = DateRange::new(input.start, input.end)?;
        Self::validate_unique(ledger, None, input.category_id, input.period)?;
        let budget = Budget::new(input.category_id, input.amount, input.period, range);
        Ok(ledger.add_budget(budget))
    }

    pub fn update(ledger: &mut Ledger, id: Uuid, patch: BudgetPatch) -> Result<()> {
        let current = ledger.budget(id).cloned().ok_or(CoreError::BudgetNotFound(id))?;
        let category_id = patch.category_id.unwrap_or(current.category_id);
        let amount = patch.amount.unwrap_or(current.amount);
        let period = patch.period.unwrap_or(current.period);
        let range = DateRange::new(
            patch.start.unwrap_or(current.range.start),
            patch.end.unwrap_or(current.range.end),
        )?;

        if amount <= 0 {
            return Err(CoreError::InvalidInput("budget amount must be positive".into()));
        }
        validate_category(ledger, category_id)?;
        Self::validate_unique(ledger, Some(id), category_id, period)?;

        let budget = ledger.budget_mut(id).ok_or(CoreError::BudgetNotFound(id))?;
        budget.category_id = category_id;
        budget.amount = amount;
        budget.period = period;
        budget.range = range;
        ledger.touch();
        Ok(())
    }

    pub fn remove(ledger: &mut Ledger, id: Uuid) -> Result<()> {
        if ledger.budget(id).is_none() {
            return Err(CoreError::BudgetNotFound(id));
        }
        ledger.budgets.retain(|budget| budget.id != id);
        ledger.touch();
        Ok(())
    }

    /// Sum of expense transactions in the envelope's category and window.
    pub fn spent(ledger: &Ledger, budget: &Budget) -> i64 {
        ledger
            .transactions
            .iter()
            .filter(|txn| {
                txn.category_id == budget.category_id
                    && txn.kind == TransactionKind::Expense
                    && budget.range.contains(txn.date)
            })
            .map(|txn| txn.amount)
            .sum()
    }

    pub fn usage(ledger: &Ledger, budget: &Budget) -> BudgetUsage {
        BudgetUsage::from_spent(budget, Self::spent(ledger, budget))
    }

    /// Every envelope with its recomputed usage, newest first.
    pub fn list_usage(ledger: &Ledger) -> Vec<BudgetUsage> {
        let mut budgets: Vec<&Budget> = ledger.budgets.iter().collect();
        budgets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        budgets
            .into_iter()
            .map(|budget| Self::usage(ledger, budget))
            .collect()
    }

    fn validate_unique(
        ledger: &Ledger,
        exclude: Option<Uuid>,
        category_id: Uuid,
        period: BudgetPeriod,
    ) -> Result<()> {
        let duplicate = ledger.budgets.iter().any(|budget| {
            budget.category_id == category_id
                && budget.period == period
                && exclude != Some(budget.id)
        });
        if duplicate {
            Err(CoreError::DuplicateBudget(format!(
                "a {} envelope for this category already exists",
                period
            )))
        } else {
            Ok(())
        }
    }
}

fn validate_category(ledger: &Ledger, category_id: Uuid) -> Result<()> {
    let category = ledger
        .category(category_id)
        .ok_or(CoreError::CategoryNotFound(category_id))?;
    if category.kind != TransactionKind::Expense {
        return Err(CoreError::InvalidInput(
            "budgets can only be attached to expense categories".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dompet_domain::{BudgetHealth, Category, Transaction, Wallet, WalletKind};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct Fixture {
        ledger: Ledger,
        wallet: Uuid,
        category: Uuid,
    }

    fn fixture() -> Fixture {
        let mut ledger = Ledger::new("user");
        let wallet = ledger.add_wallet(Wallet::new("Tunai", WalletKind::Cash, 0));
        let category = ledger.add_category(Category::new("Makan", TransactionKind::Expense));
        Fixture {
            ledger,
            wallet,
            category,
        }
    }

    fn spend(fx: &mut Fixture, amount: i64, on: NaiveDate) {
        fx.ledger.add_transaction(Transaction::new(
            fx.wallet,
            fx.category,
            amount,
            TransactionKind::Expense,
            on,
        ));
    }

    fn january_budget(fx: &mut Fixture, amount: i64) -> Uuid {
        BudgetService::create(
            &mut fx.ledger,
            NewBudget {
                category_id: fx.category,
                amount,
                period: BudgetPeriod::Monthly,
                start: date(2025, 1, 1),
                end: date(2025, 1, 31),
            },
        )
        .unwrap()
    }

    #[test]
    fn duplicate_cadence_per_category_is_rejected() {
        let mut fx = fixture();
        january_budget(&mut fx, 500_000);
        let err = BudgetService::create(
            &mut fx.ledger,
            NewBudget {
                category_id: fx.category,
                amount: 300_000,
                period: BudgetPeriod::Monthly,
                start: date(2025, 2, 1),
                end: date(2025, 2, 28),
            },
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateBudget(_)));

        // a different cadence for the same category is fine
        BudgetService::create(
            &mut fx.ledger,
            NewBudget {
                category_id: fx.category,
                amount: 100_000,
                period: BudgetPeriod::Weekly,
                start: date(2025, 1, 6),
                end: date(2025, 1, 12),
            },
        )
        .unwrap();
    }

    #[test]
    fn budgets_require_expense_categories() {
        let mut fx = fixture();
        let income = fx
            .ledger
            .add_category(Category::new("Gaji", TransactionKind::Income));
        let err = BudgetService::create(
            &mut fx.ledger,
            NewBudget {
                category_id: income,
                amount: 500_000,
                period: BudgetPeriod::Monthly,
                start: date(2025, 1, 1),
                end: date(2025, 1, 31),
            },
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn spent_is_scoped_to_category_kind_and_window() {
        let mut fx = fixture();
        let id = january_budget(&mut fx, 500_000);
        let other = fx
            .ledger
            .add_category(Category::new("Transport", TransactionKind::Expense));

        spend(&mut fx, 200_000, date(2025, 1, 10));
        spend(&mut fx, 250_000, date(2025, 1, 31));
        spend(&mut fx, 99_000, date(2025, 2, 1)); // outside the window
        fx.ledger.add_transaction(Transaction::new(
            fx.wallet,
            other,
            70_000,
            TransactionKind::Expense,
            date(2025, 1, 15),
        ));

        let budget = fx.ledger.budget(id).cloned().unwrap();
        assert_eq!(BudgetService::spent(&fx.ledger, &budget), 450_000);

        let usage = BudgetService::usage(&fx.ledger, &budget);
        assert_eq!(usage.percentage, 90);
        assert!(usage.is_near_limit);
        assert!(!usage.is_over_budget);
    }

    #[test]
    fn overspent_envelope_reports_over_status() {
        let mut fx = fixture();
        let id = january_budget(&mut fx, 500_000);
        spend(&mut fx, 600_000, date(2025, 1, 20));

        let budget = fx.ledger.budget(id).cloned().unwrap();
        let usage = BudgetService::usage(&fx.ledger, &budget);
        assert!(usage.is_over_budget);
        assert_eq!(usage.remaining, -100_000);
        assert_eq!(usage.percentage, 100);
        assert_eq!(usage.status, BudgetHealth::OverBudget);
    }

    #[test]
    fn spent_moves_monotonically_with_mutations() {
        let mut fx = fixture();
        let id = january_budget(&mut fx, 500_000);
        let budget = fx.ledger.budget(id).cloned().unwrap();

        let empty = BudgetService::spent(&fx.ledger, &budget);
        spend(&mut fx, 40_000, date(2025, 1, 4));
        let after_add = BudgetService::spent(&fx.ledger, &budget);
        assert!(after_add >= empty);

        let txn_id = fx.ledger.transactions[0].id;
        fx.ledger.transactions.retain(|txn| txn.id != txn_id);
        let after_remove = BudgetService::spent(&fx.ledger, &budget);
        assert!(after_remove <= after_add);
    }

    #[test]
    fn update_validates_resulting_envelope() {
        let mut fx = fixture();
        let id = january_budget(&mut fx, 500_000);
        let err = BudgetService::update(
            &mut fx.ledger,
            id,
            BudgetPatch {
                end: Some(date(2024, 12, 1)),
                ..BudgetPatch::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));

        BudgetService::update(
            &mut fx.ledger,
            id,
            BudgetPatch {
                amount: Some(750_000),
                ..BudgetPatch::default()
            },
        )
        .unwrap();
        assert_eq!(fx.ledger.budget(id).unwrap().amount, 750_000);
    }

    #[test]
    fn list_usage_orders_newest_first() {
        let mut fx = fixture();
        let first = january_budget(&mut fx, 500_000);
        let other = fx
            .ledger
            .add_category(Category::new("Transport", TransactionKind::Expense));
        let second = BudgetService::create(
            &mut fx.ledger,
            NewBudget {
                category_id: other,
                amount: 200_000,
                period: BudgetPeriod::Monthly,
                start: date(2025, 1, 1),
                end: date(2025, 1, 31),
            },
        )
        .unwrap();

        let usage = BudgetService::list_usage(&fx.ledger);
        assert_eq!(usage.len(), 2);
        assert_eq!(usage[0].budget_id, second);
        assert_eq!(usage[1].budget_id, first);
    }
}
