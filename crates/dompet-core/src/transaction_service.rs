//! Transaction mutation coordination: validation, the balance delta
//! ordering, and filtered listing.

use chrono::NaiveDate;
use dompet_domain::{DateRange, Ledger, Transaction, TransactionKind};
use uuid::Uuid;

use crate::{balance::BalanceService, CoreError, Result};

/// Input for recording a transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub wallet_id: Uuid,
    pub category_id: Uuid,
    pub amount: i64,
    pub kind: TransactionKind,
    pub description: Option<String>,
    pub date: NaiveDate,
}

/// Sparse update for a transaction; absent fields keep their value.
#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    pub wallet_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub amount: Option<i64>,
    pub kind: Option<TransactionKind>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}

impl TransactionPatch {
    pub fn has_effect(&self) -> bool {
        self.wallet_id.is_some()
            || self.category_id.is_some()
            || self.amount.is_some()
            || self.kind.is_some()
            || self.description.is_some()
            || self.date.is_some()
    }
}

/// Listing filter mirroring the query surface of the ledger store.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub range: Option<DateRange>,
    pub kind: Option<TransactionKind>,
    pub category_id: Option<Uuid>,
    pub wallet_id: Option<Uuid>,
    pub offset: usize,
    pub limit: Option<usize>,
}

/// Coordinates transaction mutations against a ledger. Every operation
/// validates before the first mutation, so an `Err` leaves the ledger
/// untouched; the surrounding atomic unit (see [`crate::Tracker`]) makes
/// the row and its wallet update visible together.
pub struct TransactionService;

impl TransactionService {
    pub fn create(ledger: &mut Ledger, input: NewTransaction) -> Result<Uuid> {
        validate_shape(
            ledger,
            input.wallet_id,
            input.category_id,
            input.kind,
            input.amount,
        )?;
        let mut transaction = Transaction::new(
            input.wallet_id,
            input.category_id,
            input.amount,
            input.kind,
            input.date,
        );
        transaction.description = input.description;
        let id = ledger.add_transaction(transaction);
        BalanceService::apply(ledger, input.wallet_id, input.kind, input.amount)?;
        Ok(id)
    }

    /// Applies a patch, reversing the old balance effect before applying
    /// the new one. When the wallet changes, the reversal targets the
    /// original wallet and the new delta the new one.
    pub fn update(ledger: &mut Ledger, id: Uuid, patch: TransactionPatch) -> Result<()> {
        let current = ledger
            .transaction(id)
            .cloned()
            .ok_or(CoreError::TransactionNotFound(id))?;

        let mut updated = current.clone();
        if let Some(wallet_id) = patch.wallet_id {
            updated.wallet_id = wallet_id;
        }
        if let Some(category_id) = patch.category_id {
            updated.category_id = category_id;
        }
        if let Some(amount) = patch.amount {
            updated.amount = amount;
        }
        if let Some(kind) = patch.kind {
            updated.kind = kind;
        }
        if let Some(description) = patch.description {
            updated.description = Some(description);
        }
        if let Some(date) = patch.date {
            updated.date = date;
        }
        validate_shape(
            ledger,
            updated.wallet_id,
            updated.category_id,
            updated.kind,
            updated.amount,
        )?;

        BalanceService::reverse(ledger, current.wallet_id, current.kind, current.amount)?;
        let slot = ledger
            .transaction_mut(id)
            .ok_or(CoreError::TransactionNotFound(id))?;
        let (wallet_id, kind, amount) = (updated.wallet_id, updated.kind, updated.amount);
        *slot = updated;
        BalanceService::apply(ledger, wallet_id, kind, amount)?;
        ledger.touch();
        Ok(())
    }

    /// Deletes a transaction, reversing its balance effect.
    pub fn remove(ledger: &mut Ledger, id: Uuid) -> Result<()> {
        let current = ledger
            .transaction(id)
            .cloned()
            .ok_or(CoreError::TransactionNotFound(id))?;
        BalanceService::reverse(ledger, current.wallet_id, current.kind, current.amount)?;
        ledger.transactions.retain(|txn| txn.id != id);
        ledger.touch();
        Ok(())
    }

    /// Returns transactions matching the filter, newest date first.
    pub fn list<'a>(ledger: &'a Ledger, filter: &TransactionFilter) -> Vec<&'a Transaction> {
        let mut rows: Vec<&Transaction> = ledger
            .transactions
            .iter()
            .filter(|txn| filter.range.map(|r| r.contains(txn.date)).unwrap_or(true))
            .filter(|txn| filter.kind.map(|k| txn.kind == k).unwrap_or(true))
            .filter(|txn| {
                filter
                    .category_id
                    .map(|c| txn.category_id == c)
                    .unwrap_or(true)
            })
            .filter(|txn| filter.wallet_id.map(|w| txn.wallet_id == w).unwrap_or(true))
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        rows.into_iter()
            .skip(filter.offset)
            .take(filter.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

fn validate_shape(
    ledger: &Ledger,
    wallet_id: Uuid,
    category_id: Uuid,
    kind: TransactionKind,
    amount: i64,
) -> Result<()> {
    if amount <= 0 {
        return Err(CoreError::InvalidInput(
            "transaction amount must be positive".into(),
        ));
    }
    if ledger.wallet(wallet_id).is_none() {
        return Err(CoreError::WalletNotFound(wallet_id));
    }
    let category = ledger
        .category(category_id)
        .ok_or(CoreError::CategoryNotFound(category_id))?;
    if category.kind != kind {
        return Err(CoreError::InvalidInput(
            "transaction type does not match category type".into(),
        ));
    }
    Ok(())
}
