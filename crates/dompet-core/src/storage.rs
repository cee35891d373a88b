use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use dompet_domain::Ledger;

use crate::{CoreError, Result};

/// Abstraction over persistence backends capable of storing one ledger per
/// user. The save operation must be all-or-nothing: a ledger document
/// carries a transaction row together with its wallet balance, and a
/// partially written document would break the balance invariant.
pub trait LedgerStore: Send + Sync {
    fn save_ledger(&self, ledger: &Ledger) -> Result<()>;
    fn load_ledger(&self, user_id: &str) -> Result<Ledger>;
    fn list_users(&self) -> Result<Vec<String>>;
    fn delete_ledger(&self, user_id: &str) -> Result<()>;
}

impl<S: LedgerStore + ?Sized> LedgerStore for Arc<S> {
    fn save_ledger(&self, ledger: &Ledger) -> Result<()> {
        (**self).save_ledger(ledger)
    }

    fn load_ledger(&self, user_id: &str) -> Result<Ledger> {
        (**self).load_ledger(user_id)
    }

    fn list_users(&self) -> Result<Vec<String>> {
        (**self).list_users()
    }

    fn delete_ledger(&self, user_id: &str) -> Result<()> {
        (**self).delete_ledger(user_id)
    }
}

/// In-process store for the offline/local mode and for tests. A save
/// replaces the user's document in one swap, so the atomicity contract
/// holds trivially.
#[derive(Default)]
pub struct MemoryLedgerStore {
    ledgers: Mutex<HashMap<String, Ledger>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn save_ledger(&self, ledger: &Ledger) -> Result<()> {
        let mut ledgers = self
            .ledgers
            .lock()
            .map_err(|_| CoreError::Storage("ledger store mutex poisoned".into()))?;
        ledgers.insert(ledger.user_id.clone(), ledger.clone());
        Ok(())
    }

    fn load_ledger(&self, user_id: &str) -> Result<Ledger> {
        let ledgers = self
            .ledgers
            .lock()
            .map_err(|_| CoreError::Storage("ledger store mutex poisoned".into()))?;
        ledgers
            .get(user_id)
            .cloned()
            .ok_or_else(|| CoreError::LedgerNotFound(user_id.to_string()))
    }

    fn list_users(&self) -> Result<Vec<String>> {
        let ledgers = self
            .ledgers
            .lock()
            .map_err(|_| CoreError::Storage("ledger store mutex poisoned".into()))?;
        let mut users: Vec<String> = ledgers.keys().cloned().collect();
        users.sort();
        Ok(users)
    }

    fn delete_ledger(&self, user_id: &str) -> Result<()> {
        let mut ledgers = self
            .ledgers
            .lock()
            .map_err(|_| CoreError::Storage("ledger store mutex poisoned".into()))?;
        ledgers.remove(user_id);
        Ok(())
    }
}

/// Detects dangling references and other anomalies within a ledger snapshot.
pub fn ledger_warnings(ledger: &Ledger) -> Vec<String> {
    let wallet_ids: HashSet<_> = ledger.wallets.iter().map(|w| w.id).collect();
    let category_ids: HashSet<_> = ledger.categories.iter().map(|c| c.id).collect();
    let mut warnings = Vec::new();

    for txn in &ledger.transactions {
        if !wallet_ids.contains(&txn.wallet_id) {
            warnings.push(format!(
                "transaction {} references unknown wallet {}",
                txn.id, txn.wallet_id
            ));
        }
        if !category_ids.contains(&txn.category_id) {
            warnings.push(format!(
                "transaction {} references unknown category {}",
                txn.id, txn.category_id
            ));
        }
    }
    for budget in &ledger.budgets {
        if !category_ids.contains(&budget.category_id) {
            warnings.push(format!(
                "budget {} references unknown category {}",
                budget.id, budget.category_id
            ));
        }
    }
    for reminder in &ledger.reminders {
        if !wallet_ids.contains(&reminder.wallet_id) {
            warnings.push(format!(
                "reminder {} references unknown wallet {}",
                reminder.id, reminder.wallet_id
            ));
        }
        if !category_ids.contains(&reminder.category_id) {
            warnings.push(format!(
                "reminder {} references unknown category {}",
                reminder.id, reminder.category_id
            ));
        }
        if reminder.is_recurring && reminder.frequency.is_none() {
            warnings.push(format!("reminder {} recurs without a frequency", reminder.id));
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use dompet_domain::{Reminder, Transaction, TransactionKind};
    use uuid::Uuid;

    #[test]
    fn memory_store_round_trips_by_user() {
        let store = MemoryLedgerStore::new();
        let ledger = Ledger::new("alice");
        store.save_ledger(&ledger).unwrap();

        let loaded = store.load_ledger("alice").unwrap();
        assert_eq!(loaded.user_id, "alice");
        assert!(matches!(
            store.load_ledger("bob").unwrap_err(),
            CoreError::LedgerNotFound(user) if user == "bob"
        ));

        assert_eq!(store.list_users().unwrap(), vec!["alice".to_string()]);
        store.delete_ledger("alice").unwrap();
        assert!(store.list_users().unwrap().is_empty());
    }

    #[test]
    fn warnings_flag_dangling_references() {
        let mut ledger = Ledger::new("carol");
        let date = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        ledger.add_transaction(Transaction::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            10_000,
            TransactionKind::Expense,
            date,
        ));
        let mut orphan = Reminder::new("Listrik", 200_000, Uuid::new_v4(), Uuid::new_v4(), date);
        orphan.is_recurring = true;
        ledger.add_reminder(orphan);

        let warnings = ledger_warnings(&ledger);
        assert_eq!(warnings.len(), 5);
        assert!(warnings.iter().any(|w| w.contains("recurs without")));
    }
}
