//! Business logic helpers for wallet management.

use dompet_domain::{Ledger, Wallet, WalletKind};
use uuid::Uuid;

use crate::{CoreError, Result};

const MAX_NAME_LEN: usize = 50;

/// Input for creating a wallet. The opening balance is the baseline the
/// balance invariant is measured against.
#[derive(Debug, Clone)]
pub struct NewWallet {
    pub name: String,
    pub kind: WalletKind,
    pub balance: i64,
    pub icon: Option<String>,
    pub color: Option<String>,
}

/// Sparse update for a wallet. The balance is deliberately absent: it only
/// moves through transaction mutations.
#[derive(Debug, Clone, Default)]
pub struct WalletPatch {
    pub name: Option<String>,
    pub kind: Option<WalletKind>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

/// Provides validated operations for [`Wallet`] entities.
pub struct WalletService;

impl WalletService {
    pub fn create(ledger: &mut Ledger, input: NewWallet) -> Result<Uuid> {
        let name = normalized_name(&input.name)?;
        Self::validate_unique(ledger, None, &name)?;
        let mut wallet = Wallet::new(name, input.kind, input.balance);
        wallet.icon = input.icon;
        wallet.color = input.color;
        Ok(ledger.add_wallet(wallet))
    }

    pub fn update(ledger: &mut Ledger, id: Uuid, patch: WalletPatch) -> Result<()> {
        if ledger.wallet(id).is_none() {
            return Err(CoreError::WalletNotFound(id));
        }
        let name = match patch.name {
            Some(candidate) => {
                let name = normalized_name(&candidate)?;
                Self::validate_unique(ledger, Some(id), &name)?;
                Some(name)
            }
            None => None,
        };
        let wallet = ledger
            .wallet_mut(id)
            .ok_or(CoreError::WalletNotFound(id))?;
        if let Some(name) = name {
            wallet.name = name;
        }
        if let Some(kind) = patch.kind {
            wallet.kind = kind;
        }
        if let Some(icon) = patch.icon {
            wallet.icon = Some(icon);
        }
        if let Some(color) = patch.color {
            wallet.color = Some(color);
        }
        ledger.touch();
        Ok(())
    }

    /// Removes a wallet. Blocked while any transaction still references it.
    pub fn remove(ledger: &mut Ledger, id: Uuid) -> Result<()> {
        if ledger.wallet(id).is_none() {
            return Err(CoreError::WalletNotFound(id));
        }
        let referencing = ledger
            .transactions
            .iter()
            .filter(|txn| txn.wallet_id == id)
            .count();
        if referencing > 0 {
            return Err(CoreError::Conflict(format!(
                "wallet has {} linked transactions",
                referencing
            )));
        }
        ledger.wallets.retain(|wallet| wallet.id != id);
        ledger.touch();
        Ok(())
    }

    /// Returns wallets in creation order.
    pub fn list(ledger: &Ledger) -> Vec<&Wallet> {
        ledger.wallets.iter().collect()
    }

    fn validate_unique(ledger: &Ledger, exclude: Option<Uuid>, candidate: &str) -> Result<()> {
        let normalized = candidate.to_ascii_lowercase();
        let duplicate = ledger.wallets.iter().any(|wallet| {
            wallet.name.trim().to_ascii_lowercase() == normalized && exclude != Some(wallet.id)
        });
        if duplicate {
            Err(CoreError::Conflict(format!(
                "wallet `{}` already exists",
                candidate
            )))
        } else {
            Ok(())
        }
    }
}

fn normalized_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(CoreError::InvalidInput("wallet name must not be empty".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::InvalidInput(format!(
            "wallet name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use dompet_domain::{Transaction, TransactionKind};

    fn new_wallet(name: &str) -> NewWallet {
        NewWallet {
            name: name.into(),
            kind: WalletKind::Bank,
            balance: 0,
            icon: None,
            color: None,
        }
    }

    #[test]
    fn create_rejects_duplicate_names_case_insensitively() {
        let mut ledger = Ledger::new("user");
        WalletService::create(&mut ledger, new_wallet("BCA")).unwrap();
        let err = WalletService::create(&mut ledger, new_wallet("bca")).unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[test]
    fn create_rejects_blank_names() {
        let mut ledger = Ledger::new("user");
        let err = WalletService::create(&mut ledger, new_wallet("   ")).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn remove_blocks_wallets_with_transactions() {
        let mut ledger = Ledger::new("user");
        let wallet_id = WalletService::create(&mut ledger, new_wallet("Tunai")).unwrap();
        let category_id = Uuid::new_v4();
        ledger.add_transaction(Transaction::new(
            wallet_id,
            category_id,
            5_000,
            TransactionKind::Expense,
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
        ));

        let err = WalletService::remove(&mut ledger, wallet_id).unwrap_err();
        assert!(matches!(err, CoreError::Conflict(message) if message.contains("1 linked")));

        ledger.transactions.clear();
        WalletService::remove(&mut ledger, wallet_id).unwrap();
        assert!(ledger.wallets.is_empty());
    }

    #[test]
    fn update_renames_without_self_collision() {
        let mut ledger = Ledger::new("user");
        let wallet_id = WalletService::create(&mut ledger, new_wallet("Tunai")).unwrap();
        WalletService::update(
            &mut ledger,
            wallet_id,
            WalletPatch {
                name: Some("Tunai".into()),
                kind: Some(WalletKind::Cash),
                ..WalletPatch::default()
            },
        )
        .unwrap();
        assert_eq!(ledger.wallet(wallet_id).unwrap().kind, WalletKind::Cash);
    }
}
