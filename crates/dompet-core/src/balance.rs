//! Keeps wallet balances consistent with transaction mutations.

use dompet_domain::{Ledger, TransactionKind};
use uuid::Uuid;

use crate::{CoreError, Result};

/// Stateless balance maintenance. Applying and reversing are the same
/// operation with the delta negated; callers invoke each exactly once per
/// effective transaction state change (create = apply, delete = reverse,
/// update = reverse old then apply new).
pub struct BalanceService;

impl BalanceService {
    /// Signed delta a transaction of this shape contributes to a wallet.
    pub fn delta(kind: TransactionKind, amount: i64) -> i64 {
        match kind {
            TransactionKind::Income => amount,
            TransactionKind::Expense => -amount,
        }
    }

    pub fn apply(
        ledger: &mut Ledger,
        wallet_id: Uuid,
        kind: TransactionKind,
        amount: i64,
    ) -> Result<()> {
        let wallet = ledger
            .wallet_mut(wallet_id)
            .ok_or(CoreError::WalletNotFound(wallet_id))?;
        wallet.balance += Self::delta(kind, amount);
        Ok(())
    }

    pub fn reverse(
        ledger: &mut Ledger,
        wallet_id: Uuid,
        kind: TransactionKind,
        amount: i64,
    ) -> Result<()> {
        let wallet = ledger
            .wallet_mut(wallet_id)
            .ok_or(CoreError::WalletNotFound(wallet_id))?;
        wallet.balance -= Self::delta(kind, amount);
        Ok(())
    }

    /// Signed sum of every currently stored transaction referencing the
    /// wallet. Audits and tests compare this against the wallet's balance
    /// movement.
    pub fn recomputed_delta(ledger: &Ledger, wallet_id: Uuid) -> i64 {
        ledger
            .transactions
            .iter()
            .filter(|txn| txn.wallet_id == wallet_id)
            .map(|txn| txn.signed_amount())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dompet_domain::{Wallet, WalletKind};

    #[test]
    fn delta_is_signed_by_kind() {
        assert_eq!(BalanceService::delta(TransactionKind::Income, 20_000), 20_000);
        assert_eq!(BalanceService::delta(TransactionKind::Expense, 30_000), -30_000);
    }

    #[test]
    fn apply_and_reverse_cancel_out() {
        let mut ledger = Ledger::new("user");
        let wallet_id = ledger.add_wallet(Wallet::new("Tunai", WalletKind::Cash, 100_000));

        BalanceService::apply(&mut ledger, wallet_id, TransactionKind::Expense, 30_000).unwrap();
        assert_eq!(ledger.wallet(wallet_id).unwrap().balance, 70_000);

        BalanceService::apply(&mut ledger, wallet_id, TransactionKind::Income, 20_000).unwrap();
        assert_eq!(ledger.wallet(wallet_id).unwrap().balance, 90_000);

        BalanceService::reverse(&mut ledger, wallet_id, TransactionKind::Expense, 30_000).unwrap();
        assert_eq!(ledger.wallet(wallet_id).unwrap().balance, 120_000);
    }

    #[test]
    fn unknown_wallet_is_rejected() {
        let mut ledger = Ledger::new("user");
        let missing = Uuid::new_v4();
        let err =
            BalanceService::apply(&mut ledger, missing, TransactionKind::Income, 1).unwrap_err();
        assert!(matches!(err, CoreError::WalletNotFound(id) if id == missing));
    }
}
