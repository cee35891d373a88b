use std::io;

use thiserror::Error;
use uuid::Uuid;

/// Unified error type for the core, storage, and coordination layers.
///
/// Every failure an operation can produce is recovered into one of these
/// variants; nothing propagates as a panic. Retrying is left to callers.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Ledger not found for user: {0}")]
    LedgerNotFound(String),
    #[error("Wallet not found: {0}")]
    WalletNotFound(Uuid),
    #[error("Category not found: {0}")]
    CategoryNotFound(Uuid),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(Uuid),
    #[error("Budget not found: {0}")]
    BudgetNotFound(Uuid),
    #[error("Reminder not found: {0}")]
    ReminderNotFound(Uuid),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Duplicate budget: {0}")]
    DuplicateBudget(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Storage failure: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// True for every missing-entity variant, regardless of which entity.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::LedgerNotFound(_)
                | CoreError::WalletNotFound(_)
                | CoreError::CategoryNotFound(_)
                | CoreError::TransactionNotFound(_)
                | CoreError::BudgetNotFound(_)
                | CoreError::ReminderNotFound(_)
        )
    }
}

impl From<io::Error> for CoreError {
    fn from(err: io::Error) -> Self {
        CoreError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Storage(err.to_string())
    }
}

impl From<dompet_domain::DateRangeError> for CoreError {
    fn from(err: dompet_domain::DateRangeError) -> Self {
        CoreError::InvalidInput(err.to_string())
    }
}
