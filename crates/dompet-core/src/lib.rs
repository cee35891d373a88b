//! dompet-core
//!
//! Business logic and services for the household finance tracker: balance
//! maintenance, the transaction mutation coordinator, the budget engine,
//! the report aggregator, and the reminder scheduler. Depends on
//! dompet-domain. No CLI, no terminal I/O, no concrete storage backend.

pub mod balance;
pub mod budget_service;
pub mod category_service;
pub mod error;
pub mod reminder_service;
pub mod report_service;
pub mod storage;
pub mod time;
pub mod tracker;
pub mod transaction_service;
pub mod wallet_service;

pub use balance::BalanceService;
pub use budget_service::{BudgetPatch, BudgetService, NewBudget};
pub use category_service::{CategoryPatch, CategoryService, NewCategory};
pub use error::{CoreError, Result};
pub use reminder_service::{
    MarkPaidOutcome, NewReminder, ReminderFilter, ReminderPatch, ReminderService, ReminderView,
};
pub use report_service::ReportService;
pub use storage::{ledger_warnings, LedgerStore, MemoryLedgerStore};
pub use time::{Clock, FixedClock, SystemClock};
pub use tracker::Tracker;
pub use transaction_service::{
    NewTransaction, TransactionFilter, TransactionPatch, TransactionService,
};
pub use wallet_service::{NewWallet, WalletPatch, WalletService};
