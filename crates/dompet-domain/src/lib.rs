//! dompet-domain
//!
//! Pure domain models for the household finance tracker: wallets,
//! categories, transactions, budget envelopes, reminders, and the report
//! output shapes. No I/O, no storage. Only data types and core enums.

pub mod budget;
pub mod category;
pub mod common;
pub mod ledger;
pub mod reminder;
pub mod report;
pub mod transaction;
pub mod wallet;

pub use budget::*;
pub use category::*;
pub use common::*;
pub use ledger::*;
pub use reminder::*;
pub use report::*;
pub use transaction::*;
pub use wallet::*;
