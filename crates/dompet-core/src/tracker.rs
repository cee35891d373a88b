//! Per-user session facade coordinating services, storage, and the clock.

use std::sync::Arc;

use dompet_domain::{
    BudgetUsage, Category, DateRange, Ledger, MonthComparison, MonthlyReport, PeriodSummary,
    Reminder, Transaction, TransactionKind, TrendGranularity, TrendReport, Wallet, WalletKind,
    CURRENT_SCHEMA_VERSION,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    budget_service::{BudgetPatch, BudgetService, NewBudget},
    category_service::{CategoryPatch, CategoryService, NewCategory},
    reminder_service::{
        MarkPaidOutcome, NewReminder, ReminderFilter, ReminderPatch, ReminderService, ReminderView,
    },
    report_service::ReportService,
    storage::{ledger_warnings, LedgerStore},
    time::Clock,
    transaction_service::{NewTransaction, TransactionFilter, TransactionPatch, TransactionService},
    wallet_service::{NewWallet, WalletPatch, WalletService},
    CoreError, Result,
};

const DEFAULT_WALLET_NAME: &str = "Cash";

/// One authenticated user's tracker session.
///
/// Every mutation is staged on a clone of the loaded ledger, persisted
/// through the store, and only then swapped in — so a failed save reports
/// `CoreError::Storage` with no observable side effect, and a successful
/// one makes the transaction row and its wallet balance visible together.
/// Aggregations (budgets, reports) are recomputed from current state on
/// every read.
pub struct Tracker {
    ledger: Ledger,
    storage: Box<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
}

impl Tracker {
    /// Loads the user's ledger, bootstrapping a fresh one with the default
    /// wallet when the store has never seen this user.
    pub fn open(
        storage: Box<dyn LedgerStore>,
        clock: Arc<dyn Clock>,
        user_id: &str,
    ) -> Result<Self> {
        let ledger = match storage.load_ledger(user_id) {
            Ok(ledger) => ledger,
            Err(CoreError::LedgerNotFound(_)) => {
                debug!(user = user_id, "bootstrapping new ledger");
                let mut ledger = Ledger::new(user_id);
                ledger.add_wallet(Wallet::new(DEFAULT_WALLET_NAME, WalletKind::Cash, 0));
                storage.save_ledger(&ledger)?;
                ledger
            }
            Err(err) => return Err(err),
        };
        if ledger.schema_version > CURRENT_SCHEMA_VERSION {
            return Err(CoreError::Storage(format!(
                "ledger schema v{} is newer than supported v{}",
                ledger.schema_version, CURRENT_SCHEMA_VERSION
            )));
        }
        Ok(Self {
            ledger,
            storage,
            clock,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.ledger.user_id
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Dangling-reference audit of the loaded snapshot.
    pub fn warnings(&self) -> Vec<String> {
        ledger_warnings(&self.ledger)
    }

    // --- wallets -----------------------------------------------------

    pub fn create_wallet(&mut self, input: NewWallet) -> Result<Uuid> {
        self.commit(|ledger| WalletService::create(ledger, input))
    }

    pub fn update_wallet(&mut self, id: Uuid, patch: WalletPatch) -> Result<()> {
        self.commit(|ledger| WalletService::update(ledger, id, patch))
    }

    pub fn delete_wallet(&mut self, id: Uuid) -> Result<()> {
        self.commit(|ledger| WalletService::remove(ledger, id))
    }

    pub fn wallets(&self) -> Vec<&Wallet> {
        WalletService::list(&self.ledger)
    }

    // --- categories --------------------------------------------------

    pub fn create_category(&mut self, input: NewCategory) -> Result<Uuid> {
        self.commit(|ledger| CategoryService::create(ledger, input))
    }

    pub fn update_category(&mut self, id: Uuid, patch: CategoryPatch) -> Result<()> {
        self.commit(|ledger| CategoryService::update(ledger, id, patch))
    }

    pub fn delete_category(&mut self, id: Uuid) -> Result<()> {
        self.commit(|ledger| CategoryService::remove(ledger, id))
    }

    pub fn categories(&self, kind: Option<TransactionKind>) -> Vec<&Category> {
        CategoryService::list(&self.ledger, kind)
    }

    // --- transactions ------------------------------------------------

    pub fn create_transaction(&mut self, input: NewTransaction) -> Result<Uuid> {
        self.commit(|ledger| TransactionService::create(ledger, input))
    }

    pub fn update_transaction(&mut self, id: Uuid, patch: TransactionPatch) -> Result<()> {
        self.commit(|ledger| TransactionService::update(ledger, id, patch))
    }

    pub fn delete_transaction(&mut self, id: Uuid) -> Result<()> {
        self.commit(|ledger| TransactionService::remove(ledger, id))
    }

    pub fn transactions(&self, filter: &TransactionFilter) -> Vec<&Transaction> {
        TransactionService::list(&self.ledger, filter)
    }

    // --- budgets -----------------------------------------------------

    pub fn create_budget(&mut self, input: NewBudget) -> Result<Uuid> {
        self.commit(|ledger| BudgetService::create(ledger, input))
    }

    pub fn update_budget(&mut self, id: Uuid, patch: BudgetPatch) -> Result<()> {
        self.commit(|ledger| BudgetService::update(ledger, id, patch))
    }

    pub fn delete_budget(&mut self, id: Uuid) -> Result<()> {
        self.commit(|ledger| BudgetService::remove(ledger, id))
    }

    pub fn budgets_with_usage(&self) -> Vec<BudgetUsage> {
        BudgetService::list_usage(&self.ledger)
    }

    // --- reminders ---------------------------------------------------

    pub fn create_reminder(&mut self, input: NewReminder) -> Result<Uuid> {
        self.commit(|ledger| ReminderService::create(ledger, input))
    }

    pub fn update_reminder(&mut self, id: Uuid, patch: ReminderPatch) -> Result<()> {
        self.commit(|ledger| ReminderService::update(ledger, id, patch))
    }

    pub fn delete_reminder(&mut self, id: Uuid) -> Result<()> {
        self.commit(|ledger| ReminderService::remove(ledger, id))
    }

    /// Settles a reminder; the paid record and any spawned next instance
    /// are persisted in the same atomic unit.
    pub fn mark_reminder_paid(&mut self, id: Uuid) -> Result<MarkPaidOutcome> {
        let now = self.clock.now();
        self.commit(|ledger| ReminderService::mark_paid(ledger, id, now))
    }

    pub fn reminders(&self, filter: ReminderFilter) -> Vec<ReminderView> {
        ReminderService::views(&self.ledger, filter, self.clock.today())
    }

    pub fn reminder(&self, id: Uuid) -> Option<&Reminder> {
        self.ledger.reminder(id)
    }

    // --- reports -----------------------------------------------------

    pub fn summary(&self, range: DateRange) -> PeriodSummary {
        ReportService::summary(&self.ledger, range)
    }

    pub fn monthly_report(&self, year: i32, month: u32) -> Result<MonthlyReport> {
        ReportService::monthly_report(&self.ledger, year, month)
    }

    pub fn trend(&self, range: DateRange, granularity: TrendGranularity) -> TrendReport {
        ReportService::trend(&self.ledger, range, granularity)
    }

    /// Current calendar month vs. the previous one, relative to the clock.
    pub fn month_comparison(&self) -> MonthComparison {
        ReportService::month_comparison(&self.ledger, self.clock.today())
    }

    /// Runs a mutation against a staged copy and persists it before making
    /// it visible. Failure at any point leaves the session untouched.
    fn commit<T>(&mut self, op: impl FnOnce(&mut Ledger) -> Result<T>) -> Result<T> {
        let mut staged = self.ledger.clone();
        let out = op(&mut staged)?;
        if let Err(err) = self.storage.save_ledger(&staged) {
            warn!(user = %self.ledger.user_id, error = %err, "ledger commit failed; state unchanged");
            return Err(err);
        }
        self.ledger = staged;
        Ok(out)
    }
}
