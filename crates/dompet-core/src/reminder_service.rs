//! The reminder scheduler: bill reminder CRUD, the mark-paid transition,
//! and due-date decoration.

use chrono::{DateTime, NaiveDate, Utc};
use dompet_domain::{Frequency, Ledger, Reminder};
use tracing::debug;
use uuid::Uuid;

use crate::{CoreError, Result};

const MAX_TITLE_LEN: usize = 100;

/// Input for creating a bill reminder.
#[derive(Debug, Clone)]
pub struct NewReminder {
    pub title: String,
    pub amount: i64,
    pub category_id: Uuid,
    pub wallet_id: Uuid,
    pub due_date: NaiveDate,
    pub is_recurring: bool,
    pub frequency: Option<Frequency>,
}

/// Sparse update for a reminder. `frequency` uses the double-`Option`
/// shape: the outer level means "change it", the inner level is the new
/// value (or `None` to clear).
#[derive(Debug, Clone, Default)]
pub struct ReminderPatch {
    pub title: Option<String>,
    pub amount: Option<i64>,
    pub category_id: Option<Uuid>,
    pub wallet_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub is_recurring: Option<bool>,
    pub frequency: Option<Option<Frequency>>,
}

/// Result of marking a reminder paid: the settled instance, and the
/// freshly spawned pending instance when the reminder recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkPaidOutcome {
    pub reminder_id: Uuid,
    pub spawned_id: Option<Uuid>,
}

/// Listing filter for reminders.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReminderFilter {
    /// Keep only unpaid reminders due today or later.
    pub upcoming: bool,
    pub is_paid: Option<bool>,
}

/// A reminder decorated with its due-date standing.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderView {
    pub reminder: Reminder,
    pub is_overdue: bool,
    pub days_until_due: i64,
}

/// Provides validated operations for [`Reminder`] entities.
pub struct ReminderService;

impl ReminderService {
    pub fn create(ledger: &mut Ledger, input: NewReminder) -> Result<Uuid> {
        let title = normalized_title(&input.title)?;
        validate_shape(ledger, input.wallet_id, input.category_id, input.amount)?;
        let frequency = validated_frequency(input.is_recurring, input.frequency)?;

        let mut reminder = Reminder::new(
            title,
            input.amount,
            input.category_id,
            input.wallet_id,
            input.due_date,
        );
        reminder.is_recurring = input.is_recurring;
        reminder.frequency = frequency;
        Ok(ledger.add_reminder(reminder))
    }

    pub fn update(ledger: &mut Ledger, id: Uuid, patch: ReminderPatch) -> Result<()> {
        let current = ledger
            .reminder(id)
            .cloned()
            .ok_or(CoreError::ReminderNotFound(id))?;

        let title = match patch.title {
            Some(candidate) => Some(normalized_title(&candidate)?),
            None => None,
        };
        let amount = patch.amount.unwrap_or(current.amount);
        let category_id = patch.category_id.unwrap_or(current.category_id);
        let wallet_id = patch.wallet_id.unwrap_or(current.wallet_id);
        let is_recurring = patch.is_recurring.unwrap_or(current.is_recurring);
        let frequency = patch.frequency.unwrap_or(current.frequency);

        validate_shape(ledger, wallet_id, category_id, amount)?;
        let frequency = validated_frequency(is_recurring, frequency)?;

        let reminder = ledger
            .reminder_mut(id)
            .ok_or(CoreError::ReminderNotFound(id))?;
        if let Some(title) = title {
            reminder.title = title;
        }
        reminder.amount = amount;
        reminder.category_id = category_id;
        reminder.wallet_id = wallet_id;
        if let Some(due_date) = patch.due_date {
            reminder.due_date = due_date;
        }
        reminder.is_recurring = is_recurring;
        reminder.frequency = frequency;
        ledger.touch();
        Ok(())
    }

    pub fn remove(ledger: &mut Ledger, id: Uuid) -> Result<()> {
        if ledger.reminder(id).is_none() {
            return Err(CoreError::ReminderNotFound(id));
        }
        ledger.reminders.retain(|reminder| reminder.id != id);
        ledger.touch();
        Ok(())
    }

    /// Settles a reminder. The instance is kept as the paid-history record;
    /// a recurring reminder additionally spawns a pending instance one
    /// frequency step later, both changes inside the caller's atomic unit.
    pub fn mark_paid(ledger: &mut Ledger, id: Uuid, now: DateTime<Utc>) -> Result<MarkPaidOutcome> {
        let current = ledger
            .reminder(id)
            .cloned()
            .ok_or(CoreError::ReminderNotFound(id))?;
        if current.is_paid {
            return Err(CoreError::Conflict("reminder is already marked paid".into()));
        }

        let next_due = current.next_due_date();
        let reminder = ledger
            .reminder_mut(id)
            .ok_or(CoreError::ReminderNotFound(id))?;
        reminder.is_paid = true;
        reminder.paid_at = Some(now);

        let spawned_id = next_due.map(|due_date| {
            let mut fresh = Reminder::new(
                current.title.clone(),
                current.amount,
                current.category_id,
                current.wallet_id,
                due_date,
            );
            fresh.is_recurring = true;
            fresh.frequency = current.frequency;
            debug!(reminder = %current.id, next_due = %due_date, "spawning next reminder instance");
            ledger.add_reminder(fresh)
        });
        ledger.touch();
        Ok(MarkPaidOutcome {
            reminder_id: id,
            spawned_id,
        })
    }

    /// Returns reminders matching the filter, soonest due first, decorated
    /// with overdue standing relative to `today`.
    pub fn views(ledger: &Ledger, filter: ReminderFilter, today: NaiveDate) -> Vec<ReminderView> {
        let mut rows: Vec<&Reminder> = ledger
            .reminders
            .iter()
            .filter(|reminder| !filter.upcoming || (!reminder.is_paid && reminder.due_date >= today))
            .filter(|reminder| filter.is_paid.map(|p| reminder.is_paid == p).unwrap_or(true))
            .collect();
        rows.sort_by_key(|reminder| reminder.due_date);
        rows.into_iter()
            .map(|reminder| ReminderView {
                is_overdue: reminder.is_overdue(today),
                days_until_due: reminder.days_until_due(today),
                reminder: reminder.clone(),
            })
            .collect()
    }
}

fn normalized_title(raw: &str) -> Result<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(CoreError::InvalidInput("reminder title must not be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::InvalidInput(format!(
            "reminder title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(title.to_string())
}

fn validate_shape(ledger: &Ledger, wallet_id: Uuid, category_id: Uuid, amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(CoreError::InvalidInput("reminder amount must be positive".into()));
    }
    if ledger.wallet(wallet_id).is_none() {
        return Err(CoreError::WalletNotFound(wallet_id));
    }
    if ledger.category(category_id).is_none() {
        return Err(CoreError::CategoryNotFound(category_id));
    }
    Ok(())
}

fn validated_frequency(
    is_recurring: bool,
    frequency: Option<Frequency>,
) -> Result<Option<Frequency>> {
    if is_recurring && frequency.is_none() {
        return Err(CoreError::InvalidInput(
            "a recurring reminder requires a frequency".into(),
        ));
    }
    // a one-shot reminder never keeps a stale cadence around
    Ok(if is_recurring { frequency } else { None })
}
