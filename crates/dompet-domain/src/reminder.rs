//! Recurring bill reminders and their cadence arithmetic.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{shift_month, shift_year, Amounted, Displayable, Identifiable};

/// A bill that is due on a date, optionally repeating. Paying a recurring
/// reminder keeps this instance as the paid-history record and spawns a
/// fresh pending instance one frequency step later.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reminder {
    pub id: Uuid,
    pub title: String,
    pub amount: i64,
    pub category_id: Uuid,
    pub wallet_id: Uuid,
    pub due_date: NaiveDate,
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
    pub is_paid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Reminder {
    pub fn new(
        title: impl Into<String>,
        amount: i64,
        category_id: Uuid,
        wallet_id: Uuid,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            amount,
            category_id,
            wallet_id,
            due_date,
            is_recurring: false,
            frequency: None,
            is_paid: false,
            paid_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn recurring(mut self, frequency: Frequency) -> Self {
        self.is_recurring = true;
        self.frequency = Some(frequency);
        self
    }

    /// Due date of the instance that would follow this one, when recurring.
    pub fn next_due_date(&self) -> Option<NaiveDate> {
        if !self.is_recurring {
            return None;
        }
        self.frequency.map(|freq| freq.advance(self.due_date))
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_paid && self.due_date < today
    }

    /// Whole days until the due date; negative once the bill is overdue.
    pub fn days_until_due(&self, today: NaiveDate) -> i64 {
        (self.due_date - today).num_days()
    }
}

impl Identifiable for Reminder {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Amounted for Reminder {
    fn amount(&self) -> i64 {
        self.amount
    }
}

impl Displayable for Reminder {
    fn display_label(&self) -> String {
        format!("{} (due {})", self.title, self.due_date)
    }
}

/// Repeat cadence for recurring reminders.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// The date exactly one cadence step after `from`, using calendar-aware
    /// month and year arithmetic.
    pub fn advance(self, from: NaiveDate) -> NaiveDate {
        match self {
            Frequency::Daily => from + Duration::days(1),
            Frequency::Weekly => from + Duration::weeks(1),
            Frequency::Monthly => shift_month(from, 1),
            Frequency::Yearly => shift_year(from, 1),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn monthly_advance_is_calendar_safe() {
        assert_eq!(Frequency::Monthly.advance(date(2025, 1, 31)), date(2025, 2, 28));
        assert_eq!(Frequency::Monthly.advance(date(2024, 1, 31)), date(2024, 2, 29));
        assert_eq!(Frequency::Monthly.advance(date(2025, 12, 15)), date(2026, 1, 15));
    }

    #[test]
    fn daily_and_weekly_advance_linearly() {
        assert_eq!(Frequency::Daily.advance(date(2025, 2, 28)), date(2025, 3, 1));
        assert_eq!(Frequency::Weekly.advance(date(2025, 1, 27)), date(2025, 2, 3));
    }

    #[test]
    fn yearly_advance_clamps_leap_day() {
        assert_eq!(Frequency::Yearly.advance(date(2024, 2, 29)), date(2025, 2, 28));
    }

    #[test]
    fn overdue_and_days_until_due() {
        let reminder = Reminder::new(
            "Internet",
            350_000,
            Uuid::new_v4(),
            Uuid::new_v4(),
            date(2025, 4, 10),
        );
        assert!(!reminder.is_overdue(date(2025, 4, 10)));
        assert!(reminder.is_overdue(date(2025, 4, 11)));
        assert_eq!(reminder.days_until_due(date(2025, 4, 7)), 3);
        assert_eq!(reminder.days_until_due(date(2025, 4, 12)), -2);
    }

    #[test]
    fn next_due_date_requires_recurrence() {
        let base = Reminder::new(
            "Rent",
            1_500_000,
            Uuid::new_v4(),
            Uuid::new_v4(),
            date(2025, 1, 31),
        );
        assert_eq!(base.next_due_date(), None);
        let recurring = base.recurring(Frequency::Monthly);
        assert_eq!(recurring.next_due_date(), Some(date(2025, 2, 28)));
    }
}
