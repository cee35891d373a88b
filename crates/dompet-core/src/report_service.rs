//! The report aggregator: period summaries, time-bucketed trends, category
//! breakdowns, and month-over-month comparison. Everything is recomputed
//! from the transaction log on every call.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};
use dompet_domain::{
    days_in_month, month_range, previous_month, week_start, CategoryBreakdownEntry,
    ChangeDirection, DateRange, DayBucket, Ledger, MonthComparison, MonthTotals, MonthlyReport,
    PeriodSummary, Transaction, TransactionKind, TrendBucket, TrendGranularity, TrendReport,
};
use uuid::Uuid;

use crate::{CoreError, Result};

#[derive(Default, Clone, Copy)]
struct FlowAcc {
    income: i64,
    expense: i64,
}

impl FlowAcc {
    fn add(&mut self, txn: &Transaction) {
        match txn.kind {
            TransactionKind::Income => self.income += txn.amount,
            TransactionKind::Expense => self.expense += txn.amount,
        }
    }
}

/// Aggregates ledger transactions into the report output shapes.
pub struct ReportService;

impl ReportService {
    /// Income/expense totals over a date range.
    pub fn summary(ledger: &Ledger, range: DateRange) -> PeriodSummary {
        let mut acc = FlowAcc::default();
        let mut count = 0usize;
        for txn in ledger.transactions.iter().filter(|t| range.contains(t.date)) {
            acc.add(txn);
            count += 1;
        }
        PeriodSummary::new(acc.income, acc.expense, count)
    }

    /// Full report for one calendar month: summary, category breakdowns,
    /// and a zero-filled per-day series.
    pub fn monthly_report(ledger: &Ledger, year: i32, month: u32) -> Result<MonthlyReport> {
        let range = month_range(year, month)
            .ok_or_else(|| CoreError::InvalidInput(format!("invalid month: {}", month)))?;
        let rows: Vec<&Transaction> = ledger
            .transactions
            .iter()
            .filter(|txn| range.contains(txn.date))
            .collect();

        let mut daily: Vec<DayBucket> = (1..=days_in_month(year, month))
            .map(|day| DayBucket {
                day,
                income: 0,
                expense: 0,
            })
            .collect();
        let mut acc = FlowAcc::default();
        for txn in &rows {
            acc.add(txn);
            let bucket = &mut daily[txn.date.day() as usize - 1];
            match txn.kind {
                TransactionKind::Income => bucket.income += txn.amount,
                TransactionKind::Expense => bucket.expense += txn.amount,
            }
        }

        Ok(MonthlyReport {
            year,
            month,
            summary: PeriodSummary::new(acc.income, acc.expense, rows.len()),
            expense_by_category: Self::breakdown(ledger, &rows, TransactionKind::Expense),
            income_by_category: Self::breakdown(ledger, &rows, TransactionKind::Income),
            daily,
        })
    }

    /// Groups one kind of transaction by category: totals, counts, and the
    /// share of the grand total. Sorted descending by total; ties keep
    /// first-seen order.
    pub fn breakdown(
        ledger: &Ledger,
        rows: &[&Transaction],
        kind: TransactionKind,
    ) -> Vec<CategoryBreakdownEntry> {
        let mut order: Vec<Uuid> = Vec::new();
        let mut groups: HashMap<Uuid, (i64, usize)> = HashMap::new();
        let mut grand_total = 0i64;
        for txn in rows.iter().filter(|t| t.kind == kind) {
            let entry = groups.entry(txn.category_id).or_insert_with(|| {
                order.push(txn.category_id);
                (0, 0)
            });
            entry.0 += txn.amount;
            entry.1 += 1;
            grand_total += txn.amount;
        }

        let mut entries: Vec<CategoryBreakdownEntry> = order
            .into_iter()
            .map(|category_id| {
                let (total, count) = groups[&category_id];
                let (name, icon) = match ledger.category(category_id) {
                    Some(category) => (category.name.clone(), category.icon.clone()),
                    None => ("Unknown Category".into(), None),
                };
                let percentage = if grand_total == 0 {
                    0
                } else {
                    ((total as f64 / grand_total as f64) * 100.0).round() as u8
                };
                CategoryBreakdownEntry {
                    category_id,
                    name,
                    icon,
                    total,
                    count,
                    percentage,
                }
            })
            .collect();
        entries.sort_by(|a, b| b.total.cmp(&a.total));
        entries
    }

    /// Buckets the range by week (starting Monday) or calendar month.
    /// Every bucket covering the range is emitted, zeros included, in
    /// chronological order.
    pub fn trend(ledger: &Ledger, range: DateRange, granularity: TrendGranularity) -> TrendReport {
        let starts = bucket_starts(range, granularity);
        let mut sums = vec![FlowAcc::default(); starts.len()];
        for txn in ledger.transactions.iter().filter(|t| range.contains(t.date)) {
            let index = bucket_index(starts[0], txn.date, granularity);
            sums[index].add(txn);
        }

        let buckets: Vec<TrendBucket> = starts
            .iter()
            .zip(&sums)
            .map(|(start, acc)| TrendBucket {
                label: bucket_label(*start, granularity),
                start: *start,
                income: acc.income,
                expense: acc.expense,
                balance: acc.income - acc.expense,
            })
            .collect();

        let avg_income = rounded_mean(buckets.iter().map(|b| b.income));
        let avg_expense = rounded_mean(buckets.iter().map(|b| b.expense));
        TrendReport {
            granularity,
            buckets,
            avg_income,
            avg_expense,
            avg_balance: avg_income - avg_expense,
        }
    }

    /// Compares the calendar month containing `today` with the month
    /// before it. A change out of nothing counts as a full positive swing;
    /// two empty months compare as no change.
    pub fn month_comparison(ledger: &Ledger, today: NaiveDate) -> MonthComparison {
        let current = Self::month_totals(ledger, today.year(), today.month());
        let (prev_year, prev_month) = previous_month(today.year(), today.month());
        let previous = Self::month_totals(ledger, prev_year, prev_month);

        let income_change = change_percent(current.income, previous.income);
        let expense_change = change_percent(current.expense, previous.expense);
        MonthComparison {
            current,
            previous,
            income_change,
            expense_change,
            income_direction: direction(income_change),
            expense_direction: direction(expense_change),
        }
    }

    fn month_totals(ledger: &Ledger, year: i32, month: u32) -> MonthTotals {
        let range = month_range(year, month).unwrap();
        let summary = Self::summary(ledger, range);
        MonthTotals {
            year,
            month,
            income: summary.total_income,
            expense: summary.total_expense,
            balance: summary.balance,
        }
    }
}

fn bucket_starts(range: DateRange, granularity: TrendGranularity) -> Vec<NaiveDate> {
    match granularity {
        TrendGranularity::Weekly => {
            let mut starts = Vec::new();
            let mut cursor = week_start(range.start);
            while cursor <= range.end {
                starts.push(cursor);
                cursor += Duration::weeks(1);
            }
            starts
        }
        TrendGranularity::Monthly => {
            let first = month_index(range.start);
            let last = month_index(range.end);
            (first..=last)
                .map(|index| {
                    let year = index.div_euclid(12);
                    let month = (index.rem_euclid(12) + 1) as u32;
                    NaiveDate::from_ymd_opt(year, month, 1).unwrap()
                })
                .collect()
        }
    }
}

fn bucket_index(first_start: NaiveDate, date: NaiveDate, granularity: TrendGranularity) -> usize {
    match granularity {
        TrendGranularity::Weekly => {
            ((date - first_start).num_days().div_euclid(7)) as usize
        }
        TrendGranularity::Monthly => (month_index(date) - month_index(first_start)) as usize,
    }
}

fn bucket_label(start: NaiveDate, granularity: TrendGranularity) -> String {
    match granularity {
        TrendGranularity::Weekly => format!("{}/{}", start.day(), start.month()),
        TrendGranularity::Monthly => start.format("%b %y").to_string(),
    }
}

fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month() as i32 - 1
}

fn rounded_mean(values: impl Iterator<Item = i64>) -> i64 {
    let (sum, count) = values.fold((0i64, 0i64), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0
    } else {
        (sum as f64 / count as f64).round() as i64
    }
}

fn change_percent(current: i64, previous: i64) -> i64 {
    if previous > 0 {
        (((current - previous) as f64 / previous as f64) * 100.0).round() as i64
    } else if current > 0 {
        100
    } else {
        0
    }
}

fn direction(change: i64) -> ChangeDirection {
    if change >= 0 {
        ChangeDirection::Up
    } else {
        ChangeDirection::Down
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dompet_domain::{Category, Transaction, Wallet, WalletKind};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn range(start: NaiveDate, end: NaiveDate) -> DateRange {
        DateRange::new(start, end).unwrap()
    }

    struct Fixture {
        ledger: Ledger,
        wallet: Uuid,
        makan: Uuid,
        transport: Uuid,
        gaji: Uuid,
    }

    fn fixture() -> Fixture {
        let mut ledger = Ledger::new("user");
        let wallet = ledger.add_wallet(Wallet::new("Tunai", WalletKind::Cash, 0));
        let makan = ledger.add_category(Category::new("Makan", TransactionKind::Expense));
        let transport = ledger.add_category(Category::new("Transport", TransactionKind::Expense));
        let gaji = ledger.add_category(Category::new("Gaji", TransactionKind::Income));
        Fixture {
            ledger,
            wallet,
            makan,
            transport,
            gaji,
        }
    }

    fn record(fx: &mut Fixture, category: Uuid, kind: TransactionKind, amount: i64, on: NaiveDate) {
        fx.ledger
            .add_transaction(Transaction::new(fx.wallet, category, amount, kind, on));
    }

    #[test]
    fn summary_totals_income_and_expense() {
        let mut fx = fixture();
        let (gaji, makan) = (fx.gaji, fx.makan);
        record(&mut fx, gaji, TransactionKind::Income, 5_000_000, date(2025, 3, 1));
        record(&mut fx, makan, TransactionKind::Expense, 1_200_000, date(2025, 3, 8));
        record(&mut fx, makan, TransactionKind::Expense, 999, date(2025, 4, 1)); // outside

        let summary =
            ReportService::summary(&fx.ledger, range(date(2025, 3, 1), date(2025, 3, 31)));
        assert_eq!(summary.total_income, 5_000_000);
        assert_eq!(summary.total_expense, 1_200_000);
        assert_eq!(summary.balance, 3_800_000);
        assert_eq!(summary.transaction_count, 2);
    }

    #[test]
    fn weekly_trend_emits_every_bucket_in_range() {
        let mut fx = fixture();
        // Range spans three Monday-aligned weeks: 3/3, 3/10, 3/17.
        let (makan, gaji) = (fx.makan, fx.gaji);
        record(&mut fx, makan, TransactionKind::Expense, 50_000, date(2025, 3, 4));
        record(&mut fx, gaji, TransactionKind::Income, 80_000, date(2025, 3, 18));

        let report = ReportService::trend(
            &fx.ledger,
            range(date(2025, 3, 3), date(2025, 3, 23)),
            TrendGranularity::Weekly,
        );
        assert_eq!(report.buckets.len(), 3);
        assert_eq!(report.buckets[0].start, date(2025, 3, 3));
        assert_eq!(report.buckets[0].label, "3/3");
        assert_eq!(report.buckets[0].expense, 50_000);
        // empty middle bucket still present with zero sums
        assert_eq!(report.buckets[1].income, 0);
        assert_eq!(report.buckets[1].expense, 0);
        assert_eq!(report.buckets[2].income, 80_000);
        assert_eq!(report.buckets[2].balance, 80_000);

        assert_eq!(report.avg_expense, 16_667);
        assert_eq!(report.avg_income, 26_667);
        assert_eq!(report.avg_balance, 10_000);
    }

    #[test]
    fn weekly_buckets_start_on_monday() {
        let fx = fixture();
        // 2025-03-05 is a Wednesday; the first bucket snaps back to Monday.
        let report = ReportService::trend(
            &fx.ledger,
            range(date(2025, 3, 5), date(2025, 3, 9)),
            TrendGranularity::Weekly,
        );
        assert_eq!(report.buckets.len(), 1);
        assert_eq!(report.buckets[0].start, date(2025, 3, 3));
    }

    #[test]
    fn monthly_trend_spans_year_boundaries() {
        let mut fx = fixture();
        let makan = fx.makan;
        record(&mut fx, makan, TransactionKind::Expense, 10_000, date(2024, 11, 20));
        record(&mut fx, makan, TransactionKind::Expense, 30_000, date(2025, 1, 5));

        let report = ReportService::trend(
            &fx.ledger,
            range(date(2024, 11, 1), date(2025, 1, 31)),
            TrendGranularity::Monthly,
        );
        let labels: Vec<&str> = report.buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Nov 24", "Dec 24", "Jan 25"]);
        assert_eq!(report.buckets[1].expense, 0);
        assert_eq!(report.buckets[2].expense, 30_000);
    }

    #[test]
    fn monthly_report_builds_breakdowns_and_daily_series() {
        let mut fx = fixture();
        let (makan, transport, gaji) = (fx.makan, fx.transport, fx.gaji);
        record(&mut fx, makan, TransactionKind::Expense, 300_000, date(2025, 2, 3));
        record(&mut fx, makan, TransactionKind::Expense, 100_000, date(2025, 2, 10));
        record(&mut fx, transport, TransactionKind::Expense, 100_000, date(2025, 2, 10));
        record(&mut fx, gaji, TransactionKind::Income, 4_000_000, date(2025, 2, 1));

        let report = ReportService::monthly_report(&fx.ledger, 2025, 2).unwrap();
        assert_eq!(report.daily.len(), 28);
        assert_eq!(report.daily[9].expense, 200_000);
        assert_eq!(report.daily[0].income, 4_000_000);
        assert_eq!(report.daily[4].income, 0);

        let expense = &report.expense_by_category;
        assert_eq!(expense.len(), 2);
        assert_eq!(expense[0].name, "Makan");
        assert_eq!(expense[0].total, 400_000);
        assert_eq!(expense[0].percentage, 80);
        assert_eq!(expense[1].percentage, 20);
        assert_eq!(expense[1].count, 1);

        let income = &report.income_by_category;
        assert_eq!(income.len(), 1);
        assert_eq!(income[0].percentage, 100);

        assert!(ReportService::monthly_report(&fx.ledger, 2025, 13).is_err());
    }

    #[test]
    fn breakdown_of_empty_period_has_zero_percentages() {
        let fx = fixture();
        let report = ReportService::monthly_report(&fx.ledger, 2025, 6).unwrap();
        assert!(report.expense_by_category.is_empty());
        assert_eq!(report.summary.transaction_count, 0);
    }

    #[test]
    fn comparison_treats_growth_from_zero_as_full_swing() {
        let mut fx = fixture();
        let gaji = fx.gaji;
        record(&mut fx, gaji, TransactionKind::Income, 50_000, date(2025, 5, 12));

        let comparison = ReportService::month_comparison(&fx.ledger, date(2025, 5, 20));
        assert_eq!(comparison.previous.income, 0);
        assert_eq!(comparison.income_change, 100);
        assert_eq!(comparison.income_direction, ChangeDirection::Up);
        // both months empty of expenses compares as no change
        assert_eq!(comparison.expense_change, 0);
        assert_eq!(comparison.expense_direction, ChangeDirection::Up);
    }

    #[test]
    fn comparison_computes_signed_percentages() {
        let mut fx = fixture();
        let (makan, gaji) = (fx.makan, fx.gaji);
        record(&mut fx, makan, TransactionKind::Expense, 400_000, date(2025, 4, 10));
        record(&mut fx, makan, TransactionKind::Expense, 300_000, date(2025, 5, 9));
        record(&mut fx, gaji, TransactionKind::Income, 1_000_000, date(2025, 4, 1));
        record(&mut fx, gaji, TransactionKind::Income, 1_500_000, date(2025, 5, 1));

        let comparison = ReportService::month_comparison(&fx.ledger, date(2025, 5, 20));
        assert_eq!(comparison.expense_change, -25);
        assert_eq!(comparison.expense_direction, ChangeDirection::Down);
        assert_eq!(comparison.income_change, 50);
        assert_eq!(comparison.income_direction, ChangeDirection::Up);
        assert_eq!(comparison.previous.balance, 600_000);
        assert_eq!(comparison.current.balance, 1_200_000);
    }
}
