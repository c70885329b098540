use serde::Serialize;
use time::{Date, Month, OffsetDateTime, UtcOffset};

use crate::transactions::{TransactionPoint, TransactionType};

/// Income the progress gauge is measured against.
pub const MONTHLY_TARGET: i64 = 5000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub year: i32,
    pub total_users: i64,
    pub total_tasks: i64,
    pub total_income: i64,
    pub total_expense: i64,
    /// Index 0 is January.
    pub monthly_income: [i64; 12],
    pub monthly_expense: [i64; 12],
    pub monthly_target: i64,
    pub current_month_income: i64,
    pub today_income: i64,
    pub progress_percent: i64,
}

/// `[Jan 1 of now's year, Jan 1 of the next year)`, in UTC.
pub fn year_bounds(now: OffsetDateTime) -> anyhow::Result<(OffsetDateTime, OffsetDateTime)> {
    let year = now.to_offset(UtcOffset::UTC).year();
    let start = Date::from_calendar_date(year, Month::January, 1)?.midnight().assume_utc();
    let end = Date::from_calendar_date(year + 1, Month::January, 1)?.midnight().assume_utc();
    Ok((start, end))
}

pub fn progress_percent(income: i64, target: i64) -> i64 {
    if target <= 0 {
        return 0;
    }
    let pct = (income as f64 / target as f64 * 100.0).round() as i64;
    pct.min(100)
}

/// Buckets one year of transactions by month and type in a single pass.
pub fn summarize(
    points: &[TransactionPoint],
    now: OffsetDateTime,
    total_users: i64,
    total_tasks: i64,
) -> DashboardSummary {
    let now = now.to_offset(UtcOffset::UTC);
    let today = now.date();

    let mut total_income = 0i64;
    let mut total_expense = 0i64;
    let mut monthly_income = [0i64; 12];
    let mut monthly_expense = [0i64; 12];
    let mut today_income = 0i64;

    for p in points {
        let date = p.transaction_date.to_offset(UtcOffset::UTC);
        if date.year() != now.year() {
            continue;
        }
        let month = usize::from(u8::from(date.month())) - 1;
        let price = i64::from(p.price);
        match p.type_transaction {
            TransactionType::Income => {
                total_income += price;
                monthly_income[month] += price;
                if date.date() == today {
                    today_income += price;
                }
            }
            TransactionType::Expense => {
                total_expense += price;
                monthly_expense[month] += price;
            }
        }
    }

    let current_month_income = monthly_income[usize::from(u8::from(now.month())) - 1];

    DashboardSummary {
        year: now.year(),
        total_users,
        total_tasks,
        total_income,
        total_expense,
        monthly_income,
        monthly_expense,
        monthly_target: MONTHLY_TARGET,
        current_month_income,
        today_income,
        progress_percent: progress_percent(current_month_income, MONTHLY_TARGET),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn point(kind: TransactionType, price: i32, at: OffsetDateTime) -> TransactionPoint {
        TransactionPoint {
            price,
            type_transaction: kind,
            transaction_date: at,
        }
    }

    #[test]
    fn buckets_by_month_and_type() {
        let now = datetime!(2025-06-15 12:00 UTC);
        let points = [
            point(TransactionType::Income, 100, datetime!(2025-01-10 08:00 UTC)),
            point(TransactionType::Expense, 40, datetime!(2025-01-20 08:00 UTC)),
            point(TransactionType::Income, 50, datetime!(2025-03-02 08:00 UTC)),
        ];
        let s = summarize(&points, now, 3, 7);
        assert_eq!(s.total_income, 150);
        assert_eq!(s.total_expense, 40);
        assert_eq!(s.monthly_income[0], 100);
        assert_eq!(s.monthly_income[2], 50);
        assert_eq!(s.monthly_income.iter().sum::<i64>(), 150);
        assert_eq!(s.monthly_expense[0], 40);
        assert_eq!(s.monthly_expense.iter().sum::<i64>(), 40);
        assert_eq!(s.total_users, 3);
        assert_eq!(s.total_tasks, 7);
        assert_eq!(s.year, 2025);
        assert_eq!(s.current_month_income, 0);
        assert_eq!(s.progress_percent, 0);
    }

    #[test]
    fn current_month_and_today() {
        let now = datetime!(2025-06-15 12:00 UTC);
        let points = [
            point(TransactionType::Income, 1000, datetime!(2025-06-01 00:00 UTC)),
            point(TransactionType::Income, 250, datetime!(2025-06-15 00:00 UTC)),
            point(TransactionType::Income, 250, datetime!(2025-06-15 23:59:59.999 UTC)),
            point(TransactionType::Expense, 999, datetime!(2025-06-15 10:00 UTC)),
        ];
        let s = summarize(&points, now, 1, 0);
        assert_eq!(s.current_month_income, 1500);
        assert_eq!(s.today_income, 500);
        assert_eq!(s.progress_percent, 30);
        assert_eq!(s.monthly_target, MONTHLY_TARGET);
    }

    #[test]
    fn progress_rounds_and_caps() {
        assert_eq!(progress_percent(2525, 5000), 51);
        assert_eq!(progress_percent(2475, 5000), 50);
        assert_eq!(progress_percent(9000, 5000), 100);
        assert_eq!(progress_percent(10, 0), 0);
    }

    #[test]
    fn ignores_other_years() {
        let now = datetime!(2025-02-01 00:00 UTC);
        let points = [point(TransactionType::Income, 10, datetime!(2024-12-31 23:00 UTC))];
        let s = summarize(&points, now, 0, 0);
        assert_eq!(s.total_income, 0);
    }

    #[test]
    fn bounds_cover_the_whole_year() {
        let (start, end) = year_bounds(datetime!(2024-07-04 18:30 +02:00)).unwrap();
        assert_eq!(start, datetime!(2024-01-01 00:00 UTC));
        assert_eq!(end, datetime!(2025-01-01 00:00 UTC));
    }

    #[test]
    fn serializes_camel_case() {
        let s = summarize(&[], datetime!(2025-01-01 00:00 UTC), 0, 0);
        let v = serde_json::to_value(&s).unwrap();
        assert!(v.get("monthlyIncome").unwrap().as_array().unwrap().len() == 12);
        assert!(v.get("progressPercent").is_some());
        assert!(v.get("todayIncome").is_some());
    }
}
