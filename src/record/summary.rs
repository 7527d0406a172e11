//! Period totals of the ledger, grouped by type and category.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    extract::{FromRef, Query, State, rejection::QueryRejection},
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime, macros::date};

use crate::{
    AppState, Error, ValidationError,
    record::{Amount, Category, Record, RecordType, summarize_period},
    timezone::{get_local_offset, local_today, start_of_day},
};

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    start: Date,
    end: Date,
}

impl Period {
    /// The earliest day a period may start on.
    pub const EARLIEST: Date = date!(1000 - 01 - 01);

    /// The latest day a period may end on.
    ///
    /// Leaves room for the day after the period in any timezone offset.
    pub const LATEST: Date = date!(9998 - 12 - 31);

    /// Create a period from `start` to `end`, both inclusive.
    ///
    /// # Errors
    ///
    /// This function will return a:
    /// - [ValidationError::DateOutOfRange] if either day is outside
    ///   [Period::EARLIEST] to [Period::LATEST],
    /// - or [ValidationError::InvalidDateRange] if `start` is after `end`.
    pub fn new(start: Date, end: Date) -> Result<Self, ValidationError> {
        for (field, date) in [("start", start), ("end", end)] {
            if !(Self::EARLIEST..=Self::LATEST).contains(&date) {
                return Err(ValidationError::DateOutOfRange { field, date });
            }
        }

        if start > end {
            return Err(ValidationError::InvalidDateRange { start, end });
        }

        Ok(Self { start, end })
    }

    /// The calendar month that contains `date`.
    pub fn month_containing(date: Date) -> Self {
        let start = date - Duration::days(i64::from(date.day()) - 1);

        let mut end = date;
        while let Some(next) = end.next_day() {
            if next.month() != date.month() {
                break;
            }
            end = next;
        }

        Self { start, end }
    }

    /// The first day of the period.
    pub fn start(&self) -> Date {
        self.start
    }

    /// The last day of the period.
    pub fn end(&self) -> Date {
        self.end
    }

    /// The instants bounding the period in `canonical_timezone`: the start of
    /// the first day, and the start of the day after the last day.
    ///
    /// Each bound uses the offset in effect on its own day, so a period that
    /// crosses a daylight saving change still covers whole local days.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::InvalidTimezoneError] if
    /// `canonical_timezone` is not a known timezone.
    pub fn utc_bounds(
        &self,
        canonical_timezone: &str,
    ) -> Result<(OffsetDateTime, OffsetDateTime), Error> {
        let day_after = self.end.saturating_add(Duration::days(1));

        match (
            start_of_day(self.start, canonical_timezone),
            start_of_day(day_after, canonical_timezone),
        ) {
            (Some(start), Some(end)) => Ok((start, end)),
            _ => Err(Error::InvalidTimezoneError(canonical_timezone.to_owned())),
        }
    }
}

/// The total for one category within a summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    /// The category label.
    pub category: Category,
    /// The sum of the records in the category.
    pub amount: Decimal,
    /// The category's share of its type's total, as a percentage with two
    /// decimal places.
    pub percentage: Decimal,
}

/// Income and expense totals for a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSummary {
    /// The first day of the period.
    pub start: Date,
    /// The last day of the period.
    pub end: Date,
    /// The sum of all income records.
    pub total_income: Decimal,
    /// The sum of all expense records.
    pub total_expense: Decimal,
    /// Income minus expenses, negative when more was spent than earned.
    pub balance: Decimal,
    /// The number of records in the period.
    pub record_count: usize,
    /// Expense totals per category, largest first.
    pub expense_by_category: Vec<CategoryTotal>,
    /// Income totals per category, largest first.
    pub income_by_category: Vec<CategoryTotal>,
}

fn zero() -> Decimal {
    Decimal::new(0, Amount::DECIMAL_PLACES)
}

/// Add up `amounts`, or `None` if the sum does not fit in a [Decimal].
fn checked_sum(amounts: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    amounts
        .into_iter()
        .try_fold(zero(), |sum, amount| sum.checked_add(amount))
}

/// `amount` as a percentage of `total` with two decimal places, zero when
/// `total` is zero.
fn percentage_of(amount: Decimal, total: Decimal) -> Option<Decimal> {
    if total.is_zero() {
        return Some(zero());
    }

    // Dividing first keeps the ratio at most one, so the product cannot overflow.
    let mut percentage = amount
        .checked_div(total)?
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp(Amount::DECIMAL_PLACES);
    percentage.rescale(Amount::DECIMAL_PLACES);

    Some(percentage)
}

fn category_totals<'a>(
    records: impl Iterator<Item = &'a Record>,
) -> Result<(Decimal, Vec<CategoryTotal>), Error> {
    let mut totals: BTreeMap<&Category, Decimal> = BTreeMap::new();

    for record in records {
        let total = totals.entry(&record.category).or_insert_with(zero);
        *total = total
            .checked_add(record.amount.as_decimal())
            .ok_or(Error::TotalOverflow)?;
    }

    let grand_total = checked_sum(totals.values().copied()).ok_or(Error::TotalOverflow)?;

    let mut rows = totals
        .into_iter()
        .map(|(category, amount)| {
            Ok(CategoryTotal {
                category: category.clone(),
                amount,
                percentage: percentage_of(amount, grand_total).ok_or(Error::TotalOverflow)?,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    // BTreeMap iteration already sorted the rows by name, and the sort is stable.
    rows.sort_by(|a, b| b.amount.cmp(&a.amount));

    Ok((grand_total, rows))
}

/// Total `records` by type and category.
///
/// The records are expected to already be restricted to `period`.
///
/// # Errors
///
/// This function will return an [Error::TotalOverflow] if a total is too
/// large to represent.
pub fn summarize(period: Period, records: &[Record]) -> Result<LedgerSummary, Error> {
    let (total_expense, expense_by_category) = category_totals(
        records
            .iter()
            .filter(|record| record.record_type == RecordType::Expense),
    )?;
    let (total_income, income_by_category) = category_totals(
        records
            .iter()
            .filter(|record| record.record_type == RecordType::Income),
    )?;

    Ok(LedgerSummary {
        start: period.start,
        end: period.end,
        total_income,
        total_expense,
        balance: total_income
            .checked_sub(total_expense)
            .ok_or(Error::TotalOverflow)?,
        record_count: records.len(),
        expense_by_category,
        income_by_category,
    })
}

/// The state needed to summarize the ledger.
#[derive(Debug, Clone)]
pub struct SummaryState {
    /// The database connection for reading records.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Shanghai".
    pub local_timezone: String,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The optional date range for a summary.
///
/// A missing bound defaults to the matching bound of the current month.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SummaryQuery {
    /// The first day to include, e.g. "2025-01-01".
    pub start: Option<Date>,
    /// The last day to include.
    pub end: Option<Date>,
}

/// A route handler for the income and expense totals of a period.
pub async fn get_summary_endpoint(
    State(state): State<SummaryState>,
    query: Result<Query<SummaryQuery>, QueryRejection>,
) -> Result<Json<LedgerSummary>, Error> {
    let Query(query) =
        query.map_err(|rejection| ValidationError::InvalidQuery(rejection.body_text()))?;

    let Some(offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Err(Error::InvalidTimezoneError(state.local_timezone));
    };

    let this_month = Period::month_containing(local_today(offset));
    let period = Period::new(
        query.start.unwrap_or(this_month.start()),
        query.end.unwrap_or(this_month.end()),
    )?;

    summarize_period(period, &state.local_timezone, &state.db_connection).map(Json)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use serde_json::Value;
    use time::{
        Date, Duration, OffsetDateTime, UtcOffset,
        macros::{date, datetime},
    };

    use crate::{
        Error, ValidationError,
        db::initialize,
        endpoints,
        record::{Amount, Category, Record, RecordForm, RecordType, create_transaction},
        timezone::local_today,
    };

    use super::{
        Period, SummaryState, category_totals, checked_sum, get_summary_endpoint, summarize,
    };

    fn record(id: i64, amount: &str, category: &str, record_type: RecordType) -> Record {
        Record {
            id,
            amount: Amount::parse(amount).unwrap(),
            category: Category::new(category).unwrap(),
            note: String::new(),
            record_type,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn dec(text: &str) -> Decimal {
        text.parse().unwrap()
    }

    #[test]
    fn month_containing_covers_whole_month() {
        let period = Period::month_containing(date!(2024 - 02 - 17));

        assert_eq!(period.start(), date!(2024 - 02 - 01));
        assert_eq!(period.end(), date!(2024 - 02 - 29));
    }

    #[test]
    fn period_rejects_start_after_end() {
        assert_eq!(
            Period::new(date!(2025 - 03 - 02), date!(2025 - 03 - 01)),
            Err(ValidationError::InvalidDateRange {
                start: date!(2025 - 03 - 02),
                end: date!(2025 - 03 - 01)
            })
        );
    }

    #[test]
    fn single_day_period_is_valid() {
        let day = date!(2025 - 03 - 02);

        assert!(Period::new(day, day).is_ok());
    }

    #[test]
    fn period_rejects_dates_outside_supported_range() {
        let before_earliest = Period::EARLIEST.previous_day().unwrap();

        assert_eq!(
            Period::new(date!(2025 - 01 - 01), date!(9999 - 12 - 31)),
            Err(ValidationError::DateOutOfRange {
                field: "end",
                date: date!(9999 - 12 - 31)
            })
        );
        assert_eq!(
            Period::new(before_earliest, date!(2025 - 01 - 01)),
            Err(ValidationError::DateOutOfRange {
                field: "start",
                date: before_earliest
            })
        );
    }

    #[test]
    fn widest_period_has_bounds_in_any_timezone() {
        let period = Period::new(Period::EARLIEST, Period::LATEST).unwrap();

        for timezone in ["Pacific/Kiritimati", "Pacific/Pago_Pago", "America/New_York"] {
            let (start, end) = period.utc_bounds(timezone).unwrap();

            assert!(start < end);
        }
    }

    #[test]
    fn bounds_follow_the_timezone() {
        let period = Period::new(date!(2025 - 03 - 01), date!(2025 - 03 - 31)).unwrap();

        let (start, end) = period.utc_bounds("Asia/Shanghai").unwrap();

        assert_eq!(start, datetime!(2025 - 02 - 28 16:00 UTC));
        assert_eq!(end, datetime!(2025 - 03 - 31 16:00 UTC));
        assert_eq!(end - start, Duration::days(31));
    }

    #[test]
    fn bounds_use_the_offset_of_each_day_across_daylight_saving() {
        let period = Period::new(date!(2025 - 01 - 01), date!(2025 - 06 - 30)).unwrap();

        let (start, end) = period.utc_bounds("America/New_York").unwrap();

        // EST (-05:00) in January, EDT (-04:00) in July.
        assert_eq!(start, datetime!(2025 - 01 - 01 05:00 UTC));
        assert_eq!(end, datetime!(2025 - 07 - 01 04:00 UTC));
    }

    #[test]
    fn bounds_reject_unknown_timezone() {
        let period = Period::month_containing(date!(2025 - 03 - 01));

        assert!(matches!(
            period.utc_bounds("Mars/Olympus_Mons"),
            Err(Error::InvalidTimezoneError(_))
        ));
    }

    #[test]
    fn summarize_totals_by_type_and_category() {
        let period = Period::month_containing(date!(2025 - 03 - 01));
        let records = vec![
            record(1, "30.00", "餐饮", RecordType::Expense),
            record(2, "10.00", "Transport", RecordType::Expense),
            record(3, "10.00", "餐饮", RecordType::Expense),
            record(4, "100.00", "Salary", RecordType::Income),
        ];

        let summary = summarize(period, &records).unwrap();

        assert_eq!(summary.total_expense, dec("50.00"));
        assert_eq!(summary.total_income, dec("100.00"));
        assert_eq!(summary.balance, dec("50.00"));
        assert_eq!(summary.record_count, 4);
        assert_eq!(summary.expense_by_category.len(), 2);
        assert_eq!(summary.expense_by_category[0].category.as_ref(), "餐饮");
        assert_eq!(summary.expense_by_category[0].amount, dec("40.00"));
        assert_eq!(summary.expense_by_category[0].percentage.to_string(), "80.00");
        assert_eq!(summary.expense_by_category[1].percentage.to_string(), "20.00");
        assert_eq!(summary.income_by_category[0].percentage.to_string(), "100.00");
    }

    #[test]
    fn summarize_empty_period_is_zero() {
        let period = Period::month_containing(date!(2025 - 03 - 01));

        let summary = summarize(period, &[]).unwrap();

        assert_eq!(summary.total_income.to_string(), "0.00");
        assert_eq!(summary.total_expense.to_string(), "0.00");
        assert_eq!(summary.balance.to_string(), "0.00");
        assert!(summary.expense_by_category.is_empty());
    }

    #[test]
    fn balance_can_be_negative() {
        let period = Period::month_containing(date!(2025 - 03 - 01));
        let records = vec![
            record(1, "12.34", "Rent", RecordType::Expense),
            record(2, "2.00", "Refund", RecordType::Income),
        ];

        let summary = summarize(period, &records).unwrap();

        assert_eq!(summary.balance.to_string(), "-10.34");
    }

    #[test]
    fn ties_are_sorted_by_category_name() {
        let period = Period::month_containing(date!(2025 - 03 - 01));
        let records = vec![
            record(1, "5", "b", RecordType::Expense),
            record(2, "5", "a", RecordType::Expense),
        ];

        let summary = summarize(period, &records).unwrap();

        let names: Vec<&str> = summary
            .expense_by_category
            .iter()
            .map(|row| row.category.as_ref())
            .collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(summary.expense_by_category[0].percentage.to_string(), "50.00");
    }

    #[test]
    fn largest_amounts_are_summed_exactly() {
        let period = Period::month_containing(date!(2025 - 03 - 01));
        let records: Vec<Record> = (0..1000)
            .map(|id| Record {
                amount: Amount::new(Amount::MAX).unwrap(),
                ..record(id, "0", "Rent", RecordType::Expense)
            })
            .collect();

        let summary = summarize(period, &records).unwrap();

        assert_eq!(summary.total_expense, dec("999999999999990.00"));
        assert_eq!(summary.balance, dec("-999999999999990.00"));
        assert_eq!(summary.expense_by_category[0].percentage.to_string(), "100.00");
    }

    #[test]
    fn sum_that_does_not_fit_is_none() {
        assert_eq!(checked_sum([Decimal::MAX, Decimal::ONE]), None);
        assert_eq!(checked_sum([Decimal::MIN, Decimal::NEGATIVE_ONE]), None);
        assert_eq!(checked_sum([dec("1.50"), dec("2.25")]), Some(dec("3.75")));
    }

    #[test]
    fn overflowing_total_is_an_error() {
        let period = Period::month_containing(date!(2025 - 03 - 01));
        let huge = Record {
            amount: Amount::new_unchecked(Decimal::MAX),
            ..record(1, "0", "Rent", RecordType::Expense)
        };
        let records = [
            huge.clone(),
            Record {
                id: 2,
                category: Category::new("Food").unwrap(),
                ..huge.clone()
            },
        ];

        assert!(matches!(
            category_totals(records.iter()),
            Err(Error::TotalOverflow)
        ));
        assert!(matches!(
            summarize(period, &records),
            Err(Error::TotalOverflow)
        ));
    }

    #[test]
    fn balance_of_largest_totals_is_exact() {
        let period = Period::month_containing(date!(2025 - 03 - 01));
        let records = [
            Record {
                amount: Amount::new_unchecked(Decimal::MAX),
                ..record(1, "0", "Rent", RecordType::Expense)
            },
            Record {
                amount: Amount::new_unchecked(Decimal::MAX),
                ..record(2, "0", "Salary", RecordType::Income)
            },
        ];

        assert_eq!(summarize(period, &records).unwrap().balance, Decimal::ZERO);
    }

    #[test]
    fn large_category_share_does_not_overflow() {
        let period = Period::month_containing(date!(2025 - 03 - 01));
        let records = [Record {
            amount: Amount::new_unchecked(Decimal::MAX),
            ..record(1, "0", "Rent", RecordType::Expense)
        }];

        let summary = summarize(period, &records).unwrap();

        assert_eq!(summary.expense_by_category[0].percentage.to_string(), "100.00");
    }

    fn get_test_server() -> (TestServer, SummaryState) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let state = SummaryState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
        };
        let app = Router::new()
            .route(endpoints::RECORDS_SUMMARY, get(get_summary_endpoint))
            .with_state(state.clone());

        (
            TestServer::try_new(app).expect("Could not create test server."),
            state,
        )
    }

    #[tokio::test]
    async fn summary_defaults_to_current_month() {
        let (server, state) = get_test_server();
        for (amount, record_type) in [("42.50", "expense"), ("100", "income")] {
            create_transaction(
                RecordForm {
                    amount: Some(amount.into()),
                    category: Some("餐饮".to_owned()),
                    record_type: Some(record_type.to_owned()),
                    note: None,
                },
                &state.db_connection,
            )
            .unwrap();
        }

        let response = server.get(endpoints::RECORDS_SUMMARY).await;

        response.assert_status_ok();
        let body: Value = response.json();
        let this_month = Period::month_containing(local_today(UtcOffset::UTC));
        assert_eq!(body["start"], this_month.start().to_string());
        assert_eq!(body["total_expense"], "42.50");
        assert_eq!(body["total_income"], "100.00");
        assert_eq!(body["balance"], "57.50");
        assert_eq!(body["record_count"], 2);
    }

    #[tokio::test]
    async fn summary_of_past_range_excludes_todays_records() {
        let (server, state) = get_test_server();
        create_transaction(
            RecordForm {
                amount: Some("1".into()),
                category: Some("Snacks".to_owned()),
                ..Default::default()
            },
            &state.db_connection,
        )
        .unwrap();

        let response = server
            .get(endpoints::RECORDS_SUMMARY)
            .add_query_param("start", "2000-01-01")
            .add_query_param("end", "2000-12-31")
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["record_count"], 0);
        assert_eq!(
            body["end"],
            Date::from_ordinal_date(2000, 366).unwrap().to_string()
        );
    }

    #[tokio::test]
    async fn summary_rejects_reversed_range() {
        let (server, _) = get_test_server();

        let response = server
            .get(endpoints::RECORDS_SUMMARY)
            .add_query_param("start", "2025-02-01")
            .add_query_param("end", "2025-01-01")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["field"], "start");
    }

    #[tokio::test]
    async fn summary_rejects_end_date_past_supported_range() {
        let (server, _) = get_test_server();

        let response = server
            .get(endpoints::RECORDS_SUMMARY)
            .add_query_param("start", "2025-01-01")
            .add_query_param("end", "9999-12-31")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["field"], "end");
    }

    #[tokio::test]
    async fn summary_rejects_malformed_date() {
        let (server, _) = get_test_server();

        let response = server
            .get(endpoints::RECORDS_SUMMARY)
            .add_query_param("start", "yesterday")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["field"], "query");
    }
}
