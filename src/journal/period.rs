use chrono::{DateTime, Months, NaiveDate, Utc};

use super::error::JournalError;

/// Reporting window selector for the performance dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodFilter {
    /// Everything ever recorded.
    All,
    /// Rolling window ending today, starting n calendar months back.
    TrailingMonths(u32),
    /// One calendar month.
    Month { year: i32, month: u32 },
}

impl PeriodFilter {
    /// Resolve to inclusive UTC bounds. A `None` start means unbounded:
    /// callers skip period filtering entirely.
    pub fn bounds(
        &self,
        now: DateTime<Utc>,
    ) -> Result<(Option<DateTime<Utc>>, DateTime<Utc>), JournalError> {
        match *self {
            PeriodFilter::All => Ok((None, day_end(now.date_naive()))),
            PeriodFilter::TrailingMonths(months) => {
                let start_day = now
                    .date_naive()
                    .checked_sub_months(Months::new(months))
                    .ok_or_else(|| {
                        JournalError::Validation(format!(
                            "Window of {} months is out of range",
                            months
                        ))
                    })?;
                Ok((Some(day_start(start_day)), day_end(now.date_naive())))
            }
            PeriodFilter::Month { year, month } => {
                let (start, end) = month_bounds(year, month)?;
                Ok((Some(start), end))
            }
        }
    }
}

/// Inclusive bounds of one calendar month: the 1st at 00:00:00 through the
/// last day at 23:59:59.999.
pub fn month_bounds(
    year: i32,
    month: u32,
) -> Result<(DateTime<Utc>, DateTime<Utc>), JournalError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| JournalError::Validation(format!("Invalid month {}-{}", year, month)))?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| JournalError::Validation(format!("Invalid month {}-{}", year, month)))?;

    Ok((day_start(first), day_end(last)))
}

fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(0, 0, 0).unwrap().and_utc()
}

fn day_end(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_milli_opt(23, 59, 59, 999).unwrap().and_utc()
}
