use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{AppError, AppResult};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One calendar month, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportingPeriod {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ReportingPeriod {
    pub fn for_month(month: u32, year: i32) -> AppResult<Self> {
        let invalid = || AppError::BadRequest(format!("{month}/{year} is not a valid month"));

        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(invalid)?;
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).ok_or_else(invalid)?;

        Ok(Self {
            start: first.and_time(NaiveTime::MIN),
            end: last.and_time(end_of_day),
        })
    }

    /// The full month before the one `today` falls in.
    pub fn previous_month(today: NaiveDate) -> AppResult<Self> {
        let in_previous = today
            .with_day(1)
            .and_then(|first| first.pred_opt())
            .ok_or_else(|| AppError::BadRequest(format!("no month precedes {today}")))?;

        Self::for_month(in_previous.month(), in_previous.year())
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start <= ts && ts <= self.end
    }

    pub fn start_date(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_date(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }

    /// `2024-08-01-2024-08-31`
    pub fn label(&self) -> String {
        format!("{}-{}", self.start_date(), self.end_date())
    }

    pub fn file_name(&self) -> String {
        format!("osg-account-report-{}.csv", self.label())
    }
}
