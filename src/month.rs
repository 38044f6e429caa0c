use crate::error::{Result, StatError};
use crate::model::MonthKey;
use chrono::{Datelike, Months, NaiveDate, Utc};

/// First and last calendar day of one month. The same window drives both
/// the history filter and the bucket key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
}

impl MonthWindow {
    pub fn containing(date: NaiveDate) -> Result<Self> {
        let first_day = date
            .with_day(1)
            .ok_or_else(|| StatError::InvalidDate(format!("no first day for {date}")))?;
        let last_day = first_day
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(|| StatError::InvalidDate(format!("no last day for {date}")))?;
        Ok(Self { first_day, last_day })
    }

    /// The month `back` whole months before `today`'s month.
    pub fn months_back(today: NaiveDate, back: u32) -> Result<Self> {
        let first = today
            .with_day(1)
            .and_then(|d| d.checked_sub_months(Months::new(back)))
            .ok_or_else(|| {
                StatError::InvalidDate(format!("{back} months before {today} is out of range"))
            })?;
        Self::containing(first)
    }

    /// Windows for the current month and the `count - 1` months before it,
    /// newest first.
    pub fn plan(today: NaiveDate, count: u32) -> Result<Vec<Self>> {
        (0..count).map(|i| Self::months_back(today, i)).collect()
    }

    pub fn key(&self) -> MonthKey {
        MonthKey::of(self.first_day)
    }

    pub fn since_arg(&self) -> String {
        format!("{} 00:00:00 +0000", self.first_day.format("%Y-%m-%d"))
    }

    pub fn until_arg(&self) -> String {
        format!("{} 23:59:59 +0000", self.last_day.format("%Y-%m-%d"))
    }
}

/// Today's date in UTC, so month boundaries never follow the local zone.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}
