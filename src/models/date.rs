use std::fmt;
use std::str::FromStr;

use chrono::{Days, Local, NaiveDate};

use crate::error::AppError;

const STORAGE_FORMAT: &str = "%d/%m/%Y";

/// Calendar day an article was ingested on.
///
/// Kept as a `NaiveDate` everywhere; the `dd/mm/yyyy` text form only exists
/// at the database and HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IngestDate(NaiveDate);

impl IngestDate {
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    #[cfg(test)]
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn days_before(&self, days: u64) -> Option<Self> {
        self.0.checked_sub_days(Days::new(days)).map(Self)
    }

    /// `dd-mm-yyyy`, the form used in dated listing URLs.
    pub fn dashed(&self) -> String {
        self.0.format("%d-%m-%Y").to_string()
    }
}

impl fmt::Display for IngestDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(STORAGE_FORMAT))
    }
}

impl FromStr for IngestDate {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), STORAGE_FORMAT)
            .map(Self)
            .map_err(|_| AppError::InvalidDate(s.to_string()))
    }
}
