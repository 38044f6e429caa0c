use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::AddAssign;
use std::str::FromStr;

pub const SCHEMA_VERSION: u32 = 1;

/// Line churn attributed to one author, from one stat line or accumulated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeCount {
    pub insertions: u64,
    pub deletions: u64,
}

impl ChangeCount {
    pub fn new(insertions: u64, deletions: u64) -> Self {
        Self { insertions, deletions }
    }
}

impl AddAssign for ChangeCount {
    fn add_assign(&mut self, rhs: Self) {
        self.insertions = self.insertions.saturating_add(rhs.insertions);
        self.deletions = self.deletions.saturating_add(rhs.deletions);
    }
}

/// Author identifier as printed by `git log --pretty=%ae`. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorKey(String);

impl AuthorKey {
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == key.len() {
            Some(Self(key))
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Calendar month bucket. Orders chronologically and renders as `YYYY-MM`,
/// so the string form sorts the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) && (0..=9999).contains(&year) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// `(2024-03) March 2024`
    pub fn label(&self) -> String {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(first) => first.format("(%Y-%m) %B %Y").to_string(),
            None => format!("({self})"),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got '{s}'"))?;
        let year: i32 = year.parse().map_err(|_| format!("invalid year in '{s}'"))?;
        let month: u32 = month.parse().map_err(|_| format!("invalid month in '{s}'"))?;
        MonthKey::new(year, month).ok_or_else(|| format!("month out of range: '{s}'"))
    }
}

impl TryFrom<String> for MonthKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    pub author: AuthorKey,
    pub changes: ChangeCount,
}

impl Attribution {
    pub fn new(author: AuthorKey, insertions: u64, deletions: u64) -> Self {
        Self {
            author,
            changes: ChangeCount::new(insertions, deletions),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRow {
    pub author: AuthorKey,
    pub insertions: u64,
    pub deletions: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthBlock {
    pub month: MonthKey,
    pub label: String,
    pub authors: Vec<AuthorRow>,
    pub insertions: u64,
    pub deletions: u64,
}

/// Sorted view of an aggregate, ready to render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub months: Vec<MonthBlock>,
    pub developers: Vec<AuthorRow>,
    pub totals: ChangeCount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedScan {
    pub directory: String,
    pub month: MonthKey,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub base_path: String,
    pub all_repositories: bool,
    pub months_back: u32,
    pub extensions: Vec<String>,
    pub months: Vec<MonthBlock>,
    pub developers: Vec<AuthorRow>,
    pub total_insertions: u64,
    pub total_deletions: u64,
    pub failed_scans: Vec<FailedScan>,
}

/// One NDJSON line: an author's figures within one month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthAuthorRecord {
    pub month: MonthKey,
    pub author: AuthorKey,
    pub insertions: u64,
    pub deletions: u64,
}
