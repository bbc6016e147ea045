// Row types flowing through the pipeline.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// A fetched article, before annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub newspaper: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<NaiveDate>,
}

/// One annotated article: its newspaper, main topic and mentioned persons.
///
/// An empty `topic` marks a row whose annotation could not be recovered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub newspaper: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub persons: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<NaiveDate>,
}

impl ArticleRecord {
    pub fn is_empty(&self) -> bool {
        self.topic.trim().is_empty()
    }
}

/// Inclusive publication date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// One calendar month back from `today`, inclusive of both ends.
    pub fn last_month(today: NaiveDate) -> Self {
        let start = today.checked_sub_months(Months::new(1)).unwrap_or(today);
        Self { start, end: today }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}
