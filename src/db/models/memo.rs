use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One optional free-text note per calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyMemo {
    pub memo_date: NaiveDate,
    pub content: String,
}
